//! Breakthrough rates by dose-brand combination, booster eligibility and
//! the primary × booster brand matrix.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use tracing::info;
use vaxstat_core::calendar::{date_range, days_before};
use vaxstat_core::{
    BoosterCoverage, Brand, Bucket, Combo, CoverageSeries, Dose, LinelistRecord, Metric, Policy,
};

use crate::error::intersect;
use crate::index::DateIndex;
use crate::rates::{smoothed_rates, warmup_start};
use crate::series::{Cell, Series};
use crate::{AnalyticsError, PER_POPULATION, RateSeries};

fn past_lag(days: Option<i64>, lag: u32) -> bool {
    days.is_some_and(|d| d > i64::from(lag))
}

/// Combinations a record's event is attributed to.
///
/// Cases count only towards their three-dose combination, once the booster
/// is past `lag`. Deaths measure both offsets to the positive test and are
/// attributed independently: a death can count towards its two-dose course
/// and its three-dose combination at once.
pub fn attributed_combos(record: &LinelistRecord, metric: Metric, lag: u32) -> Vec<Combo> {
    let boosted = |days| past_lag(days, lag).then(|| record.combo(3)).flatten();
    match metric {
        Metric::Cases => boosted(record.days_dose3).into_iter().collect(),
        Metric::Deaths => past_lag(record.days_dose2_to_positive, lag)
            .then(|| record.combo(2))
            .flatten()
            .into_iter()
            .chain(boosted(record.days_dose3_to_positive))
            .collect(),
    }
}

/// Events and rate for one combination over a period.
#[derive(Debug, Clone, PartialEq)]
pub struct ComboRate {
    pub combo: Combo,
    pub events: u64,
    /// Mean cumulative coverage over the lagged period.
    pub mean_denominator: Option<f64>,
    /// Events per 100,000; zero when there were no events.
    pub rate: Option<f64>,
}

pub struct BoosterPipeline<'a> {
    metric: Metric,
    index: DateIndex<'a>,
    boosters: &'a BoosterCoverage,
    policy: &'a Policy,
}

impl<'a> BoosterPipeline<'a> {
    pub fn new(
        metric: Metric,
        records: &'a [LinelistRecord],
        boosters: &'a BoosterCoverage,
        policy: &'a Policy,
    ) -> Self {
        Self {
            metric,
            index: DateIndex::new(records),
            boosters,
            policy,
        }
    }

    /// Reported combinations; case rates only cover boosted ones.
    pub fn combos(&self) -> Vec<Combo> {
        self.policy
            .booster_combos
            .iter()
            .filter(|c| self.metric == Metric::Deaths || c.dose_count() == 3)
            .cloned()
            .collect()
    }

    fn event_lag(&self) -> u32 {
        self.policy.booster_event_lag
    }

    fn denominator_lag(&self) -> u32 {
        self.policy.booster_denominator_lag(self.metric)
    }

    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        intersect(self.index.span(), self.boosters.span())
    }

    pub fn combo_counts<'r>(
        &self,
        records: impl IntoIterator<Item = &'r LinelistRecord>,
    ) -> BTreeMap<Combo, u64> {
        let mut counts = BTreeMap::new();
        for record in records {
            for combo in attributed_combos(record, self.metric, self.event_lag()) {
                *counts.entry(combo).or_default() += 1;
            }
        }
        counts
    }

    fn denominator(&self, combo: &Combo, date: NaiveDate) -> Option<f64> {
        let lagged = days_before(date, self.denominator_lag())?;
        self.boosters.cumulative(combo, lagged).map(|n| n as f64)
    }

    /// Daily rates per combination over `start..=end`, smoothed like
    /// [`RatePipeline::compute`](crate::RatePipeline::compute).
    pub fn combo_rates(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        moving_average: usize,
    ) -> Result<RateSeries, AnalyticsError> {
        let first = warmup_start(start, end, moving_average)?;
        AnalyticsError::check_span(first, end, self.coverage())?;

        let combos = self.combos();
        let columns = combos.iter().cloned().map(Bucket::Combo).collect();
        let (rates, gaps) = smoothed_rates(columns, first, end, moving_average, |date| {
            let counts = self.combo_counts(self.index.on(date).iter().copied());
            combos
                .iter()
                .map(|c| {
                    (
                        counts.get(c).copied().unwrap_or(0),
                        self.denominator(c, date),
                    )
                })
                .collect()
        })?;

        info!(
            metric = %self.metric,
            %start,
            %end,
            combos = combos.len(),
            gaps = gaps.len(),
            "computed combination rates"
        );
        Ok(RateSeries {
            metric: self.metric,
            rates,
            gaps,
        })
    }

    /// Events in `start..=end` per combination over the mean coverage of the
    /// same period shifted back by the denominator lag.
    pub fn summary(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<ComboRate>, AnalyticsError> {
        if start > end {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "start {start} is after end {end}"
            )));
        }
        let lag = self.denominator_lag();
        let shifted = days_before(start, lag)
            .zip(days_before(end, lag))
            .filter(|&span| intersect(Some(span), self.boosters.span()).is_some());
        let Some((lo, hi)) = shifted else {
            return Err(AnalyticsError::DateRangeOutOfBounds {
                start,
                end,
                coverage: self.boosters.span(),
            });
        };

        let counts = self.combo_counts(self.index.between(start, end));
        let rates = self
            .combos()
            .into_iter()
            .map(|combo| {
                let values: Vec<f64> = date_range(lo, hi)
                    .filter_map(|date| self.boosters.cumulative(&combo, date))
                    .map(|n| n as f64)
                    .collect();
                let mean_denominator =
                    (!values.is_empty()).then(|| values.iter().sum::<f64>() / values.len() as f64);
                let events = counts.get(&combo).copied().unwrap_or(0);
                let rate = if events == 0 {
                    Some(0.0)
                } else {
                    mean_denominator
                        .filter(|m| *m > 0.0)
                        .map(|m| events as f64 / m * PER_POPULATION)
                };
                ComboRate {
                    combo,
                    events,
                    mean_denominator,
                    rate,
                }
            })
            .collect();
        Ok(rates)
    }
}

/// Booster eligibility on one date.
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    pub date: NaiveDate,
    /// Second-dose recipients past their brand's eligibility window.
    pub eligible: Vec<(Brand, u64)>,
    pub total_eligible: u64,
    /// Cumulative booster doses given.
    pub boosted: u64,
    /// `boosted / total_eligible`, when anyone is eligible.
    pub share_boosted: Option<f64>,
}

/// Eligibility on `date`, or `None` when `primary` does not cover it.
///
/// Dates before the first vaccination row count as zero second doses.
pub fn eligibility(
    primary: &CoverageSeries,
    policy: &Policy,
    date: NaiveDate,
) -> Option<Eligibility> {
    let boosted = primary.cumulative_booster(date)?;
    let eligible: Vec<(Brand, u64)> = policy
        .eligibility
        .iter()
        .map(|window| {
            let count = days_before(date, window.days)
                .and_then(|shifted| primary.cumulative(window.brand, Dose::Second, shifted))
                .unwrap_or(0);
            (window.brand, count)
        })
        .collect();
    let total_eligible = eligible.iter().map(|(_, n)| n).sum();
    let share_boosted = (total_eligible > 0).then(|| boosted as f64 / total_eligible as f64);
    Some(Eligibility {
        date,
        eligible,
        total_eligible,
        boosted,
        share_boosted,
    })
}

/// Eligibility over every date in `primary`: one column per brand, then
/// total eligible, boosted and the boosted share.
pub fn eligibility_series(
    primary: &CoverageSeries,
    policy: &Policy,
) -> Result<Series<String>, AnalyticsError> {
    let mut columns: Vec<String> = policy
        .eligibility
        .iter()
        .map(|w| format!("{} eligible", w.brand.label()))
        .collect();
    columns.extend(["Total eligible", "Boosted", "Share boosted"].map(String::from));

    let mut series = Series::new(columns);
    for day in primary.days() {
        let Some(e) = eligibility(primary, policy, day.date) else {
            continue;
        };
        let mut cells: Vec<Cell> = e.eligible.iter().map(|(_, n)| Cell::Value(*n as f64)).collect();
        cells.push(Cell::Value(e.total_eligible as f64));
        cells.push(Cell::Value(e.boosted as f64));
        cells.push(e.share_boosted.map_or(Cell::Gap, Cell::Value));
        series.push_row(day.date, cells)?;
    }
    Ok(series)
}

/// One primary/booster brand pair of the combination matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixCell {
    pub primary: Brand,
    pub booster: Brand,
    pub count: u64,
    /// Share of all booster doses in the matrix.
    pub share: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComboMatrix {
    pub date: NaiveDate,
    pub total: u64,
    pub cells: Vec<MatrixCell>,
}

impl ComboMatrix {
    pub fn get(&self, primary: Brand, booster: Brand) -> Option<&MatrixCell> {
        self.cells
            .iter()
            .find(|c| c.primary == primary && c.booster == booster)
    }
}

/// Homologous primary course × booster brand counts at the latest date.
pub fn combination_matrix(boosters: &BoosterCoverage) -> Option<ComboMatrix> {
    let (_, date) = boosters.span()?;
    let counts: Vec<(Brand, Brand, u64)> = Brand::TRACKED
        .iter()
        .flat_map(|&primary| Brand::TRACKED.iter().map(move |&booster| (primary, booster)))
        .map(|(primary, booster)| {
            let count = Combo::from_doses(&[primary, primary, booster])
                .and_then(|c| boosters.cumulative(&c, date))
                .unwrap_or(0);
            (primary, booster, count)
        })
        .collect();
    let total: u64 = counts.iter().map(|(_, _, n)| n).sum();
    let cells = counts
        .into_iter()
        .map(|(primary, booster, count)| MatrixCell {
            primary,
            booster,
            count,
            share: (total > 0).then(|| count as f64 / total as f64),
        })
        .collect();
    Some(ComboMatrix { date, total, cells })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::d;
    use vaxstat_core::DailyDoses;

    fn combo(code: &str) -> Combo {
        Combo::parse(code).unwrap()
    }

    fn primary() -> CoverageSeries {
        let days = date_range(d("2021-01-01"), d("2021-12-31"))
            .map(|date| {
                let booster = if date >= d("2021-10-01") { 5 } else { 0 };
                DailyDoses::new(date)
                    .with_doses(Brand::Pfizer, Dose::Second, 10)
                    .with_doses(Brand::Sinovac, Dose::Second, 200)
                    .with_booster(booster)
            })
            .collect();
        CoverageSeries::from_daily(days).unwrap()
    }

    /// 2021-10-01..=2021-11-30: daily ppp 100, ssp 200, sss 50.
    fn boosters(primary: &CoverageSeries) -> BoosterCoverage {
        let rows = date_range(d("2021-10-01"), d("2021-11-30")).flat_map(|date| {
            [
                (date, combo("ppp"), 100),
                (date, combo("ssp"), 200),
                (date, combo("sss"), 50),
            ]
        });
        BoosterCoverage::from_daily(rows, primary)
    }

    fn october_day(date: NaiveDate) -> u64 {
        ((date - d("2021-10-01")).num_days() + 1) as u64
    }

    /// 2021-11-01..=2021-11-30: each day one ppp case past the lag, one ssp
    /// case past the lag, one ssp case inside it and one unboosted.
    fn cases() -> Vec<LinelistRecord> {
        date_range(d("2021-11-01"), d("2021-11-30"))
            .flat_map(|date| {
                [
                    LinelistRecord::new(date)
                        .with_primary(Brand::Pfizer, Brand::Pfizer, 200)
                        .with_booster(Brand::Pfizer, 20),
                    LinelistRecord::new(date)
                        .with_primary(Brand::Sinovac, Brand::Sinovac, 200)
                        .with_booster(Brand::Pfizer, 30),
                    LinelistRecord::new(date)
                        .with_primary(Brand::Sinovac, Brand::Sinovac, 200)
                        .with_booster(Brand::Pfizer, 5),
                    LinelistRecord::new(date).with_primary(Brand::Pfizer, Brand::Pfizer, 100),
                ]
            })
            .collect()
    }

    #[test]
    fn deaths_count_towards_primary_and_booster_combinations() {
        let date = d("2021-11-10");
        let boosted = LinelistRecord::new(date)
            .with_primary(Brand::Sinovac, Brand::Sinovac, 200)
            .with_booster(Brand::Pfizer, 30)
            .with_positive_offsets(Some(190), Some(20));
        assert_eq!(
            attributed_combos(&boosted, Metric::Deaths, 14),
            [combo("ss"), combo("ssp")]
        );
        assert_eq!(attributed_combos(&boosted, Metric::Cases, 14), [combo("ssp")]);

        let recent_booster = boosted.clone().with_positive_offsets(Some(190), Some(10));
        assert_eq!(
            attributed_combos(&recent_booster, Metric::Deaths, 14),
            [combo("ss")]
        );

        let homologous = LinelistRecord::new(date)
            .with_primary(Brand::Pfizer, Brand::Pfizer, 210)
            .with_booster(Brand::Pfizer, 25)
            .with_positive_offsets(Some(190), Some(20));
        assert_eq!(
            attributed_combos(&homologous, Metric::Deaths, 14),
            [combo("pp"), combo("ppp")]
        );

        let primary_only = LinelistRecord::new(date)
            .with_primary(Brand::Pfizer, Brand::Pfizer, 100)
            .with_positive_offsets(Some(90), None);
        assert_eq!(
            attributed_combos(&primary_only, Metric::Deaths, 14),
            [combo("pp")]
        );
        assert!(attributed_combos(&primary_only, Metric::Cases, 14).is_empty());
    }

    #[test]
    fn daily_combination_rates() {
        let (primary, policy, cases) = (primary(), Policy::default(), cases());
        let boosters = boosters(&primary);
        let pipeline = BoosterPipeline::new(Metric::Cases, &cases, &boosters, &policy);
        assert_eq!(pipeline.combos(), [combo("ppp"), combo("ssp"), combo("sss")]);

        let date = d("2021-11-15");
        let series = pipeline.combo_rates(date, date, 0).unwrap();
        // Denominators are read 14 days earlier, on 2021-11-01.
        let ppp = 100 * october_day(d("2021-11-01"));
        assert_eq!(
            series.get(date, &Bucket::Combo(combo("ppp"))),
            Some(Cell::Value(1.0 / ppp as f64 * 100_000.0))
        );
        assert_eq!(
            series.get(date, &Bucket::Combo(combo("sss"))),
            Some(Cell::Value(0.0))
        );
        assert!(series.ensure_complete().is_ok());
    }

    #[test]
    fn combination_rates_outside_booster_coverage() {
        let (primary, policy, cases) = (primary(), Policy::default(), cases());
        let boosters = boosters(&primary);
        let pipeline = BoosterPipeline::new(Metric::Cases, &cases, &boosters, &policy);
        assert!(matches!(
            pipeline.combo_rates(d("2021-11-01"), d("2021-11-05"), 7),
            Err(AnalyticsError::DateRangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn period_summary() {
        let (primary, policy, cases) = (primary(), Policy::default(), cases());
        let boosters = boosters(&primary);
        let pipeline = BoosterPipeline::new(Metric::Cases, &cases, &boosters, &policy);

        let summary = pipeline.summary(d("2021-11-10"), d("2021-11-20")).unwrap();
        assert_eq!(summary.len(), 3);

        let ppp = &summary[0];
        assert_eq!(ppp.events, 11);
        // Mean of days 27..=37 of the booster table.
        let mean = 100.0 * 32.0;
        assert!((ppp.mean_denominator.unwrap() - mean).abs() < 1e-9);
        assert!((ppp.rate.unwrap() - 11.0 / mean * 100_000.0).abs() < 1e-9);

        let sss = &summary[2];
        assert_eq!(sss.events, 0);
        assert_eq!(sss.rate, Some(0.0));
    }

    #[test]
    fn death_summary_includes_two_dose_combinations() {
        let (primary, policy) = (primary(), Policy::default());
        let boosters = boosters(&primary);
        let deaths = vec![
            LinelistRecord::new(d("2021-11-25"))
                .with_primary(Brand::Sinovac, Brand::Sinovac, 200)
                .with_positive_offsets(Some(190), None),
            LinelistRecord::new(d("2021-11-26"))
                .with_primary(Brand::Sinovac, Brand::Sinovac, 200)
                .with_booster(Brand::Sinovac, 40)
                .with_positive_offsets(Some(190), Some(30)),
        ];
        let pipeline = BoosterPipeline::new(Metric::Deaths, &deaths, &boosters, &policy);
        assert_eq!(pipeline.combos().len(), 6);

        let summary = pipeline.summary(d("2021-11-20"), d("2021-11-30")).unwrap();
        let by_code: BTreeMap<&str, &ComboRate> =
            summary.iter().map(|r| (r.combo.code(), r)).collect();
        // The boosted death counts towards both its course and its booster.
        assert_eq!(by_code["ss"].events, 2);
        assert_eq!(by_code["sss"].events, 1);
        assert_eq!(by_code["pp"].rate, Some(0.0));
        assert!(by_code["ss"].rate.unwrap() > 0.0);
    }

    #[test]
    fn summary_before_booster_programme() {
        let (primary, policy, cases) = (primary(), Policy::default(), cases());
        let boosters = boosters(&primary);
        let pipeline = BoosterPipeline::new(Metric::Cases, &cases, &boosters, &policy);
        assert!(matches!(
            pipeline.summary(d("2021-09-01"), d("2021-09-30")),
            Err(AnalyticsError::DateRangeOutOfBounds { .. })
        ));
    }

    #[test]
    fn eligibility_windows_by_brand() {
        let (primary, policy) = (primary(), Policy::default());
        let date = d("2021-12-01");
        let e = eligibility(&primary, &policy, date).unwrap();

        let day = |date: NaiveDate| ((date - d("2021-01-01")).num_days() + 1) as u64;
        let sinovac = 200 * day(days_before(date, 90).unwrap());
        let pfizer = 10 * day(days_before(date, 180).unwrap());
        assert_eq!(
            e.eligible,
            [
                (Brand::Pfizer, pfizer),
                (Brand::AstraZeneca, 0),
                (Brand::Sinovac, sinovac)
            ]
        );
        assert_eq!(e.total_eligible, pfizer + sinovac);
        assert_eq!(e.boosted, 5 * 62);
        assert_eq!(
            e.share_boosted,
            Some(310.0 / (pfizer + sinovac) as f64)
        );
    }

    #[test]
    fn nobody_eligible_before_programme_start() {
        let (primary, policy) = (primary(), Policy::default());
        let e = eligibility(&primary, &policy, d("2021-02-01")).unwrap();
        assert_eq!(e.total_eligible, 0);
        assert_eq!(e.share_boosted, None);
        assert!(eligibility(&primary, &policy, d("2022-01-01")).is_none());

        let series = eligibility_series(&primary, &policy).unwrap();
        assert_eq!(series.len(), 365);
        assert_eq!(
            series.get(d("2021-02-01"), &"Share boosted".to_string()),
            Some(Cell::Gap)
        );
    }

    #[test]
    fn latest_combination_matrix() {
        let primary = primary();
        let matrix = combination_matrix(&boosters(&primary)).unwrap();
        assert_eq!(matrix.date, d("2021-11-30"));

        let days = october_day(d("2021-11-30"));
        assert_eq!(matrix.total, 350 * days);
        let ssp = matrix.get(Brand::Sinovac, Brand::Pfizer).unwrap();
        assert_eq!(ssp.count, 200 * days);
        assert!((ssp.share.unwrap() - 200.0 / 350.0).abs() < 1e-12);
        assert_eq!(
            matrix.get(Brand::AstraZeneca, Brand::AstraZeneca).unwrap().count,
            0
        );
    }
}
