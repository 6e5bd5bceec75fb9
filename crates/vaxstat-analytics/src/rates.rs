//! Daily breakthrough rates per vaccination status.

use chrono::NaiveDate;
use tracing::{debug, info};
use vaxstat_core::calendar::{date_range, days_before};
use vaxstat_core::{Bucket, LinelistRecord, Metric, Policy};

use crate::error::intersect;
use crate::index::DateIndex;
use crate::series::{Cell, Series};
use crate::status::{self, StatusCounts, StatusSummary};
use crate::{AnalyticsError, Denominators, PER_POPULATION};

/// Events per 100,000 of `denominator`, or a gap when it is missing.
pub(crate) fn rate_cell(count: u64, denominator: Option<f64>) -> Cell {
    match denominator {
        Some(denom) if denom > 0.0 => Cell::finite(count as f64 / denom * PER_POPULATION),
        _ => Cell::Gap,
    }
}

/// Build the raw daily table over `first..=end`, then smooth it.
///
/// `day` returns `(count, denominator)` per column for one date.
pub(crate) fn smoothed_rates(
    columns: Vec<Bucket>,
    first: NaiveDate,
    end: NaiveDate,
    window: usize,
    mut day: impl FnMut(NaiveDate) -> Vec<(u64, Option<f64>)>,
) -> Result<(Series<Bucket>, Vec<(NaiveDate, Bucket)>), AnalyticsError> {
    let mut raw = Series::new(columns.clone());
    let mut gaps = Vec::new();
    for date in date_range(first, end) {
        let cells: Vec<Cell> = day(date)
            .into_iter()
            .map(|(count, denom)| rate_cell(count, denom))
            .collect();
        for (bucket, cell) in columns.iter().zip(&cells) {
            if *cell == Cell::Gap {
                debug!(%date, %bucket, "missing denominator");
                gaps.push((date, bucket.clone()));
            }
        }
        raw.push_row(date, cells)?;
    }
    Ok((raw.trailing_mean(window), gaps))
}

/// First processed date for an output range starting at `start`.
pub(crate) fn warmup_start(
    start: NaiveDate,
    end: NaiveDate,
    window: usize,
) -> Result<NaiveDate, AnalyticsError> {
    if start > end {
        return Err(AnalyticsError::InvalidConfiguration(format!(
            "start {start} is after end {end}"
        )));
    }
    let warmup = u32::try_from(window).map_err(|_| {
        AnalyticsError::InvalidConfiguration(format!("moving average window {window} too large"))
    })?;
    days_before(start, warmup).ok_or_else(|| {
        AnalyticsError::InvalidConfiguration(format!("{window} days before {start}"))
    })
}

/// Rates per bucket, with the cells whose denominator was missing.
#[derive(Debug, Clone)]
pub struct RateSeries {
    pub metric: Metric,
    pub rates: Series<Bucket>,
    /// Raw (pre-smoothing) days and buckets without a usable denominator.
    pub gaps: Vec<(NaiveDate, Bucket)>,
}

impl RateSeries {
    pub fn get(&self, date: NaiveDate, bucket: &Bucket) -> Option<Cell> {
        self.rates.get(date, bucket)
    }

    /// Fail on the first missing denominator.
    pub fn ensure_complete(&self) -> Result<(), AnalyticsError> {
        match self.gaps.first() {
            Some((date, bucket)) => Err(AnalyticsError::MissingReferenceData {
                date: *date,
                bucket: bucket.label(),
            }),
            None => Ok(()),
        }
    }
}

/// Breakthrough rates for one metric: linelist events joined against
/// lagged coverage denominators.
pub struct RatePipeline<'a> {
    metric: Metric,
    index: DateIndex<'a>,
    denominators: Denominators<'a>,
    policy: &'a Policy,
}

impl<'a> RatePipeline<'a> {
    pub fn new(
        metric: Metric,
        records: &'a [LinelistRecord],
        denominators: Denominators<'a>,
        policy: &'a Policy,
    ) -> Self {
        Self {
            metric,
            index: DateIndex::new(records),
            denominators,
            policy,
        }
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn index(&self) -> &DateIndex<'a> {
        &self.index
    }

    /// Days after dose 2 before an event counts as fully vaccinated.
    pub fn lag(&self) -> u32 {
        self.policy.full_vax_lag(self.metric)
    }

    /// Dates covered by both the linelist and the vaccination table.
    pub fn coverage(&self) -> Option<(NaiveDate, NaiveDate)> {
        intersect(self.index.span(), self.denominators.coverage().span())
    }

    pub fn daily_counts(&self, date: NaiveDate) -> StatusCounts {
        StatusCounts::tally(self.index.on(date).iter().copied(), self.lag())
    }

    /// Unsmoothed `(count, denominator)` per standard bucket on `date`.
    fn day(&self, date: NaiveDate) -> Vec<(u64, Option<f64>)> {
        let counts = self.daily_counts(date);
        let lag = self.lag();
        Bucket::standard()
            .iter()
            .map(|bucket| {
                (
                    counts.get(bucket),
                    self.denominators.for_bucket(bucket, date, lag),
                )
            })
            .collect()
    }

    /// Unsmoothed rates per standard bucket on `date`.
    pub fn daily_rate(&self, date: NaiveDate) -> Vec<(Bucket, Cell)> {
        Bucket::standard()
            .into_iter()
            .zip(self.day(date))
            .map(|(bucket, (count, denom))| (bucket, rate_cell(count, denom)))
            .collect()
    }

    /// Rates for `start..=end`, smoothed over `moving_average` days.
    ///
    /// The window's warmup days before `start` are processed too, so the
    /// first row is the first date with a full window. Policy suppressions
    /// are applied after smoothing.
    pub fn compute(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        moving_average: usize,
    ) -> Result<RateSeries, AnalyticsError> {
        let first = warmup_start(start, end, moving_average)?;
        AnalyticsError::check_span(first, end, self.coverage())?;

        let (mut rates, gaps) =
            smoothed_rates(Bucket::standard(), first, end, moving_average, |date| {
                self.day(date)
            })?;
        for rule in self.policy.suppressions_for(self.metric) {
            rates.suppress_until(&Bucket::Full(rule.brand), rule.until);
        }

        info!(
            metric = %self.metric,
            %start,
            %end,
            moving_average,
            days = rates.len(),
            gaps = gaps.len(),
            "computed breakthrough rates"
        );
        Ok(RateSeries {
            metric: self.metric,
            rates,
            gaps,
        })
    }

    /// Daily counts per status over `start..=end`.
    pub fn status_table(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Series<String>, AnalyticsError> {
        status::daily_status_table(&self.index, start, end, self.lag())
    }

    /// Population versus event shares over the `past_n_days` ending at `end`.
    pub fn status_summary(
        &self,
        end: NaiveDate,
        past_n_days: u32,
    ) -> Result<StatusSummary, AnalyticsError> {
        status::status_summary(&self.index, &self.denominators, end, past_n_days, self.lag())
    }
}
