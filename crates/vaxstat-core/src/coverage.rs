//! Vaccination coverage reference tables.
//!
//! Sources publish daily dose counts; every cumulative figure here is the
//! prefix sum of those daily counts in date order, so cumulative columns are
//! non-decreasing by construction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;

use crate::{Brand, Combo, CoreError, Dose};

/// Doses administered on one day, as published in the national table.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyDoses {
    pub date: NaiveDate,
    /// Doses per tracked brand and dose number (`pfizer1`, `sinovac2`, ...).
    pub doses: BTreeMap<(Brand, Dose), u64>,
    /// All doses of every brand (`daily`).
    pub total: u64,
    /// First doses of every brand (`daily_partial`).
    pub partial: u64,
    /// Booster doses of every brand (`daily_booster`).
    pub booster: u64,
}

impl DailyDoses {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            doses: BTreeMap::new(),
            total: 0,
            partial: 0,
            booster: 0,
        }
    }

    pub fn with_doses(mut self, brand: Brand, dose: Dose, count: u64) -> Self {
        self.doses.insert((brand, dose), count);
        self
    }

    pub fn with_partial(mut self, count: u64) -> Self {
        self.partial = count;
        self
    }

    pub fn with_total(mut self, count: u64) -> Self {
        self.total = count;
        self
    }

    pub fn with_booster(mut self, count: u64) -> Self {
        self.booster = count;
        self
    }

    pub fn brand_total(&self, brand: Brand) -> u64 {
        Dose::ALL
            .iter()
            .map(|&dose| self.doses.get(&(brand, dose)).copied().unwrap_or(0))
            .sum()
    }
}

fn prefix_sum(values: impl Iterator<Item = u64>) -> Vec<u64> {
    values
        .scan(0u64, |acc, v| {
            *acc = acc.saturating_add(v);
            Some(*acc)
        })
        .collect()
}

/// Date-indexed national vaccination coverage with derived cumulative totals.
#[derive(Debug, Clone)]
pub struct CoverageSeries {
    days: Vec<DailyDoses>,
    index: BTreeMap<NaiveDate, usize>,
    cumulative: BTreeMap<(Brand, Dose), Vec<u64>>,
    cumulative_partial: Vec<u64>,
    cumulative_booster: Vec<u64>,
}

impl CoverageSeries {
    /// Sort daily rows by date and derive the cumulative columns.
    ///
    /// Fails on two rows for the same date.
    pub fn from_daily(mut days: Vec<DailyDoses>) -> Result<Self, CoreError> {
        days.sort_by_key(|d| d.date);
        if let Some(pair) = days.windows(2).find(|w| w[0].date == w[1].date) {
            return Err(CoreError::DuplicateDate(pair[0].date));
        }

        let keys: BTreeSet<(Brand, Dose)> =
            days.iter().flat_map(|d| d.doses.keys().copied()).collect();
        let cumulative = keys
            .into_iter()
            .map(|key| {
                let column =
                    prefix_sum(days.iter().map(|d| d.doses.get(&key).copied().unwrap_or(0)));
                (key, column)
            })
            .collect();

        let cumulative_partial = prefix_sum(days.iter().map(|d| d.partial));
        let cumulative_booster = prefix_sum(days.iter().map(|d| d.booster));
        let index = days.iter().enumerate().map(|(i, d)| (d.date, i)).collect();

        Ok(Self {
            days,
            index,
            cumulative,
            cumulative_partial,
            cumulative_booster,
        })
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// First and last covered dates.
    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.days.first()?.date, self.days.last()?.date))
    }

    pub fn days(&self) -> impl Iterator<Item = &DailyDoses> {
        self.days.iter()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DailyDoses> {
        self.index.get(&date).map(|&i| &self.days[i])
    }

    /// Cumulative doses of `brand`/`dose` up to and including `date`.
    ///
    /// `None` when `date` is not covered; zero when the brand never
    /// appears in the table.
    pub fn cumulative(&self, brand: Brand, dose: Dose, date: NaiveDate) -> Option<u64> {
        let i = *self.index.get(&date)?;
        Some(
            self.cumulative
                .get(&(brand, dose))
                .map(|col| col[i])
                .unwrap_or(0),
        )
    }

    /// People with at least one dose, up to and including `date`.
    pub fn cumulative_partial(&self, date: NaiveDate) -> Option<u64> {
        self.index.get(&date).map(|&i| self.cumulative_partial[i])
    }

    pub fn cumulative_booster(&self, date: NaiveDate) -> Option<u64> {
        self.index.get(&date).map(|&i| self.cumulative_booster[i])
    }

    /// Full cumulative column for `brand`/`dose`, in date order.
    pub fn cumulative_column(&self, brand: Brand, dose: Dose) -> Option<&[u64]> {
        self.cumulative.get(&(brand, dose)).map(Vec::as_slice)
    }
}

/// Cumulative counts per booster combination (`ppp`, `ssp`, ...), plus the
/// derived two-dose-only combinations (`pp`, `aa`, `ss`).
#[derive(Debug, Clone)]
pub struct BoosterCoverage {
    dates: Vec<NaiveDate>,
    index: BTreeMap<NaiveDate, usize>,
    cumulative: BTreeMap<Combo, Vec<Option<u64>>>,
}

impl BoosterCoverage {
    /// Build from `(date, combo, daily count)` rows.
    ///
    /// Several rows for the same date and combination (one per state) are
    /// summed. Two-dose combinations are the brand's cumulative second doses
    /// from `primary` minus every booster combination extending that pair;
    /// they are unknown on dates `primary` does not cover.
    pub fn from_daily(
        rows: impl IntoIterator<Item = (NaiveDate, Combo, u64)>,
        primary: &CoverageSeries,
    ) -> Self {
        let mut per_day: BTreeMap<NaiveDate, BTreeMap<Combo, u64>> = BTreeMap::new();
        for (date, combo, count) in rows {
            *per_day.entry(date).or_default().entry(combo).or_default() += count;
        }

        let dates: Vec<NaiveDate> = per_day.keys().copied().collect();
        let combos: BTreeSet<Combo> = per_day.values().flat_map(|m| m.keys().cloned()).collect();

        let mut cumulative: BTreeMap<Combo, Vec<Option<u64>>> = combos
            .iter()
            .map(|combo| {
                let daily = per_day
                    .values()
                    .map(|m| m.get(combo).copied().unwrap_or(0));
                (combo.clone(), prefix_sum(daily).into_iter().map(Some).collect())
            })
            .collect();

        for brand in Brand::TRACKED {
            let Some(pair) = Combo::from_doses(&[brand, brand]) else {
                continue;
            };
            if cumulative.contains_key(&pair) {
                continue;
            }
            let boosted: Vec<&Combo> = combos.iter().filter(|c| c.extends(&pair)).collect();
            let column = dates
                .iter()
                .enumerate()
                .map(|(i, &date)| {
                    let second = primary.cumulative(brand, Dose::Second, date)?;
                    let boosted_total: u64 = boosted
                        .iter()
                        .filter_map(|c| cumulative.get(*c).and_then(|col| col[i]))
                        .sum();
                    Some(second.saturating_sub(boosted_total))
                })
                .collect();
            cumulative.insert(pair, column);
        }

        let index = dates.iter().enumerate().map(|(i, &d)| (d, i)).collect();
        Self {
            dates,
            index,
            cumulative,
        }
    }

    pub fn span(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((*self.dates.first()?, *self.dates.last()?))
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn combos(&self) -> impl Iterator<Item = &Combo> {
        self.cumulative.keys()
    }

    pub fn cumulative(&self, combo: &Combo, date: NaiveDate) -> Option<u64> {
        let i = *self.index.get(&date)?;
        self.cumulative.get(combo)?[i]
    }
}

/// Region name → total population.
#[derive(Debug, Clone, Default)]
pub struct PopulationTable {
    regions: BTreeMap<String, u64>,
}

impl PopulationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, region: impl Into<String>, population: u64) {
        self.regions.insert(region.into(), population);
    }

    pub fn get(&self, region: &str) -> Option<u64> {
        self.regions.get(region).copied()
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    pub fn regions(&self) -> impl Iterator<Item = (&str, u64)> {
        self.regions.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<S: Into<String>> FromIterator<(S, u64)> for PopulationTable {
    fn from_iter<T: IntoIterator<Item = (S, u64)>>(iter: T) -> Self {
        Self {
            regions: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
