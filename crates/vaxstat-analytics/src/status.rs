//! Daily event counts by vaccination status, and period shares.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use vaxstat_core::calendar::{date_range, days_before};
use vaxstat_core::{Brand, Bucket, LinelistRecord};

use crate::index::DateIndex;
use crate::series::{Cell, Series};
use crate::{AnalyticsError, Denominators};

pub const PARTIAL_OTHERS: &str = "Partial/Others";
pub const TOTAL: &str = "Total";

/// Status bucket of one record, or `None` when it is neither unvaccinated
/// nor fully vaccinated with a tracked brand (partial, other brands, inside
/// the lag).
pub fn classify(record: &LinelistRecord, lag: u32) -> Option<Bucket> {
    if record.is_unvaccinated() {
        return Some(Bucket::Unvaccinated);
    }
    record
        .fully_vaccinated_with(lag)
        .filter(|b| b.is_tracked())
        .map(Bucket::Full)
}

/// Event counts per standard bucket over some set of records.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusCounts {
    pub per_bucket: BTreeMap<Bucket, u64>,
    /// Every record tallied, classified or not.
    pub total: u64,
}

impl StatusCounts {
    pub fn tally<'r>(records: impl IntoIterator<Item = &'r LinelistRecord>, lag: u32) -> Self {
        let mut counts = Self::default();
        for record in records {
            counts.total += 1;
            if let Some(bucket) = classify(record, lag) {
                *counts.per_bucket.entry(bucket).or_default() += 1;
            }
        }
        counts
    }

    pub fn get(&self, bucket: &Bucket) -> u64 {
        self.per_bucket.get(bucket).copied().unwrap_or(0)
    }

    pub fn classified(&self) -> u64 {
        self.per_bucket.values().sum()
    }

    /// Records in no bucket.
    pub fn unclassified(&self) -> u64 {
        self.total - self.classified()
    }

    pub fn add(&mut self, other: &StatusCounts) {
        self.total += other.total;
        for (bucket, n) in &other.per_bucket {
            *self.per_bucket.entry(bucket.clone()).or_default() += n;
        }
    }
}

fn status_columns() -> Vec<String> {
    let mut columns = vec![Bucket::Unvaccinated.label(), PARTIAL_OTHERS.to_string()];
    columns.extend(Brand::TRACKED.iter().map(|b| b.label().to_string()));
    columns.push(TOTAL.to_string());
    columns
}

fn status_cells(counts: &StatusCounts) -> Vec<Cell> {
    let mut cells = vec![
        Cell::Value(counts.get(&Bucket::Unvaccinated) as f64),
        Cell::Value(counts.unclassified() as f64),
    ];
    cells.extend(
        Brand::TRACKED
            .iter()
            .map(|&b| Cell::Value(counts.get(&Bucket::Full(b)) as f64)),
    );
    cells.push(Cell::Value(counts.total as f64));
    cells
}

/// Daily counts per status over `start..=end`: Unvaccinated, Partial/Others,
/// one column per tracked brand, and Total.
pub fn daily_status_table(
    index: &DateIndex<'_>,
    start: NaiveDate,
    end: NaiveDate,
    lag: u32,
) -> Result<Series<String>, AnalyticsError> {
    if start > end {
        return Err(AnalyticsError::InvalidConfiguration(format!(
            "start {start} is after end {end}"
        )));
    }
    let mut table = Series::new(status_columns());
    for date in date_range(start, end) {
        let counts = StatusCounts::tally(index.on(date).iter().copied(), lag);
        table.push_row(date, status_cells(&counts))?;
    }
    Ok(table)
}

/// One status group's share of the population and of events.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusShare {
    pub label: String,
    /// Percent of the population in this status at the period end.
    pub population_pct: Option<f64>,
    /// Percent of all events in the period.
    pub event_pct: Option<f64>,
    pub events: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusSummary {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub total_events: u64,
    pub shares: Vec<StatusShare>,
}

/// Population share versus event share per status over the `past_n_days`
/// ending at `end`.
pub fn status_summary(
    index: &DateIndex<'_>,
    denominators: &Denominators<'_>,
    end: NaiveDate,
    past_n_days: u32,
    lag: u32,
) -> Result<StatusSummary, AnalyticsError> {
    if past_n_days == 0 {
        return Err(AnalyticsError::InvalidConfiguration(
            "summary period must cover at least one day".into(),
        ));
    }
    let start = days_before(end, past_n_days - 1).ok_or_else(|| {
        AnalyticsError::InvalidConfiguration(format!("{past_n_days} days before {end}"))
    })?;
    let counts = StatusCounts::tally(index.between(start, end), lag);

    let population = denominators.population() as f64;
    let pct = |part: f64, whole: f64| (whole > 0.0).then(|| part / whole * 100.0);
    let event_pct = |n: u64| pct(n as f64, counts.total as f64);

    let mut shares = vec![
        StatusShare {
            label: Bucket::Unvaccinated.label(),
            population_pct: denominators
                .unvaccinated(end)
                .and_then(|n| pct(n, population)),
            event_pct: event_pct(counts.get(&Bucket::Unvaccinated)),
            events: counts.get(&Bucket::Unvaccinated),
        },
        StatusShare {
            label: PARTIAL_OTHERS.to_string(),
            population_pct: None,
            event_pct: event_pct(counts.unclassified()),
            events: counts.unclassified(),
        },
    ];
    for brand in Brand::TRACKED {
        let bucket = Bucket::Full(brand);
        shares.push(StatusShare {
            label: bucket.label(),
            population_pct: denominators
                .fully_vaccinated(brand, end, lag)
                .and_then(|n| pct(n, population)),
            event_pct: event_pct(counts.get(&bucket)),
            events: counts.get(&bucket),
        });
    }

    Ok(StatusSummary {
        start,
        end,
        total_events: counts.total,
        shares,
    })
}
