//! Shared fixtures for the pipeline tests.

use chrono::NaiveDate;
use vaxstat_core::calendar::date_range;
use vaxstat_core::{Brand, CoverageSeries, DailyDoses, Dose, LinelistRecord};

pub(crate) const POPULATION: u64 = 1_000_000;

pub(crate) fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

/// 2021-07-01..=2021-09-30. Each day: 1000 second doses of Pfizer and of
/// Sinovac, 100 of AstraZeneca, 3000 first doses.
pub(crate) fn coverage() -> CoverageSeries {
    let days = date_range(d("2021-07-01"), d("2021-09-30"))
        .map(|date| {
            DailyDoses::new(date)
                .with_doses(Brand::Pfizer, Dose::Second, 1000)
                .with_doses(Brand::Sinovac, Dose::Second, 1000)
                .with_doses(Brand::AstraZeneca, Dose::Second, 100)
                .with_partial(3000)
                .with_total(5100)
        })
        .collect();
    CoverageSeries::from_daily(days).unwrap()
}

/// Cumulative value of a 2021-07-01-based daily constant on `date`.
pub(crate) fn cumulative(per_day: u64, date: NaiveDate) -> f64 {
    let days = (date - d("2021-07-01")).num_days() + 1;
    (per_day as i64 * days) as f64
}

/// 2021-07-20..=2021-09-20. Each day: 3 unvaccinated, 2 Pfizer past the
/// lag, 1 Sinovac past the lag, 1 Pfizer inside the lag.
pub(crate) fn records() -> Vec<LinelistRecord> {
    date_range(d("2021-07-20"), d("2021-09-20"))
        .flat_map(|date| {
            [
                LinelistRecord::new(date).with_age(30),
                LinelistRecord::new(date).with_age(42),
                LinelistRecord::new(date).with_age(55),
                LinelistRecord::new(date)
                    .with_age(61)
                    .with_primary(Brand::Pfizer, Brand::Pfizer, 30),
                LinelistRecord::new(date)
                    .with_age(70)
                    .with_primary(Brand::Pfizer, Brand::Pfizer, 40),
                LinelistRecord::new(date)
                    .with_age(80)
                    .with_primary(Brand::Sinovac, Brand::Sinovac, 30),
                LinelistRecord::new(date)
                    .with_age(25)
                    .with_primary(Brand::Pfizer, Brand::Pfizer, 10),
            ]
        })
        .collect()
}
