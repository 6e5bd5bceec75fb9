//! Weekly doses administered by brand.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use vaxstat_core::calendar::{is_week_end, week_ending};
use vaxstat_core::{Brand, CoverageSeries};

use crate::AnalyticsError;
use crate::series::{Cell, Series};

pub const OTHERS: &str = "Others";

/// Weekly (Monday to Sunday) dose totals per tracked brand plus `Others`,
/// the remainder of the daily total. A trailing partial week is dropped.
///
/// With `percentage` each week is expressed as shares of its own total.
pub fn weekly_doses(
    coverage: &CoverageSeries,
    percentage: bool,
) -> Result<Series<String>, AnalyticsError> {
    let mut weeks: BTreeMap<NaiveDate, [f64; 4]> = BTreeMap::new();
    let mut last = None;
    for day in coverage.days() {
        let week = weeks.entry(week_ending(day.date)).or_insert([0.0; 4]);
        let mut tracked = 0;
        for (slot, brand) in week.iter_mut().zip(Brand::TRACKED) {
            let n = day.brand_total(brand);
            *slot += n as f64;
            tracked += n;
        }
        week[3] += day.total as f64 - tracked as f64;
        last = Some(day.date);
    }
    if let Some(date) = last.filter(|d| !is_week_end(*d)) {
        weeks.remove(&week_ending(date));
    }

    let mut columns: Vec<String> = Brand::TRACKED.iter().map(|b| b.label().to_string()).collect();
    columns.push(OTHERS.to_string());

    let mut series = Series::new(columns);
    for (week, totals) in weeks {
        let sum: f64 = totals.iter().sum();
        let cells = totals
            .iter()
            .map(|&n| match (percentage, sum != 0.0) {
                (false, _) => Cell::Value(n),
                (true, true) => Cell::Value(n / sum),
                (true, false) => Cell::Gap,
            })
            .collect();
        series.push_row(week, cells)?;
    }
    Ok(series)
}
