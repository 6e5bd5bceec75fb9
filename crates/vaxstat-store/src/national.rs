//! National daily cases, deaths and hospital load.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;
use vaxstat_core::{NationalDay, input};

use crate::StoreError;
use crate::csv::{Columns, read_csv, utf8};

fn day(days: &mut BTreeMap<NaiveDate, NationalDay>, date: NaiveDate) -> &mut NationalDay {
    days.entry(date).or_insert_with(|| NationalDay::new(date))
}

fn add(slot: &mut Option<f64>, value: Option<i64>) {
    if let Some(v) = value {
        *slot = Some(slot.unwrap_or(0.0) + v as f64);
    }
}

/// Outer-join the national case, death and hospital files by date.
///
/// Hospital rows are per state and summed per day.
pub fn load_national(
    cases_path: &Path,
    deaths_path: &Path,
    hospital_path: &Path,
) -> Result<Vec<NationalDay>, StoreError> {
    let mut days: BTreeMap<NaiveDate, NationalDay> = BTreeMap::new();

    for batch in read_csv(cases_path, &input::national_cases_schema(), utf8)? {
        let cols = Columns::new(&batch, cases_path);
        let dates = cols.required_dates("date")?;
        for (date, cases) in dates.into_iter().zip(cols.ints("cases_new")?) {
            add(&mut day(&mut days, date).cases, cases);
        }
    }

    for batch in read_csv(deaths_path, &input::national_deaths_schema(), utf8)? {
        let cols = Columns::new(&batch, deaths_path);
        let dates = cols.required_dates("date")?;
        for (date, deaths) in dates.into_iter().zip(cols.ints("deaths_new_dod")?) {
            add(&mut day(&mut days, date).deaths, deaths);
        }
    }

    for batch in read_csv(hospital_path, &input::hospital_schema(), utf8)? {
        let cols = Columns::new(&batch, hospital_path);
        let dates = cols.required_dates("date")?;
        let admitted = cols.ints("admitted_covid")?;
        let hospitalised = cols.ints("hosp_covid")?;
        for (row, date) in dates.into_iter().enumerate() {
            let entry = day(&mut days, date);
            add(&mut entry.admissions, admitted[row]);
            add(&mut entry.hospitalised, hospitalised[row]);
        }
    }

    let series: Vec<NationalDay> = days.into_values().collect();
    info!(days = series.len(), "loaded national time series");
    Ok(series)
}
