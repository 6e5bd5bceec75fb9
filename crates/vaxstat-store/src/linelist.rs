//! Case and death linelists: one row per individual.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::info;
use vaxstat_core::{Brand, LinelistRecord, input};

use crate::StoreError;
use crate::csv::{Columns, read_csv, utf8};

const CASES_PREFIX: &str = "linelist_cases";

/// Case linelist files in `dir`, in name order.
fn case_files(dir: &Path) -> Result<Vec<PathBuf>, StoreError> {
    if !dir.is_dir() {
        return Err(StoreError::FileNotFound(dir.to_path_buf()));
    }
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(CASES_PREFIX) && n.ends_with(".csv"))
        })
        .collect();
    if files.is_empty() {
        return Err(StoreError::NoLinelistFiles(dir.to_path_buf()));
    }
    files.sort();
    Ok(files)
}

/// Load every `linelist_cases*.csv` in `dir`.
///
/// Case files publish brands as single-letter codes and the dose offsets
/// as (integral) floats.
pub fn load_cases(dir: &Path) -> Result<Vec<LinelistRecord>, StoreError> {
    let schema = input::linelist_cases_schema();
    let mut records = Vec::new();
    for path in case_files(dir)? {
        for batch in read_csv(&path, &schema, utf8)? {
            let cols = Columns::new(&batch, &path);
            records.extend(cases_from_columns(&cols)?);
        }
    }
    info!(count = records.len(), dir = %dir.display(), "loaded case linelist");
    Ok(records)
}

fn cases_from_columns(cols: &Columns<'_>) -> Result<Vec<LinelistRecord>, StoreError> {
    let dates = cols.required_dates("date")?;
    let ages = cols.ints("age")?;
    let brands = brand_columns(cols)?;
    let days_dose2 = cols.floats("days_dose2")?;
    let days_dose3 = cols.floats("days_dose3")?;

    Ok((0..cols.num_rows())
        .map(|row| LinelistRecord {
            date: dates[row],
            age: to_age(ages[row]),
            brand1: brands[0][row],
            brand2: brands[1][row],
            brand3: brands[2][row],
            days_dose2: days_dose2[row].map(|d| d.floor() as i64),
            days_dose3: days_dose3[row].map(|d| d.floor() as i64),
            days_dose2_to_positive: None,
            days_dose3_to_positive: None,
        })
        .collect())
}

/// Load `linelist_deaths.csv`, deriving day offsets from the dose dates.
pub fn load_deaths(path: &Path) -> Result<Vec<LinelistRecord>, StoreError> {
    let schema = input::linelist_deaths_schema();
    let mut records = Vec::new();
    for batch in read_csv(path, &schema, utf8)? {
        let cols = Columns::new(&batch, path);
        records.extend(deaths_from_columns(&cols)?);
    }
    info!(count = records.len(), path = %path.display(), "loaded death linelist");
    Ok(records)
}

fn deaths_from_columns(cols: &Columns<'_>) -> Result<Vec<LinelistRecord>, StoreError> {
    let dates = cols.required_dates("date")?;
    let dose2 = cols.dates("date_dose2")?;
    // Only the booster analysis needs these; older extracts lack them.
    let positive = cols.dates_or_null("date_positive")?;
    let dose3 = cols.dates_or_null("date_dose3")?;
    let ages = cols.ints("age")?;
    let brands = brand_columns(cols)?;

    Ok((0..cols.num_rows())
        .map(|row| LinelistRecord {
            date: dates[row],
            age: to_age(ages[row]),
            brand1: brands[0][row],
            brand2: brands[1][row],
            brand3: brands[2][row],
            days_dose2: days_between(Some(dates[row]), dose2[row]),
            days_dose3: days_between(Some(dates[row]), dose3[row]),
            days_dose2_to_positive: days_between(positive[row], dose2[row]),
            days_dose3_to_positive: days_between(positive[row], dose3[row]),
        })
        .collect())
}

fn brand_columns(cols: &Columns<'_>) -> Result<[Vec<Option<Brand>>; 3], StoreError> {
    let parse = |name: &str| -> Result<Vec<Option<Brand>>, StoreError> {
        Ok(cols
            .strings(name)?
            .into_iter()
            .map(|v| v.and_then(Brand::parse))
            .collect())
    };
    Ok([parse("brand1")?, parse("brand2")?, parse("brand3")?])
}

fn to_age(age: Option<i64>) -> Option<u32> {
    age.and_then(|a| u32::try_from(a).ok())
}

fn days_between(later: Option<NaiveDate>, earlier: Option<NaiveDate>) -> Option<i64> {
    Some((later? - earlier?).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write(path: &Path, body: &str) {
        let mut file = fs::File::create(path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn cases_from_multiple_files() {
        let tmp = tempfile::TempDir::new().unwrap();
        write(
            &tmp.path().join("linelist_cases_1.csv"),
            "date,days_dose1,days_dose2,days_dose3,vaxtype,brand1,brand2,brand3,state,age\n\
             2021-09-01,,,,,,,,Johor,34\n\
             2021-09-01,60.0,30.0,,p,p,p,,Johor,51\n",
        );
        write(
            &tmp.path().join("linelist_cases_2.csv"),
            "date,days_dose1,days_dose2,days_dose3,vaxtype,brand1,brand2,brand3,state,age\n\
             2021-12-02,250.0,220.0,20.0,s,s,s,p,Sabah,70\n",
        );
        write(&tmp.path().join("other.csv"), "x\n1\n");

        let cases = load_cases(tmp.path()).unwrap();
        assert_eq!(cases.len(), 3);
        assert!(cases[0].is_unvaccinated());
        assert_eq!(cases[0].age, Some(34));
        assert_eq!(cases[1].brand2, Some(Brand::Pfizer));
        assert_eq!(cases[1].days_dose2, Some(30));
        assert_eq!(cases[2].combo(3).unwrap().code(), "ssp");
        assert_eq!(cases[2].days_dose3, Some(20));
        assert_eq!(cases[2].date, d("2021-12-02"));
    }

    #[test]
    fn no_case_files_is_an_error() {
        let tmp = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_cases(tmp.path()),
            Err(StoreError::NoLinelistFiles(_))
        ));
    }

    #[test]
    fn deaths_derive_offsets_from_dates() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("linelist_deaths.csv");
        write(
            &path,
            "date,date_positive,date_dose1,date_dose2,date_dose3,brand1,brand2,brand3,age,state\n\
             2021-09-20,2021-09-10,2021-06-01,2021-06-22,,Sinovac,Sinovac,,80,Kedah\n\
             2021-09-20,2021-09-15,,,,,,,62,Kedah\n",
        );
        let deaths = load_deaths(&path).unwrap();
        assert_eq!(deaths.len(), 2);
        assert_eq!(deaths[0].brand2, Some(Brand::Sinovac));
        assert_eq!(deaths[0].days_dose2, Some(90));
        assert_eq!(deaths[0].days_dose2_to_positive, Some(80));
        assert_eq!(deaths[0].days_dose3, None);
        assert!(deaths[1].is_unvaccinated());
    }

    #[test]
    fn deaths_without_booster_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("linelist_deaths.csv");
        write(
            &path,
            "date,date_dose1,date_dose2,brand1,brand2,brand3,age\n\
             2021-09-20,2021-06-01,2021-06-22,Pfizer,Pfizer,,71\n",
        );
        let deaths = load_deaths(&path).unwrap();
        assert_eq!(deaths.len(), 1);
        assert_eq!(deaths[0].days_dose2, Some(90));
        assert_eq!(deaths[0].days_dose3, None);
        assert_eq!(deaths[0].days_dose2_to_positive, None);
        assert_eq!(deaths[0].days_dose3_to_positive, None);
    }

    #[test]
    fn null_event_date_aborts() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("linelist_deaths.csv");
        write(
            &path,
            "date,date_positive,date_dose1,date_dose2,date_dose3,brand1,brand2,brand3,age\n\
             ,2021-09-15,,,,,,,62\n",
        );
        assert!(matches!(
            load_deaths(&path),
            Err(StoreError::NullValue { .. })
        ));
    }
}
