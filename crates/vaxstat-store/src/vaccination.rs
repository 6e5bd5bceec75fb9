//! National vaccination table and booster combination table.

use std::path::Path;

use arrow::datatypes::DataType;
use tracing::{info, warn};
use vaxstat_core::{BoosterCoverage, Brand, Combo, CoverageSeries, DailyDoses, Dose, input};

use crate::StoreError;
use crate::csv::{Columns, read_csv, utf8};

/// Load `vax_malaysia.csv` and derive cumulative totals by prefix sum.
///
/// Brand/dose columns missing from the file count as zero doses.
pub fn load_vaccination(path: &Path) -> Result<CoverageSeries, StoreError> {
    let schema = input::vaccination_schema();
    let mut days = Vec::new();

    for batch in read_csv(path, &schema, utf8)? {
        let cols = Columns::new(&batch, path);
        let dates = cols.required_dates("date")?;
        let total = cols.ints_or_zero("daily")?;
        let partial = cols.ints_or_zero("daily_partial")?;
        let booster = cols.ints_or_zero("daily_booster")?;

        let mut per_dose = Vec::new();
        for brand in Brand::TRACKED {
            for dose in Dose::ALL {
                if let Some(name) = input::dose_column(brand, dose) {
                    per_dose.push((brand, dose, cols.ints_or_zero(&name)?));
                }
            }
        }

        for (row, &date) in dates.iter().enumerate() {
            let mut day = DailyDoses::new(date)
                .with_total(total[row])
                .with_partial(partial[row])
                .with_booster(booster[row]);
            for (brand, dose, counts) in &per_dose {
                day = day.with_doses(*brand, *dose, counts[row]);
            }
            days.push(day);
        }
    }

    let series = CoverageSeries::from_daily(days)?;
    info!(days = series.len(), path = %path.display(), "loaded vaccination coverage");
    Ok(series)
}

/// Load `vax_booster_combos.csv`.
///
/// Every column other than `date` and `state` is a combination code; columns
/// whose name is not a valid code are skipped.
pub fn load_booster_coverage(
    path: &Path,
    primary: &CoverageSeries,
) -> Result<BoosterCoverage, StoreError> {
    let schema = input::booster_combos_schema();
    let batches = read_csv(path, &schema, |_| DataType::Int64)?;

    let mut rows = Vec::new();
    for batch in &batches {
        let cols = Columns::new(batch, path);
        let dates = cols.required_dates("date")?;

        for field in batch.schema().fields() {
            let name = field.name();
            if name == "date" || name == "state" {
                continue;
            }
            let Ok(combo) = Combo::parse(name) else {
                warn!(column = %name, "skipping non-combination column");
                continue;
            };
            let counts = cols.ints_or_zero(name)?;
            rows.extend(
                dates
                    .iter()
                    .zip(counts)
                    .map(|(&date, count)| (date, combo.clone(), count)),
            );
        }
    }

    let coverage = BoosterCoverage::from_daily(rows, primary);
    info!(
        combos = coverage.combos().count(),
        days = coverage.dates().len(),
        "loaded booster combinations"
    );
    Ok(coverage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;

    fn write(path: &Path, body: &str) {
        let mut file = std::fs::File::create(path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn vaccination_csv(dir: &Path) -> std::path::PathBuf {
        let path = dir.join("vax_malaysia.csv");
        write(
            &path,
            "date,daily_partial,daily_full,daily_booster,daily,pfizer1,pfizer2,pfizer3,sinovac1,sinovac2,sinovac3,astra1,astra2,astra3,cansino\n\
             2021-07-01,100,50,0,150,60,30,0,40,20,0,0,0,0,0\n\
             2021-07-02,80,70,5,155,50,40,5,30,30,0,0,0,0,0\n",
        );
        path
    }

    #[test]
    fn vaccination_cumulative_columns() {
        let tmp = tempfile::TempDir::new().unwrap();
        let cov = load_vaccination(&vaccination_csv(tmp.path())).unwrap();
        assert_eq!(cov.len(), 2);
        assert_eq!(cov.cumulative(Brand::Pfizer, Dose::Second, d("2021-07-02")), Some(70));
        assert_eq!(cov.cumulative(Brand::Sinovac, Dose::Second, d("2021-07-02")), Some(50));
        assert_eq!(cov.cumulative_partial(d("2021-07-02")), Some(180));
        assert_eq!(cov.cumulative_booster(d("2021-07-02")), Some(5));
        assert_eq!(cov.day(d("2021-07-01")).unwrap().total, 150);
    }

    #[test]
    fn booster_combos_summed_over_states() {
        let tmp = tempfile::TempDir::new().unwrap();
        let primary = load_vaccination(&vaccination_csv(tmp.path())).unwrap();
        let path = tmp.path().join("vax_booster_combos.csv");
        write(
            &path,
            "date,state,ppp,pps,ssp,sss,notes\n\
             2021-07-01,Johor,1,0,0,0,\n\
             2021-07-01,Kedah,2,0,0,0,\n\
             2021-07-02,Johor,2,1,0,0,\n",
        );
        let boosters = load_booster_coverage(&path, &primary).unwrap();
        let ppp = Combo::parse("ppp").unwrap();
        let pp = Combo::parse("pp").unwrap();
        assert_eq!(boosters.cumulative(&ppp, d("2021-07-01")), Some(3));
        assert_eq!(boosters.cumulative(&ppp, d("2021-07-02")), Some(5));
        // 70 Pfizer second doses minus ppp 5 and pps 1.
        assert_eq!(boosters.cumulative(&pp, d("2021-07-02")), Some(64));
    }
}
