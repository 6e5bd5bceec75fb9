//! Everything one run needs, loaded up front.

use std::path::Path;

use chrono::NaiveDate;
use tracing::info;
use vaxstat_core::{
    BoosterCoverage, CoverageSeries, LinelistRecord, Metric, NationalDay, Policy,
    PopulationTable,
};

use crate::{
    DataPaths, StoreError, load_booster_coverage, load_cases, load_deaths, load_national,
    load_population, load_vaccination,
};

/// Loaded, immutable source tables. Analytics borrow from this.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub cases: Vec<LinelistRecord>,
    pub deaths: Vec<LinelistRecord>,
    pub vaccination: CoverageSeries,
    pub boosters: BoosterCoverage,
    pub population: PopulationTable,
}

impl Dataset {
    /// Latest event date across both linelists.
    pub fn last_updated(&self) -> Option<NaiveDate> {
        self.cases
            .iter()
            .chain(&self.deaths)
            .map(|r| r.date)
            .max()
    }

    pub fn linelist(&self, metric: Metric) -> &[LinelistRecord] {
        match metric {
            Metric::Cases => &self.cases,
            Metric::Deaths => &self.deaths,
        }
    }
}

/// Loads a [`Dataset`] from the files named by a [`DataPaths`].
pub struct DatasetLoader {
    paths: DataPaths,
}

impl DatasetLoader {
    pub fn new(paths: DataPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &DataPaths {
        &self.paths
    }

    /// Load the linelists, vaccination tables and population.
    ///
    /// Any missing or malformed file aborts the load.
    pub fn load(&self) -> Result<Dataset, StoreError> {
        let paths = &self.paths;
        info!(root = %paths.root.display(), "loading dataset");

        let cases = load_cases(&paths.linelist_dir)?;
        let deaths = load_deaths(&paths.deaths)?;
        let vaccination = load_vaccination(&paths.vaccination)?;
        let boosters = load_booster_coverage(&paths.booster_combos, &vaccination)?;
        let population = load_population(&paths.population)?;

        let dataset = Dataset {
            cases,
            deaths,
            vaccination,
            boosters,
            population,
        };
        info!(
            cases = dataset.cases.len(),
            deaths = dataset.deaths.len(),
            last_updated = ?dataset.last_updated(),
            "dataset ready"
        );
        Ok(dataset)
    }

    /// Load the national case, death and hospital series.
    pub fn load_national(&self) -> Result<Vec<NationalDay>, StoreError> {
        load_national(
            &self.paths.national_cases,
            &self.paths.national_deaths,
            &self.paths.hospital,
        )
    }
}

/// Read a JSON policy override. Fields absent from the file keep their defaults.
pub fn load_policy(path: &Path) -> Result<Policy, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound(path.to_path_buf()));
    }
    let json = std::fs::read_to_string(path)?;
    let policy = Policy::from_json(&json)?;
    info!(path = %path.display(), "loaded policy override");
    Ok(policy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use vaxstat_core::{Brand, Dose};

    fn write(path: &Path, body: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, body).unwrap();
    }

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn seed(root: &Path) -> DataPaths {
        let paths = DataPaths::new(root);
        write(
            &paths.linelist_dir.join("linelist_cases_1.csv"),
            "date,days_dose1,days_dose2,days_dose3,brand1,brand2,brand3,age\n\
             2021-08-01,,,,,,,30\n\
             2021-08-02,40.0,20.0,,p,p,,45\n",
        );
        write(
            &paths.deaths,
            "date,date_positive,date_dose1,date_dose2,date_dose3,brand1,brand2,brand3,age\n\
             2021-08-03,2021-07-25,,,,,,,70\n",
        );
        write(
            &paths.vaccination,
            "date,daily_partial,daily_booster,daily,pfizer1,pfizer2\n\
             2021-08-01,10,0,15,10,5\n\
             2021-08-02,10,0,15,10,5\n",
        );
        write(
            &paths.booster_combos,
            "date,state,ppp\n2021-08-02,Johor,1\n",
        );
        write(&paths.population, "state,pop\nMalaysia,1000\n");
        paths
    }

    #[test]
    fn load_full_dataset() {
        let tmp = tempfile::TempDir::new().unwrap();
        let loader = DatasetLoader::new(seed(tmp.path()));
        let dataset = loader.load().unwrap();

        assert_eq!(dataset.cases.len(), 2);
        assert_eq!(dataset.linelist(Metric::Deaths).len(), 1);
        assert_eq!(dataset.last_updated(), Some(d("2021-08-03")));
        assert_eq!(
            dataset
                .vaccination
                .cumulative(Brand::Pfizer, Dose::Second, d("2021-08-02")),
            Some(10)
        );
        assert_eq!(dataset.population.get("Malaysia"), Some(1000));
    }

    #[test]
    fn missing_file_aborts_load() {
        let tmp = tempfile::TempDir::new().unwrap();
        let paths = seed(tmp.path());
        fs::remove_file(&paths.population).unwrap();
        let result = DatasetLoader::new(paths).load();
        assert!(matches!(result, Err(StoreError::FileNotFound(_))));
    }

    #[test]
    fn policy_override_from_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("policy.json");
        fs::write(&path, r#"{ "booster_event_lag": 7 }"#).unwrap();
        let policy = load_policy(&path).unwrap();
        assert_eq!(policy.booster_event_lag, 7);
        assert_eq!(policy.full_vax_lag(Metric::Cases), 14);

        fs::write(&path, r#"{ "booster_event_lag": "soon" }"#).unwrap();
        assert!(matches!(load_policy(&path), Err(StoreError::Core(_))));
    }
}
