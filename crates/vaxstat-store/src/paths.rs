use std::path::{Path, PathBuf};

/// Locations of every source file, resolved against a data root.
///
/// Defaults follow the layout of the MoH `covid19-public` repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub root: PathBuf,
    /// Directory holding `linelist_cases*.csv`.
    pub linelist_dir: PathBuf,
    pub deaths: PathBuf,
    pub vaccination: PathBuf,
    pub booster_combos: PathBuf,
    pub population: PathBuf,
    pub national_cases: PathBuf,
    pub national_deaths: PathBuf,
    pub hospital: PathBuf,
}

impl DataPaths {
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref().to_path_buf();
        let linelist_dir = root.join("epidemic").join("linelist");
        Self {
            deaths: linelist_dir.join("linelist_deaths.csv"),
            vaccination: root.join("vaccination").join("vax_malaysia.csv"),
            booster_combos: root.join("vaccination").join("vax_booster_combos.csv"),
            population: root.join("static").join("population.csv"),
            national_cases: root.join("epidemic").join("cases_malaysia.csv"),
            national_deaths: root.join("epidemic").join("deaths_malaysia.csv"),
            hospital: root.join("epidemic").join("hospital.csv"),
            linelist_dir,
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_layout() {
        let paths = DataPaths::new("/data");
        assert_eq!(paths.linelist_dir, PathBuf::from("/data/epidemic/linelist"));
        assert_eq!(
            paths.deaths,
            PathBuf::from("/data/epidemic/linelist/linelist_deaths.csv")
        );
        assert_eq!(paths.population, PathBuf::from("/data/static/population.csv"));
    }
}
