//! Dataset loader: source CSVs → Arrow RecordBatches → typed vaxstat tables.

mod csv;
mod dataset;
mod error;
mod linelist;
mod national;
mod paths;
mod population;
mod vaccination;

pub use csv::read_csv;
pub use dataset::{Dataset, DatasetLoader, load_policy};
pub use error::StoreError;
pub use linelist::{load_cases, load_deaths};
pub use national::load_national;
pub use paths::DataPaths;
pub use population::load_population;
pub use vaccination::{load_booster_coverage, load_vaccination};
