pub mod brand;
pub mod bucket;
pub mod calendar;
pub mod coverage;
pub mod error;
pub mod national;
pub mod policy;
pub mod record;
pub mod schema;

pub use brand::{Brand, Combo, Dose};
pub use bucket::Bucket;
pub use coverage::{BoosterCoverage, CoverageSeries, DailyDoses, PopulationTable};
pub use error::CoreError;
pub use national::NationalDay;
pub use policy::{Metric, Policy};
pub use record::LinelistRecord;
pub use schema::{input, output};
