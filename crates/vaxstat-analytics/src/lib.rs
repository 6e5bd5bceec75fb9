//! Derived statistics over a loaded dataset: breakthrough rates by
//! vaccination status, apparent vaccine effectiveness, booster combination
//! rates, age profiles and the supporting daily tables.

pub mod age;
pub mod booster;
pub mod denominator;
pub mod density;
pub mod doses;
pub mod effectiveness;
mod error;
pub mod index;
pub mod national;
pub mod rates;
pub mod series;
pub mod status;
#[cfg(test)]
mod testing;

pub use booster::BoosterPipeline;
pub use denominator::Denominators;
pub use density::{DensityPoint, probability_density};
pub use effectiveness::{EffectivenessSeries, vaccine_effectiveness};
pub use error::AnalyticsError;
pub use index::DateIndex;
pub use rates::{RatePipeline, RateSeries};
pub use series::{Cell, Series};
pub use status::{StatusCounts, classify};

/// Rates are events per this many people.
pub const PER_POPULATION: f64 = 100_000.0;
