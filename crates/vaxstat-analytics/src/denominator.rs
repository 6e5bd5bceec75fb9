//! Population at risk per vaccination-status bucket.

use chrono::NaiveDate;
use vaxstat_core::calendar::days_before;
use vaxstat_core::{Brand, Bucket, CoverageSeries, Dose, PopulationTable};

use crate::AnalyticsError;

/// Coverage and population for one region.
#[derive(Debug, Clone, Copy)]
pub struct Denominators<'a> {
    coverage: &'a CoverageSeries,
    population: u64,
}

impl<'a> Denominators<'a> {
    pub fn new(coverage: &'a CoverageSeries, population: u64) -> Self {
        Self {
            coverage,
            population,
        }
    }

    pub fn for_region(
        coverage: &'a CoverageSeries,
        table: &PopulationTable,
        region: &str,
    ) -> Result<Self, AnalyticsError> {
        let population = table
            .get(region)
            .ok_or_else(|| AnalyticsError::UnknownRegion(region.to_string()))?;
        Ok(Self::new(coverage, population))
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    pub fn coverage(&self) -> &'a CoverageSeries {
        self.coverage
    }

    /// People with no dose on `date`.
    pub fn unvaccinated(&self, date: NaiveDate) -> Option<f64> {
        let partial = self.coverage.cumulative_partial(date)?;
        Some(self.population as f64 - partial as f64)
    }

    /// People whose second dose of `brand` was given at least `lag` days before `date`.
    pub fn fully_vaccinated(&self, brand: Brand, date: NaiveDate, lag: u32) -> Option<f64> {
        let lagged = days_before(date, lag)?;
        self.coverage
            .cumulative(brand, Dose::Second, lagged)
            .map(|n| n as f64)
    }

    /// Denominator for `bucket`, or `None` when it is missing or not positive.
    pub fn for_bucket(&self, bucket: &Bucket, date: NaiveDate, lag: u32) -> Option<f64> {
        let value = match bucket {
            Bucket::Unvaccinated => self.unvaccinated(date),
            Bucket::Full(brand) => self.fully_vaccinated(*brand, date, lag),
            Bucket::Combo(_) => None,
        }?;
        (value > 0.0).then_some(value)
    }
}
