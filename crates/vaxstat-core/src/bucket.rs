use std::fmt;

use crate::{Brand, Combo};

/// Vaccination status cohort used to segment events and population.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Bucket {
    Unvaccinated,
    /// Fully vaccinated: dose 2 of this brand, past the lag threshold.
    Full(Brand),
    /// Dose-brand sequence from the booster combination table.
    Combo(Combo),
}

impl Bucket {
    /// Unvaccinated followed by one fully-vaccinated bucket per tracked brand.
    pub fn standard() -> Vec<Bucket> {
        std::iter::once(Bucket::Unvaccinated)
            .chain(Brand::TRACKED.into_iter().map(Bucket::Full))
            .collect()
    }

    pub fn label(&self) -> String {
        match self {
            Bucket::Unvaccinated => "Unvaccinated".to_string(),
            Bucket::Full(brand) => brand.label().to_string(),
            Bucket::Combo(combo) => combo.code().to_string(),
        }
    }

    pub fn is_vaccinated(&self) -> bool {
        !matches!(self, Bucket::Unvaccinated)
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}
