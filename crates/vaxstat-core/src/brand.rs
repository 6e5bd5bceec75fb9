//! Vaccine brands, dose numbers and multi-dose brand combinations.
//!
//! The case linelist records brands as single-letter codes (`p`, `a`, `s`)
//! while the death linelist spells them out (`Pfizer`, `AstraZeneca`,
//! `Sinovac`). Both spellings parse to the same [`Brand`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// A vaccine brand as recorded in the linelists and coverage tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Brand {
    Pfizer,
    AstraZeneca,
    Sinovac,
    /// Any other brand (Sinopharm, CanSino, pending sync, ...).
    Other,
}

impl Brand {
    /// Brands with dedicated coverage columns and their own status bucket.
    pub const TRACKED: [Brand; 3] = [Brand::Pfizer, Brand::AstraZeneca, Brand::Sinovac];

    /// Parse a brand cell. Empty cells and `nan` mean no dose was given.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("nan") {
            return None;
        }
        let brand = match raw.to_ascii_lowercase().as_str() {
            "p" | "pfizer" | "pfizer-biontech" => Brand::Pfizer,
            "a" | "astrazeneca" | "astra" | "oxford-astrazeneca" => Brand::AstraZeneca,
            "s" | "sinovac" => Brand::Sinovac,
            _ => Brand::Other,
        };
        Some(brand)
    }

    /// Single-letter code used in booster combination columns.
    pub fn code(self) -> char {
        match self {
            Brand::Pfizer => 'p',
            Brand::AstraZeneca => 'a',
            Brand::Sinovac => 's',
            Brand::Other => 'o',
        }
    }

    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'p' => Some(Brand::Pfizer),
            'a' => Some(Brand::AstraZeneca),
            's' => Some(Brand::Sinovac),
            'o' => Some(Brand::Other),
            _ => None,
        }
    }

    /// Display label used for series columns.
    pub fn label(self) -> &'static str {
        match self {
            Brand::Pfizer => "Pfizer-BioNTech",
            Brand::AstraZeneca => "Oxford-AstraZeneca",
            Brand::Sinovac => "Sinovac",
            Brand::Other => "Others",
        }
    }

    /// Column prefix in the national vaccination table (`pfizer2`, `astra3`, ...).
    pub fn column_prefix(self) -> Option<&'static str> {
        match self {
            Brand::Pfizer => Some("pfizer"),
            Brand::AstraZeneca => Some("astra"),
            Brand::Sinovac => Some("sinovac"),
            Brand::Other => None,
        }
    }

    pub fn is_tracked(self) -> bool {
        self != Brand::Other
    }
}

impl fmt::Display for Brand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Dose number within a vaccination course.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Dose {
    First,
    Second,
    Third,
}

impl Dose {
    pub const ALL: [Dose; 3] = [Dose::First, Dose::Second, Dose::Third];

    pub fn number(self) -> u8 {
        match self {
            Dose::First => 1,
            Dose::Second => 2,
            Dose::Third => 3,
        }
    }
}

/// Ordered sequence of brands received, e.g. `ssp` = Sinovac, Sinovac, Pfizer.
///
/// Two-dose (`pp`) and three-dose (`ppp`) combinations are both valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Combo(String);

impl Combo {
    pub fn parse(code: &str) -> Result<Self, CoreError> {
        let code = code.trim().to_ascii_lowercase();
        let valid_len = matches!(code.chars().count(), 2 | 3);
        if !valid_len || !code.chars().all(|c| Brand::from_code(c).is_some()) {
            return Err(CoreError::InvalidCombo(code));
        }
        Ok(Self(code))
    }

    /// Build a combination from the brands of consecutive doses.
    pub fn from_doses(doses: &[Brand]) -> Option<Self> {
        if !matches!(doses.len(), 2 | 3) {
            return None;
        }
        Some(Self(doses.iter().map(|b| b.code()).collect()))
    }

    pub fn code(&self) -> &str {
        &self.0
    }

    pub fn doses(&self) -> Vec<Brand> {
        self.0.chars().filter_map(Brand::from_code).collect()
    }

    pub fn dose_count(&self) -> usize {
        self.0.len()
    }

    /// Whether `self` is a booster combination extending the two-dose `primary`.
    pub fn extends(&self, primary: &Combo) -> bool {
        self.dose_count() == primary.dose_count() + 1 && self.0.starts_with(primary.code())
    }
}

impl fmt::Display for Combo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Combo {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Combo::parse(&value)
    }
}

impl From<Combo> for String {
    fn from(value: Combo) -> Self {
        value.0
    }
}
