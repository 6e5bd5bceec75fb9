//! Analysis policy: lag thresholds, data-quality cutoffs and booster
//! eligibility windows.
//!
//! These are fixed editorial choices rather than values derived from the
//! data, so they live in one table that can be inspected, tested and
//! overridden from JSON.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{Brand, Combo, CoreError};

/// Event type being rated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Cases,
    Deaths,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cases => f.write_str("cases"),
            Metric::Deaths => f.write_str("deaths"),
        }
    }
}

/// A day count per metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricDays {
    pub cases: u32,
    pub deaths: u32,
}

impl MetricDays {
    pub fn get(&self, metric: Metric) -> u32 {
        match metric {
            Metric::Cases => self.cases,
            Metric::Deaths => self.deaths,
        }
    }
}

/// Blank out a brand's rates on or before `until` (small-sample noise).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suppression {
    pub metric: Metric,
    pub brand: Brand,
    pub until: NaiveDate,
}

/// Days after the second dose of `brand` before a booster is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityWindow {
    pub brand: Brand,
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    /// Days after dose 2 before a person counts as fully vaccinated.
    pub full_vax_lag: MetricDays,
    /// Days after dose 3 (or dose 2 for two-dose combinations) before an
    /// event is attributed to a combination.
    pub booster_event_lag: u32,
    /// Lag applied to booster combination denominators.
    pub booster_denominator_lag: MetricDays,
    /// Dose-2 lag for the breakthrough death age profile.
    pub age_profile_lag: u32,
    pub suppressions: Vec<Suppression>,
    pub eligibility: Vec<EligibilityWindow>,
    /// Combinations reported by the booster analysis.
    pub booster_combos: Vec<Combo>,
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN)
}

fn combos(codes: &[&str]) -> Vec<Combo> {
    codes.iter().filter_map(|c| Combo::parse(c).ok()).collect()
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            full_vax_lag: MetricDays {
                cases: 14,
                deaths: 14,
            },
            booster_event_lag: 14,
            booster_denominator_lag: MetricDays {
                cases: 14,
                deaths: 21,
            },
            age_profile_lag: 21,
            suppressions: vec![
                Suppression {
                    metric: Metric::Cases,
                    brand: Brand::AstraZeneca,
                    until: date(2021, 8, 1),
                },
                Suppression {
                    metric: Metric::Deaths,
                    brand: Brand::AstraZeneca,
                    until: date(2021, 8, 15),
                },
            ],
            eligibility: vec![
                EligibilityWindow {
                    brand: Brand::Pfizer,
                    days: 180,
                },
                EligibilityWindow {
                    brand: Brand::AstraZeneca,
                    days: 180,
                },
                EligibilityWindow {
                    brand: Brand::Sinovac,
                    days: 90,
                },
            ],
            booster_combos: combos(&["pp", "aa", "ss", "ppp", "ssp", "sss"]),
        }
    }
}

impl Policy {
    /// Parse a policy from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let policy: Policy = serde_json::from_str(json)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        for window in &self.eligibility {
            if !window.brand.is_tracked() {
                return Err(CoreError::InvalidPolicy(format!(
                    "eligibility window for untracked brand {}",
                    window.brand
                )));
            }
        }
        for rule in &self.suppressions {
            let duplicates = self
                .suppressions
                .iter()
                .filter(|r| r.metric == rule.metric && r.brand == rule.brand)
                .count();
            if duplicates > 1 {
                return Err(CoreError::InvalidPolicy(format!(
                    "more than one suppression for ({}, {})",
                    rule.metric, rule.brand
                )));
            }
        }
        Ok(())
    }

    pub fn full_vax_lag(&self, metric: Metric) -> u32 {
        self.full_vax_lag.get(metric)
    }

    pub fn booster_denominator_lag(&self, metric: Metric) -> u32 {
        self.booster_denominator_lag.get(metric)
    }

    /// Last suppressed date for `(metric, brand)`, if any.
    pub fn suppressed_until(&self, metric: Metric, brand: Brand) -> Option<NaiveDate> {
        self.suppressions
            .iter()
            .find(|r| r.metric == metric && r.brand == brand)
            .map(|r| r.until)
    }

    pub fn suppressions_for(&self, metric: Metric) -> impl Iterator<Item = &Suppression> {
        self.suppressions.iter().filter(move |r| r.metric == metric)
    }

    pub fn eligibility_window(&self, brand: Brand) -> Option<u32> {
        self.eligibility
            .iter()
            .find(|w| w.brand == brand)
            .map(|w| w.days)
    }
}
