//! Age-group breakdown of daily cases and age profiles of breakthrough deaths.

use std::fmt;

use chrono::NaiveDate;
use tracing::debug;
use vaxstat_core::calendar::date_range;
use vaxstat_core::{Brand, LinelistRecord, Policy};

use crate::density::{DensityPoint, probability_density};
use crate::index::DateIndex;
use crate::rates::warmup_start;
use crate::series::{Cell, Series};
use crate::AnalyticsError;

/// Groups start below this age; the last group is open-ended.
const OPEN_GROUP_BELOW: u32 = 85;
const OLDEST: u32 = 120;

/// An inclusive age band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeGroup {
    pub lower: u32,
    pub upper: u32,
    open: bool,
}

impl AgeGroup {
    pub fn contains(&self, age: u32) -> bool {
        (self.lower..=self.upper).contains(&age)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.open {
            write!(f, "{}+", self.lower)
        } else {
            write!(f, "{}-{}", self.lower, self.upper)
        }
    }
}

/// `bin_size`-year bands from 0; the band starting last below 85 runs to 120.
pub fn age_groups(bin_size: u32) -> Result<Vec<AgeGroup>, AnalyticsError> {
    if bin_size == 0 {
        return Err(AnalyticsError::InvalidConfiguration(
            "age group size must be positive".into(),
        ));
    }
    let lowers: Vec<u32> = (0..OPEN_GROUP_BELOW).step_by(bin_size as usize).collect();
    Ok(lowers
        .iter()
        .enumerate()
        .map(|(i, &lower)| match lowers.get(i + 1) {
            Some(&next) => AgeGroup {
                lower,
                upper: next - 1,
                open: false,
            },
            None => AgeGroup {
                lower,
                upper: OLDEST,
                open: true,
            },
        })
        .collect())
}

/// Daily cases per age group over `start..=end`, as a trailing mean.
pub fn cases_by_age_group(
    index: &DateIndex<'_>,
    start: NaiveDate,
    end: NaiveDate,
    bin_size: u32,
    moving_average: usize,
) -> Result<Series<AgeGroup>, AnalyticsError> {
    let groups = age_groups(bin_size)?;
    let first = warmup_start(start, end, moving_average)?;
    AnalyticsError::check_span(first, end, index.span())?;

    let mut daily = Series::new(groups.clone());
    for date in date_range(first, end) {
        let mut counts = vec![0u64; groups.len()];
        for age in index.on(date).iter().filter_map(|r| r.age) {
            if let Some(i) = groups.iter().position(|g| g.contains(age)) {
                counts[i] += 1;
            }
        }
        daily.push_row(date, counts.into_iter().map(|n| Cell::Value(n as f64)).collect())?;
    }
    Ok(daily.trailing_mean(moving_average))
}

/// Density of ages at death for one brand's fully vaccinated.
#[derive(Debug, Clone, PartialEq)]
pub struct AgeProfile {
    pub brand: Brand,
    pub bins_res: f64,
    pub sample_size: usize,
    pub points: Vec<DensityPoint>,
}

/// AstraZeneca's breakthrough deaths are few, so its bins are wider.
fn profile_resolution(brand: Brand) -> f64 {
    match brand {
        Brand::AstraZeneca => 5.0,
        _ => 3.0,
    }
}

/// Age density of deaths more than `age_profile_lag` days after dose 2,
/// per tracked dose-2 brand. Brands without such deaths are left out.
pub fn breakthrough_age_density(
    deaths: &[LinelistRecord],
    policy: &Policy,
    density: bool,
) -> Result<Vec<AgeProfile>, AnalyticsError> {
    let mut profiles = Vec::new();
    for brand in Brand::TRACKED {
        let ages: Vec<f64> = deaths
            .iter()
            .filter(|r| r.fully_vaccinated_with(policy.age_profile_lag) == Some(brand))
            .filter_map(|r| r.age.map(f64::from))
            .collect();
        if ages.is_empty() {
            debug!(%brand, "no breakthrough deaths for age profile");
            continue;
        }
        let bins_res = profile_resolution(brand);
        profiles.push(AgeProfile {
            brand,
            bins_res,
            sample_size: ages.len(),
            points: probability_density(&ages, bins_res, density)?,
        });
    }
    Ok(profiles)
}
