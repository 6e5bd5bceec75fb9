use chrono::NaiveDate;

use crate::{Brand, Combo, Dose};

/// One row of the case or death linelist: a single individual.
///
/// Death records additionally carry the day offsets between doses and the
/// positive test, which the booster analysis uses to classify deaths by
/// status at infection time rather than at death.
#[derive(Debug, Clone, PartialEq)]
pub struct LinelistRecord {
    pub date: NaiveDate,
    pub age: Option<u32>,
    pub brand1: Option<Brand>,
    pub brand2: Option<Brand>,
    pub brand3: Option<Brand>,
    /// Days between dose 2 and the event date.
    pub days_dose2: Option<i64>,
    /// Days between dose 3 and the event date.
    pub days_dose3: Option<i64>,
    pub days_dose2_to_positive: Option<i64>,
    pub days_dose3_to_positive: Option<i64>,
}

impl LinelistRecord {
    /// An unvaccinated record with no age.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            age: None,
            brand1: None,
            brand2: None,
            brand3: None,
            days_dose2: None,
            days_dose3: None,
            days_dose2_to_positive: None,
            days_dose3_to_positive: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    /// Primary course, the second dose `days_dose2` days before the event.
    pub fn with_primary(mut self, first: Brand, second: Brand, days_dose2: i64) -> Self {
        self.brand1 = Some(first);
        self.brand2 = Some(second);
        self.days_dose2 = Some(days_dose2);
        self
    }

    pub fn with_booster(mut self, brand: Brand, days_dose3: i64) -> Self {
        self.brand3 = Some(brand);
        self.days_dose3 = Some(days_dose3);
        self
    }

    pub fn with_positive_offsets(mut self, dose2: Option<i64>, dose3: Option<i64>) -> Self {
        self.days_dose2_to_positive = dose2;
        self.days_dose3_to_positive = dose3;
        self
    }

    pub fn brand(&self, dose: Dose) -> Option<Brand> {
        match dose {
            Dose::First => self.brand1,
            Dose::Second => self.brand2,
            Dose::Third => self.brand3,
        }
    }

    pub fn is_unvaccinated(&self) -> bool {
        self.brand1.is_none()
    }

    /// Dose-2 brand when dose 2 is strictly more than `lag` days old.
    pub fn fully_vaccinated_with(&self, lag: u32) -> Option<Brand> {
        match self.days_dose2 {
            Some(days) if days > i64::from(lag) => self.brand2,
            _ => None,
        }
    }

    /// Brand sequence of the first `doses` doses, if all were given.
    pub fn combo(&self, doses: usize) -> Option<Combo> {
        let brands: Option<Vec<Brand>> = Dose::ALL
            .iter()
            .take(doses)
            .map(|&d| self.brand(d))
            .collect();
        Combo::from_doses(&brands?)
    }
}
