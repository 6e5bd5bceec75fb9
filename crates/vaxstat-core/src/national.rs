use chrono::NaiveDate;

/// One day of the national epidemic time series.
///
/// Values are `None` where the source file has no row for the date.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NationalDay {
    pub date: NaiveDate,
    /// New cases (`cases_new`).
    pub cases: Option<f64>,
    /// Deaths by date of death (`deaths_new_dod`).
    pub deaths: Option<f64>,
    /// New COVID-19 admissions (`admitted_covid`), summed over hospitals.
    pub admissions: Option<f64>,
    /// COVID-19 patients in hospital (`hosp_covid`), summed over hospitals.
    pub hospitalised: Option<f64>,
}

impl NationalDay {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            cases: None,
            deaths: None,
            admissions: None,
            hospitalised: None,
        }
    }
}
