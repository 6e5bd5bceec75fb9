//! Apparent vaccine effectiveness relative to the unvaccinated rate.

use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use vaxstat_core::{Bucket, Metric};

use crate::series::{Cell, Series};
use crate::{AnalyticsError, RateSeries};

/// `100 - vaccinated / unvaccinated * 100`. Negative when the vaccinated
/// rate is the higher one.
pub fn vaccine_effectiveness(vaccinated_rate: f64, unvaccinated_rate: f64) -> f64 {
    100.0 - (vaccinated_rate / unvaccinated_rate * 100.0)
}

fn effectiveness_cell(vaccinated: Cell, unvaccinated: Cell) -> Cell {
    match (vaccinated, unvaccinated) {
        (Cell::Value(v), Cell::Value(u)) if u != 0.0 => Cell::finite(vaccine_effectiveness(v, u)),
        (Cell::Suppressed, _) | (_, Cell::Suppressed) => Cell::Suppressed,
        _ => Cell::Gap,
    }
}

/// Effectiveness per vaccinated bucket. Raw values are signed; every
/// output accessor floors them at zero.
#[derive(Debug, Clone)]
pub struct EffectivenessSeries {
    pub metric: Metric,
    raw: Series<Bucket>,
}

impl EffectivenessSeries {
    pub fn from_rates(rates: &RateSeries) -> Result<Self, AnalyticsError> {
        let vaccinated: Vec<Bucket> = rates
            .rates
            .columns()
            .iter()
            .filter(|b| b.is_vaccinated())
            .cloned()
            .collect();
        let positions: Vec<usize> = rates
            .rates
            .columns()
            .iter()
            .enumerate()
            .filter(|(_, b)| b.is_vaccinated())
            .map(|(i, _)| i)
            .collect();
        let unvaccinated = rates
            .rates
            .columns()
            .iter()
            .position(|b| *b == Bucket::Unvaccinated);

        let mut raw = Series::new(vaccinated);
        for (date, row) in rates.rates.rows() {
            let reference = unvaccinated.map(|i| row[i]).unwrap_or(Cell::Gap);
            let cells = positions
                .iter()
                .map(|&i| effectiveness_cell(row[i], reference))
                .collect();
            raw.push_row(date, cells)?;
        }
        Ok(Self {
            metric: rates.metric,
            raw,
        })
    }

    /// Signed values, before flooring.
    pub fn raw(&self) -> &Series<Bucket> {
        &self.raw
    }

    pub fn clamped(&self) -> Series<Bucket> {
        self.raw.map_cells(|_, cell| match cell {
            Cell::Value(v) => Cell::Value(v.max(0.0)),
            other => other,
        })
    }

    pub fn get(&self, date: NaiveDate, bucket: &Bucket) -> Option<f64> {
        self.raw.get(date, bucket)?.value().map(|v| v.max(0.0))
    }

    pub fn to_record_batch(&self) -> Result<RecordBatch, AnalyticsError> {
        self.clamped().to_record_batch()
    }
}
