//! Date-indexed tables of nullable cells.

use std::fmt::Display;
use std::sync::Arc;

use arrow::array::{ArrayRef, Date32Array, Float64Array};
use arrow::record_batch::RecordBatch;
use chrono::NaiveDate;
use vaxstat_core::calendar::to_date32;
use vaxstat_core::output;

use crate::AnalyticsError;

/// One cell of a derived series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Value(f64),
    /// Reference data (a denominator) was missing or zero.
    Gap,
    /// Blanked out by the data-quality policy.
    Suppressed,
}

impl Cell {
    pub fn value(self) -> Option<f64> {
        match self {
            Cell::Value(v) => Some(v),
            Cell::Gap | Cell::Suppressed => None,
        }
    }

    /// `Value` for a finite number, `Gap` otherwise.
    pub fn finite(v: f64) -> Cell {
        if v.is_finite() { Cell::Value(v) } else { Cell::Gap }
    }
}

/// Rows of consecutive dates, one cell per column.
#[derive(Debug, Clone, PartialEq)]
pub struct Series<K> {
    columns: Vec<K>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<Cell>>,
}

impl<K: Clone + PartialEq + Display> Series<K> {
    pub fn new(columns: Vec<K>) -> Self {
        Self {
            columns,
            dates: Vec::new(),
            rows: Vec::new(),
        }
    }

    /// Append a row; `cells` must have one entry per column.
    pub fn push_row(&mut self, date: NaiveDate, cells: Vec<Cell>) -> Result<(), AnalyticsError> {
        if cells.len() != self.columns.len() {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "row for {date} has {} cells, expected {}",
                cells.len(),
                self.columns.len()
            )));
        }
        if let Some(&last) = self.dates.last()
            && date <= last
        {
            return Err(AnalyticsError::InvalidConfiguration(format!(
                "row for {date} is not after {last}"
            )));
        }
        self.dates.push(date);
        self.rows.push(cells);
        Ok(())
    }

    pub fn columns(&self) -> &[K] {
        &self.columns
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }

    fn column_index(&self, column: &K) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    fn row_index(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    pub fn get(&self, date: NaiveDate, column: &K) -> Option<Cell> {
        let row = self.row_index(date)?;
        let col = self.column_index(column)?;
        Some(self.rows[row][col])
    }

    pub fn row(&self, date: NaiveDate) -> Option<&[Cell]> {
        self.row_index(date).map(|i| self.rows[i].as_slice())
    }

    pub fn rows(&self) -> impl Iterator<Item = (NaiveDate, &[Cell])> {
        self.dates
            .iter()
            .copied()
            .zip(self.rows.iter().map(Vec::as_slice))
    }

    /// `(date, cell)` pairs for one column.
    pub fn column(&self, column: &K) -> Option<Vec<(NaiveDate, Cell)>> {
        let col = self.column_index(column)?;
        Some(
            self.dates
                .iter()
                .zip(&self.rows)
                .map(|(&date, row)| (date, row[col]))
                .collect(),
        )
    }

    /// Apply `f` to every cell, keeping dates and columns.
    pub fn map_cells(&self, f: impl Fn(&K, Cell) -> Cell) -> Self {
        let rows = self
            .rows
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.columns)
                    .map(|(&cell, key)| f(key, cell))
                    .collect()
            })
            .collect();
        Self {
            columns: self.columns.clone(),
            dates: self.dates.clone(),
            rows,
        }
    }

    /// Trailing mean over `window` rows.
    ///
    /// Leading rows without a full window are dropped. A window holding a
    /// gap yields a gap; otherwise one holding a suppressed cell yields a
    /// suppressed cell. Windows of 0 or 1 return the series unchanged.
    pub fn trailing_mean(&self, window: usize) -> Self {
        if window <= 1 {
            return self.clone();
        }
        let mut out = Self::new(self.columns.clone());
        for end in (window - 1)..self.rows.len() {
            let span = &self.rows[end + 1 - window..=end];
            let cells = (0..self.columns.len())
                .map(|col| mean_of(span.iter().map(|row| row[col]), window))
                .collect();
            out.dates.push(self.dates[end]);
            out.rows.push(cells);
        }
        out
    }

    /// Mark `column` suppressed on every date up to and including `until`.
    pub fn suppress_until(&mut self, column: &K, until: NaiveDate) {
        let Some(col) = self.column_index(column) else {
            return;
        };
        for (date, row) in self.dates.iter().zip(self.rows.iter_mut()) {
            if *date <= until {
                row[col] = Cell::Suppressed;
            }
        }
    }

    /// `date` plus one nullable `Float64` column per series column.
    pub fn to_record_batch(&self) -> Result<RecordBatch, AnalyticsError> {
        let labels: Vec<String> = self.columns.iter().map(ToString::to_string).collect();
        let schema = output::series_schema(&labels);

        let mut arrays: Vec<ArrayRef> = Vec::with_capacity(labels.len() + 1);
        arrays.push(Arc::new(Date32Array::from_iter_values(
            self.dates.iter().map(|&d| to_date32(d)),
        )));
        for col in 0..self.columns.len() {
            let values: Float64Array = self.rows.iter().map(|row| row[col].value()).collect();
            arrays.push(Arc::new(values));
        }
        Ok(RecordBatch::try_new(Arc::new(schema), arrays)?)
    }
}

fn mean_of(cells: impl Iterator<Item = Cell>, window: usize) -> Cell {
    let mut sum = 0.0;
    let mut suppressed = false;
    for cell in cells {
        match cell {
            Cell::Value(v) => sum += v,
            Cell::Gap => return Cell::Gap,
            Cell::Suppressed => suppressed = true,
        }
    }
    if suppressed {
        Cell::Suppressed
    } else {
        Cell::Value(sum / window as f64)
    }
}
