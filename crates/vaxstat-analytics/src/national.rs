//! National cases, hospital load and deaths indexed to a previous peak.

use chrono::NaiveDate;
use vaxstat_core::NationalDay;
use vaxstat_core::calendar::date_range;

use crate::AnalyticsError;
use crate::series::{Cell, Series};

pub const CASES: &str = "cases";
pub const HOSPITALISED: &str = "hospitalised";
pub const DEATHS: &str = "deaths";

#[derive(Debug, Clone, PartialEq)]
pub struct NormalisationOptions {
    /// Peaks are taken within this inclusive window.
    pub peak_window: (NaiveDate, NaiveDate),
    /// Rows before this date are left out of the output.
    pub from: Option<NaiveDate>,
    pub moving_average: usize,
    /// Hospital load is moved this many days earlier.
    pub shift_hospitals: usize,
    /// Deaths are moved this many days earlier.
    pub shift_deaths: usize,
}

impl Default for NormalisationOptions {
    fn default() -> Self {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap_or(NaiveDate::MIN);
        Self {
            peak_window: (date(2020, 11, 1), date(2021, 2, 1)),
            from: Some(date(2020, 10, 1)),
            moving_average: 7,
            shift_hospitals: 7,
            shift_deaths: 21,
        }
    }
}

fn cell(value: Option<f64>) -> Cell {
    value.map_or(Cell::Gap, Cell::Value)
}

/// Cases, hospitalised patients and deaths as a percentage of their peak
/// in `peak_window`, after smoothing. Hospital and death series are
/// shifted earlier to line up with the cases that drove them.
pub fn normalised_series(
    days: &[NationalDay],
    options: &NormalisationOptions,
) -> Result<Series<String>, AnalyticsError> {
    let (peak_start, peak_end) = options.peak_window;
    if peak_start > peak_end {
        return Err(AnalyticsError::InvalidConfiguration(format!(
            "peak window {peak_start}..={peak_end} is empty"
        )));
    }
    let (Some(first), Some(last)) = (days.first(), days.last()) else {
        return Err(AnalyticsError::DateRangeOutOfBounds {
            start: peak_start,
            end: peak_end,
            coverage: None,
        });
    };

    let columns = vec![CASES.to_string(), HOSPITALISED.to_string(), DEATHS.to_string()];
    let mut daily = Series::new(columns.clone());
    let mut source = days.iter().peekable();
    for date in date_range(first.date, last.date) {
        let cells = match source.next_if(|day| day.date == date) {
            Some(day) => vec![cell(day.cases), cell(day.hospitalised), cell(day.deaths)],
            None => vec![Cell::Gap; 3],
        };
        daily.push_row(date, cells)?;
    }
    let smoothed = daily.trailing_mean(options.moving_average);

    let in_window = |date: NaiveDate| peak_start <= date && date <= peak_end;
    let mut peaks = Vec::with_capacity(columns.len());
    for column in &columns {
        let peak = smoothed
            .column(column)
            .into_iter()
            .flatten()
            .filter(|(date, _)| in_window(*date))
            .filter_map(|(_, c)| c.value())
            .fold(None, |max: Option<f64>, v| Some(max.map_or(v, |m| m.max(v))));
        match peak {
            Some(p) if p > 0.0 => peaks.push(p),
            _ => {
                return Err(AnalyticsError::MissingReferenceData {
                    date: peak_start,
                    bucket: column.clone(),
                });
            }
        }
    }

    let shifts = [0, options.shift_hospitals, options.shift_deaths];
    let rows: Vec<(NaiveDate, &[Cell])> = smoothed.rows().collect();
    let mut out = Series::new(columns);
    for (i, &(date, _)) in rows.iter().enumerate() {
        if options.from.is_some_and(|from| date < from) {
            continue;
        }
        let cells = (0..3)
            .map(|col| match rows.get(i + shifts[col]) {
                Some((_, row)) => match row[col] {
                    Cell::Value(v) => Cell::Value(v / peaks[col] * 100.0),
                    other => other,
                },
                None => Cell::Gap,
            })
            .collect();
        out.push_row(date, cells)?;
    }
    Ok(out)
}
