use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyticsError {
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no reference data for {bucket} on {date}")]
    MissingReferenceData { date: NaiveDate, bucket: String },

    #[error("requested {start}..={end} is outside loaded coverage {coverage:?}")]
    DateRangeOutOfBounds {
        start: NaiveDate,
        end: NaiveDate,
        coverage: Option<(NaiveDate, NaiveDate)>,
    },

    #[error("invalid sample: {0}")]
    InvalidSample(String),

    #[error("unknown region: {0}")]
    UnknownRegion(String),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

impl AnalyticsError {
    /// Reject a processing span not contained in `coverage`.
    pub(crate) fn check_span(
        start: NaiveDate,
        end: NaiveDate,
        coverage: Option<(NaiveDate, NaiveDate)>,
    ) -> Result<(), AnalyticsError> {
        match coverage {
            Some((first, last)) if first <= start && end <= last => Ok(()),
            _ => Err(AnalyticsError::DateRangeOutOfBounds {
                start,
                end,
                coverage,
            }),
        }
    }
}

/// Overlap of two inclusive date spans.
pub(crate) fn intersect(
    a: Option<(NaiveDate, NaiveDate)>,
    b: Option<(NaiveDate, NaiveDate)>,
) -> Option<(NaiveDate, NaiveDate)> {
    let (a0, a1) = a?;
    let (b0, b1) = b?;
    let span = (a0.max(b0), a1.min(b1));
    (span.0 <= span.1).then_some(span)
}
