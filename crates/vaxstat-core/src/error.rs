use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid vaccine combination code: {0:?}")]
    InvalidCombo(String),

    #[error("duplicate coverage row for {0}")]
    DuplicateDate(NaiveDate),

    #[error("invalid policy: {0}")]
    InvalidPolicy(String),

    #[error("policy JSON error: {0}")]
    PolicyJson(#[from] serde_json::Error),
}
