use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of the most recent exchange-rate fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "message", rename_all = "snake_case")]
pub enum RateStatus {
    Loading,
    Success,
    Error(String),
}

/// Last known exchange rate plus fetch bookkeeping.
///
/// `rate` keeps the last successful value; a later failure only changes
/// `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateState {
    /// Local currency code, e.g. "TWD".
    pub currency: String,
    pub rate: Option<f64>,
    pub status: RateStatus,
    /// When `rate` was last set.
    pub updated_at: Option<DateTime<Utc>>,
}

impl RateState {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            rate: None,
            status: RateStatus::Loading,
            updated_at: None,
        }
    }

    pub fn is_available(&self) -> bool {
        self.rate.is_some()
    }
}
