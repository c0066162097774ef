use crate::error::{AppError, Result};
use crate::services::display::ReportUnits;
use crate::services::DEFAULT_SETTINGS_KEY;
use crate::sources::exchange_rate_api::EXCHANGE_RATE_API_URL;
use crate::types::{Constants, DEFAULT_FEE_RATE};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Trading fee charged on entry and on exit, as a decimal.
    pub fee_rate: f64,
    /// Exchange-rate endpoint (USD base).
    pub exchange_rate_url: String,
    /// Currency PnL is converted into.
    pub local_currency: String,
    /// Seconds between exchange-rate refreshes.
    pub rate_refresh_secs: u64,
    /// HTTP timeout for a single rate fetch.
    pub rate_timeout_secs: u64,
    /// Directory holding saved settings.
    pub settings_dir: PathBuf,
    /// Key the input snapshot is saved under.
    pub settings_key: String,
    /// Underlying asset label, e.g. "BTC".
    pub asset_symbol: String,
    /// Settlement currency label, e.g. "USDT".
    pub quote_symbol: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            fee_rate: DEFAULT_FEE_RATE,
            exchange_rate_url: EXCHANGE_RATE_API_URL.to_string(),
            local_currency: "TWD".to_string(),
            rate_refresh_secs: 3600,
            rate_timeout_secs: 10,
            settings_dir: PathBuf::from(".perpcalc"),
            settings_key: DEFAULT_SETTINGS_KEY.to_string(),
            asset_symbol: "BTC".to_string(),
            quote_symbol: "USDT".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            fee_rate: env::var("FEE_RATE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.fee_rate),
            exchange_rate_url: env::var("EXCHANGE_RATE_URL").unwrap_or(defaults.exchange_rate_url),
            local_currency: env::var("LOCAL_CURRENCY")
                .map(|v| v.to_uppercase())
                .unwrap_or(defaults.local_currency),
            rate_refresh_secs: env::var("RATE_REFRESH_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_refresh_secs),
            rate_timeout_secs: env::var("RATE_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.rate_timeout_secs),
            settings_dir: env::var("SETTINGS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.settings_dir),
            settings_key: env::var("SETTINGS_KEY").unwrap_or(defaults.settings_key),
            asset_symbol: env::var("ASSET_SYMBOL").unwrap_or(defaults.asset_symbol),
            quote_symbol: env::var("QUOTE_SYMBOL").unwrap_or(defaults.quote_symbol),
        }
    }

    /// Reject values the calculator cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !self.fee_rate.is_finite() || !(0.0..1.0).contains(&self.fee_rate) {
            return Err(AppError::Config(format!(
                "FEE_RATE must be in [0, 1), got {}",
                self.fee_rate
            )));
        }
        if self.rate_refresh_secs == 0 {
            return Err(AppError::Config("RATE_REFRESH_SECS must be positive".into()));
        }
        if self.settings_key.trim().is_empty() {
            return Err(AppError::Config("SETTINGS_KEY must not be empty".into()));
        }
        Ok(())
    }

    /// Calculation constants with the configured fee rate.
    pub fn constants(&self) -> Constants {
        Constants::with_fee_rate(self.fee_rate)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.rate_refresh_secs)
    }

    pub fn rate_timeout(&self) -> Duration {
        Duration::from_secs(self.rate_timeout_secs)
    }

    pub fn report_units(&self) -> ReportUnits {
        ReportUnits {
            quote: self.quote_symbol.clone(),
            asset: self.asset_symbol.clone(),
        }
    }
}
