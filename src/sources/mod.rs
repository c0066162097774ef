//! External exchange-rate sources.

pub mod exchange_rate_api;

pub use exchange_rate_api::ExchangeRateApiClient;

use async_trait::async_trait;

/// Something that can quote how many units of a local currency one USD buys.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &str;

    /// Local currency code the rate is quoted in.
    fn currency(&self) -> &str;

    /// Fetch the current rate.
    async fn fetch_rate(&self) -> anyhow::Result<f64>;
}
