use super::RateSource;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Public USD base endpoint; no API key needed.
pub const EXCHANGE_RATE_API_URL: &str = "https://api.exchangerate-api.com/v4/latest/USD";

/// Response of the `latest/USD` endpoint. Only the rate table matters.
#[derive(Debug, Deserialize)]
struct LatestRatesResponse {
    #[serde(default)]
    base: Option<String>,
    rates: Option<HashMap<String, f64>>,
}

/// exchangerate-api.com REST client.
#[derive(Clone)]
pub struct ExchangeRateApiClient {
    client: Client,
    url: String,
    currency: String,
}

impl ExchangeRateApiClient {
    /// Create a new client quoting `currency` per USD.
    pub fn new(url: impl Into<String>, currency: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent("perpcalc/0.1 (Perpetual futures calculator)")
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            url: url.into(),
            currency: currency.into().to_uppercase(),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateApiClient {
    fn name(&self) -> &str {
        "exchangerate-api"
    }

    fn currency(&self) -> &str {
        &self.currency
    }

    async fn fetch_rate(&self) -> anyhow::Result<f64> {
        let response = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(
                "exchangerate-api returned {}: {}",
                status,
                text.chars().take(200).collect::<String>()
            );
            return Err(anyhow::anyhow!("exchangerate-api error: {}", status));
        }

        let body = response.text().await?;
        let rate = parse_rate(&body, &self.currency)?;
        debug!("Fetched USD->{} rate {}", self.currency, rate);
        Ok(rate)
    }
}

/// Pull `rates.<currency>` out of a `latest/USD` response body.
///
/// A missing table, missing currency, or non-positive rate is an error.
pub fn parse_rate(body: &str, currency: &str) -> anyhow::Result<f64> {
    let parsed: LatestRatesResponse = serde_json::from_str(body)?;

    if let Some(base) = parsed.base.as_deref() {
        if !base.eq_ignore_ascii_case("USD") {
            return Err(anyhow::anyhow!("unexpected base currency {}", base));
        }
    }

    let rate = parsed
        .rates
        .as_ref()
        .and_then(|rates| rates.get(&currency.to_uppercase()).copied())
        .ok_or_else(|| anyhow::anyhow!("invalid API data format: no {} rate", currency))?;

    if !rate.is_finite() || rate <= 0.0 {
        return Err(anyhow::anyhow!("invalid {} rate {}", currency, rate));
    }

    Ok(rate)
}
