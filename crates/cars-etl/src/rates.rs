//! Currency rate resolver
//!
//! Fetches the conversion rate from a configured HTTP endpoint. Any
//! failure — network, timeout, non-2xx status, malformed body, missing
//! currency field — resolves to the configured fallback rate instead
//! of an error, so the pipeline never stalls on the rate service. The
//! caller can observe which source was used via [`RateSource`].

use crate::config::RateConfig;
use cars_common::{EtlError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Where a resolved rate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateSource {
    /// Fetched from the live endpoint
    Live,
    /// Configured fallback constant, endpoint unavailable
    Fallback,
}

/// A resolved conversion rate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate {
    /// Units of target currency per one unit of source currency
    pub rate: f64,
    pub source: RateSource,
}

/// Response shape of the rate endpoint (`rates.<currency>`)
#[derive(Debug, Deserialize)]
struct RatesResponse {
    rates: HashMap<String, f64>,
}

/// HTTP client for the rate endpoint
pub struct RateResolver {
    client: Client,
    config: RateConfig,
}

impl RateResolver {
    /// Create a new resolver with a bounded request timeout
    pub fn new(config: RateConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("cars-etl/0.1")
            .build()
            .map_err(|e| EtlError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(RateResolver { client, config })
    }

    /// Resolve the conversion rate.
    ///
    /// Never fails: any error on the live path yields the fallback
    /// rate, logged at warn.
    pub async fn resolve(&self) -> ResolvedRate {
        match self.fetch_live().await {
            Ok(rate) if rate > 0.0 => {
                debug!(rate, currency = %self.config.currency, "Fetched live exchange rate");
                ResolvedRate {
                    rate,
                    source: RateSource::Live,
                }
            },
            Ok(rate) => {
                warn!(
                    rate,
                    fallback = self.config.fallback_rate,
                    "Rate endpoint returned a non-positive rate, using fallback"
                );
                self.fallback()
            },
            Err(e) => {
                warn!(
                    error = %e,
                    fallback = self.config.fallback_rate,
                    "Rate endpoint failed, using fallback"
                );
                self.fallback()
            },
        }
    }

    fn fallback(&self) -> ResolvedRate {
        ResolvedRate {
            rate: self.config.fallback_rate,
            source: RateSource::Fallback,
        }
    }

    async fn fetch_live(&self) -> std::result::Result<f64, anyhow::Error> {
        let response = self
            .client
            .get(&self.config.endpoint)
            .send()
            .await?
            .error_for_status()?;

        let body: RatesResponse = response.json().await?;

        body.rates.get(&self.config.currency).copied().ok_or_else(|| {
            anyhow::anyhow!("Currency {} missing from rate response", self.config.currency)
        })
    }
}
