use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;

use super::reconciliation::PriceSource;
use crate::errors::EngineError;

#[derive(Debug, Deserialize)]
struct PricePoint {
    price: Option<Decimal>,
}

/// Historical-price client against the market-data service. Returns
/// `Ok(None)` when the feed has no candle for the requested instant yet,
/// which the reconciliation pass treats as "retry next cycle".
#[derive(Clone)]
pub struct HttpPriceSource {
    http: reqwest::Client,
    base_url: String,
}

impl HttpPriceSource {
    pub fn new(base_url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, base_url })
    }
}

impl PriceSource for HttpPriceSource {
    async fn price_at(
        &self,
        asset_id: &str,
        at: DateTime<Utc>,
    ) -> anyhow::Result<Option<Decimal>> {
        let url = format!("{}/prices/{}", self.base_url.trim_end_matches('/'), asset_id);
        let response = self
            .http
            .get(&url)
            .query(&[("at", at.to_rfc3339())])
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| EngineError::ExternalServiceUnavailable(format!("price feed: {e}")))?;

        let point: PricePoint = response
            .json()
            .await
            .map_err(|e| EngineError::ExternalServiceUnavailable(format!("price feed: {e}")))?;
        Ok(point.price)
    }
}
