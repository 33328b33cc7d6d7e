use std::time::Duration;

use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::EngineError;

/// Context handed to the external narrative-generation service. The
/// returned text is stored opaquely in the insight field and never
/// feeds back into any numeric decision.
#[derive(Debug, Clone, Serialize)]
pub struct NarrativeContext {
    pub asset_id: String,
    pub sentiment_score: Decimal,
    pub crowd_action: Option<String>,
    pub whale_net_flow: Decimal,
    pub divergence_type: String,
    pub dominant_behavior: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NarrativeResponse {
    insight: String,
}

/// Best-effort client for the narrative service. Every failure mode
/// (timeout, connection refused, bad payload) degrades to `None` so a
/// slow external call can never stall a scoring pass.
#[derive(Clone)]
pub struct NarrativeClient {
    http: reqwest::Client,
    url: String,
}

impl NarrativeClient {
    pub fn new(url: String, timeout_secs: u64) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self { http, url })
    }

    pub async fn generate(&self, ctx: &NarrativeContext) -> Option<String> {
        let result = self
            .http
            .post(&self.url)
            .json(ctx)
            .send()
            .await
            .and_then(|r| r.error_for_status());

        match result {
            Ok(response) => match response.json::<NarrativeResponse>().await {
                Ok(body) => Some(body.insight),
                Err(e) => {
                    counter!("narrative_failures_total").increment(1);
                    tracing::warn!(error = %e, "Narrative service returned malformed body");
                    None
                }
            },
            Err(e) => {
                counter!("narrative_failures_total").increment(1);
                let err = EngineError::ExternalServiceUnavailable(format!("narrative service: {e}"));
                tracing::debug!(error = %err, "Proceeding without insight");
                None
            }
        }
    }
}
