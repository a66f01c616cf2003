//! HTTP client for the route-optimizer service.
//!
//! The optimizer runs as a private Cloud Run service; requests carry an
//! identity token minted by the metadata server for its URL. Local runs
//! set `BYPASS_OPTIMIZER_AUTH` and skip the token.

use anyhow::{Context, Result};
use async_trait::async_trait;

use crate::domains::scheduling::models::{OptimizationPayload, OptimizerResponse};
use crate::kernel::traits::BaseRouteOptimizer;

const METADATA_IDENTITY_URL: &str =
    "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/identity";

/// Solves take a while on big days; the deadline is generous.
const SOLVE_TIMEOUT_SECS: u64 = 300;

pub struct OptimizerClient {
    client: reqwest::Client,
    url: String,
    bypass_auth: bool,
}

impl OptimizerClient {
    pub fn new(url: String, bypass_auth: bool) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(SOLVE_TIMEOUT_SECS))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            url,
            bypass_auth,
        })
    }

    async fn identity_token(&self) -> Result<Option<String>> {
        if self.bypass_auth {
            return Ok(None);
        }

        let token = self
            .client
            .get(METADATA_IDENTITY_URL)
            .query(&[("audience", self.url.as_str())])
            .header("Metadata-Flavor", "Google")
            .timeout(std::time::Duration::from_secs(5))
            .send()
            .await
            .context("Failed to reach metadata server for identity token")?
            .error_for_status()
            .context("Metadata server rejected identity token request")?
            .text()
            .await
            .context("Failed to read identity token")?;

        Ok(Some(token))
    }
}

#[async_trait]
impl BaseRouteOptimizer for OptimizerClient {
    async fn solve(&self, payload: &OptimizationPayload) -> Result<OptimizerResponse> {
        let token = self.identity_token().await?;

        let mut request = self.client.post(&self.url).json(payload);
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }

        tracing::info!(
            items = payload.items.len(),
            technicians = payload.technicians.len(),
            locations = payload.locations.len(),
            "Calling route optimizer"
        );

        let response = request
            .send()
            .await
            .context("Failed to send optimizer request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Optimizer HTTP error {}: {}", status, body);
        }

        let parsed: OptimizerResponse = response
            .json()
            .await
            .context("Failed to parse optimizer response")?;

        tracing::info!(
            status = %parsed.status,
            routes = parsed.routes.len(),
            unassigned = parsed.unassigned_item_ids.len(),
            "Optimizer responded"
        );

        Ok(parsed)
    }
}
