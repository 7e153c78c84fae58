//! HTTP client for a remote `recipe-engine`
//!
//! Engine error bodies are mapped back to the engine error kind, so a remote
//! `UnsupportedShape` is reported exactly like a local one. Anything else that
//! goes wrong on the wire becomes `Error::Transport`.

use std::time::Duration;

use async_trait::async_trait;
use recipe_common::api::{BalanceRequest, ErrorResponse, PanRequest, CORRELATION_ID_HEADER};
use recipe_common::http::CorrelationId;
use recipe_common::{Error, Pans, Recipe, RecipeAggregate, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::service::{BalancerService, CalculatorService};

/// Remote calculator and balancer
#[derive(Debug, Clone)]
pub struct RemoteEngineClient {
    client: reqwest::Client,
    calculator_url: String,
    balancer_url: String,
}

impl RemoteEngineClient {
    /// Create a client for the given engine base URLs
    pub fn new(calculator_url: &str, balancer_url: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("recipe-manager/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            calculator_url: calculator_url.trim_end_matches('/').to_string(),
            balancer_url: balancer_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, T>(&self, url: &str, ctx: &CorrelationId, body: &B) -> Result<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        debug!(url, "Calling remote engine");

        let response = self
            .client
            .post(url)
            .header(CORRELATION_ID_HEADER, ctx.as_str())
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Transport(format!("POST {} failed: {}", url, e)))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::Transport(format!("Reading response from {} failed: {}", url, e)))?;

        if status.is_success() {
            return serde_json::from_slice(&bytes).map_err(|e| {
                Error::Transport(format!("Unexpected response from {}: {}", url, e))
            });
        }

        match serde_json::from_slice::<ErrorResponse>(&bytes) {
            Ok(body) => Err(body.error.into_error()),
            Err(_) => Err(Error::Transport(format!("{} returned {}", url, status))),
        }
    }
}

#[async_trait]
impl CalculatorService for RemoteEngineClient {
    async fn total_pans_area(&self, ctx: &CorrelationId, request: &PanRequest) -> Result<Pans> {
        let url = format!("{}/pans/total", self.calculator_url);
        self.post(&url, ctx, request).await
    }
}

#[async_trait]
impl BalancerService for RemoteEngineClient {
    async fn balance(
        &self,
        ctx: &CorrelationId,
        recipe: &Recipe,
        pans: &Pans,
    ) -> Result<RecipeAggregate> {
        let url = format!("{}/balance", self.balancer_url);
        let body = BalanceRequest {
            recipe: recipe.clone(),
            pans: pans.clone(),
        };
        self.post(&url, ctx, &body).await
    }
}
