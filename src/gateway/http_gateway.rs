//! HTTP implementation of the portfolio gateway over reqwest.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::constants::{DEFAULT_API_BASE_URL, DEFAULT_GATEWAY_TIMEOUT_SECS};
use crate::errors::{GatewayError, Result};
use crate::gateway::{PerformancePayload, PortfolioGateway, PortfolioPayload};
use crate::gateway::HoldingRecord;
use crate::holdings::holdings_model::{HoldingInput, HoldingPatch};

/// REST client for the portfolio service:
/// `GET /portfolio`, `GET /portfolio/performance`,
/// `POST/PUT/DELETE /portfolio/holdings`.
pub struct HttpPortfolioGateway {
    client: Client,
    base_url: String,
}

impl HttpPortfolioGateway {
    /// Creates a gateway for the given base URL (e.g. `http://host/api`).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_GATEWAY_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    /// Sends a request and returns the response body, mapping transport and
    /// status failures to [`GatewayError`].
    async fn execute(&self, request: RequestBuilder, path: &str) -> Result<String> {
        debug!("Gateway request: {}", path);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                GatewayError::Timeout
            } else {
                GatewayError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                message: extract_error_message(&body, status),
            }
            .into());
        }

        response
            .text()
            .await
            .map_err(|e| GatewayError::Network(format!("Failed to read response: {}", e)).into())
    }
}

impl Default for HttpPortfolioGateway {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}

/// Decodes a JSON body, mapping parse failures to
/// [`GatewayError::MalformedPayload`].
fn decode<T: DeserializeOwned>(body: &str) -> Result<T> {
    serde_json::from_str(body)
        .map_err(|e| GatewayError::MalformedPayload(e.to_string()).into())
}

/// Pulls the `error` field out of a JSON error body, falling back to the
/// raw body or the status text.
fn extract_error_message(body: &str, status: StatusCode) -> String {
    #[derive(serde::Deserialize)]
    struct ErrorBody {
        error: Option<String>,
    }

    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(message) = parsed.error {
            return message;
        }
    }
    if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        body.trim().to_string()
    }
}

#[async_trait]
impl PortfolioGateway for HttpPortfolioGateway {
    async fn get_portfolio(&self) -> Result<PortfolioPayload> {
        let body = self
            .execute(self.request(Method::GET, "/portfolio"), "/portfolio")
            .await?;
        decode(&body)
    }

    async fn get_performance(&self) -> Result<PerformancePayload> {
        let body = self
            .execute(
                self.request(Method::GET, "/portfolio/performance"),
                "/portfolio/performance",
            )
            .await?;
        decode(&body)
    }

    async fn create_holding(&self, input: &HoldingInput) -> Result<Option<HoldingRecord>> {
        let body = self
            .execute(
                self.request(Method::POST, "/portfolio/holdings").json(input),
                "/portfolio/holdings",
            )
            .await?;
        if body.trim().is_empty() {
            return Ok(None);
        }
        decode(&body).map(Some)
    }

    async fn update_holding(&self, id: &str, patch: &HoldingPatch) -> Result<()> {
        let path = format!("/portfolio/holdings/{}", id);
        self.execute(self.request(Method::PUT, &path).json(patch), &path)
            .await?;
        Ok(())
    }

    async fn delete_holding(&self, id: &str) -> Result<()> {
        let path = format!("/portfolio/holdings/{}", id);
        self.execute(self.request(Method::DELETE, &path), &path)
            .await?;
        Ok(())
    }
}
