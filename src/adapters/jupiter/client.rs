//! Jupiter API Client
//!
//! HTTP client for the Jupiter swap API (`/quote` and `/swap`).
//! Retries rate limits and server errors with backoff.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;

use super::quote::{QuoteParams, QuoteResponse};
use super::swap::{SwapRequest, SwapResponse};
use crate::config::{DEFAULT_JUPITER_API_URL, Config};
use crate::ports::ExecutionError;

/// Jupiter API client configuration
#[derive(Debug, Clone)]
pub struct JupiterConfig {
    /// Base URL for Jupiter API
    pub api_base_url: String,
    /// Optional API key for higher rate limits
    pub api_key: Option<String>,
    /// Request timeout
    pub timeout: Duration,
    /// Number of retry attempts
    pub max_retries: u32,
}

impl Default for JupiterConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_JUPITER_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 3,
        }
    }
}

impl From<&Config> for JupiterConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_base_url: config.jupiter_api_url.trim_end_matches('/').to_string(),
            api_key: config.jupiter_api_key.clone(),
            timeout: Duration::from_secs(config.call_timeout_secs),
            ..Self::default()
        }
    }
}

/// Jupiter DEX aggregator client
#[derive(Debug, Clone)]
pub struct JupiterClient {
    config: JupiterConfig,
    http: Client,
}

impl JupiterClient {
    /// Create a new Jupiter client with custom configuration
    pub fn with_config(config: JupiterConfig) -> Result<Self, ExecutionError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExecutionError::ApiError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Get a quote for a token swap
    pub async fn get_quote(&self, params: &QuoteParams) -> Result<QuoteResponse, ExecutionError> {
        let url = format!("{}/quote", self.config.api_base_url);

        let mut req = self.http.get(&url).query(&[
            ("inputMint", params.input_mint.as_str()),
            ("outputMint", params.output_mint.as_str()),
            ("amount", &params.amount.to_string()),
            ("slippageBps", &params.slippage_bps.to_string()),
        ]);

        if params.only_direct_routes {
            req = req.query(&[("onlyDirectRoutes", "true")]);
        }

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| ExecutionError::ApiError("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| ExecutionError::ApiError(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Build a swap transaction for a previously fetched quote
    pub async fn get_swap_transaction(
        &self,
        request: &SwapRequest,
    ) -> Result<SwapResponse, ExecutionError> {
        let url = format!("{}/swap", self.config.api_base_url);

        let mut req = self.http.post(&url).json(request);

        if let Some(ref api_key) = self.config.api_key {
            req = req.header("x-api-key", api_key);
        }

        let response = self
            .execute_with_retry(|| async {
                req.try_clone()
                    .ok_or_else(|| ExecutionError::ApiError("Failed to clone request".into()))?
                    .send()
                    .await
                    .map_err(|e| ExecutionError::ApiError(e.to_string()))
            })
            .await?;

        self.handle_response(response).await
    }

    /// Execute request with retry logic and rate limit handling
    async fn execute_with_retry<F, Fut>(&self, request_fn: F) -> Result<reqwest::Response, ExecutionError>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, ExecutionError>>,
    {
        let mut last_error = None;

        for attempt in 0..self.config.max_retries {
            match request_fn().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let backoff = Duration::from_secs(2u64.pow(attempt + 1)); // 2s, 4s, 8s
                        tracing::warn!(
                            "Rate limited (429), backing off for {:?} (attempt {}/{})",
                            backoff,
                            attempt + 1,
                            self.config.max_retries
                        );
                        last_error = Some(ExecutionError::ApiError("Rate limit exceeded".into()));
                        tokio::time::sleep(backoff).await;
                        continue;
                    }

                    if status.is_server_error() {
                        last_error = Some(ExecutionError::ApiError(format!("Server error: {}", status)));
                        tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    tracing::debug!("Jupiter request failed (attempt {}): {}", attempt + 1, e);
                    last_error = Some(e);
                    tokio::time::sleep(Duration::from_millis(500 * (attempt as u64 + 1))).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ExecutionError::ApiError("Max retries exceeded".into())))
    }

    /// Handle API response and deserialize
    async fn handle_response<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ExecutionError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(classify_error(status, &error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ExecutionError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    /// Get the configured API base URL
    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

/// Map a non-success Jupiter reply onto the port error
fn classify_error(status: StatusCode, body: &str) -> ExecutionError {
    if body.contains("SlippageToleranceExceeded") || body.contains("6001") {
        return ExecutionError::SlippageExceeded;
    }
    if body.contains("COULD_NOT_FIND_ANY_ROUTE") || body.contains("NO_ROUTES_FOUND") {
        return ExecutionError::NoRoute(body.to_string());
    }
    if status == StatusCode::BAD_REQUEST {
        return ExecutionError::InvalidParameters(body.to_string());
    }
    ExecutionError::ApiError(format!("API error {}: {}", status, body))
}
