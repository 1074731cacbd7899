//! DexScreener Client
//!
//! Classifies a token as bonding-curve or graduated from its primary pair
//! listing on DexScreener.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

use super::types::TokenPairsResponse;
use crate::config::{Config, DEFAULT_DEXSCREENER_API_URL};
use crate::domain::MarketStatus;
use crate::ports::{MarketStatusOracle, OracleError};

#[derive(Debug, Clone)]
pub struct DexScreenerConfig {
    pub api_base_url: String,
    pub timeout: Duration,
}

impl Default for DexScreenerConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_DEXSCREENER_API_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl From<&Config> for DexScreenerConfig {
    fn from(config: &Config) -> Self {
        Self {
            api_base_url: config.dexscreener_api_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.call_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DexScreenerClient {
    config: DexScreenerConfig,
    http: Client,
}

impl DexScreenerClient {
    pub fn with_config(config: DexScreenerConfig) -> Result<Self, OracleError> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Http(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, http })
    }

    /// Raw pair listings for a token mint
    pub async fn token_pairs(&self, token_mint: &str) -> Result<TokenPairsResponse, OracleError> {
        let url = format!("{}/tokens/{}", self.config.api_base_url, token_mint);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| OracleError::Http(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(OracleError::Http("Rate limited by DexScreener".into()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OracleError::Http(format!("DexScreener {}: {}", status, body)));
        }

        response
            .json::<TokenPairsResponse>()
            .await
            .map_err(|e| OracleError::InvalidResponse(e.to_string()))
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }
}

/// Classify a DexScreener reply
pub fn classify_pairs(response: &TokenPairsResponse) -> MarketStatus {
    let listing = response.primary_pair().map(|pair| pair.to_listing());
    MarketStatus::classify(listing.as_ref())
}

#[async_trait]
impl MarketStatusOracle for DexScreenerClient {
    async fn market_status(&self, token_mint: &str) -> Result<MarketStatus, OracleError> {
        let pairs = self.token_pairs(token_mint).await?;
        let status = classify_pairs(&pairs);

        tracing::debug!(
            "Market status for {}: graduated={} progress={:.1}% mcap=${:.0}",
            token_mint,
            status.graduated,
            status.bonding_curve_progress,
            status.market_cap
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(json: &str) -> TokenPairsResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_null_pairs_is_unlisted() {
        let status = classify_pairs(&parse(r#"{"schemaVersion":"1.0.0","pairs":null}"#));
        assert!(status.is_on_bonding_curve);
        assert!(!status.graduated);
        assert_eq!(status.bonding_curve_progress, 0.0);
    }

    #[test]
    fn test_raydium_primary_pair_is_graduated() {
        let status = classify_pairs(&parse(
            r#"{"pairs":[
                {"chainId":"solana","dexId":"raydium","pairAddress":"RayPair1","fdv":152000.5},
                {"chainId":"solana","dexId":"pumpfun","pairAddress":"Curve1","fdv":150000}
            ]}"#,
        ));
        assert!(status.graduated);
        assert!(!status.is_on_bonding_curve);
        assert_eq!(status.pair_address.as_deref(), Some("RayPair1"));
        assert_relative_eq!(status.market_cap, 152000.5);
    }

    #[test]
    fn test_curve_pair_reports_progress() {
        let status = classify_pairs(&parse(
            r#"{"pairs":[{"chainId":"solana","dexId":"pumpfun","pairAddress":"Curve1","fdv":34500}]}"#,
        ));
        assert!(status.is_on_bonding_curve);
        assert_relative_eq!(status.bonding_curve_progress, 50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_missing_fdv_falls_back_to_market_cap() {
        let status = classify_pairs(&parse(
            r#"{"pairs":[{"dexId":"pumpswap","marketCap":6900}]}"#,
        ));
        assert_relative_eq!(status.bonding_curve_progress, 10.0, epsilon = 1e-9);
    }

    #[test]
    fn test_config_trims_trailing_slash() {
        let mut config = Config::new(crate::config::SigningCredential::Base58("k".into()), "Mint");
        config.dexscreener_api_url = "https://dex.example/latest/dex/".to_string();
        config.call_timeout_secs = 3;
        let client = DexScreenerClient::with_config(DexScreenerConfig::from(&config)).unwrap();
        assert_eq!(client.api_base_url(), "https://dex.example/latest/dex");
    }
}
