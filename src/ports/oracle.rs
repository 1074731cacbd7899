use async_trait::async_trait;
use thiserror::Error;

use crate::domain::MarketStatus;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("RPC request failed: {0}")]
    Rpc(String),
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("Invalid address: {0}")]
    InvalidAddress(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Native balance of a wallet
#[async_trait]
pub trait BalanceOracle: Send + Sync {
    /// Balance in native units (SOL, not lamports)
    async fn native_balance(&self, address: &str) -> Result<f64, OracleError>;
}

/// Bonding curve vs graduated classification of a token
#[async_trait]
pub trait MarketStatusOracle: Send + Sync {
    async fn market_status(&self, token_mint: &str) -> Result<MarketStatus, OracleError>;
}
