use async_trait::async_trait;
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    commitment_config::CommitmentConfig, pubkey::Pubkey, transaction::VersionedTransaction,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::lamports_to_sol;
use crate::ports::{BalanceOracle, OracleError};

#[derive(Debug, Error)]
pub enum SolanaClientError {
    #[error("RPC request failed: {0}")]
    RpcError(String),
    #[error("Transaction failed: {0}")]
    TransactionError(String),
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),
}

impl From<SolanaClientError> for OracleError {
    fn from(err: SolanaClientError) -> Self {
        match err {
            SolanaClientError::InvalidPublicKey(key) => OracleError::InvalidAddress(key),
            other => OracleError::Rpc(other.to_string()),
        }
    }
}

/// Wrapper around Solana RPC client with async-compatible methods
#[derive(Clone)]
pub struct SolanaClient {
    client: Arc<RpcClient>,
}

impl SolanaClient {
    /// Create a new Solana RPC client at `confirmed` commitment
    pub fn new(rpc_url: String, timeout: Duration) -> Self {
        let client = Arc::new(RpcClient::new_with_timeout_and_commitment(
            rpc_url,
            timeout,
            CommitmentConfig::confirmed(),
        ));
        Self { client }
    }

    pub fn url(&self) -> String {
        self.client.url()
    }

    /// Get SOL balance in lamports for a public key
    pub async fn get_balance(&self, pubkey: &str) -> Result<u64, SolanaClientError> {
        let pubkey = Pubkey::from_str(pubkey)
            .map_err(|e| SolanaClientError::InvalidPublicKey(format!("{}: {}", pubkey, e)))?;

        // Spawn blocking to make sync RPC call async-compatible
        let client = Arc::clone(&self.client);
        tokio::task::spawn_blocking(move || {
            client
                .get_balance(&pubkey)
                .map_err(|e| SolanaClientError::RpcError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }

    /// Submit a signed transaction and block until it is confirmed
    pub async fn send_and_confirm_transaction(
        &self,
        transaction: VersionedTransaction,
    ) -> Result<String, SolanaClientError> {
        let client = Arc::clone(&self.client);

        tokio::task::spawn_blocking(move || {
            client
                .send_and_confirm_transaction(&transaction)
                .map(|sig| sig.to_string())
                .map_err(|e| SolanaClientError::TransactionError(e.to_string()))
        })
        .await
        .map_err(|e| SolanaClientError::RpcError(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl BalanceOracle for SolanaClient {
    async fn native_balance(&self, address: &str) -> Result<f64, OracleError> {
        let lamports = self.get_balance(address).await?;
        Ok(lamports_to_sol(lamports))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> SolanaClient {
        SolanaClient::new("https://api.devnet.solana.com".to_string(), Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_client_creation() {
        assert_eq!(client().url(), "https://api.devnet.solana.com");
    }

    #[tokio::test]
    async fn test_invalid_address_rejected_before_rpc() {
        let err = client().native_balance("not-a-pubkey").await.unwrap_err();
        assert!(matches!(err, OracleError::InvalidAddress(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SolanaClientError::RpcError("test".to_string());
        assert!(err.to_string().contains("RPC request failed"));

        let oracle: OracleError = SolanaClientError::TransactionError("x".into()).into();
        assert!(matches!(oracle, OracleError::Rpc(_)));
    }
}
