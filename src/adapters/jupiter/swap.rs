//! Jupiter Swap Types
//!
//! Request and response structures for the Jupiter swap-build API.

use serde::{Deserialize, Serialize};
use solana_sdk::transaction::VersionedTransaction;

use crate::ports::ExecutionError;

/// Request body for building a swap transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapRequest {
    /// Signer's public key (wallet address)
    pub user_public_key: String,
    /// The full quote response from /quote endpoint
    pub quote_response: serde_json::Value,
    /// Wrap SOL before and unwrap after the swap
    #[serde(default = "default_true")]
    pub wrap_and_unwrap_sol: bool,
    /// Optional prioritization fee in lamports; Jupiter picks one when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prioritization_fee_lamports: Option<u64>,
    #[serde(default = "default_true")]
    pub dynamic_compute_unit_limit: bool,
}

fn default_true() -> bool {
    true
}

impl SwapRequest {
    pub fn new(user_public_key: String, quote_response: serde_json::Value) -> Self {
        Self {
            user_public_key,
            quote_response,
            wrap_and_unwrap_sol: true,
            prioritization_fee_lamports: None,
            dynamic_compute_unit_limit: true,
        }
    }

    pub fn with_priority_fee(mut self, lamports: Option<u64>) -> Self {
        self.prioritization_fee_lamports = lamports;
        self
    }
}

/// Response from Jupiter swap API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapResponse {
    /// Base64 encoded serialized transaction ready to sign and send
    pub swap_transaction: String,
    pub last_valid_block_height: u64,
    #[serde(default)]
    pub prioritization_fee_lamports: u64,
}

impl SwapResponse {
    /// Get the transaction bytes from base64
    pub fn transaction_bytes(&self) -> Result<Vec<u8>, base64::DecodeError> {
        use base64::Engine;
        base64::engine::general_purpose::STANDARD.decode(&self.swap_transaction)
    }

    /// Decode the unsigned versioned transaction
    pub fn transaction(&self) -> Result<VersionedTransaction, ExecutionError> {
        let bytes = self
            .transaction_bytes()
            .map_err(|e| ExecutionError::InvalidResponse(format!("swapTransaction base64: {}", e)))?;
        bincode::deserialize(&bytes)
            .map_err(|e| ExecutionError::InvalidResponse(format!("swapTransaction decode: {}", e)))
    }
}
