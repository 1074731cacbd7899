use async_trait::async_trait;
use thiserror::Error;

use super::models::{ExecutedSwap, QuoteRequest, SwapQuote, SwapTag};

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("No route available: {0}")]
    NoRoute(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Transaction signing failed: {0}")]
    SigningError(String),
    #[error("Transaction execution failed: {0}")]
    ExecutionFailed(String),
    #[error("Slippage tolerance exceeded")]
    SlippageExceeded,
    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

/// Quote + execute contract of the swap aggregator
#[async_trait]
pub trait SwapGateway: Send + Sync {
    /// Price a swap. Read-only.
    async fn get_quote(&self, request: QuoteRequest) -> Result<SwapQuote, ExecutionError>;

    /// Submit the quoted swap and wait for confirmation
    async fn execute_swap(
        &self,
        quote: SwapQuote,
        tag: SwapTag,
    ) -> Result<ExecutedSwap, ExecutionError>;
}
