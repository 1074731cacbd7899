//! Ports Layer - Trait definitions for external dependencies
//!
//! Following hexagonal architecture, these traits abstract:
//! - Balance reads (Solana RPC)
//! - Market status classification (DEX aggregator)
//! - Swap quoting and execution (Jupiter)

pub mod execution;
pub mod oracle;
pub mod models;
pub mod mocks;

pub use execution::{ExecutionError, SwapGateway};
pub use oracle::{BalanceOracle, MarketStatusOracle, OracleError};
pub use models::{ExecutedSwap, QuoteRequest, SwapLeg, SwapQuote, SwapTag, SOL_MINT};
