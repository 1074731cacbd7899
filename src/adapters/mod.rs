//! Adapters Layer - External System Implementations
//!
//! This module contains implementations of the port traits:
//! - Solana: RPC balance reads, transaction submission, wallet loading
//! - Jupiter: DEX aggregator quotes and live swap execution
//! - DexScreener: bonding curve / graduation classification
//! - Simulation: synthetic execution around a real quote source
//! - CLI: Command-line interface definitions

pub mod cli;
pub mod dexscreener;
pub mod jupiter;
pub mod simulation;
pub mod solana;

pub use cli::CliApp;
pub use dexscreener::DexScreenerClient;
pub use jupiter::{JupiterClient, JupiterSwapGateway};
pub use simulation::SimulatedSwapGateway;
pub use solana::{SolanaClient, WalletManager};
