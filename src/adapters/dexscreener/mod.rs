//! DexScreener Adapter
//!
//! MarketStatusOracle implementation backed by the public DexScreener API.

mod client;
mod types;

pub use client::{classify_pairs, DexScreenerClient, DexScreenerConfig};
pub use types::{DexPair, TokenPairsResponse};
