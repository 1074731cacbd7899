//! Port models shared between the engine and the swap adapters

use serde::{Deserialize, Serialize};

/// Wrapped SOL mint, used as the native side of every swap
pub const SOL_MINT: &str = "So11111111111111111111111111111111111111112";

/// Which part of the cycle a swap belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SwapLeg {
    Buyback,
    LiquidityPairing,
}

impl SwapLeg {
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapLeg::Buyback => "buyback",
            SwapLeg::LiquidityPairing => "lp",
        }
    }
}

/// Identifies a swap submission within the engine's history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapTag {
    pub leg: SwapLeg,
    /// Cycle number the swap is executed for (1-based)
    pub cycle: u64,
}

/// Quote request in aggregator terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRequest {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units (lamports for SOL)
    pub amount: u64,
    pub slippage_bps: u16,
}

impl QuoteRequest {
    /// Native SOL -> token
    pub fn buy(token_mint: &str, lamports: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint: SOL_MINT.to_string(),
            output_mint: token_mint.to_string(),
            amount: lamports,
            slippage_bps,
        }
    }
}

/// A priced swap. Time-sensitive: consumed by a single execution and never
/// carried across cycles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SwapQuote {
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: u64,
    pub out_amount: u64,
    /// Minimum output after slippage
    pub min_out_amount: u64,
    /// Price impact in percent
    pub price_impact_pct: f64,
    /// Human-readable route, e.g. "Raydium > Orca"
    pub route: String,
    /// Aggregator payload handed back on execution
    #[serde(default)]
    pub raw: serde_json::Value,
}

/// A confirmed (or simulated) swap
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutedSwap {
    pub signature: String,
    pub output_amount: u64,
    pub simulated: bool,
}
