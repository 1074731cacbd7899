//! Jupiter Quote Types
//!
//! Request and response structures for the Jupiter quote API, validated at
//! the boundary before they reach the engine.

use serde::{Deserialize, Serialize};

use crate::ports::{ExecutionError, SwapQuote};

/// Query parameters for the `/quote` endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
    /// Input token mint address
    pub input_mint: String,
    /// Output token mint address
    pub output_mint: String,
    /// Amount in base units (lamports for SOL)
    pub amount: u64,
    /// Slippage tolerance in basis points (1 = 0.01%)
    pub slippage_bps: u16,
    /// Only use direct routes (no intermediate tokens)
    #[serde(default)]
    pub only_direct_routes: bool,
}

impl QuoteParams {
    pub fn new(input_mint: String, output_mint: String, amount: u64, slippage_bps: u16) -> Self {
        Self {
            input_mint,
            output_mint,
            amount,
            slippage_bps,
            only_direct_routes: false,
        }
    }

    pub fn with_direct_routes(mut self, direct: bool) -> Self {
        self.only_direct_routes = direct;
        self
    }
}

impl From<crate::ports::QuoteRequest> for QuoteParams {
    fn from(req: crate::ports::QuoteRequest) -> Self {
        Self::new(req.input_mint, req.output_mint, req.amount, req.slippage_bps)
    }
}

/// Response from Jupiter quote API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    pub input_mint: String,
    pub output_mint: String,
    /// Input amount in base units
    pub in_amount: String,
    /// Output amount in base units
    pub out_amount: String,
    /// Minimum output amount after slippage
    pub other_amount_threshold: String,
    /// ExactIn or ExactOut
    pub swap_mode: String,
    pub slippage_bps: u16,
    /// Price impact percentage (as string)
    #[serde(default)]
    pub price_impact_pct: String,
    pub route_plan: Vec<RoutePlanStep>,
    #[serde(default)]
    pub context_slot: Option<u64>,
    /// Catch-all so the payload can be handed back to `/swap` untouched
    #[serde(flatten)]
    pub extra: std::collections::HashMap<String, serde_json::Value>,
}

fn parse_amount(field: &str, raw: &str) -> Result<u64, ExecutionError> {
    raw.parse::<u64>()
        .map_err(|_| ExecutionError::InvalidResponse(format!("{} is not an integer: {:?}", field, raw)))
}

impl QuoteResponse {
    /// Price impact as f64 percentage. Empty string means no measurable impact.
    pub fn price_impact(&self) -> Result<f64, ExecutionError> {
        if self.price_impact_pct.trim().is_empty() {
            return Ok(0.0);
        }
        self.price_impact_pct.trim().parse::<f64>().map_err(|_| {
            ExecutionError::InvalidResponse(format!(
                "priceImpactPct is not a number: {:?}",
                self.price_impact_pct
            ))
        })
    }

    /// "Raydium > Orca" style route label
    pub fn route_label(&self) -> String {
        self.route_plan
            .iter()
            .map(|step| step.swap_info.label.as_str())
            .collect::<Vec<_>>()
            .join(" > ")
    }

    /// Validate and convert into the port-level quote
    pub fn into_swap_quote(self) -> Result<SwapQuote, ExecutionError> {
        if self.route_plan.is_empty() {
            return Err(ExecutionError::NoRoute(format!(
                "{} -> {}",
                self.input_mint, self.output_mint
            )));
        }

        let in_amount = parse_amount("inAmount", &self.in_amount)?;
        let out_amount = parse_amount("outAmount", &self.out_amount)?;
        let min_out_amount = parse_amount("otherAmountThreshold", &self.other_amount_threshold)?;
        let price_impact_pct = self.price_impact()?;
        let route = self.route_label();
        let raw = serde_json::to_value(&self)
            .map_err(|e| ExecutionError::InvalidResponse(e.to_string()))?;

        Ok(SwapQuote {
            input_mint: self.input_mint,
            output_mint: self.output_mint,
            in_amount,
            out_amount,
            min_out_amount,
            price_impact_pct,
            route,
            raw,
        })
    }
}

/// A step in the route plan
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutePlanStep {
    pub swap_info: SwapInfo,
    /// Percentage of the trade going through this route
    pub percent: u8,
}

/// Information about a single swap in the route
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapInfo {
    /// AMM key (pool identifier)
    pub amm_key: String,
    /// Label for the DEX (e.g., "Raydium", "Orca")
    #[serde(default)]
    pub label: String,
    pub input_mint: String,
    pub output_mint: String,
    pub in_amount: String,
    pub out_amount: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_amount: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fee_mint: Option<String>,
}
