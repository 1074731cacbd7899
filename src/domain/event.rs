//! Engine events and status snapshot
//!
//! The JSON shape (camelCase keys, epoch-millisecond timestamps) is what the
//! dashboard reads, so field names follow its vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of a feed entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Cycle trigger marker (dashboard vocabulary, not emitted by the engine)
    Trigger,
    Buyback,
    LpAdd,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Trigger => "trigger",
            EventKind::Buyback => "buyback",
            EventKind::LpAdd => "lp_add",
        }
    }
}

/// One successful sub-action. Immutable once emitted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineEvent {
    pub id: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub tx_signature: String,
    #[serde(rename = "buyAmountSOL")]
    pub buy_amount_sol: f64,
    /// Raw token base units from the quote
    pub buy_amount_token: u64,
    #[serde(rename = "lpAddedSOL")]
    pub lp_added_sol: f64,
    pub lp_added_token: u64,
    pub accumulator_balance_before: f64,
    pub accumulator_balance_after: f64,
}

impl EngineEvent {
    pub fn buyback(
        cycle: u64,
        timestamp: DateTime<Utc>,
        tx_signature: String,
        amount_sol: f64,
        amount_token: u64,
        balance_before: f64,
    ) -> Self {
        Self {
            id: format!("evt-{}-{}", cycle, EventKind::Buyback.as_str()),
            timestamp,
            kind: EventKind::Buyback,
            tx_signature,
            buy_amount_sol: amount_sol,
            buy_amount_token: amount_token,
            lp_added_sol: 0.0,
            lp_added_token: 0,
            accumulator_balance_before: balance_before,
            accumulator_balance_after: (balance_before - amount_sol).max(0.0),
        }
    }

    /// `amount_sol` is the full liquidity allocation; only `spent_sol` (the
    /// swapped half) leaves the wallet, the native half stays for pairing.
    pub fn liquidity_add(
        cycle: u64,
        timestamp: DateTime<Utc>,
        tx_signature: String,
        amount_sol: f64,
        spent_sol: f64,
        amount_token: u64,
        balance_before: f64,
    ) -> Self {
        Self {
            id: format!("evt-{}-{}", cycle, EventKind::LpAdd.as_str()),
            timestamp,
            kind: EventKind::LpAdd,
            tx_signature,
            buy_amount_sol: 0.0,
            buy_amount_token: 0,
            lp_added_sol: amount_sol,
            lp_added_token: amount_token,
            accumulator_balance_before: balance_before,
            accumulator_balance_after: (balance_before - spent_sol).max(0.0),
        }
    }
}

/// Everything a dashboard needs to render the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub accumulator_balance: f64,
    pub trigger_threshold: f64,
    pub fill_percentage: f64,
    /// Seconds
    pub cooldown_remaining: u64,
    pub max_slippage_bps: u16,
    pub circuit_breaker_active: bool,
    /// Epoch ms, 0 = never
    pub last_trigger_time: i64,
    pub last_trigger_tx: String,
    /// Seconds until the engine may trigger again
    pub next_trigger_estimate: u64,
    pub total_buybacks: f64,
    pub total_liquidity_added: f64,
    pub total_events_count: usize,
    pub cycle_count: u64,
    pub mode: String,
    pub graduated: bool,
    pub bonding_curve_progress: f64,
    pub pending_liquidity: f64,
}

/// `balance / threshold * 100`, 0 for a non-positive threshold
pub fn fill_percentage(balance: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 {
        return 0.0;
    }
    balance / threshold * 100.0
}
