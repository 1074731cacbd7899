//! Engine Runtime State
//!
//! Process-lifetime counters owned by the engine controller. Never persisted:
//! a restart resets cooldown and cumulative totals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Mutable state threaded through every `evaluate_cycle` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineRuntimeState {
    /// Completion time of the last executed cycle (None = never triggered)
    pub last_trigger: Option<DateTime<Utc>>,
    /// Transaction reference of the last executed buyback
    pub last_trigger_tx: Option<String>,
    /// Cumulative native currency allocated to buybacks
    pub total_buyback: f64,
    /// Cumulative native currency allocated to liquidity
    pub total_liquidity: f64,
    /// Number of executed cycles
    pub cycle_count: u64,
    /// Liquidity pair discovered at graduation when none was configured
    pub discovered_pair: Option<String>,
    /// Liquidity allocation whose half-swap failed and still sits in the wallet
    pub pending_liquidity: f64,
}

impl EngineRuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining cooldown at `now`, or None when the engine may trigger
    pub fn cooldown_remaining(&self, now: DateTime<Utc>, cooldown: Duration) -> Option<Duration> {
        let last = self.last_trigger?;
        let elapsed = now - last;
        if elapsed < cooldown {
            Some(cooldown - elapsed)
        } else {
            None
        }
    }

    /// Whole seconds of cooldown left, rounded up (0 when elapsed)
    pub fn cooldown_remaining_secs(&self, now: DateTime<Utc>, cooldown: Duration) -> u64 {
        self.cooldown_remaining(now, cooldown)
            .map(|d| {
                let ms = d.num_milliseconds().max(0) as u64;
                ms.div_ceil(1000)
            })
            .unwrap_or(0)
    }

    /// Last trigger as epoch milliseconds, 0 when never triggered
    pub fn last_trigger_ms(&self) -> i64 {
        self.last_trigger.map(|t| t.timestamp_millis()).unwrap_or(0)
    }

    /// Record a completed cycle
    pub fn record_cycle(
        &mut self,
        now: DateTime<Utc>,
        buyback_tx: String,
        buyback_amount: f64,
        liquidity_added: Option<f64>,
    ) {
        self.last_trigger = Some(now);
        self.last_trigger_tx = Some(buyback_tx);
        self.cycle_count += 1;
        self.total_buyback += buyback_amount;
        if let Some(amount) = liquidity_added {
            self.total_liquidity += amount;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn test_fresh_state_has_no_cooldown() {
        let state = EngineRuntimeState::new();
        assert!(state.cooldown_remaining(t(0), Duration::seconds(300)).is_none());
        assert_eq!(state.last_trigger_ms(), 0);
        assert_eq!(state.cycle_count, 0);
    }

    #[test]
    fn test_cooldown_counts_down() {
        let mut state = EngineRuntimeState::new();
        state.record_cycle(t(0), "sig".into(), 1.0, Some(0.5));

        assert_eq!(state.cooldown_remaining_secs(t(100), Duration::seconds(300)), 200);
        assert_eq!(state.cooldown_remaining_secs(t(300), Duration::seconds(300)), 0);
        assert!(state.cooldown_remaining(t(301), Duration::seconds(300)).is_none());
    }

    #[test]
    fn test_cooldown_rounds_up_partial_seconds() {
        let mut state = EngineRuntimeState::new();
        state.record_cycle(t(0), "sig".into(), 1.0, None);
        let now = t(10) + Duration::milliseconds(500);
        assert_eq!(state.cooldown_remaining_secs(now, Duration::seconds(300)), 290);
    }

    #[test]
    fn test_record_cycle_skips_missing_liquidity() {
        let mut state = EngineRuntimeState::new();
        state.record_cycle(t(0), "a".into(), 1.8, None);
        state.record_cycle(t(400), "b".into(), 1.8, Some(1.2));

        assert_eq!(state.cycle_count, 2);
        assert!((state.total_buyback - 3.6).abs() < 1e-9);
        assert!((state.total_liquidity - 1.2).abs() < 1e-9);
        assert_eq!(state.last_trigger_tx.as_deref(), Some("b"));
    }
}
