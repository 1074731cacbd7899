//! Circuit Breaker
//!
//! Price impact protection for the buyback leg. A quote whose reported price
//! impact exceeds the configured slippage tolerance trips the breaker and the
//! cycle is abandoned before any swap is submitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default maximum slippage in basis points (5%)
pub const DEFAULT_MAX_SLIPPAGE_BPS: u16 = 500;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CircuitBreakerError {
    #[error("Circuit breaker tripped: price impact {0:.2}% exceeds maximum {1:.2}%")]
    PriceImpactExceeded(f64, f64),
}

/// Status of the circuit breaker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitBreakerStatus {
    /// Last inspected quote was acceptable
    Active,
    /// Last inspected quote exceeded the tolerance
    Tripped,
}

impl CircuitBreakerStatus {
    pub fn can_trade(&self) -> bool {
        matches!(self, CircuitBreakerStatus::Active)
    }

    pub fn description(&self) -> &'static str {
        match self {
            CircuitBreakerStatus::Active => "Price impact within tolerance",
            CircuitBreakerStatus::Tripped => "Circuit breaker TRIPPED - last quote rejected",
        }
    }
}

/// A rejected quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TripRecord {
    pub at: DateTime<Utc>,
    pub price_impact_pct: f64,
}

/// Stateless price impact check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceImpactBreaker {
    max_slippage_bps: u16,
}

impl Default for PriceImpactBreaker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SLIPPAGE_BPS)
    }
}

impl PriceImpactBreaker {
    pub fn new(max_slippage_bps: u16) -> Self {
        Self { max_slippage_bps }
    }

    /// Tolerance expressed as a percentage (500 bps = 5.0%)
    pub fn max_impact_pct(&self) -> f64 {
        self.max_slippage_bps as f64 / 100.0
    }

    pub fn max_slippage_bps(&self) -> u16 {
        self.max_slippage_bps
    }

    /// Passes when impact is at or below the tolerance
    pub fn check(&self, price_impact_pct: f64) -> Result<(), CircuitBreakerError> {
        let max = self.max_impact_pct();
        if price_impact_pct > max || price_impact_pct.is_nan() {
            return Err(CircuitBreakerError::PriceImpactExceeded(price_impact_pct, max));
        }
        Ok(())
    }
}

/// Observed breaker state for the status feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMonitor {
    status: CircuitBreakerStatus,
    trip_count: u64,
    last_trip: Option<TripRecord>,
}

impl Default for CircuitBreakerMonitor {
    fn default() -> Self {
        Self {
            status: CircuitBreakerStatus::Active,
            trip_count: 0,
            last_trip: None,
        }
    }
}

impl CircuitBreakerMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_trip(&mut self, price_impact_pct: f64, at: DateTime<Utc>) {
        self.status = CircuitBreakerStatus::Tripped;
        self.trip_count += 1;
        self.last_trip = Some(TripRecord { at, price_impact_pct });
    }

    /// A later quote passed the check
    pub fn record_pass(&mut self) {
        self.status = CircuitBreakerStatus::Active;
    }

    pub fn status(&self) -> CircuitBreakerStatus {
        self.status
    }

    pub fn is_tripped(&self) -> bool {
        self.status == CircuitBreakerStatus::Tripped
    }

    pub fn trip_count(&self) -> u64 {
        self.trip_count
    }

    pub fn last_trip(&self) -> Option<&TripRecord> {
        self.last_trip.as_ref()
    }
}
