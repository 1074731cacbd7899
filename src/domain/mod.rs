//! Domain Layer - Core types and rules for the liquidity engine
//!
//! Pure logic with no I/O. All external interactions happen through the
//! ports layer.

pub mod allocation;
pub mod circuit_breaker;
pub mod event;
pub mod market_status;
pub mod state;

pub use allocation::{lamports_to_sol, sol_to_lamports, Allocation, LAMPORTS_PER_SOL};
pub use circuit_breaker::{
    CircuitBreakerError, CircuitBreakerMonitor, CircuitBreakerStatus, PriceImpactBreaker,
};
pub use event::{fill_percentage, EngineEvent, EngineStatus, EventKind};
pub use market_status::{MarketStatus, VenueListing, GRADUATION_MARKET_CAP_USD};
pub use state::EngineRuntimeState;
