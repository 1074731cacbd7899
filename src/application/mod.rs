//! Application Layer - the engine state machine, its scheduler and the
//! event/status feed

pub mod engine;
pub mod feed;
pub mod scheduler;

pub use engine::{
    BuybackEngine, CycleOutcome, CycleReport, EngineError, EngineSettings, LiquidityLeg,
    Observations,
};
pub use feed::{read_events_file, EventFeed, FeedError};
pub use scheduler::{Scheduler, TickOutcome};
