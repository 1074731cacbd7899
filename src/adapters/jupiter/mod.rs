//! Jupiter Adapter
//!
//! Implementation of the SwapGateway port on top of the Jupiter aggregator.
//! Handles quote fetching, swap building, signing and submission.

mod client;
mod gateway;
mod quote;
mod swap;

pub use client::{JupiterClient, JupiterConfig};
pub use gateway::JupiterSwapGateway;
pub use quote::{QuoteParams, QuoteResponse};
pub use swap::{SwapRequest, SwapResponse};
