//! TIDE - Autonomous buyback and liquidity engine for Solana
//!
//! Watches an accumulator wallet and, once it crosses a threshold, buys the
//! token back through Jupiter and pairs part of the balance for liquidity.
//!
//! # Modules
//!
//! - `domain`: Core rules (allocation split, circuit breaker, market status, events)
//! - `ports`: Trait abstractions (BalanceOracle, MarketStatusOracle, SwapGateway)
//! - `adapters`: External implementations (Solana, Jupiter, DexScreener, simulation, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: Engine state machine, scheduler and event feed

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod config;
pub mod application;
