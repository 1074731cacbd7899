//! CLI Adapter
//!
//! Command-line interface for the engine.
//! Uses clap derive macros for argument parsing.

mod commands;

pub use commands::{CliApp, Command, OutputFormat, QuoteCmd, RunCmd, StatusCmd};
