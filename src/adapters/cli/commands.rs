//! CLI Command Definitions
//!
//! Arguments for the engine's commands. Handlers live in the binary.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// TIDE - autonomous buyback and liquidity engine for Solana
#[derive(Parser, Debug)]
#[command(
    name = "tide-engine",
    version = env!("CARGO_PKG_VERSION"),
    about = "Autonomous buyback and liquidity engine for Solana",
    long_about = "Watches an accumulator wallet and, once it crosses the trigger threshold, \
                  buys the token back through Jupiter and pairs part of the balance for \
                  liquidity. Simulation is the default; live mode must be requested explicitly."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the engine loop
    Run(RunCmd),

    /// Read balance and market status once and print the snapshot
    Status(StatusCmd),

    /// Quote a SOL -> token buyback and show the circuit breaker verdict
    Quote(QuoteCmd),
}

/// Start the engine loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Optional TOML configuration file (environment overrides it)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Force simulation regardless of ENGINE_MODE
    #[arg(short, long, conflicts_with = "live")]
    pub simulate: bool,

    /// Force live mode (requires --i-accept-losses)
    #[arg(long)]
    pub live: bool,

    /// Acknowledge risk of financial loss (required for live mode)
    #[arg(long)]
    pub i_accept_losses: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One-shot status read
#[derive(Parser, Debug)]
pub struct StatusCmd {
    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Buyback quote
#[derive(Parser, Debug)]
pub struct QuoteCmd {
    /// Amount of SOL to quote
    #[arg(value_name = "AMOUNT")]
    pub amount: f64,

    /// Optional TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Slippage tolerance in basis points (defaults to MAX_SLIPPAGE_BPS)
    #[arg(long, value_name = "BPS")]
    pub slippage: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_app_parse_run() {
        let args = vec!["tide-engine", "run", "--config", "engine.toml"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, Some(PathBuf::from("engine.toml")));
                assert!(!cmd.simulate);
                assert!(!cmd.live);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_defaults() {
        let app = CliApp::try_parse_from(vec!["tide-engine", "run"]).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert!(cmd.config.is_none());
                assert!(!cmd.i_accept_losses);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_cli_app_parse_run_with_live() {
        let args = vec!["tide-engine", "run", "--live", "--i-accept-losses"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Run(cmd) => {
                assert!(cmd.live);
                assert!(cmd.i_accept_losses);
                assert!(!cmd.simulate);
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_simulate_conflicts_with_live() {
        let args = vec!["tide-engine", "run", "--simulate", "--live"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_status() {
        let args = vec!["tide-engine", "status", "--format", "json"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Status(cmd) => assert_eq!(cmd.format, OutputFormat::Json),
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_status_rejects_unknown_format() {
        let args = vec!["tide-engine", "status", "--format", "table"];
        assert!(CliApp::try_parse_from(args).is_err());
    }

    #[test]
    fn test_cli_app_parse_quote() {
        let args = vec!["tide-engine", "quote", "1.5", "--slippage", "100"];
        let app = CliApp::try_parse_from(args).unwrap();

        match app.command {
            Command::Quote(cmd) => {
                assert_eq!(cmd.amount, 1.5);
                assert_eq!(cmd.slippage, Some(100));
            }
            _ => panic!("Expected Quote command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let args = vec!["tide-engine", "-v", "--debug", "status"];
        let app = CliApp::try_parse_from(args).unwrap();

        assert!(app.verbose);
        assert!(app.debug);
    }
}
