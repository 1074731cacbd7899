//! Configuration Loader
//!
//! Builds the engine configuration from an optional TOML file overlaid with
//! environment variables (`.env` is loaded by the binary through dotenvy).

use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_RPC_URL: &str = "https://api.mainnet-beta.solana.com";
pub const DEFAULT_JUPITER_API_URL: &str = "https://api.jup.ag/swap/v1";
pub const DEFAULT_DEXSCREENER_API_URL: &str = "https://api.dexscreener.com/latest/dex";
pub const DEFAULT_TRIGGER_THRESHOLD_SOL: f64 = 2.5;
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 300;
pub const DEFAULT_BUYBACK_PCT: f64 = 60.0;
pub const DEFAULT_LP_ADD_PCT: f64 = 40.0;
pub const DEFAULT_MAX_SLIPPAGE_BPS: u16 = 500;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 15_000;
pub const DEFAULT_CALL_TIMEOUT_SECS: u64 = 30;
/// Covers send-and-confirm until the blockhash expires
pub const DEFAULT_EXECUTION_TIMEOUT_SECS: u64 = 120;
/// 30 days
pub const MAX_COOLDOWN_SECONDS: u64 = 30 * 24 * 60 * 60;

/// Whether state-mutating calls hit the chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionMode {
    /// Swaps are replaced by synthetic successes
    #[default]
    Simulate,
    Live,
}

impl ExecutionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionMode::Simulate => "simulate",
            ExecutionMode::Live => "live",
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, ExecutionMode::Live)
    }
}

impl FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulate" | "simulation" | "dry-run" | "dry_run" | "paper" => {
                Ok(ExecutionMode::Simulate)
            }
            "live" => Ok(ExecutionMode::Live),
            other => Err(ConfigError::InvalidValue {
                key: "ENGINE_MODE".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single signing credential the engine holds
#[derive(Clone, PartialEq, Eq)]
pub enum SigningCredential {
    /// Base58 encoded 64-byte secret key
    Base58(String),
    /// Path to a JSON byte-array keypair file
    KeypairFile(PathBuf),
}

impl fmt::Debug for SigningCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningCredential::Base58(_) => f.write_str("Base58(<redacted>)"),
            SigningCredential::KeypairFile(path) => {
                f.debug_tuple("KeypairFile").field(path).finish()
            }
        }
    }
}

/// Fully resolved configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub rpc_url: String,
    pub credential: SigningCredential,
    pub token_mint: String,
    pub lp_pair: Option<String>,
    /// Defaults to the signer's address when absent
    pub accumulator_wallet: Option<String>,
    pub trigger_threshold_sol: f64,
    pub cooldown_seconds: u64,
    pub buyback_pct: f64,
    pub lp_add_pct: f64,
    pub max_slippage_bps: u16,
    pub mode: ExecutionMode,
    pub poll_interval_ms: u64,
    pub call_timeout_secs: u64,
    /// Bound on a swap submission, at least `call_timeout_secs`
    pub execution_timeout_secs: u64,
    pub jupiter_api_url: String,
    pub jupiter_api_key: Option<String>,
    pub dexscreener_api_url: String,
    pub priority_fee_lamports: Option<u64>,
    /// JSONL sink for emitted events
    pub events_file: Option<PathBuf>,
    /// JSON sink for the status snapshot
    pub status_file: Option<PathBuf>,
}

/// On-disk TOML layout. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub rpc_url: Option<String>,
    pub private_key: Option<String>,
    pub keypair_path: Option<String>,
    pub token_mint: Option<String>,
    pub lp_pair: Option<String>,
    pub accumulator_wallet: Option<String>,
    pub trigger_threshold_sol: Option<f64>,
    pub cooldown_seconds: Option<u64>,
    pub buyback_pct: Option<f64>,
    pub lp_add_pct: Option<f64>,
    pub max_slippage_bps: Option<u16>,
    pub mode: Option<String>,
    pub poll_interval_ms: Option<u64>,
    pub call_timeout_secs: Option<u64>,
    pub execution_timeout_secs: Option<u64>,
    pub jupiter_api_url: Option<String>,
    pub jupiter_api_key: Option<String>,
    pub dexscreener_api_url: Option<String>,
    pub priority_fee_lamports: Option<u64>,
    pub events_file: Option<String>,
    pub status_file: Option<String>,
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Missing required setting: {0}")]
    Missing(String),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from an optional file plus the process environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok())
}

/// Load configuration with a custom environment lookup
pub fn load_config_with<F>(path: Option<&Path>, env: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let file = match path {
        Some(p) => {
            let content = std::fs::read_to_string(p)?;
            toml::from_str::<FileConfig>(&content)?
        }
        None => FileConfig::default(),
    };

    let config = Config::resolve(file, env)?;
    config.validate()?;
    Ok(config)
}

/// Non-empty environment value
fn env_str<F: Fn(&str) -> Option<String>>(env: &F, key: &str) -> Option<String> {
    env(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_parse<T, F>(env: &F, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match env_str(env, key) {
        Some(raw) => raw.parse::<T>().map(Some).map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw,
        }),
        None => Ok(None),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn expand_path(raw: String) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&raw).to_string())
}

impl Config {
    /// Defaults for everything except the two required settings
    pub fn new(credential: SigningCredential, token_mint: impl Into<String>) -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_string(),
            credential,
            token_mint: token_mint.into(),
            lp_pair: None,
            accumulator_wallet: None,
            trigger_threshold_sol: DEFAULT_TRIGGER_THRESHOLD_SOL,
            cooldown_seconds: DEFAULT_COOLDOWN_SECONDS,
            buyback_pct: DEFAULT_BUYBACK_PCT,
            lp_add_pct: DEFAULT_LP_ADD_PCT,
            max_slippage_bps: DEFAULT_MAX_SLIPPAGE_BPS,
            mode: ExecutionMode::default(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            call_timeout_secs: DEFAULT_CALL_TIMEOUT_SECS,
            execution_timeout_secs: DEFAULT_EXECUTION_TIMEOUT_SECS,
            jupiter_api_url: DEFAULT_JUPITER_API_URL.to_string(),
            jupiter_api_key: None,
            dexscreener_api_url: DEFAULT_DEXSCREENER_API_URL.to_string(),
            priority_fee_lamports: None,
            events_file: None,
            status_file: None,
        }
    }

    fn resolve<F>(file: FileConfig, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let private_key = env_str(&env, "ENGINE_PRIVATE_KEY").or(non_empty(file.private_key));
        let keypair_path = env_str(&env, "ENGINE_KEYPAIR_PATH").or(non_empty(file.keypair_path));

        let credential = match (private_key, keypair_path) {
            (Some(key), _) => SigningCredential::Base58(key),
            (None, Some(path)) => SigningCredential::KeypairFile(expand_path(path)),
            (None, None) => {
                return Err(ConfigError::Missing(
                    "ENGINE_PRIVATE_KEY (or ENGINE_KEYPAIR_PATH)".to_string(),
                ))
            }
        };

        let token_mint = env_str(&env, "TOKEN_MINT")
            .or(non_empty(file.token_mint))
            .ok_or_else(|| ConfigError::Missing("TOKEN_MINT".to_string()))?;

        let mode = match env_str(&env, "ENGINE_MODE").or(non_empty(file.mode)) {
            Some(raw) => raw.parse()?,
            None => ExecutionMode::default(),
        };

        Ok(Self {
            rpc_url: env_str(&env, "SOLANA_RPC_URL")
                .or_else(|| env_str(&env, "SOLANA_RPC"))
                .or(non_empty(file.rpc_url))
                .unwrap_or_else(|| DEFAULT_RPC_URL.to_string()),
            credential,
            token_mint,
            lp_pair: env_str(&env, "LP_PAIR").or(non_empty(file.lp_pair)),
            accumulator_wallet: env_str(&env, "ACCUMULATOR_WALLET")
                .or(non_empty(file.accumulator_wallet)),
            trigger_threshold_sol: env_parse(&env, "TRIGGER_THRESHOLD_SOL")?
                .or(file.trigger_threshold_sol)
                .unwrap_or(DEFAULT_TRIGGER_THRESHOLD_SOL),
            cooldown_seconds: env_parse(&env, "COOLDOWN_SECONDS")?
                .or(file.cooldown_seconds)
                .unwrap_or(DEFAULT_COOLDOWN_SECONDS),
            buyback_pct: env_parse(&env, "BUYBACK_PCT")?
                .or(file.buyback_pct)
                .unwrap_or(DEFAULT_BUYBACK_PCT),
            lp_add_pct: env_parse(&env, "LP_ADD_PCT")?
                .or(file.lp_add_pct)
                .unwrap_or(DEFAULT_LP_ADD_PCT),
            max_slippage_bps: env_parse(&env, "MAX_SLIPPAGE_BPS")?
                .or(file.max_slippage_bps)
                .unwrap_or(DEFAULT_MAX_SLIPPAGE_BPS),
            mode,
            poll_interval_ms: env_parse(&env, "POLL_INTERVAL_MS")?
                .or(file.poll_interval_ms)
                .unwrap_or(DEFAULT_POLL_INTERVAL_MS),
            call_timeout_secs: env_parse(&env, "CALL_TIMEOUT_SECS")?
                .or(file.call_timeout_secs)
                .unwrap_or(DEFAULT_CALL_TIMEOUT_SECS),
            execution_timeout_secs: env_parse(&env, "EXECUTION_TIMEOUT_SECS")?
                .or(file.execution_timeout_secs)
                .unwrap_or(DEFAULT_EXECUTION_TIMEOUT_SECS),
            jupiter_api_url: env_str(&env, "JUPITER_API_URL")
                .or(non_empty(file.jupiter_api_url))
                .unwrap_or_else(|| DEFAULT_JUPITER_API_URL.to_string()),
            jupiter_api_key: env_str(&env, "JUPITER_API_KEY").or(non_empty(file.jupiter_api_key)),
            dexscreener_api_url: env_str(&env, "DEXSCREENER_API_URL")
                .or(non_empty(file.dexscreener_api_url))
                .unwrap_or_else(|| DEFAULT_DEXSCREENER_API_URL.to_string()),
            priority_fee_lamports: env_parse(&env, "PRIORITY_FEE_LAMPORTS")?
                .or(file.priority_fee_lamports),
            events_file: env_str(&env, "EVENTS_FILE")
                .or(non_empty(file.events_file))
                .map(expand_path),
            status_file: env_str(&env, "STATUS_FILE")
                .or(non_empty(file.status_file))
                .map(expand_path),
        })
    }

    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.trigger_threshold_sol > 0.0) {
            return Err(ConfigError::ValidationError(format!(
                "trigger_threshold_sol must be > 0, got {}",
                self.trigger_threshold_sol
            )));
        }

        for (name, pct) in [("buyback_pct", self.buyback_pct), ("lp_add_pct", self.lp_add_pct)] {
            if !(0.0..=100.0).contains(&pct) {
                return Err(ConfigError::ValidationError(format!(
                    "{} must be 0-100, got {}",
                    name, pct
                )));
            }
        }

        if self.buyback_pct + self.lp_add_pct > 100.0 {
            return Err(ConfigError::ValidationError(format!(
                "buyback_pct + lp_add_pct must not exceed 100, got {}",
                self.buyback_pct + self.lp_add_pct
            )));
        }

        if self.cooldown_seconds > MAX_COOLDOWN_SECONDS {
            return Err(ConfigError::ValidationError(format!(
                "cooldown_seconds must be <= {}, got {}",
                MAX_COOLDOWN_SECONDS, self.cooldown_seconds
            )));
        }

        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ValidationError(
                "poll_interval_ms must be > 0".to_string(),
            ));
        }

        if self.call_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "call_timeout_secs must be > 0".to_string(),
            ));
        }

        if self.execution_timeout_secs < self.call_timeout_secs {
            return Err(ConfigError::ValidationError(format!(
                "execution_timeout_secs ({}) must be >= call_timeout_secs ({})",
                self.execution_timeout_secs, self.call_timeout_secs
            )));
        }

        if self.rpc_url.is_empty() {
            return Err(ConfigError::ValidationError(
                "rpc_url cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
