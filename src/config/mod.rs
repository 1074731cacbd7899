//! Configuration Module
//!
//! Loads and validates engine configuration from TOML and the environment.

pub mod loader;

pub use loader::{
    load_config, load_config_with, Config, ConfigError, ExecutionMode, FileConfig,
    SigningCredential, DEFAULT_DEXSCREENER_API_URL, DEFAULT_JUPITER_API_URL,
};
