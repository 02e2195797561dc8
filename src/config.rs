//! Configuration management for LedgerChain

use crate::blockchain::TokenKind;
use crate::error::ChainError;
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub genesis: GenesisConfig,
    #[serde(default)]
    pub audit: AuditConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenesisConfig {
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default = "default_native_tokens")]
    pub native_tokens: Vec<TokenSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TokenSpec {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: i32,
    pub kind: TokenKind,
    #[serde(default = "default_binding_factor")]
    pub energy_binding_factor: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuditConfig {
    #[serde(default = "default_enabled")]
    pub verify_block_hashes: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            timestamp: 0,
            native_tokens: default_native_tokens(),
        }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            verify_block_hashes: default_enabled(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AuditConfig {
    pub fn options(&self) -> crate::audit::AuditOptions {
        crate::audit::AuditOptions {
            verify_block_hashes: self.verify_block_hashes,
        }
    }
}

fn native(name: &str, symbol: &str, kind: TokenKind) -> TokenSpec {
    TokenSpec {
        name: name.to_string(),
        symbol: symbol.to_string(),
        decimals: default_decimals(),
        kind,
        energy_binding_factor: default_binding_factor(),
    }
}

fn default_native_tokens() -> Vec<TokenSpec> {
    vec![
        native("TTTC", "TTTC", TokenKind::NativeGovernance),
        native("ELTT", "ELTT", TokenKind::NativeUtility),
        native("ELTC", "ELTC", TokenKind::NativeReserve),
    ]
}

fn default_decimals() -> i32 {
    8
}

fn default_binding_factor() -> f64 {
    0.75
}

fn default_enabled() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Reads a TOML configuration file. A missing file yields the defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ChainError> {
    let path = path.as_ref();
    let config_str = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Config::default()),
        Err(e) => return Err(e.into()),
    };
    let config: Config = toml::from_str(&config_str)?;

    // Validate critical values
    if config.genesis.native_tokens.is_empty() {
        return Err(ChainError::Config(format!(
            "genesis.native_tokens must not be empty in {}",
            path.display()
        )));
    }
    if config.logging.level.trim().is_empty() {
        return Err(ChainError::Config("logging.level must not be empty".to_string()));
    }

    Ok(config)
}
