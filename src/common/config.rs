//! Environment-based Configuration for the Mint Watcher
//!
//! # Environment Variables
//!
//! ## Network Configuration
//! - `MINTWATCH_NETWORK` - "mainnet", "testnet", or "devnet" (default: "mainnet")
//! - `MINTWATCH_SOLANA_RPC` - Solana JSON-RPC endpoint URL
//! - `MINTWATCH_SOLANA_WS` - Solana pubsub endpoint (derived from the RPC URL if unset)
//! - `MINTWATCH_PROGRAM_ID` - Token program owning the mint accounts
//!
//! ## Engine Settings
//! - `MINTWATCH_POLL_INTERVAL_MS` - Reconciliation period, 0 disables it (default: 60000)
//! - `MINTWATCH_SEED_EXISTING` - Mark pre-existing mints as seen on start (default: true)
//! - `MINTWATCH_BLOCK_TIME_TIMEOUT_MS` - Upper bound on block time lookups (default: 2000)
//! - `MINTWATCH_EVENT_CAPACITY` - Broadcast buffer for birth/error events (default: 1024)
//!
//! ## Optional Settings
//! - `MINTWATCH_API_PORT` - HTTP/WebSocket port (default: 3002)
//! - `MINTWATCH_LOG_LEVEL` - Logging level (debug, info, warn, error)
//! - `MINTWATCH_LOG_JSON` - Set to "1" for JSON log lines

use std::env;
use std::str::FromStr;

use solana_sdk::pubkey::Pubkey;
use thiserror::Error;

use crate::mint_tracker::{TrackerConfig, TOKEN_PROGRAM_ID};

/// Default HTTP port for the API surface
pub const DEFAULT_API_PORT: u16 = 3002;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Network environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "mainnet-beta" => Ok(Network::Mainnet),
            "testnet" | "test" => Ok(Network::Testnet),
            "devnet" | "dev" => Ok(Network::Devnet),
            _ => Err(ConfigError::InvalidValue(
                "MINTWATCH_NETWORK".to_string(),
                format!("unknown network: {}", s),
            )),
        }
    }
}

impl Network {
    /// Get default Solana RPC for this network
    pub fn default_solana_rpc(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://api.mainnet-beta.solana.com",
            Network::Testnet => "https://api.testnet.solana.com",
            Network::Devnet => "https://api.devnet.solana.com",
        }
    }
}

/// Derive the pubsub endpoint from an RPC URL (http → ws, https → wss)
pub fn derive_ws_url(rpc_url: &str) -> String {
    if let Some(rest) = rpc_url.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = rpc_url.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else {
        rpc_url.to_string()
    }
}

/// Main configuration struct
#[derive(Debug, Clone)]
pub struct WatcherSettings {
    /// Network environment
    pub network: Network,

    /// Solana RPC endpoint
    pub solana_rpc: String,

    /// Solana pubsub endpoint
    pub solana_ws: String,

    /// Program owning the watched mint accounts
    pub program_id: Pubkey,

    /// Engine options
    pub tracker: TrackerConfig,

    /// HTTP/WebSocket port
    pub api_port: u16,

    /// Log level
    pub log_level: String,

    /// Emit JSON log lines
    pub log_json: bool,
}

impl WatcherSettings {
    /// Load configuration from `.env` (if present) and the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let network: Network = get("MINTWATCH_NETWORK")
            .unwrap_or_else(|| "mainnet".to_string())
            .parse()?;

        let solana_rpc = get("MINTWATCH_SOLANA_RPC")
            .unwrap_or_else(|| network.default_solana_rpc().to_string());
        let solana_ws = get("MINTWATCH_SOLANA_WS").unwrap_or_else(|| derive_ws_url(&solana_rpc));

        let program_id = match get("MINTWATCH_PROGRAM_ID") {
            Some(raw) => Pubkey::from_str(&raw).map_err(|e| {
                ConfigError::InvalidValue("MINTWATCH_PROGRAM_ID".to_string(), e.to_string())
            })?,
            None => TOKEN_PROGRAM_ID,
        };

        let defaults = TrackerConfig::default();
        let tracker = TrackerConfig {
            poll_interval_ms: parse_or(
                "MINTWATCH_POLL_INTERVAL_MS",
                get("MINTWATCH_POLL_INTERVAL_MS"),
                defaults.poll_interval_ms,
            )?,
            seed_existing_on_start: match get("MINTWATCH_SEED_EXISTING") {
                Some(raw) => parse_bool("MINTWATCH_SEED_EXISTING", &raw)?,
                None => defaults.seed_existing_on_start,
            },
            block_time_timeout_ms: parse_or(
                "MINTWATCH_BLOCK_TIME_TIMEOUT_MS",
                get("MINTWATCH_BLOCK_TIME_TIMEOUT_MS"),
                defaults.block_time_timeout_ms,
            )?,
            event_capacity: parse_or(
                "MINTWATCH_EVENT_CAPACITY",
                get("MINTWATCH_EVENT_CAPACITY"),
                defaults.event_capacity,
            )?,
        };

        if tracker.event_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "MINTWATCH_EVENT_CAPACITY".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let api_port = parse_or(
            "MINTWATCH_API_PORT",
            get("MINTWATCH_API_PORT"),
            DEFAULT_API_PORT,
        )?;
        let log_level = get("MINTWATCH_LOG_LEVEL").unwrap_or_else(|| "info".to_string());
        let log_json = match get("MINTWATCH_LOG_JSON") {
            Some(raw) => parse_bool("MINTWATCH_LOG_JSON", &raw)?,
            None => false,
        };

        Ok(Self {
            network,
            solana_rpc,
            solana_ws,
            program_id,
            tracker,
            api_port,
            log_level,
            log_json,
        })
    }

    /// Print configuration summary
    pub fn print_summary(&self) {
        println!("=== Mint Watcher Configuration ===");
        println!("Network: {:?}", self.network);
        println!("Solana RPC: {}", self.solana_rpc);
        println!("Solana WS: {}", self.solana_ws);
        println!("Program ID: {}", self.program_id);
        println!("Poll Interval: {} ms", self.tracker.poll_interval_ms);
        println!("Seed Existing: {}", self.tracker.seed_existing_on_start);
        println!("API Port: {}", self.api_port);
        println!("Log Level: {}", self.log_level);
        println!("==================================");
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => value
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

fn parse_bool(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidValue(
            key.to_string(),
            format!("expected a boolean, got {}", other),
        )),
    }
}
