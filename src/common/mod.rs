//! Common Infrastructure Module
//!
//! Shared utilities and configuration for the mint watcher.
//!
//! This module contains:
//! - Configuration loading from environment variables
//! - Structured logging setup
//! - Common error types

pub mod config;
pub mod error;
pub mod logging;

// Re-exports for convenience
pub use config::{ConfigError, Network, WatcherSettings};
pub use error::{MintWatchError, Result};
pub use logging::{
    init_from_settings, init_logging, log_birth_event, log_tracker_error, ErrorDetails,
    EventCategory, LogEvent, LogLevel, LoggingError,
};
