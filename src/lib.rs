//! mintwatch - SPL Token Mint Birth Watcher
//!
//! Watches the token program for new mint accounts and emits one birth event
//! per mint, combining a push subscription with a periodic reconciliation scan.
//!
//! ## Services
//!
//! 1. **Mint Tracker** - Subscription listener + reconciliation scanner
//! 2. **Mint API** - REST and WebSocket access to births and tracker state

pub mod common;
pub mod mint_tracker;

// Re-exports: Common
pub use common::{ConfigError, MintWatchError, Network, Result, WatcherSettings};

// Re-exports: Mint Tracker
pub use mint_tracker::{
    create_tracker_service, AccountRecord, BirthRecord, LedgerSource, LifecycleState, MintEvent,
    MintTrackerService, SharedTrackerService, SolanaMintSource, SourceError, TrackerConfig,
    TrackerError,
};
