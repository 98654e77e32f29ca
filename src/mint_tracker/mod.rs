//! Mint Tracker Module
//!
//! Detects newly created SPL token mints and reports each one exactly once:
//!
//! ```text
//! ledger push ─┐
//!              ├─→ check_and_mark → decode → resolve timestamp → birth event
//! ledger scan ─┘
//! ```
//!
//! ## Components
//!
//! - **types**: Data structures for records, births, events, config and stats
//! - **layout**: Fixed 82-byte mint account decoder
//! - **registry**: First-observer-wins dedup set
//! - **source**: Ledger collaborator trait
//! - **solana**: Solana RPC/pubsub implementation of the collaborator
//! - **timestamp**: Slot → wall-clock resolution with local fallback
//! - **events**: Broadcast channel for births and errors
//! - **pipeline**: Decode/dedup/emit path shared by both inputs
//! - **listener**: Push subscription consumer
//! - **scanner**: Periodic reconciliation backstop
//! - **service**: Start/stop lifecycle
//! - **api**: REST and WebSocket endpoints
//!
//! ## API Endpoints
//!
//! - `GET /api/mints/health` - Health check
//! - `GET /api/mints/seen` - Seen mint addresses
//! - `GET /api/mints/stats` - Counters
//! - `WS /ws/mints` - Subscribe to births

pub mod api;
pub mod events;
pub mod layout;
pub mod listener;
pub mod pipeline;
pub mod registry;
pub mod scanner;
pub mod service;
pub mod solana;
pub mod source;
pub mod timestamp;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-exports
pub use api::{create_mint_router, start_api_server};
pub use events::MintEventPublisher;
pub use layout::{decode_mint, encode_mint, summarize_snapshot, SnapshotSummary, MINT_ACCOUNT_LEN};
pub use listener::SubscriptionListener;
pub use pipeline::{BirthPipeline, ProcessOutcome};
pub use registry::{InMemorySeenRegistry, SeenRegistry};
pub use scanner::{PassReport, ReconciliationScanner};
pub use service::{create_tracker_service, MintTrackerService, SharedTrackerService, TrackerError};
pub use solana::{SolanaMintSource, TOKEN_PROGRAM_ID};
pub use source::{AccountFeed, LedgerSource, SourceError};
pub use timestamp::TimestampResolver;
pub use types::{
    AccountRecord, BirthRecord, LifecycleState, MintEvent, MintState, TrackerConfig,
    TrackerStats, TrackerStatsSnapshot, UNKNOWN_CREATOR,
};
