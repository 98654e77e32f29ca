//! Mint Tracker Types
//!
//! Data model for birth detection:
//! account record → decoded mint state → (first seen + initialized) → birth record

use serde::{Deserialize, Serialize};
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicU64, Ordering};

/// Creator label used when a mint has no authority
pub const UNKNOWN_CREATOR: &str = "unknown";

/// Raw account observation supplied by the ledger collaborator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Mint account address
    pub address: Pubkey,
    /// Raw account data
    pub data: Vec<u8>,
    /// Slot at which the data was observed
    pub slot: u64,
}

impl AccountRecord {
    pub fn new(address: Pubkey, data: Vec<u8>, slot: u64) -> Self {
        Self {
            address,
            data,
            slot,
        }
    }
}

/// Decoded view of a mint account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MintState {
    pub initialized: bool,
    pub authority: Option<Pubkey>,
}

impl MintState {
    /// State reported for buffers that cannot be decoded yet
    pub const UNDECODABLE: MintState = MintState {
        initialized: false,
        authority: None,
    };

    /// Authority as base58, or `"unknown"`
    pub fn authority_label(&self) -> String {
        self.authority
            .map(|a| a.to_string())
            .unwrap_or_else(|| UNKNOWN_CREATOR.to_string())
    }
}

/// A reported mint birth. Emitted once per address per lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthRecord {
    /// Mint address (base58)
    pub mint: String,
    /// Mint authority (base58) or `"unknown"`
    pub creator: String,
    /// Slot of the first initialized observation
    pub first_seen_slot: u64,
    /// Approximate wall-clock time in milliseconds since epoch
    pub timestamp: i64,
}

impl BirthRecord {
    pub fn new(address: &Pubkey, state: &MintState, slot: u64, timestamp: i64) -> Self {
        Self {
            mint: address.to_string(),
            creator: state.authority_label(),
            first_seen_slot: slot,
            timestamp,
        }
    }
}

/// Events pushed to consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum MintEvent {
    Birth(BirthRecord),
    Error { message: String },
}

impl MintEvent {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}

/// Lifecycle of the tracker service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    #[default]
    Stopped,
    Starting,
    Running,
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stopped => write!(f, "stopped"),
            Self::Starting => write!(f, "starting"),
            Self::Running => write!(f, "running"),
        }
    }
}

/// Tracker configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// Reconciliation period in milliseconds; 0 disables the backstop
    pub poll_interval_ms: u64,
    /// Mark every existing mint as seen before going live
    pub seed_existing_on_start: bool,
    /// Upper bound for a block time lookup before falling back to local time
    pub block_time_timeout_ms: u64,
    /// Broadcast channel capacity for events
    pub event_capacity: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 60_000,
            seed_existing_on_start: true,
            block_time_timeout_ms: 2_000,
            event_capacity: 1024,
        }
    }
}

/// Live counters, shared between the listener and the scanner
#[derive(Debug, Default)]
pub struct TrackerStats {
    births: AtomicU64,
    duplicates: AtomicU64,
    uninitialized: AtomicU64,
    seeded: AtomicU64,
    passes: AtomicU64,
    skipped_ticks: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time copy of [`TrackerStats`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TrackerStatsSnapshot {
    pub births: u64,
    pub duplicates: u64,
    pub uninitialized: u64,
    pub seeded: u64,
    pub passes: u64,
    pub skipped_ticks: u64,
    pub errors: u64,
}

impl TrackerStats {
    pub fn record_birth(&self) {
        self.births.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_duplicate(&self) {
        self.duplicates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_uninitialized(&self) {
        self.uninitialized.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_seeded(&self, count: u64) {
        self.seeded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_pass(&self) {
        self.passes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped_tick(&self) {
        self.skipped_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> TrackerStatsSnapshot {
        TrackerStatsSnapshot {
            births: self.births.load(Ordering::Relaxed),
            duplicates: self.duplicates.load(Ordering::Relaxed),
            uninitialized: self.uninitialized.load(Ordering::Relaxed),
            seeded: self.seeded.load(Ordering::Relaxed),
            passes: self.passes.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_birth_record_wire_shape() {
        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let state = MintState {
            initialized: true,
            authority: Some(authority),
        };

        let event = MintEvent::Birth(BirthRecord::new(&mint, &state, 1000, 1_700_000_000_000));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "birth");
        assert_eq!(json["mint"], mint.to_string());
        assert_eq!(json["creator"], authority.to_string());
        assert_eq!(json["firstSeenSlot"], 1000);
        assert_eq!(json["timestamp"], 1_700_000_000_000i64);
    }

    #[test]
    fn test_missing_authority_is_unknown() {
        let record = BirthRecord::new(&Pubkey::new_unique(), &MintState::UNDECODABLE, 5, 0);
        assert_eq!(record.creator, UNKNOWN_CREATOR);
    }

    #[test]
    fn test_error_event_shape() {
        let json = serde_json::to_string(&MintEvent::error("subscription closed")).unwrap();
        assert_eq!(json, r#"{"event":"error","message":"subscription closed"}"#);
    }

    #[test]
    fn test_stats_snapshot() {
        let stats = TrackerStats::default();
        stats.record_birth();
        stats.record_seeded(3);
        stats.record_skipped_tick();

        let snap = stats.snapshot();
        assert_eq!(snap.births, 1);
        assert_eq!(snap.seeded, 3);
        assert_eq!(snap.skipped_ticks, 1);
        assert_eq!(snap.errors, 0);
    }
}
