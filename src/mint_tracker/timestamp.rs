//! Slot → wall-clock resolution
//!
//! Best effort: any lookup failure or timeout falls back to the local clock.

use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::source::{LedgerSource, SourceError};

/// Resolves observation slots to millisecond timestamps
#[derive(Clone)]
pub struct TimestampResolver {
    source: Arc<dyn LedgerSource>,
    timeout: Duration,
}

impl TimestampResolver {
    pub fn new(source: Arc<dyn LedgerSource>, timeout: Duration) -> Self {
        Self { source, timeout }
    }

    /// Milliseconds since epoch for `slot`. Never fails.
    pub async fn resolve(&self, slot: u64) -> i64 {
        match self.lookup(slot).await {
            Ok(secs) if secs > 0 => secs.saturating_mul(1000),
            Ok(secs) => {
                debug!(slot, secs, "non-positive block time, using local clock");
                now_millis()
            }
            Err(err) => {
                debug!(slot, %err, "block time lookup failed, using local clock");
                now_millis()
            }
        }
    }

    /// Block time in seconds, bounded by the configured timeout
    pub async fn lookup(&self, slot: u64) -> Result<i64, SourceError> {
        tokio::time::timeout(self.timeout, self.source.block_time(slot))
            .await
            .unwrap_or(Err(SourceError::Timeout))
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
