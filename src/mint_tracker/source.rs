//! Ledger Collaborator Interface
//!
//! The engine only needs three things from the ledger: a snapshot of all mint
//! accounts, a push feed of mint account changes, and slot → block time.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::types::AccountRecord;

/// Items delivered by a push subscription
pub type AccountFeed = mpsc::Receiver<Result<AccountRecord, SourceError>>;

/// Ledger collaborator errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    #[error("rpc error: {0}")]
    Rpc(String),

    #[error("subscription error: {0}")]
    Subscription(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("request timed out")]
    Timeout,
}

impl SourceError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            SourceError::Rpc(_) | SourceError::Subscription(_) | SourceError::Timeout
        )
    }
}

/// Source of mint account data
///
/// Implementations:
/// - `SolanaMintSource` - JSON-RPC + pubsub against a Solana node
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LedgerSource: Send + Sync {
    /// Pull every mint account currently on the ledger
    async fn fetch_mint_accounts(&self) -> Result<Vec<AccountRecord>, SourceError>;

    /// Open a push feed of mint account changes. The feed closing means the
    /// subscription ended; reconnecting is up to the implementation.
    async fn subscribe_mint_accounts(&self) -> Result<AccountFeed, SourceError>;

    /// Block time for `slot`, in seconds since epoch
    async fn block_time(&self, slot: u64) -> Result<i64, SourceError>;
}
