//! Scriptable in-memory ledger for engine and integration tests

use async_trait::async_trait;
use solana_sdk::pubkey::Pubkey;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;

use super::layout::encode_mint;
use super::source::{AccountFeed, LedgerSource, SourceError};
use super::types::AccountRecord;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// [`LedgerSource`] backed by a vector of accounts and a single push feed
pub struct FakeLedgerSource {
    accounts: Mutex<Vec<AccountRecord>>,
    feed: Mutex<Option<mpsc::Sender<Result<AccountRecord, SourceError>>>>,
    snapshot_delay: Mutex<Duration>,
    fail_snapshots: AtomicBool,
    fail_subscribe: AtomicBool,
    snapshot_calls: AtomicUsize,
    block_time_secs: i64,
}

impl FakeLedgerSource {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
            feed: Mutex::new(None),
            snapshot_delay: Mutex::new(Duration::ZERO),
            fail_snapshots: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            snapshot_calls: AtomicUsize::new(0),
            block_time_secs: 1_700_000_000,
        }
    }

    /// Put an initialized mint on the ledger and return its address
    pub fn add_mint(&self, slot: u64) -> Pubkey {
        self.add_mint_record(slot).address
    }

    /// Put an initialized mint on the ledger and return the stored record
    pub fn add_mint_record(&self, slot: u64) -> AccountRecord {
        let authority = Pubkey::new_unique();
        let record = AccountRecord::new(
            Pubkey::new_unique(),
            encode_mint(Some(&authority), true),
            slot,
        );
        self.add_record(record.clone());
        record
    }

    pub fn add_record(&self, record: AccountRecord) {
        lock(&self.accounts).push(record);
    }

    /// Deliver an item on the open subscription. False when none is open.
    pub async fn push(&self, item: Result<AccountRecord, SourceError>) -> bool {
        let sender = lock(&self.feed).clone();
        match sender {
            Some(tx) => tx.send(item).await.is_ok(),
            None => false,
        }
    }

    /// Drop the sender side, ending the subscription
    pub fn close_feed(&self) {
        lock(&self.feed).take();
    }

    pub fn has_subscriber(&self) -> bool {
        lock(&self.feed)
            .as_ref()
            .map(|tx| !tx.is_closed())
            .unwrap_or(false)
    }

    pub fn set_snapshot_delay(&self, delay: Duration) {
        *lock(&self.snapshot_delay) = delay;
    }

    pub fn set_fail_snapshots(&self, fail: bool) {
        self.fail_snapshots.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_subscribe(&self, fail: bool) {
        self.fail_subscribe.store(fail, Ordering::SeqCst);
    }

    pub fn snapshot_calls(&self) -> usize {
        self.snapshot_calls.load(Ordering::SeqCst)
    }

    pub fn block_time_millis(&self) -> i64 {
        self.block_time_secs * 1000
    }
}

impl Default for FakeLedgerSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerSource for FakeLedgerSource {
    async fn fetch_mint_accounts(&self) -> Result<Vec<AccountRecord>, SourceError> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *lock(&self.snapshot_delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail_snapshots.load(Ordering::SeqCst) {
            return Err(SourceError::Rpc("getProgramAccounts failed".into()));
        }
        Ok(lock(&self.accounts).clone())
    }

    async fn subscribe_mint_accounts(&self) -> Result<AccountFeed, SourceError> {
        if self.fail_subscribe.load(Ordering::SeqCst) {
            return Err(SourceError::Subscription("connection refused".into()));
        }
        let (tx, rx) = mpsc::channel(64);
        *lock(&self.feed) = Some(tx);
        Ok(rx)
    }

    async fn block_time(&self, _slot: u64) -> Result<i64, SourceError> {
        Ok(self.block_time_secs)
    }
}
