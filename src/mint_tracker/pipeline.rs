//! Shared birth-detection path
//!
//! Both the subscription listener and the reconciliation scanner feed account
//! records through [`BirthPipeline::process`]:
//!
//! ```text
//! check_and_mark → decode → (initialized?) → resolve timestamp → emit birth
//! ```
//!
//! The registry claim happens before the first `.await`. Whoever loses the
//! claim stops immediately, so a birth is emitted at most once per lifecycle.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::events::MintEventPublisher;
use super::layout::decode_mint;
use super::registry::SeenRegistry;
use super::timestamp::TimestampResolver;
use super::types::{AccountRecord, BirthRecord, MintEvent, TrackerStats};
use crate::common::logging::{log_birth_event, log_tracker_error, EventCategory};

/// What happened to a single record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Address was already claimed this lifecycle
    AlreadySeen,
    /// Claimed, but not decodable or not initialized; no birth
    Uninitialized,
    /// Claimed and emitted
    Born(BirthRecord),
}

/// Decode/dedup/emit path shared by both input sources
#[derive(Clone)]
pub struct BirthPipeline {
    registry: Arc<dyn SeenRegistry>,
    resolver: TimestampResolver,
    publisher: MintEventPublisher,
    stats: Arc<TrackerStats>,
}

impl BirthPipeline {
    pub fn new(
        registry: Arc<dyn SeenRegistry>,
        resolver: TimestampResolver,
        publisher: MintEventPublisher,
        stats: Arc<TrackerStats>,
    ) -> Self {
        Self {
            registry,
            resolver,
            publisher,
            stats,
        }
    }

    /// Run one record through the pipeline
    pub async fn process(&self, record: &AccountRecord) -> ProcessOutcome {
        if !self.registry.check_and_mark(&record.address) {
            self.stats.record_duplicate();
            return ProcessOutcome::AlreadySeen;
        }

        let state = decode_mint(&record.data);
        if !state.initialized {
            debug!(
                mint = %record.address,
                slot = record.slot,
                len = record.data.len(),
                "mint not initialized, marked seen without birth"
            );
            self.stats.record_uninitialized();
            return ProcessOutcome::Uninitialized;
        }

        let timestamp = self.resolver.resolve(record.slot).await;
        let birth = BirthRecord::new(&record.address, &state, record.slot, timestamp);

        info!(
            mint = %birth.mint,
            creator = %birth.creator,
            slot = birth.first_seen_slot,
            "mint birth"
        );
        log_birth_event(&birth);
        self.stats.record_birth();
        self.publisher.publish(MintEvent::Birth(birth.clone()));

        ProcessOutcome::Born(birth)
    }

    /// Mark records as seen without emitting anything. Returns how many were new.
    pub fn seed<'a, I>(&self, records: I) -> u64
    where
        I: IntoIterator<Item = &'a AccountRecord>,
    {
        let fresh = records
            .into_iter()
            .filter(|record| self.registry.check_and_mark(&record.address))
            .count() as u64;
        self.stats.record_seeded(fresh);
        fresh
    }

    /// Surface a non-fatal error to subscribers and logs
    pub fn report_error(&self, category: EventCategory, message: impl Into<String>) {
        let message = message.into();
        warn!(?category, %message, "non-fatal tracker error");
        log_tracker_error(category, &message);
        self.stats.record_error();
        self.publisher.publish(MintEvent::Error { message });
    }

    pub fn registry(&self) -> &Arc<dyn SeenRegistry> {
        &self.registry
    }

    pub fn stats(&self) -> &Arc<TrackerStats> {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint_tracker::layout::encode_mint;
    use crate::mint_tracker::registry::InMemorySeenRegistry;
    use crate::mint_tracker::source::MockLedgerSource;
    use solana_sdk::pubkey::Pubkey;
    use std::time::Duration;

    fn pipeline_with_block_time(secs: i64) -> (BirthPipeline, MintEventPublisher) {
        let mut source = MockLedgerSource::new();
        source.expect_block_time().returning(move |_| Ok(secs));

        let publisher = MintEventPublisher::new(16);
        let pipeline = BirthPipeline::new(
            Arc::new(InMemorySeenRegistry::new()),
            TimestampResolver::new(Arc::new(source), Duration::from_secs(1)),
            publisher.clone(),
            Arc::new(TrackerStats::default()),
        );
        (pipeline, publisher)
    }

    #[tokio::test]
    async fn test_initialized_mint_is_born_once() {
        let (pipeline, publisher) = pipeline_with_block_time(1_700_000_000);
        let mut rx = publisher.subscribe();

        let mint = Pubkey::new_unique();
        let authority = Pubkey::new_unique();
        let record = AccountRecord::new(mint, encode_mint(Some(&authority), true), 1000);

        let outcome = pipeline.process(&record).await;
        let expected = BirthRecord {
            mint: mint.to_string(),
            creator: authority.to_string(),
            first_seen_slot: 1000,
            timestamp: 1_700_000_000_000,
        };
        assert_eq!(outcome, ProcessOutcome::Born(expected.clone()));
        assert_eq!(rx.recv().await.unwrap(), MintEvent::Birth(expected));

        let again = AccountRecord::new(mint, encode_mint(Some(&authority), true), 1005);
        assert_eq!(pipeline.process(&again).await, ProcessOutcome::AlreadySeen);
        assert!(rx.try_recv().is_err());

        let stats = pipeline.stats().snapshot();
        assert_eq!(stats.births, 1);
        assert_eq!(stats.duplicates, 1);
    }

    #[tokio::test]
    async fn test_uninitialized_is_marked_without_birth() {
        let (pipeline, publisher) = pipeline_with_block_time(1);
        let mut rx = publisher.subscribe();
        let mint = Pubkey::new_unique();

        let pending = AccountRecord::new(mint, encode_mint(None, false), 10);
        assert_eq!(pipeline.process(&pending).await, ProcessOutcome::Uninitialized);

        // Later initialization at the same address stays suppressed
        let ready = AccountRecord::new(mint, encode_mint(None, true), 11);
        assert_eq!(pipeline.process(&ready).await, ProcessOutcome::AlreadySeen);

        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.registry().list(), vec![mint]);
    }

    #[tokio::test]
    async fn test_undersized_buffer_is_marked_seen() {
        let (pipeline, _publisher) = pipeline_with_block_time(1);
        let record = AccountRecord::new(Pubkey::new_unique(), vec![1, 0, 0, 0], 3);

        assert_eq!(pipeline.process(&record).await, ProcessOutcome::Uninitialized);
        assert_eq!(pipeline.registry().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_suppresses_births() {
        let (pipeline, publisher) = pipeline_with_block_time(1);
        let mut rx = publisher.subscribe();

        let records: Vec<_> = (0..3)
            .map(|i| AccountRecord::new(Pubkey::new_unique(), encode_mint(None, true), i))
            .collect();

        assert_eq!(pipeline.seed(&records), 3);
        assert_eq!(pipeline.seed(&records), 0);

        for record in &records {
            assert_eq!(pipeline.process(record).await, ProcessOutcome::AlreadySeen);
        }
        assert!(rx.try_recv().is_err());
        assert_eq!(pipeline.stats().snapshot().seeded, 3);
    }

    #[tokio::test]
    async fn test_report_error_publishes_event() {
        let (pipeline, publisher) = pipeline_with_block_time(1);
        let mut rx = publisher.subscribe();

        pipeline.report_error(EventCategory::Subscription, "socket closed");

        assert_eq!(rx.recv().await.unwrap(), MintEvent::error("socket closed"));
        assert_eq!(pipeline.stats().snapshot().errors, 1);
    }
}
