//! Subscription Listener
//!
//! Consumes the push feed and runs every account update through the shared
//! pipeline. Malformed pushes become error events; the feed closing ends the
//! listener (the reconciliation scanner keeps coverage).

use std::sync::Arc;
use tracing::{info, warn};

use super::pipeline::{BirthPipeline, ProcessOutcome};
use super::source::LedgerSource;
use crate::common::logging::EventCategory;

/// Push-path consumer
pub struct SubscriptionListener {
    source: Arc<dyn LedgerSource>,
    pipeline: BirthPipeline,
}

impl SubscriptionListener {
    pub fn new(source: Arc<dyn LedgerSource>, pipeline: BirthPipeline) -> Self {
        Self { source, pipeline }
    }

    /// Subscribe and process until the feed ends
    pub async fn run(self) {
        let mut feed = match self.source.subscribe_mint_accounts().await {
            Ok(feed) => feed,
            Err(e) => {
                self.pipeline
                    .report_error(EventCategory::Subscription, format!("subscribe failed: {}", e));
                return;
            }
        };

        info!("subscription listener running");

        while let Some(item) = feed.recv().await {
            match item {
                Ok(record) => {
                    if let ProcessOutcome::Born(birth) = self.pipeline.process(&record).await {
                        info!(mint = %birth.mint, "birth via subscription");
                    }
                }
                Err(e) => {
                    self.pipeline
                        .report_error(EventCategory::Subscription, e.to_string());
                }
            }
        }

        warn!("subscription feed ended");
        self.pipeline
            .report_error(EventCategory::Subscription, "subscription closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint_tracker::events::MintEventPublisher;
    use crate::mint_tracker::layout::encode_mint;
    use crate::mint_tracker::registry::InMemorySeenRegistry;
    use crate::mint_tracker::source::SourceError;
    use crate::mint_tracker::testing::FakeLedgerSource;
    use crate::mint_tracker::timestamp::TimestampResolver;
    use crate::mint_tracker::types::{AccountRecord, MintEvent, TrackerStats};
    use solana_sdk::pubkey::Pubkey;
    use std::time::Duration;

    fn setup() -> (Arc<FakeLedgerSource>, BirthPipeline, MintEventPublisher) {
        let source = Arc::new(FakeLedgerSource::new());
        let publisher = MintEventPublisher::new(16);
        let pipeline = BirthPipeline::new(
            Arc::new(InMemorySeenRegistry::new()),
            TimestampResolver::new(source.clone(), Duration::from_secs(1)),
            publisher.clone(),
            Arc::new(TrackerStats::default()),
        );
        (source, pipeline, publisher)
    }

    async fn wait_for_subscriber(source: &FakeLedgerSource) {
        while !source.has_subscriber() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_push_produces_single_birth() {
        let (source, pipeline, publisher) = setup();
        let mut rx = publisher.subscribe();
        let handle = tokio::spawn(SubscriptionListener::new(source.clone(), pipeline).run());
        wait_for_subscriber(&source).await;

        let mint = Pubkey::new_unique();
        let record = AccountRecord::new(mint, encode_mint(None, true), 55);
        assert!(source.push(Ok(record.clone())).await);
        assert!(source.push(Ok(record)).await);

        match rx.recv().await.unwrap() {
            MintEvent::Birth(birth) => {
                assert_eq!(birth.mint, mint.to_string());
                assert_eq!(birth.creator, "unknown");
                assert_eq!(birth.first_seen_slot, 55);
                assert_eq!(birth.timestamp, source.block_time_millis());
            }
            other => panic!("unexpected event: {:?}", other),
        }

        source.close_feed();
        assert_eq!(rx.recv().await.unwrap(), MintEvent::error("subscription closed"));
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_push_is_reported_and_listener_continues() {
        let (source, pipeline, publisher) = setup();
        let mut rx = publisher.subscribe();
        let handle = tokio::spawn(SubscriptionListener::new(source.clone(), pipeline).run());
        wait_for_subscriber(&source).await;

        source
            .push(Err(SourceError::MalformedPayload("bad base64".into())))
            .await;
        assert_eq!(
            rx.recv().await.unwrap(),
            MintEvent::error("malformed payload: bad base64")
        );

        let record = AccountRecord::new(Pubkey::new_unique(), encode_mint(None, true), 1);
        source.push(Ok(record)).await;
        assert!(matches!(rx.recv().await.unwrap(), MintEvent::Birth(_)));

        source.close_feed();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_subscribe_failure_reports_error() {
        let (source, pipeline, publisher) = setup();
        source.set_fail_subscribe(true);
        let mut rx = publisher.subscribe();

        SubscriptionListener::new(source, pipeline).run().await;

        match rx.recv().await.unwrap() {
            MintEvent::Error { message } => assert!(message.starts_with("subscribe failed")),
            other => panic!("unexpected event: {:?}", other),
        }
    }
}
