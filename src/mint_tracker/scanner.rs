//! Reconciliation Scanner
//!
//! Periodic full snapshot that catches any birth the push feed missed.
//! At most one pass runs at a time: the timer claims an in-progress flag
//! before spawning a pass, and a tick that finds the flag held is skipped
//! (counted, not queued).

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use super::pipeline::{BirthPipeline, ProcessOutcome};
use super::source::{LedgerSource, SourceError};
use crate::common::logging::EventCategory;

/// Summary of one reconciliation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub accounts: usize,
    pub births: usize,
    pub already_seen: usize,
    pub uninitialized: usize,
}

/// Releases the in-progress flag when dropped, including on task abort
struct PassGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Pull-path backstop
pub struct ReconciliationScanner {
    source: Arc<dyn LedgerSource>,
    pipeline: BirthPipeline,
    in_progress: Arc<AtomicBool>,
}

impl ReconciliationScanner {
    pub fn new(source: Arc<dyn LedgerSource>, pipeline: BirthPipeline) -> Self {
        Self {
            source,
            pipeline,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Whether a pass currently holds the flag
    pub fn is_pass_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    fn try_claim(&self) -> Option<PassGuard> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassGuard {
                flag: self.in_progress.clone(),
            })
    }

    /// Run one pass now. `None` when another pass holds the flag.
    pub async fn run_pass(&self) -> Option<Result<PassReport, SourceError>> {
        let guard = self.try_claim()?;
        Some(self.pass(guard).await)
    }

    async fn pass(&self, _guard: PassGuard) -> Result<PassReport, SourceError> {
        self.pipeline.stats().record_pass();

        let records = match self.source.fetch_mint_accounts().await {
            Ok(records) => records,
            Err(e) => {
                self.pipeline.report_error(
                    EventCategory::Reconciliation,
                    format!("reconciliation pass failed: {}", e),
                );
                return Err(e);
            }
        };

        let mut report = PassReport {
            accounts: records.len(),
            ..PassReport::default()
        };

        for record in &records {
            match self.pipeline.process(record).await {
                ProcessOutcome::Born(birth) => {
                    info!(mint = %birth.mint, "birth via reconciliation");
                    report.births += 1;
                }
                ProcessOutcome::AlreadySeen => report.already_seen += 1,
                ProcessOutcome::Uninitialized => report.uninitialized += 1,
            }
        }

        debug!(
            accounts = report.accounts,
            births = report.births,
            "reconciliation pass complete"
        );

        Ok(report)
    }

    /// Timer loop. The first pass starts immediately. Passes are owned by this
    /// task, so aborting it also aborts any pass in flight.
    pub async fn run_timer(self: Arc<Self>, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut passes = JoinSet::new();

        info!(period_ms = period.as_millis() as u64, "reconciliation timer running");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.try_claim() {
                        Some(guard) => {
                            let scanner = self.clone();
                            passes.spawn(async move {
                                let _ = scanner.pass(guard).await;
                            });
                        }
                        None => {
                            debug!("reconciliation pass still running, tick skipped");
                            self.pipeline.stats().record_skipped_tick();
                        }
                    }
                }
                Some(_) = passes.join_next(), if !passes.is_empty() => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mint_tracker::events::MintEventPublisher;
    use crate::mint_tracker::registry::InMemorySeenRegistry;
    use crate::mint_tracker::testing::FakeLedgerSource;
    use crate::mint_tracker::timestamp::TimestampResolver;
    use crate::mint_tracker::types::{MintEvent, TrackerStats};

    fn scanner(source: Arc<FakeLedgerSource>) -> (Arc<ReconciliationScanner>, MintEventPublisher) {
        let publisher = MintEventPublisher::new(64);
        let pipeline = BirthPipeline::new(
            Arc::new(InMemorySeenRegistry::new()),
            TimestampResolver::new(source.clone(), Duration::from_secs(1)),
            publisher.clone(),
            Arc::new(TrackerStats::default()),
        );
        (
            Arc::new(ReconciliationScanner::new(source, pipeline)),
            publisher,
        )
    }

    #[tokio::test]
    async fn test_pass_reports_missed_births_once() {
        let source = Arc::new(FakeLedgerSource::new());
        let a = source.add_mint(10);
        let b = source.add_mint(11);
        let (scanner, publisher) = scanner(source.clone());
        let mut rx = publisher.subscribe();

        let report = scanner.run_pass().await.unwrap().unwrap();
        assert_eq!(report.accounts, 2);
        assert_eq!(report.births, 2);

        let mut born = Vec::new();
        for _ in 0..2 {
            if let MintEvent::Birth(birth) = rx.recv().await.unwrap() {
                born.push(birth.mint);
            }
        }
        born.sort();
        let mut expected = vec![a.to_string(), b.to_string()];
        expected.sort();
        assert_eq!(born, expected);

        let report = scanner.run_pass().await.unwrap().unwrap();
        assert_eq!(report.births, 0);
        assert_eq!(report.already_seen, 2);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_failed_pass_releases_flag() {
        let source = Arc::new(FakeLedgerSource::new());
        source.set_fail_snapshots(true);
        let (scanner, publisher) = scanner(source.clone());
        let mut rx = publisher.subscribe();

        let result = scanner.run_pass().await.unwrap();
        assert!(result.is_err());
        assert!(!scanner.is_pass_in_progress());
        assert!(matches!(rx.recv().await.unwrap(), MintEvent::Error { .. }));

        source.set_fail_snapshots(false);
        source.add_mint(1);
        let report = scanner.run_pass().await.unwrap().unwrap();
        assert_eq!(report.births, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_pass_is_skipped() {
        let source = Arc::new(FakeLedgerSource::new());
        source.set_snapshot_delay(Duration::from_millis(250));
        let (scanner, _publisher) = scanner(source.clone());

        let slow = {
            let scanner = scanner.clone();
            tokio::spawn(async move { scanner.run_pass().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(scanner.is_pass_in_progress());
        assert!(scanner.run_pass().await.is_none());

        assert!(slow.await.unwrap().is_some());
        assert!(!scanner.is_pass_in_progress());
        assert_eq!(source.snapshot_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_skips_ticks_while_pass_runs() {
        let source = Arc::new(FakeLedgerSource::new());
        source.set_snapshot_delay(Duration::from_millis(250));
        let (scanner, _publisher) = scanner(source.clone());

        let timer = tokio::spawn(scanner.clone().run_timer(Duration::from_millis(100)));

        // Ticks at 0, 100, 200: one pass, two skips
        tokio::time::sleep(Duration::from_millis(290)).await;
        assert_eq!(source.snapshot_calls(), 1);
        assert_eq!(scanner.pipeline.stats().snapshot().skipped_ticks, 2);

        // Tick at 300 finds the flag free again
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(source.snapshot_calls(), 2);

        timer.abort();
        let _ = timer.await;

        // The pass started at 300 would hold the flag until 550 if it survived
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!scanner.is_pass_in_progress());
    }
}
