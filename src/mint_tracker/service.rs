//! Mint Tracker Service
//!
//! Lifecycle controller tying the engine together:
//! stopped → starting (seed) → running (listener + reconciliation timer) → stopped
//!
//! # Flow:
//! 1. `start()` optionally marks every existing mint as seen (no events)
//! 2. The subscription listener reports births as they are pushed
//! 3. The reconciliation timer re-scans the ledger as a backstop
//! 4. `stop()` tears both down and forgets every seen address

use solana_sdk::pubkey::Pubkey;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::AbortHandle;
use tracing::{info, warn};

use super::events::MintEventPublisher;
use super::listener::SubscriptionListener;
use super::pipeline::BirthPipeline;
use super::registry::{InMemorySeenRegistry, SeenRegistry};
use super::scanner::{PassReport, ReconciliationScanner};
use super::source::{LedgerSource, SourceError};
use super::timestamp::TimestampResolver;
use super::types::{LifecycleState, MintEvent, TrackerConfig, TrackerStats, TrackerStatsSnapshot};

/// Mint tracker service errors
#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    #[error("Seeding failed: {0}")]
    SeedFailed(String),
}

struct Lifecycle {
    state: LifecycleState,
    /// Bumped on every start/stop so a stale seeding run can tell it lost
    generation: u64,
    /// Listener, timer and on-demand passes; all aborted by stop()
    tasks: Vec<AbortHandle>,
}

/// Main mint tracker service
pub struct MintTrackerService {
    /// Configuration
    config: TrackerConfig,
    /// Ledger collaborator
    source: Arc<dyn LedgerSource>,
    /// Shared decode/dedup/emit path
    pipeline: BirthPipeline,
    /// Backstop scanner
    scanner: Arc<ReconciliationScanner>,
    /// Event fan-out
    publisher: MintEventPublisher,
    lifecycle: Mutex<Lifecycle>,
}

impl MintTrackerService {
    /// Create a service with an in-memory registry
    pub fn new(source: Arc<dyn LedgerSource>, config: TrackerConfig) -> Self {
        Self::with_registry(source, config, Arc::new(InMemorySeenRegistry::new()))
    }

    /// Create a service with a custom registry
    pub fn with_registry(
        source: Arc<dyn LedgerSource>,
        config: TrackerConfig,
        registry: Arc<dyn SeenRegistry>,
    ) -> Self {
        let publisher = MintEventPublisher::new(config.event_capacity);
        let resolver = TimestampResolver::new(
            source.clone(),
            Duration::from_millis(config.block_time_timeout_ms),
        );
        let pipeline = BirthPipeline::new(
            registry,
            resolver,
            publisher.clone(),
            Arc::new(TrackerStats::default()),
        );
        let scanner = Arc::new(ReconciliationScanner::new(source.clone(), pipeline.clone()));

        Self {
            config,
            source,
            pipeline,
            scanner,
            publisher,
            lifecycle: Mutex::new(Lifecycle {
                state: LifecycleState::Stopped,
                generation: 0,
                tasks: Vec::new(),
            }),
        }
    }

    fn lifecycle(&self) -> MutexGuard<'_, Lifecycle> {
        self.lifecycle.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start detection. No-op while already starting or running.
    pub async fn start(&self) -> Result<(), TrackerError> {
        let generation = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != LifecycleState::Stopped {
                return Ok(());
            }
            lifecycle.state = LifecycleState::Starting;
            lifecycle.generation += 1;
            lifecycle.generation
        };

        info!(
            seed = self.config.seed_existing_on_start,
            poll_interval_ms = self.config.poll_interval_ms,
            "starting mint tracker"
        );

        let existing = if self.config.seed_existing_on_start {
            match self.source.fetch_mint_accounts().await {
                Ok(records) => Some(records),
                Err(e) => {
                    let mut lifecycle = self.lifecycle();
                    if lifecycle.generation == generation {
                        lifecycle.state = LifecycleState::Stopped;
                    }
                    warn!(error = %e, "seeding failed, tracker not started");
                    return Err(TrackerError::SeedFailed(e.to_string()));
                }
            }
        } else {
            None
        };

        let mut lifecycle = self.lifecycle();
        if lifecycle.generation != generation || lifecycle.state != LifecycleState::Starting {
            info!("tracker stopped during seeding");
            return Ok(());
        }

        // Marked under the lifecycle lock so a concurrent stop() cannot interleave
        if let Some(records) = existing {
            let fresh = self.pipeline.seed(&records);
            info!(accounts = records.len(), seeded = fresh, "existing mints marked seen");
        }

        let listener = SubscriptionListener::new(self.source.clone(), self.pipeline.clone());
        lifecycle
            .tasks
            .push(tokio::spawn(listener.run()).abort_handle());

        if self.config.poll_interval_ms > 0 {
            let period = Duration::from_millis(self.config.poll_interval_ms);
            let timer = tokio::spawn(self.scanner.clone().run_timer(period));
            lifecycle.tasks.push(timer.abort_handle());
        }

        lifecycle.state = LifecycleState::Running;
        info!("mint tracker running");
        Ok(())
    }

    /// Stop detection and forget every seen address. Safe to repeat.
    pub fn stop(&self) {
        let mut lifecycle = self.lifecycle();
        if lifecycle.state == LifecycleState::Stopped && lifecycle.tasks.is_empty() {
            return;
        }
        lifecycle.state = LifecycleState::Stopped;
        lifecycle.generation += 1;

        let tasks = std::mem::take(&mut lifecycle.tasks);
        for task in &tasks {
            task.abort();
        }
        // Cleared before the lock drops; start() seeds under the same lock
        self.pipeline.registry().clear();

        info!(tasks = tasks.len(), "mint tracker stopped");
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle().state
    }

    /// Every address claimed this lifecycle
    pub fn list_seen(&self) -> Vec<Pubkey> {
        self.pipeline.registry().list()
    }

    /// Subscribe to birth and error events
    pub fn subscribe(&self) -> broadcast::Receiver<MintEvent> {
        self.publisher.subscribe()
    }

    pub fn stats(&self) -> TrackerStatsSnapshot {
        self.pipeline.stats().snapshot()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Whether a reconciliation pass currently holds the overlap guard
    pub fn is_reconciling(&self) -> bool {
        self.scanner.is_pass_in_progress()
    }

    /// Number of live event subscribers
    pub fn subscriber_count(&self) -> usize {
        self.publisher.subscriber_count()
    }

    /// Run a reconciliation pass on demand.
    ///
    /// `None` unless the tracker is running, when another pass holds the
    /// overlap guard, or when `stop()` aborts the pass midway.
    pub async fn reconcile_now(&self) -> Option<Result<PassReport, SourceError>> {
        let pass = {
            let mut lifecycle = self.lifecycle();
            if lifecycle.state != LifecycleState::Running {
                return None;
            }
            let scanner = self.scanner.clone();
            let pass = tokio::spawn(async move { scanner.run_pass().await });
            lifecycle.tasks.retain(|task| !task.is_finished());
            lifecycle.tasks.push(pass.abort_handle());
            pass
        };

        pass.await.ok().flatten()
    }
}

impl Drop for MintTrackerService {
    fn drop(&mut self) {
        for task in &self.lifecycle().tasks {
            task.abort();
        }
    }
}

/// Shared tracker service type
pub type SharedTrackerService = Arc<MintTrackerService>;

/// Create a shared tracker service
pub fn create_tracker_service(
    source: Arc<dyn LedgerSource>,
    config: TrackerConfig,
) -> SharedTrackerService {
    Arc::new(MintTrackerService::new(source, config))
}
