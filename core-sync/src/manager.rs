//! # Sync Manager
//!
//! Full catalog refresh for the signed-in user.
//!
//! ## Overview
//!
//! A sync pass:
//! 1. Resolves the active user and their cache partition
//! 2. Returns early when the partition's cache is still valid
//! 3. Evicts every other user's cached rows
//! 4. Fetches categories, channels, movies and series concurrently
//! 5. Writes the counts into the partition's sync metadata
//!
//! Each entity stage fails on its own: a remote error, a `Loading` answer or
//! a cache write failure leaves that entity empty for the round and is
//! reported as [`SyncEvent::StageDegraded`]. Only a missing user and
//! eviction or metadata failures fail the pass.
//!
//! ## Auto-Sync
//!
//! [`SyncManager::start_auto_sync`] spawns a loop that cleans expired TMDB
//! rows, re-syncs when the cache is stale, then sleeps for the configured
//! interval. Stopping cancels the loop; a pass in flight is dropped, which
//! aborts its entity tasks.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let sync = SyncManager::new(cache, repository, session, SyncConfig::default())
//!     .with_event_bus(event_bus.clone());
//!
//! match sync.perform_initial_sync().await? {
//!     SyncOutcome::AlreadyValid => {}
//!     SyncOutcome::Synced(counts) => println!("{} rows", counts.total()),
//! }
//! sync.start_auto_sync();
//! ```

use crate::error::{Result, SyncError};
use crate::stage::{CacheInfo, ProgressTracker, SyncOutcome, SyncStage};
use core_auth::{PartitionId, SessionProvider};
use core_cache::{CategoryType, DatabaseCacheManager, SyncCounts};
use core_runtime::config::DEFAULT_AUTO_SYNC_INTERVAL;
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use provider_xtream::{XtreamRepository, XtreamResult};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Sync manager configuration
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Sleep between auto-sync passes
    pub auto_sync_interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            auto_sync_interval: DEFAULT_AUTO_SYNC_INTERVAL,
        }
    }
}

struct AutoSyncHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Orchestrates catalog syncs and the background auto-sync loop.
pub struct SyncManager {
    worker: Arc<SyncWorker>,
    auto_sync: Mutex<Option<AutoSyncHandle>>,
}

/// Shared state of sync passes, owned by the manager and the auto-sync task.
struct SyncWorker {
    cache: Arc<DatabaseCacheManager>,
    repository: Arc<dyn XtreamRepository>,
    session: Arc<dyn SessionProvider>,
    event_bus: Option<EventBus>,
    config: SyncConfig,
}

type ProgressFn<'a> = &'a (dyn Fn(SyncStage, f32) + Send + Sync);

impl SyncManager {
    pub fn new(
        cache: Arc<DatabaseCacheManager>,
        repository: Arc<dyn XtreamRepository>,
        session: Arc<dyn SessionProvider>,
        config: SyncConfig,
    ) -> Self {
        Self {
            worker: Arc::new(SyncWorker {
                cache,
                repository,
                session,
                event_bus: None,
                config,
            }),
            auto_sync: Mutex::new(None),
        }
    }

    /// Attach an event bus. Call before the manager is shared.
    pub fn with_event_bus(self, event_bus: EventBus) -> Self {
        let worker = SyncWorker {
            cache: Arc::clone(&self.worker.cache),
            repository: Arc::clone(&self.worker.repository),
            session: Arc::clone(&self.worker.session),
            event_bus: Some(event_bus),
            config: self.worker.config.clone(),
        };
        Self {
            worker: Arc::new(worker),
            auto_sync: Mutex::new(None),
        }
    }

    /// Sync the active user's catalog unless the cache is still valid.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] without an active user
    /// - [`SyncError::Cache`] if eviction or the metadata write fails
    pub async fn perform_initial_sync(&self) -> Result<SyncOutcome> {
        self.worker.sync_reporting(&|_, _| {}).await
    }

    /// Like [`perform_initial_sync`](Self::perform_initial_sync), reporting
    /// `(stage, fraction)` checkpoints to `on_progress`.
    pub async fn perform_initial_sync_with_callback<F>(&self, on_progress: F) -> Result<SyncOutcome>
    where
        F: Fn(SyncStage, f32) + Send + Sync,
    {
        self.worker.sync_reporting(&on_progress).await
    }

    /// Start the background loop, replacing any loop already running.
    pub fn start_auto_sync(&self) {
        let mut slot = self.auto_sync.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(previous) = slot.take() {
            debug!("Replacing running auto-sync loop");
            previous.token.cancel();
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let worker = Arc::clone(&self.worker);
        let interval = worker.config.auto_sync_interval;

        let task = tokio::spawn(async move {
            info!(interval_secs = interval.as_secs(), "Auto-sync started");
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = worker.auto_sync_pass() => {}
                }
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            info!("Auto-sync stopped");
        });

        *slot = Some(AutoSyncHandle { token, task });
    }

    /// Stop the background loop. Does nothing if it is not running.
    pub fn stop_auto_sync(&self) {
        let handle = self
            .auto_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = handle {
            handle.token.cancel();
        }
    }

    pub fn is_auto_sync_running(&self) -> bool {
        self.auto_sync
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_some_and(|h| !h.token.is_cancelled() && !h.task.is_finished())
    }

    /// Mark the active user's cache stale. No-op without a user.
    pub async fn invalidate_cache(&self) -> Result<()> {
        match self.worker.session.current_user().await {
            Some(user) => {
                self.worker
                    .cache
                    .invalidate_xtream_cache(&user.partition_id())
                    .await?;
                Ok(())
            }
            None => {
                debug!("No active user, nothing to invalidate");
                Ok(())
            }
        }
    }

    /// Cache state of the active user, `None` without one.
    pub async fn cache_info(&self) -> Result<Option<CacheInfo>> {
        let Some(user) = self.worker.session.current_user().await else {
            return Ok(None);
        };

        let partition = user.partition_id();
        let cache = &self.worker.cache;
        Ok(Some(CacheInfo {
            is_valid: cache.is_xtream_cache_valid(&partition).await?,
            valid_until: cache.xtream_cache_valid_until(&partition).await?,
            partition,
        }))
    }
}

impl Drop for SyncManager {
    fn drop(&mut self) {
        self.stop_auto_sync();
    }
}

impl SyncWorker {
    async fn sync_reporting(self: &Arc<Self>, on_progress: ProgressFn<'_>) -> Result<SyncOutcome> {
        let result = self.run_sync(on_progress).await;
        if let Err(e) = &result {
            error!(error = %e, "Catalog sync failed");
            self.emit(SyncEvent::Failed {
                sync_id: None,
                message: e.to_string(),
                recoverable: e.is_recoverable(),
            });
        }
        result
    }

    #[instrument(skip(self, on_progress))]
    async fn run_sync(self: &Arc<Self>, on_progress: ProgressFn<'_>) -> Result<SyncOutcome> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(SyncError::NotAuthenticated)?;
        let partition = user.partition_id();

        if self.cache.is_xtream_cache_valid(&partition).await? {
            let valid_until = self.cache.xtream_cache_valid_until(&partition).await?;
            debug!(partition = %partition.short(), "Cache still valid, skipping sync");
            self.emit(SyncEvent::Skipped {
                partition: partition.short().to_string(),
                valid_until: valid_until.map(|t| t.timestamp_millis()),
            });
            return Ok(SyncOutcome::AlreadyValid);
        }

        let sync_id = Uuid::new_v4().to_string();
        let started = Instant::now();
        info!(sync_id = %sync_id, partition = %partition.short(), "Catalog sync started");
        self.emit(SyncEvent::Started {
            sync_id: sync_id.clone(),
            partition: partition.short().to_string(),
        });
        self.report(&sync_id, SyncStage::Starting, on_progress);

        self.cache.cleanup_other_users_data(&partition).await?;

        let mut tasks = JoinSet::new();
        for stage in SyncStage::ENTITIES {
            let worker = Arc::clone(self);
            let partition = partition.clone();
            let sync_id = sync_id.clone();
            tasks.spawn(async move {
                let count = worker.sync_entity(stage, &partition, &sync_id).await;
                (stage, count)
            });
        }

        let mut counts = SyncCounts::default();
        let mut tracker = ProgressTracker::new();
        while let Some(joined) = tasks.join_next().await {
            let (stage, count) = joined.map_err(|e| SyncError::Task(e.to_string()))?;
            match stage {
                SyncStage::Categories => counts.categories = count,
                SyncStage::Channels => counts.channels = count,
                SyncStage::Movies => counts.movies = count,
                SyncStage::Series => counts.series = count,
                _ => {}
            }
            for ready in tracker.finish(stage) {
                self.report(&sync_id, ready, on_progress);
            }
        }

        self.report(&sync_id, SyncStage::Finalizing, on_progress);
        self.cache
            .update_xtream_sync_metadata(&partition, counts)
            .await?;
        self.report(&sync_id, SyncStage::Completed, on_progress);

        let duration_ms = started.elapsed().as_millis() as u64;
        info!(
            sync_id = %sync_id,
            categories = counts.categories,
            channels = counts.channels,
            movies = counts.movies,
            series = counts.series,
            duration_ms,
            "Catalog sync completed"
        );
        self.emit(SyncEvent::Completed {
            sync_id,
            categories: counts.categories,
            channels: counts.channels,
            movies: counts.movies,
            series: counts.series,
            duration_ms,
        });

        Ok(SyncOutcome::Synced(counts))
    }

    async fn sync_entity(&self, stage: SyncStage, partition: &PartitionId, sync_id: &str) -> u64 {
        match stage {
            SyncStage::Categories => self.sync_categories(partition, sync_id).await,
            SyncStage::Channels => {
                let channels = self.accept(stage, sync_id, self.repository.live_streams(None).await);
                let written = self.cache.cache_xtream_channels(&channels, partition).await;
                self.written(stage, sync_id, written, channels.len())
            }
            SyncStage::Movies => {
                let movies = self.accept(stage, sync_id, self.repository.vod_streams(None).await);
                let written = self.cache.cache_xtream_movies(&movies, partition).await;
                self.written(stage, sync_id, written, movies.len())
            }
            SyncStage::Series => {
                let series = self.accept(stage, sync_id, self.repository.series(None).await);
                let written = self.cache.cache_xtream_series(&series, partition).await;
                self.written(stage, sync_id, written, series.len())
            }
            _ => 0,
        }
    }

    /// Live, VOD and series categories, each stored under its own type.
    async fn sync_categories(&self, partition: &PartitionId, sync_id: &str) -> u64 {
        let (live, vod, series) = tokio::join!(
            self.repository.live_categories(),
            self.repository.vod_categories(),
            self.repository.series_categories(),
        );

        let mut total = 0;
        for (kind, result) in [
            (CategoryType::Live, live),
            (CategoryType::Vod, vod),
            (CategoryType::Series, series),
        ] {
            let categories = self.accept(SyncStage::Categories, sync_id, result);
            let written = self
                .cache
                .cache_xtream_categories(&categories, kind, partition)
                .await;
            total += self.written(SyncStage::Categories, sync_id, written, categories.len());
        }
        total
    }

    /// Unwrap a remote result, degrading failures to an empty list.
    fn accept<T>(&self, stage: SyncStage, sync_id: &str, result: XtreamResult<Vec<T>>) -> Vec<T> {
        match result {
            XtreamResult::Success(items) => items,
            XtreamResult::Error { message, code } => {
                warn!(stage = %stage, ?code, message = %message, "Remote fetch failed");
                self.degraded(stage, sync_id, message);
                Vec::new()
            }
            XtreamResult::Loading => {
                warn!(stage = %stage, "Remote returned Loading, treating as empty");
                self.degraded(stage, sync_id, "Remote data still loading".to_string());
                Vec::new()
            }
        }
    }

    fn written(
        &self,
        stage: SyncStage,
        sync_id: &str,
        written: core_cache::Result<()>,
        count: usize,
    ) -> u64 {
        match written {
            Ok(()) => count as u64,
            Err(e) => {
                warn!(stage = %stage, error = %e, "Cache write failed");
                self.degraded(stage, sync_id, e.to_string());
                0
            }
        }
    }

    async fn auto_sync_pass(self: &Arc<Self>) {
        if let Err(e) = self.cache.cleanup_expired_data().await {
            warn!(error = %e, "TMDB cleanup failed");
        }

        match self.sync_reporting(&|_, _| {}).await {
            Ok(SyncOutcome::AlreadyValid) => debug!("Auto-sync: cache still valid"),
            Ok(SyncOutcome::Synced(counts)) => {
                info!(total = counts.total(), "Auto-sync refreshed the catalog")
            }
            Err(SyncError::NotAuthenticated) => debug!("Auto-sync: no active user"),
            Err(e) => warn!(error = %e, "Auto-sync pass failed"),
        }
    }

    fn report(&self, sync_id: &str, stage: SyncStage, on_progress: ProgressFn<'_>) {
        let fraction = stage.progress();
        debug!(stage = %stage, fraction, "Sync progress");
        on_progress(stage, fraction);
        self.emit(SyncEvent::Progress {
            sync_id: sync_id.to_string(),
            stage: stage.as_str().to_string(),
            percent: (fraction * 100.0).round() as u8,
        });
    }

    fn degraded(&self, stage: SyncStage, sync_id: &str, message: String) {
        self.emit(SyncEvent::StageDegraded {
            sync_id: sync_id.to_string(),
            stage: stage.as_str().to_string(),
            message,
        });
    }

    fn emit(&self, event: SyncEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Sync(event));
        }
    }
}
