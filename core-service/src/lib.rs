//! Core service façade and bootstrap helpers.
//!
//! This crate wires host-provided bridges (HTTP, connectivity, clock, log
//! sink) into the shared IPTV core and owns the resulting object graph:
//! the SQLite pool, the cache manager, the session store, the Xtream
//! connector with its retry strategy, the sync manager and the event bus.
//! Desktop apps typically enable the `desktop-shims` feature so missing
//! bridges fall back to `bridge-desktop` implementations.
//!
//! ```ignore
//! use core_runtime::CoreConfig;
//! use core_service::CoreService;
//!
//! let config = CoreConfig::builder().database_path("/data/catalog.db").build()?;
//! let core = CoreService::bootstrap(config).await?;
//!
//! core.sign_in("http://panel.example:8080", "alice", "secret").await?;
//! let movies = core.catalog().vod_streams(None).await?;
//! ```

pub mod catalog;
pub mod error;

pub use catalog::CatalogService;
pub use error::{CoreError, Result};

use anyhow::Context;
use core_auth::{SessionProvider, SessionStore, UserProfile};
use core_cache::{create_pool, DatabaseCacheManager, DatabaseConfig};
use core_runtime::config::CoreConfig;
use core_runtime::events::{EventBus, EventStream};
use core_runtime::logging::init_logging;
use core_runtime::retry::RetryStrategy;
use core_sync::{CacheInfo, SyncConfig, SyncManager, SyncOutcome, SyncStage};
use provider_xtream::{XtreamConnector, XtreamRepository};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{info, instrument};

/// Primary façade exposed to host applications.
#[derive(Clone)]
pub struct CoreService {
    config: Arc<CoreConfig>,
    event_bus: EventBus,
    session: Arc<SessionStore>,
    cache: Arc<DatabaseCacheManager>,
    sync: Arc<SyncManager>,
    catalog: CatalogService,
}

impl CoreService {
    /// Initialize logging (when configured), open the catalog database and
    /// build the service.
    pub async fn bootstrap(config: CoreConfig) -> anyhow::Result<Self> {
        if let Some(logging) = config.logging.clone() {
            init_logging(logging).context("failed to initialize logging")?;
        }

        let pool = create_pool(DatabaseConfig::new(&config.database_path))
            .await
            .with_context(|| {
                format!(
                    "failed to open catalog cache at {}",
                    config.database_path.display()
                )
            })?;

        let service = Self::with_pool(config, pool);
        info!("Core service ready");
        Ok(service)
    }

    /// Build the service on an already migrated pool.
    pub fn with_pool(config: CoreConfig, pool: SqlitePool) -> Self {
        let event_bus = EventBus::new(config.event_buffer_size);

        let session = Arc::new(SessionStore::new().with_event_bus(event_bus.clone()));
        let session_provider: Arc<dyn SessionProvider> = session.clone();

        let cache = Arc::new(
            DatabaseCacheManager::new(pool, Arc::clone(&config.clock), config.cache_policy)
                .with_event_bus(event_bus.clone()),
        );

        let retry = RetryStrategy::new(Arc::clone(&config.network_monitor));
        let repository: Arc<dyn XtreamRepository> = Arc::new(XtreamConnector::new(
            Arc::clone(&config.http_client),
            Arc::clone(&session_provider),
            retry,
        ));

        let sync = SyncManager::new(
            Arc::clone(&cache),
            Arc::clone(&repository),
            Arc::clone(&session_provider),
            SyncConfig {
                auto_sync_interval: config.auto_sync_interval,
            },
        )
        .with_event_bus(event_bus.clone());

        let catalog = CatalogService::new(Arc::clone(&cache), repository, session_provider);

        Self {
            config: Arc::new(config),
            event_bus,
            session,
            cache,
            sync: Arc::new(sync),
            catalog,
        }
    }

    /// Sign in and bring the user's catalog up to date.
    ///
    /// Starts the auto-sync loop when enabled in the feature flags.
    #[instrument(skip_all)]
    pub async fn sign_in(
        &self,
        server: &str,
        username: &str,
        password: &str,
    ) -> Result<SyncOutcome> {
        let profile = UserProfile::new(server, username, password)?;
        self.session.sign_in(profile)?;

        let outcome = self.sync.perform_initial_sync().await?;

        if self.config.features.enable_auto_sync {
            self.sync.start_auto_sync();
        }
        Ok(outcome)
    }

    /// Stop background sync and clear the session. The signed-out user's
    /// cache is deleted when `clear_cache_on_sign_out` is set.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<()> {
        self.sync.stop_auto_sync();

        let Some(previous) = self.session.sign_out() else {
            return Ok(());
        };

        if self.config.features.clear_cache_on_sign_out {
            let removed = self.cache.clear_xtream_cache(&previous.partition_id()).await?;
            info!(rows_removed = removed, "Cleared cache on sign-out");
        }
        Ok(())
    }

    /// Run a sync pass now (a no-op when the cache is still valid).
    pub async fn sync(&self) -> Result<SyncOutcome> {
        self.sync.perform_initial_sync().await.map_err(CoreError::from)
    }

    pub async fn sync_with_progress<F>(&self, on_progress: F) -> Result<SyncOutcome>
    where
        F: Fn(SyncStage, f32) + Send + Sync,
    {
        self.sync
            .perform_initial_sync_with_callback(on_progress)
            .await
            .map_err(CoreError::from)
    }

    /// Mark the active user's cache stale so the next sync refetches.
    pub async fn invalidate_cache(&self) -> Result<()> {
        self.sync.invalidate_cache().await.map_err(CoreError::from)
    }

    pub async fn cache_info(&self) -> Result<Option<CacheInfo>> {
        self.sync.cache_info().await.map_err(CoreError::from)
    }

    /// Stop background work. The service stays usable for cached reads.
    pub fn shutdown(&self) {
        if self.sync.is_auto_sync_running() {
            info!("Stopping auto-sync on shutdown");
        }
        self.sync.stop_auto_sync();
    }

    pub fn catalog(&self) -> &CatalogService {
        &self.catalog
    }

    pub fn cache(&self) -> Arc<DatabaseCacheManager> {
        Arc::clone(&self.cache)
    }

    pub fn session(&self) -> Arc<SessionStore> {
        Arc::clone(&self.session)
    }

    pub fn sync_manager(&self) -> Arc<SyncManager> {
        Arc::clone(&self.sync)
    }

    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Stream of auth, sync and cache events.
    pub fn events(&self) -> EventStream {
        EventStream::new(self.event_bus.subscribe())
    }
}
