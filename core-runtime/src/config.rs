//! # Core Configuration
//!
//! Configuration for bootstrapping the IPTV core with host-provided bridges.
//!
//! ## Overview
//!
//! `CoreConfig` carries everything the application context needs: where the
//! catalog cache database lives, which platform bridges to use, and the cache
//! and sync policy. Build it with [`CoreConfig::builder`]; `build()` validates
//! the result.
//!
//! ## Fail-Fast Capability Checks
//!
//! The HTTP client and network monitor are required. With the
//! `desktop-shims` feature the builder falls back to `bridge-desktop`
//! implementations; without it a missing bridge yields
//! [`Error::CapabilityMissing`].
//!
//! ```ignore
//! use core_runtime::config::CoreConfig;
//!
//! let config = CoreConfig::builder()
//!     .database_path("/data/catalog.db")
//!     .http_client(Arc::new(MyHttpClient))
//!     .network_monitor(Arc::new(MyNetworkMonitor))
//!     .build()?;
//! ```

use crate::error::{Error, Result};
use crate::logging::LoggingConfig;
use bridge_traits::{Clock, HttpClient, LoggerSink, NetworkMonitor, SystemClock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// How long a full Xtream catalog sync stays valid.
pub const XTREAM_CACHE_TTL: Duration = Duration::from_secs(12 * 60 * 60);

/// How long TMDB metadata is retained before cleanup removes it.
pub const TMDB_CACHE_RETENTION: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Interval between background auto-sync passes.
pub const DEFAULT_AUTO_SYNC_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Connect/read timeout for the default HTTP client.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Cache freshness policy.
///
/// These are fixed policy values, chosen once when the cache manager is
/// constructed. Read paths never take a per-call TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// Xtream data validity window, measured from the last full sync
    pub xtream_ttl: Duration,
    /// TMDB rows older than this are removed by cleanup
    pub tmdb_retention: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            xtream_ttl: XTREAM_CACHE_TTL,
            tmdb_retention: TMDB_CACHE_RETENTION,
        }
    }
}

impl CachePolicy {
    pub fn validate(&self) -> Result<()> {
        if self.xtream_ttl.is_zero() {
            return Err(Error::Config("Xtream cache TTL must be non-zero".to_string()));
        }
        if self.tmdb_retention.is_zero() {
            return Err(Error::Config(
                "TMDB cache retention must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Feature toggles for optional behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Start the hourly auto-sync loop when the core boots
    pub enable_auto_sync: bool,
    /// Delete the signed-out user's cached catalog on sign-out
    pub clear_cache_on_sign_out: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            enable_auto_sync: true,
            clear_cache_on_sign_out: false,
        }
    }
}

/// Core configuration
#[derive(Clone)]
pub struct CoreConfig {
    /// Path to the SQLite catalog cache database
    pub database_path: PathBuf,

    /// HTTP client used for Xtream API calls
    pub http_client: Arc<dyn HttpClient>,

    /// Connectivity source for the retry precheck
    pub network_monitor: Arc<dyn NetworkMonitor>,

    /// Time source for cache TTL checks
    pub clock: Arc<dyn Clock>,

    pub cache_policy: CachePolicy,

    /// Sleep between auto-sync iterations
    pub auto_sync_interval: Duration,

    /// Capacity of the event bus channel
    pub event_buffer_size: usize,

    pub features: FeatureFlags,

    /// When set, the application context initializes global logging
    pub logging: Option<LoggingConfig>,
}

impl std::fmt::Debug for CoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreConfig")
            .field("database_path", &self.database_path)
            .field("http_client", &"HttpClient { ... }")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .field("cache_policy", &self.cache_policy)
            .field("auto_sync_interval", &self.auto_sync_interval)
            .field("event_buffer_size", &self.event_buffer_size)
            .field("features", &self.features)
            .field("logging", &self.logging)
            .finish()
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::default()
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<()> {
        if self.database_path.as_os_str().is_empty() {
            return Err(Error::Config("Database path cannot be empty".to_string()));
        }

        self.cache_policy.validate()?;

        if self.auto_sync_interval.is_zero() {
            return Err(Error::Config(
                "Auto-sync interval must be greater than zero".to_string(),
            ));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn http_client_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "HttpClient".to_string(),
        message: "No HTTP client implementation provided. \
                  Desktop: enable the 'desktop-shims' feature to use ReqwestHttpClient. \
                  Mobile: inject a platform-native adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn network_monitor_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "NetworkMonitor".to_string(),
        message: "No NetworkMonitor implementation provided. \
                  Desktop: enable the 'desktop-shims' feature to use DesktopNetworkMonitor. \
                  Mobile: inject the platform connectivity adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_http_client(timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    use bridge_desktop::ReqwestHttpClient;

    let client = ReqwestHttpClient::with_timeout(timeout)
        .map_err(|e| Error::Internal(format!("Failed to create default HttpClient: {}", e)))?;
    Ok(Arc::new(client))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_http_client(_timeout: Duration) -> Result<Arc<dyn HttpClient>> {
    Err(http_client_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Ok(Arc::new(bridge_desktop::DesktopNetworkMonitor::new()))
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_network_monitor() -> Result<Arc<dyn NetworkMonitor>> {
    Err(network_monitor_missing_error())
}

/// Builder for [`CoreConfig`]
#[derive(Default)]
pub struct CoreConfigBuilder {
    database_path: Option<PathBuf>,
    http_client: Option<Arc<dyn HttpClient>>,
    http_timeout: Option<Duration>,
    network_monitor: Option<Arc<dyn NetworkMonitor>>,
    clock: Option<Arc<dyn Clock>>,
    cache_policy: Option<CachePolicy>,
    auto_sync_interval: Option<Duration>,
    event_buffer_size: Option<usize>,
    features: FeatureFlags,
    logging: Option<LoggingConfig>,
}

impl CoreConfigBuilder {
    pub fn database_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn http_client(mut self, client: Arc<dyn HttpClient>) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Timeout for the default desktop HTTP client. Ignored when a client
    /// is injected.
    pub fn http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = Some(timeout);
        self
    }

    pub fn network_monitor(mut self, monitor: Arc<dyn NetworkMonitor>) -> Self {
        self.network_monitor = Some(monitor);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = Some(policy);
        self
    }

    pub fn auto_sync_interval(mut self, interval: Duration) -> Self {
        self.auto_sync_interval = Some(interval);
        self
    }

    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    pub fn enable_auto_sync(mut self, enabled: bool) -> Self {
        self.features.enable_auto_sync = enabled;
        self
    }

    pub fn clear_cache_on_sign_out(mut self, enabled: bool) -> Self {
        self.features.clear_cache_on_sign_out = enabled;
        self
    }

    pub fn features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// Forward log events to a host sink. Enables logging with defaults if
    /// no logging config was set.
    pub fn logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        let logging = self.logging.take().unwrap_or_default();
        self.logging = Some(logging.with_logger_sink(sink));
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] when the database path is missing or a value is invalid
    /// - [`Error::CapabilityMissing`] when a bridge is missing and no desktop
    ///   fallback is compiled in
    pub fn build(self) -> Result<CoreConfig> {
        let database_path = self.database_path.ok_or_else(|| {
            Error::Config("Database path is required. Use .database_path() to set it.".to_string())
        })?;

        let http_timeout = self.http_timeout.unwrap_or(DEFAULT_HTTP_TIMEOUT);
        if http_timeout.is_zero() {
            return Err(Error::Config(
                "HTTP timeout must be greater than zero".to_string(),
            ));
        }

        let http_client = match self.http_client {
            Some(client) => client,
            None => provide_default_http_client(http_timeout)?,
        };

        let network_monitor = match self.network_monitor {
            Some(monitor) => monitor,
            None => provide_default_network_monitor()?,
        };

        let config = CoreConfig {
            database_path,
            http_client,
            network_monitor,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            cache_policy: self.cache_policy.unwrap_or_default(),
            auto_sync_interval: self
                .auto_sync_interval
                .unwrap_or(DEFAULT_AUTO_SYNC_INTERVAL),
            event_buffer_size: self
                .event_buffer_size
                .unwrap_or(crate::events::DEFAULT_EVENT_BUFFER_SIZE),
            features: self.features,
            logging: self.logging,
        };

        config.validate()?;

        Ok(config)
    }
}
