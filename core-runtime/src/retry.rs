//! # Retry Strategy
//!
//! Exponential backoff for remote calls, gated by a connectivity check.
//!
//! ## Overview
//!
//! [`RetryStrategy`] runs an async operation up to
//! [`RetryConfig::max_attempts`] times. Before every attempt it asks the
//! injected [`NetworkMonitor`] whether the device is online and fails fast
//! with [`NetworkError::NetworkUnavailable`] when it is not. Failures are
//! converted to [`NetworkError`]; only errors that are both transient and
//! listed in the config's retryable set are retried.
//!
//! ```ignore
//! let strategy = RetryStrategy::new(network_monitor);
//! let body = strategy
//!     .execute(&RetryConfig::profile(RetryProfile::Normal), || async {
//!         http.execute(request.clone()).await
//!     })
//!     .await?;
//! ```

use crate::network_error::{NetworkError, NetworkErrorKind};
use bridge_traits::NetworkMonitor;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Named retry presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryProfile {
    /// 3 attempts, 1s base, 30s cap
    Default,
    /// 2 attempts, 0.5s base, 2s cap
    Fast,
    /// 3 attempts, 1s base, 10s cap
    Normal,
    /// 5 attempts, 2s base, 30s cap
    Aggressive,
    /// Playback: parse errors are not retried
    Streaming,
    /// Login: only connectivity and server errors are retried
    Auth,
}

/// Backoff parameters and the set of error kinds worth retrying.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
    pub retryable: HashSet<NetworkErrorKind>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(30_000),
            backoff_multiplier: 2.0,
            retryable: Self::default_retryable(),
        }
    }
}

impl RetryConfig {
    /// Kinds retried unless a profile narrows them.
    pub fn default_retryable() -> HashSet<NetworkErrorKind> {
        [
            NetworkErrorKind::NetworkUnavailable,
            NetworkErrorKind::ConnectionTimeout,
            NetworkErrorKind::ConnectionFailed,
            NetworkErrorKind::ServerError,
            NetworkErrorKind::ParseError,
            NetworkErrorKind::CorruptedStream,
        ]
        .into_iter()
        .collect()
    }

    pub fn profile(profile: RetryProfile) -> Self {
        match profile {
            RetryProfile::Default => Self::default(),
            RetryProfile::Fast => Self {
                max_attempts: 2,
                base_delay: Duration::from_millis(500),
                max_delay: Duration::from_millis(2000),
                backoff_multiplier: 1.5,
                ..Self::default()
            },
            RetryProfile::Normal => Self {
                max_attempts: 3,
                base_delay: Duration::from_millis(1000),
                max_delay: Duration::from_millis(10_000),
                backoff_multiplier: 2.0,
                ..Self::default()
            },
            RetryProfile::Aggressive => Self {
                max_attempts: 5,
                base_delay: Duration::from_millis(2000),
                max_delay: Duration::from_millis(30_000),
                backoff_multiplier: 2.5,
                ..Self::default()
            },
            RetryProfile::Streaming => Self {
                max_attempts: 3,
                base_delay: Duration::from_millis(1500),
                max_delay: Duration::from_millis(15_000),
                backoff_multiplier: 2.0,
                retryable: [
                    NetworkErrorKind::NetworkUnavailable,
                    NetworkErrorKind::ConnectionTimeout,
                    NetworkErrorKind::ConnectionFailed,
                    NetworkErrorKind::ServerError,
                    NetworkErrorKind::CorruptedStream,
                ]
                .into_iter()
                .collect(),
            },
            RetryProfile::Auth => Self {
                max_attempts: 2,
                base_delay: Duration::from_millis(1000),
                max_delay: Duration::from_millis(5000),
                backoff_multiplier: 2.0,
                retryable: [
                    NetworkErrorKind::NetworkUnavailable,
                    NetworkErrorKind::ConnectionTimeout,
                    NetworkErrorKind::ServerError,
                ]
                .into_iter()
                .collect(),
            },
        }
    }

    /// Delay before the retry that follows zero-based `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let millis = self.base_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped.max(0.0) as u64)
    }

    /// `attempt` is the one-based number of attempts made so far.
    pub fn should_retry(&self, error: &NetworkError, attempt: u32) -> bool {
        attempt < self.max_attempts
            && error.is_retryable()
            && self.retryable.contains(&error.kind())
    }
}

/// Executes operations with backoff and a connectivity precheck.
#[derive(Clone)]
pub struct RetryStrategy {
    network_monitor: Arc<dyn NetworkMonitor>,
}

impl std::fmt::Debug for RetryStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryStrategy")
            .field("network_monitor", &"NetworkMonitor { ... }")
            .finish()
    }
}

impl RetryStrategy {
    pub fn new(network_monitor: Arc<dyn NetworkMonitor>) -> Self {
        Self { network_monitor }
    }

    /// Run `operation` with retries.
    pub async fn execute<T, E, F, Fut>(
        &self,
        config: &RetryConfig,
        operation: F,
    ) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<NetworkError>,
    {
        self.execute_with_notify(config, |_, _, _| {}, operation)
            .await
    }

    /// Run `operation` with retries, calling `on_retry(next_attempt, error,
    /// delay)` before each backoff sleep.
    pub async fn execute_with_notify<T, E, F, Fut, N>(
        &self,
        config: &RetryConfig,
        mut on_retry: N,
        mut operation: F,
    ) -> Result<T, NetworkError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<NetworkError>,
        N: FnMut(u32, &NetworkError, Duration),
    {
        let mut last_error = None;

        for attempt in 0..config.max_attempts {
            if !self.network_monitor.is_connected().await {
                debug!(attempt, "Skipping attempt, network unavailable");
                return Err(NetworkError::NetworkUnavailable);
            }

            let error: NetworkError = match operation().await {
                Ok(value) => return Ok(value),
                Err(e) => e.into(),
            };

            if !config.should_retry(&error, attempt + 1) {
                debug!(attempt, kind = ?error.kind(), "Not retrying");
                return Err(error);
            }

            if attempt + 1 < config.max_attempts {
                let delay = config.delay_for(attempt);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "Retrying after failure"
                );
                on_retry(attempt + 1, &error, delay);
                tokio::time::sleep(delay).await;
            }

            last_error = Some(error);
        }

        Err(last_error.unwrap_or_else(|| NetworkError::Unknown {
            message: format!("Operation failed after {} attempts", config.max_attempts),
        }))
    }
}
