//! # Event Bus System
//!
//! Provides an event-driven notification channel for the IPTV core using
//! `tokio::sync::broadcast`. Hosts subscribe to learn when a session changes,
//! when a catalog sync progresses, or when cached content was replaced, and
//! re-query the cache instead of holding a reactive pipeline.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: Strongly-typed enum hierarchies for auth, sync and cache
//! - **EventBus**: Central broadcast channel for publishing events
//! - **EventStream**: Wrapper for consuming events with filtering
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     emit      ┌───────────┐
//! │ SessionStore ├──────────────>│           │
//! └──────────────┘               │           │     subscribe    ┌────────────┐
//! ┌──────────────┐     emit      │ EventBus  ├─────────────────>│ Host UI    │
//! │ SyncManager  ├──────────────>│ (broadcast│                  └────────────┘
//! └──────────────┘               │  channel) │
//! ┌──────────────┐     emit      │           │
//! │ CacheManager ├──────────────>│           │
//! └──────────────┘               └───────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use core_runtime::events::{CacheEvent, CoreEvent, EventBus, EventStream};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(100);
//! let mut stream = EventStream::new(event_bus.subscribe())
//!     .filter(|event| matches!(event, CoreEvent::Cache(_)));
//!
//! event_bus
//!     .emit(CoreEvent::Cache(CacheEvent::Invalidated {
//!         partition: "1a2b3c4d".to_string(),
//!     }))
//!     .ok();
//!
//! let event = stream.recv().await.unwrap();
//! assert_eq!(event.description(), "Catalog cache invalidated");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! - **`RecvError::Lagged(n)`**: Subscriber was too slow and missed `n` events.
//!   This is non-fatal; the subscriber can continue receiving new events.
//! - **`RecvError::Closed`**: All senders have been dropped. This indicates shutdown.
//!
//! Emitting with no subscribers returns an error; producers ignore it with `.ok()`.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

// Re-export commonly used types
pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
///
/// Subscribers that can't keep up will receive `RecvError::Lagged`.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

// ============================================================================
// Core Event Types
// ============================================================================

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Session changes
    Auth(AuthEvent),
    /// Catalog sync lifecycle
    Sync(SyncEvent),
    /// Persisted cache changes
    Cache(CacheEvent),
}

impl CoreEvent {
    /// Get a human-readable description of the event
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Auth(e) => e.description(),
            CoreEvent::Sync(e) => e.description(),
            CoreEvent::Cache(e) => e.description(),
        }
    }

    /// Get the severity level of the event
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Auth(AuthEvent::AuthError { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Sync(SyncEvent::StageDegraded { .. }) => EventSeverity::Warning,
            CoreEvent::Auth(AuthEvent::SignedIn { .. }) => EventSeverity::Info,
            CoreEvent::Sync(SyncEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Cache(CacheEvent::Evicted { .. }) => EventSeverity::Info,
            CoreEvent::Cache(CacheEvent::Cleaned { .. }) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

// ============================================================================
// Authentication Events
// ============================================================================

/// Session events. `partition` is always the short form of the partition id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum AuthEvent {
    SignedIn {
        profile_id: String,
        partition: String,
    },
    SignedOut {
        profile_id: String,
    },
    AuthError {
        profile_id: Option<String>,
        message: String,
    },
}

impl AuthEvent {
    fn description(&self) -> &str {
        match self {
            AuthEvent::SignedIn { .. } => "User signed in successfully",
            AuthEvent::SignedOut { .. } => "User signed out",
            AuthEvent::AuthError { .. } => "Authentication error",
        }
    }
}

// ============================================================================
// Sync Events
// ============================================================================

/// Catalog sync events
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum SyncEvent {
    /// A full sync pass started
    Started { sync_id: String, partition: String },
    /// Coarse progress checkpoint
    Progress {
        sync_id: String,
        stage: String,
        percent: u8,
    },
    /// One entity type degraded to an empty list this round
    StageDegraded {
        sync_id: String,
        stage: String,
        message: String,
    },
    /// Cache was still valid, nothing fetched
    Skipped {
        partition: String,
        valid_until: Option<i64>,
    },
    Completed {
        sync_id: String,
        categories: u64,
        channels: u64,
        movies: u64,
        series: u64,
        duration_ms: u64,
    },
    Failed {
        sync_id: Option<String>,
        message: String,
        recoverable: bool,
    },
}

impl SyncEvent {
    fn description(&self) -> &str {
        match self {
            SyncEvent::Started { .. } => "Catalog sync started",
            SyncEvent::Progress { .. } => "Catalog sync in progress",
            SyncEvent::StageDegraded { .. } => "Catalog sync stage returned no data",
            SyncEvent::Skipped { .. } => "Catalog cache still valid",
            SyncEvent::Completed { .. } => "Catalog sync completed",
            SyncEvent::Failed { .. } => "Catalog sync failed",
        }
    }
}

// ============================================================================
// Cache Events
// ============================================================================

/// Cache change notifications
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum CacheEvent {
    /// Rows of one entity type were replaced (`entity` is e.g. `"movies"`)
    Updated {
        partition: Option<String>,
        entity: String,
        count: u64,
    },
    Invalidated {
        partition: String,
    },
    /// Rows of every other partition were removed
    Evicted {
        kept_partition: String,
        rows_removed: u64,
    },
    /// All rows of one partition were removed
    Cleared {
        partition: String,
    },
    /// TMDB retention cleanup finished
    Cleaned {
        movies_remaining: u64,
        series_remaining: u64,
    },
}

impl CacheEvent {
    fn description(&self) -> &str {
        match self {
            CacheEvent::Updated { .. } => "Catalog cache updated",
            CacheEvent::Invalidated { .. } => "Catalog cache invalidated",
            CacheEvent::Evicted { .. } => "Other users' cache evicted",
            CacheEvent::Cleared { .. } => "Catalog cache cleared",
            CacheEvent::Cleaned { .. } => "Expired metadata cleaned",
        }
    }
}

// ============================================================================
// Event Bus
// ============================================================================

/// Central event bus for publishing and subscribing to core events.
///
/// Cheap to clone; every clone shares the same channel.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Create a new event bus with the specified buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// Returns the number of subscribers that received it, or an error when
    /// nobody is listening.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

// ============================================================================
// Event Stream Wrapper
// ============================================================================

type EventFilter = Box<dyn Fn(&CoreEvent) -> bool + Send + Sync>;

/// Receiver wrapper that skips events not matching a predicate.
pub struct EventStream {
    receiver: Receiver<CoreEvent>,
    filter: Option<EventFilter>,
}

impl EventStream {
    pub fn new(receiver: Receiver<CoreEvent>) -> Self {
        Self {
            receiver,
            filter: None,
        }
    }

    pub fn filter<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&CoreEvent) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Box::new(predicate));
        self
    }

    fn matches(&self, event: &CoreEvent) -> bool {
        self.filter.as_ref().map_or(true, |filter| filter(event))
    }

    /// Receive the next matching event.
    pub async fn recv(&mut self) -> Result<CoreEvent, RecvError> {
        loop {
            let event = self.receiver.recv().await?;
            if self.matches(&event) {
                return Ok(event);
            }
        }
    }

    /// Non-blocking receive. `None` when no matching event is queued.
    pub fn try_recv(&mut self) -> Option<Result<CoreEvent, RecvError>> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => {
                    if self.matches(&event) {
                        return Some(Ok(event));
                    }
                }
                Err(broadcast::error::TryRecvError::Empty) => return None,
                Err(broadcast::error::TryRecvError::Lagged(n)) => {
                    return Some(Err(RecvError::Lagged(n)))
                }
                Err(broadcast::error::TryRecvError::Closed) => return Some(Err(RecvError::Closed)),
            }
        }
    }
}

impl fmt::Debug for EventStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("has_filter", &self.filter.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn completed() -> CoreEvent {
        CoreEvent::Sync(SyncEvent::Completed {
            sync_id: "sync-1".to_string(),
            categories: 42,
            channels: 1200,
            movies: 5300,
            series: 800,
            duration_ms: 4100,
        })
    }

    #[tokio::test]
    async fn test_event_bus_subscription() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let _sub1 = bus.subscribe();
        let _sub2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_event_emission_no_subscribers() {
        let bus = EventBus::new(10);
        let event = CoreEvent::Auth(AuthEvent::SignedOut {
            profile_id: "profile-1".to_string(),
        });

        assert!(bus.emit(event).is_err());
    }

    #[tokio::test]
    async fn test_multiple_subscribers_receive_event() {
        let bus = EventBus::new(10);
        let mut sub1 = bus.subscribe();
        let mut sub2 = bus.subscribe();

        let event = CoreEvent::Sync(SyncEvent::Started {
            sync_id: "sync-1".to_string(),
            partition: "1a2b3c4d".to_string(),
        });
        assert_eq!(bus.emit(event.clone()).unwrap(), 2);

        assert_eq!(sub1.recv().await.unwrap(), event);
        assert_eq!(sub2.recv().await.unwrap(), event);
    }

    #[tokio::test]
    async fn test_event_stream_with_filter() {
        let bus = EventBus::new(10);
        let mut stream =
            EventStream::new(bus.subscribe()).filter(|event| matches!(event, CoreEvent::Cache(_)));

        bus.emit(completed()).ok();

        let cache_event = CoreEvent::Cache(CacheEvent::Updated {
            partition: Some("1a2b3c4d".to_string()),
            entity: "movies".to_string(),
            count: 5300,
        });
        bus.emit(cache_event.clone()).ok();

        assert_eq!(stream.recv().await.unwrap(), cache_event);
        assert!(stream.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_lagged_subscriber() {
        let bus = EventBus::new(2);
        let mut sub = bus.subscribe();

        for percent in [10u8, 20, 40, 60, 80] {
            bus.emit(CoreEvent::Sync(SyncEvent::Progress {
                sync_id: "sync-1".to_string(),
                stage: "movies".to_string(),
                percent,
            }))
            .ok();
        }

        assert!(matches!(sub.recv().await, Err(RecvError::Lagged(_))));
    }

    #[test]
    fn test_event_severity() {
        let failed = CoreEvent::Sync(SyncEvent::Failed {
            sync_id: None,
            message: "not authenticated".to_string(),
            recoverable: true,
        });
        assert_eq!(failed.severity(), EventSeverity::Error);
        assert_eq!(completed().severity(), EventSeverity::Info);

        let degraded = CoreEvent::Sync(SyncEvent::StageDegraded {
            sync_id: "sync-1".to_string(),
            stage: "series".to_string(),
            message: "HTTP 503".to_string(),
        });
        assert_eq!(degraded.severity(), EventSeverity::Warning);

        let invalidated = CoreEvent::Cache(CacheEvent::Invalidated {
            partition: "1a2b3c4d".to_string(),
        });
        assert_eq!(invalidated.severity(), EventSeverity::Debug);
    }

    #[test]
    fn test_event_description() {
        let event = CoreEvent::Cache(CacheEvent::Evicted {
            kept_partition: "1a2b3c4d".to_string(),
            rows_removed: 120,
        });
        assert_eq!(event.description(), "Other users' cache evicted");
    }

    #[tokio::test]
    async fn test_concurrent_publishers() {
        let bus = EventBus::new(100);
        let mut sub = bus.subscribe();

        let bus1 = bus.clone();
        let bus2 = bus.clone();

        let handle1 = tokio::spawn(async move {
            for i in 0..10u64 {
                bus1.emit(CoreEvent::Cache(CacheEvent::Updated {
                    partition: None,
                    entity: "tmdb_movies".to_string(),
                    count: i,
                }))
                .ok();
            }
        });

        let handle2 = tokio::spawn(async move {
            for i in 0..10u8 {
                bus2.emit(CoreEvent::Sync(SyncEvent::Progress {
                    sync_id: "sync-1".to_string(),
                    stage: "channels".to_string(),
                    percent: i * 10,
                }))
                .ok();
            }
        });

        handle1.await.ok();
        handle2.await.ok();

        let mut count = 0;
        while sub.try_recv().is_ok() {
            count += 1;
        }
        assert_eq!(count, 20);
    }

    #[test]
    fn test_event_serialization() {
        let event = completed();

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"type\":\"Sync\""));
        assert!(json.contains("\"event\":\"Completed\""));

        let deserialized: CoreEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, event);
    }
}
