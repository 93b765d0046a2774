//! # Core Runtime Module
//!
//! Foundational runtime infrastructure for the IPTV core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Event bus system
//! - Network error taxonomy and retry with backoff
//!
//! ## Overview
//!
//! Every other crate in the workspace depends on this one. It establishes the
//! logging conventions, the event broadcasting used to announce cache and sync
//! changes, and the retry policy applied to remote Xtream calls.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;
pub mod network_error;
pub mod retry;

pub use config::{CachePolicy, CoreConfig, CoreConfigBuilder, FeatureFlags};
pub use error::{Error, Result};
pub use events::{CoreEvent, EventBus, EventStream};
pub use network_error::{NetworkError, NetworkErrorKind};
pub use retry::{RetryConfig, RetryProfile, RetryStrategy};
