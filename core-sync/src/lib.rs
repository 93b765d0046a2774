//! # Catalog Sync
//!
//! Keeps the signed-in user's Xtream catalog cache fresh.
//!
//! ## Components
//!
//! - **Sync Manager** (`manager`): full refresh of categories, channels,
//!   movies and series as concurrent, independently failing tasks, plus the
//!   background auto-sync loop
//! - **Stages** (`stage`): progress checkpoints and sync outcomes

pub mod error;
pub mod manager;
pub mod stage;

pub use error::{Result, SyncError};
pub use manager::{SyncConfig, SyncManager};
pub use stage::{CacheInfo, ProgressTracker, SyncOutcome, SyncStage};
