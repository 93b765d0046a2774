//! # Catalog Cache
//!
//! Persistent SQLite cache for the Xtream catalog and TMDB metadata.
//!
//! ## Overview
//!
//! - Xtream rows (movies, series, channels, categories) are partitioned per
//!   user by [`PartitionId`]; one metadata row per partition records the last
//!   full sync.
//! - TMDB rows are shared by all users and expire by retention.
//! - [`DatabaseCacheManager`] is the facade the sync and service layers use.

pub mod db;
pub mod error;
pub mod manager;
pub mod models;
pub mod repositories;

pub use core_auth::PartitionId;
pub use core_runtime::CachePolicy;
pub use db::{create_pool, create_test_pool, DatabaseConfig};
pub use error::{CacheError, Result};
pub use manager::DatabaseCacheManager;
pub use models::{
    Category, CategoryType, Channel, Movie, Series, SyncCounts, SyncMetadata, TmdbMovie,
    TmdbSeries, TmdbSyncMetadata,
};
