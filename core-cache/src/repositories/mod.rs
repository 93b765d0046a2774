//! # Repository Pattern Implementation
//!
//! Repository traits and their SQLite implementations for the catalog cache.
//!
//! ## Available Repositories
//!
//! - `XtreamCacheRepository` - per-partition movies, series, channels,
//!   categories and sync metadata
//! - `TmdbCacheRepository` - shared TMDB movie and series metadata with
//!   retention bookkeeping

pub mod tmdb;
pub mod xtream;

pub use tmdb::{SqliteTmdbCacheRepository, TmdbCacheRepository};
pub use xtream::{SqliteXtreamCacheRepository, XtreamCacheRepository};
