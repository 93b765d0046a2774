//! Domain models for the catalog cache
//!
//! Xtream models are what the remote API and the use cases exchange; the
//! cache adds the partition and sync timestamp columns on write. TMDB models
//! carry their own `last_sync` because retention is decided per row.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

// =============================================================================
// Xtream catalog
// =============================================================================

/// A VOD stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Movie {
    pub stream_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub category_id: String,
    pub rating: Option<String>,
    pub rating_5based: f64,
    /// Unix seconds as reported by the panel
    pub added_timestamp: i64,
    pub is_adult: bool,
    pub container_extension: Option<String>,
    pub tmdb_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Series {
    pub series_id: String,
    pub name: String,
    pub cover: Option<String>,
    pub category_id: String,
    pub plot: Option<String>,
    pub cast: Option<String>,
    pub director: Option<String>,
    pub genre: Option<String>,
    pub release_date: Option<String>,
    pub last_modified: i64,
    pub rating: Option<String>,
    pub rating_5based: f64,
    #[sqlx(json)]
    pub backdrop_path: Vec<String>,
    pub youtube_trailer: Option<String>,
    pub episode_run_time: Option<String>,
    pub tmdb_id: Option<String>,
}

/// A live TV channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Channel {
    pub stream_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub category_id: String,
    pub epg_channel_id: Option<String>,
    pub is_adult: bool,
    pub tv_archive: bool,
    pub tv_archive_duration: i64,
    pub added_timestamp: i64,
}

/// Which catalog a category belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CategoryType {
    Live,
    Vod,
    Series,
}

impl CategoryType {
    pub const ALL: [CategoryType; 3] = [CategoryType::Live, CategoryType::Vod, CategoryType::Series];

    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryType::Live => "live",
            CategoryType::Vod => "vod",
            CategoryType::Series => "series",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "live" => Some(CategoryType::Live),
            "vod" => Some(CategoryType::Vod),
            "series" => Some(CategoryType::Series),
            _ => None,
        }
    }
}

impl fmt::Display for CategoryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub category_id: String,
    pub name: String,
    pub parent_id: i64,
    pub category_type: CategoryType,
}

/// Number of rows written per entity type by one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCounts {
    pub categories: u64,
    pub channels: u64,
    pub movies: u64,
    pub series: u64,
}

impl SyncCounts {
    pub fn total(&self) -> u64 {
        self.categories + self.channels + self.movies + self.series
    }
}

/// Last full sync of one partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SyncMetadata {
    pub partition_id: String,
    /// Unix epoch millis
    pub last_full_sync: i64,
    pub movies_count: i64,
    pub series_count: i64,
    pub channels_count: i64,
    pub categories_count: i64,
    pub is_valid: bool,
}

impl SyncMetadata {
    pub fn last_full_sync_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.last_full_sync)
    }

    pub fn counts(&self) -> SyncCounts {
        SyncCounts {
            categories: self.categories_count.max(0) as u64,
            channels: self.channels_count.max(0) as u64,
            movies: self.movies_count.max(0) as u64,
            series: self.series_count.max(0) as u64,
        }
    }
}

// =============================================================================
// TMDB metadata
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TmdbMovie {
    pub tmdb_id: String,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    pub runtime: Option<i64>,
    #[sqlx(json)]
    pub genres: Vec<String>,
    pub adult: bool,
    pub budget: i64,
    pub revenue: i64,
    pub tagline: Option<String>,
    pub status: Option<String>,
    pub original_language: Option<String>,
    pub popularity: f64,
    pub homepage: Option<String>,
    pub imdb_id: Option<String>,
    /// Unix epoch millis; overwritten by the cache on every write
    pub last_sync: i64,
}

impl TmdbMovie {
    /// Minimal record; remaining fields default to empty.
    pub fn new(tmdb_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            tmdb_id: tmdb_id.into(),
            title: title.into(),
            original_title: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
            release_date: None,
            vote_average: 0.0,
            vote_count: 0,
            runtime: None,
            genres: Vec::new(),
            adult: false,
            budget: 0,
            revenue: 0,
            tagline: None,
            status: None,
            original_language: None,
            popularity: 0.0,
            homepage: None,
            imdb_id: None,
            last_sync: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TmdbSeries {
    pub tmdb_id: String,
    pub name: String,
    pub original_name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub last_air_date: Option<String>,
    pub vote_average: f64,
    pub vote_count: i64,
    #[sqlx(json)]
    pub genres: Vec<String>,
    pub adult: bool,
    #[sqlx(json)]
    pub episode_run_time: Vec<i64>,
    pub in_production: bool,
    pub number_of_episodes: i64,
    pub number_of_seasons: i64,
    pub original_language: Option<String>,
    pub popularity: f64,
    pub status: Option<String>,
    pub tagline: Option<String>,
    pub series_type: Option<String>,
    pub homepage: Option<String>,
    pub last_sync: i64,
}

impl TmdbSeries {
    pub fn new(tmdb_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            tmdb_id: tmdb_id.into(),
            name: name.into(),
            original_name: None,
            overview: None,
            poster_path: None,
            backdrop_path: None,
            first_air_date: None,
            last_air_date: None,
            vote_average: 0.0,
            vote_count: 0,
            genres: Vec::new(),
            adult: false,
            episode_run_time: Vec::new(),
            in_production: false,
            number_of_episodes: 0,
            number_of_seasons: 0,
            original_language: None,
            popularity: 0.0,
            status: None,
            tagline: None,
            series_type: None,
            homepage: None,
            last_sync: 0,
        }
    }
}

/// Singleton bookkeeping row for TMDB cleanup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct TmdbSyncMetadata {
    pub id: i64,
    pub last_cleanup: i64,
    pub total_movies: i64,
    pub total_series: i64,
}

impl TmdbSyncMetadata {
    pub fn last_cleanup_at(&self) -> Option<DateTime<Utc>> {
        millis_to_datetime(self.last_cleanup)
    }
}

pub(crate) fn millis_to_datetime(millis: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis).single()
}
