//! Xtream `player_api.php` response types
//!
//! Panels disagree on JSON types: ids, ratings and timestamps arrive as
//! numbers or strings, flags as `"1"`, `1` or `true`, and optional fields as
//! `null` or `""`. Every field is decoded leniently and defaults when absent.

use core_cache::{Category, CategoryType, Channel, Movie, Series};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A catalog list entry that the cache keys by its panel id.
///
/// Entries without an id cannot be stored without colliding on the primary
/// key, so they are treated as malformed.
pub trait CatalogEntry {
    fn has_id(&self) -> bool;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_name: String,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub parent_id: i64,
}

impl CategoryDto {
    pub fn into_category(self, kind: CategoryType) -> Category {
        Category {
            category_id: self.category_id,
            name: self.category_name,
            parent_id: self.parent_id,
            category_type: kind,
        }
    }
}

/// Entry of `get_live_streams`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveStreamDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub stream_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub epg_channel_id: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub added: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_adult: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub tv_archive: bool,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub tv_archive_duration: i64,
}

impl From<LiveStreamDto> for Channel {
    fn from(dto: LiveStreamDto) -> Self {
        Channel {
            stream_id: dto.stream_id,
            name: dto.name,
            icon: dto.stream_icon,
            category_id: dto.category_id,
            epg_channel_id: dto.epg_channel_id,
            is_adult: dto.is_adult,
            tv_archive: dto.tv_archive,
            tv_archive_duration: dto.tv_archive_duration,
            added_timestamp: dto.added,
        }
    }
}

/// Entry of `get_vod_streams`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VodStreamDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub stream_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub stream_icon: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating_5based: f64,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub added: i64,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_adult: bool,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub container_extension: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tmdb_id: Option<String>,
}

impl From<VodStreamDto> for Movie {
    fn from(dto: VodStreamDto) -> Self {
        Movie {
            stream_id: dto.stream_id,
            name: dto.name,
            icon: dto.stream_icon,
            category_id: dto.category_id,
            rating: dto.rating,
            rating_5based: dto.rating_5based,
            added_timestamp: dto.added,
            is_adult: dto.is_adult,
            container_extension: dto.container_extension,
            tmdb_id: dto.tmdb_id,
        }
    }
}

/// Entry of `get_series`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SeriesDto {
    #[serde(default, deserialize_with = "lenient_string")]
    pub series_id: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub name: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cover: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub plot: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub cast: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub director: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub genre: Option<String>,
    #[serde(
        default,
        rename = "releaseDate",
        alias = "release_date",
        deserialize_with = "lenient_opt_string"
    )]
    pub release_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_i64")]
    pub last_modified: i64,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub rating: Option<String>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub rating_5based: f64,
    #[serde(default, deserialize_with = "lenient_string_list")]
    pub backdrop_path: Vec<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub youtube_trailer: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub episode_run_time: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub category_id: String,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub tmdb_id: Option<String>,
}

impl From<SeriesDto> for Series {
    fn from(dto: SeriesDto) -> Self {
        Series {
            series_id: dto.series_id,
            name: dto.name,
            cover: dto.cover,
            category_id: dto.category_id,
            plot: dto.plot,
            cast: dto.cast,
            director: dto.director,
            genre: dto.genre,
            release_date: dto.release_date,
            last_modified: dto.last_modified,
            rating: dto.rating,
            rating_5based: dto.rating_5based,
            backdrop_path: dto.backdrop_path,
            youtube_trailer: dto.youtube_trailer,
            episode_run_time: dto.episode_run_time,
            tmdb_id: dto.tmdb_id,
        }
    }
}

impl CatalogEntry for CategoryDto {
    fn has_id(&self) -> bool {
        !self.category_id.is_empty()
    }
}

impl CatalogEntry for LiveStreamDto {
    fn has_id(&self) -> bool {
        !self.stream_id.is_empty()
    }
}

impl CatalogEntry for VodStreamDto {
    fn has_id(&self) -> bool {
        !self.stream_id.is_empty()
    }
}

impl CatalogEntry for SeriesDto {
    fn has_id(&self) -> bool {
        !self.series_id.is_empty()
    }
}

// =============================================================================
// Lenient field decoders
// =============================================================================

fn value_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    Ok(value_to_string(Value::deserialize(deserializer)?))
}

fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_default(),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().map(|f| f as i64))
                .unwrap_or_default()
        }
        Value::Bool(b) => i64::from(b),
        _ => 0,
    })
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::String(s) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    })
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Bool(b) => b,
        Value::Number(n) => n.as_i64().is_some_and(|n| n != 0),
        Value::String(s) => matches!(s.trim(), "1" | "true" | "yes"),
        _ => false,
    })
}

fn lenient_string_list<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<String>, D::Error> {
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Array(items) => items.into_iter().filter_map(value_to_string).collect(),
        other => value_to_string(other).into_iter().collect(),
    })
}
