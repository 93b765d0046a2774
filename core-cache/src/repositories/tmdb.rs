//! TMDB metadata cache repository
//!
//! Rows are shared by every partition. Freshness is per row: callers pass a
//! `min_sync` cutoff (unix millis) and only rows synced after it are returned
//! by the batch and listing queries.

use crate::error::Result;
use crate::models::{TmdbMovie, TmdbSeries, TmdbSyncMetadata};
use async_trait::async_trait;
use sqlx::{query_as, QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, instrument};

#[async_trait]
pub trait TmdbCacheRepository: Send + Sync {
    /// Upsert movies with `last_sync = synced_at`. Returns rows written.
    async fn upsert_movies(&self, items: &[TmdbMovie], synced_at: i64) -> Result<u64>;

    async fn upsert_series(&self, items: &[TmdbSeries], synced_at: i64) -> Result<u64>;

    async fn find_movie(&self, tmdb_id: &str) -> Result<Option<TmdbMovie>>;

    async fn find_series(&self, tmdb_id: &str) -> Result<Option<TmdbSeries>>;

    /// Movies among `ids` synced after `min_sync`.
    async fn find_movies_by_ids(&self, ids: &[String], min_sync: i64) -> Result<Vec<TmdbMovie>>;

    async fn find_series_by_ids(&self, ids: &[String], min_sync: i64)
        -> Result<Vec<TmdbSeries>>;

    /// Substring match on title or original title, most popular first.
    async fn search_movies(&self, query: &str, limit: u32) -> Result<Vec<TmdbMovie>>;

    /// Substring match on name or original name, most popular first.
    async fn search_series(&self, query: &str, limit: u32) -> Result<Vec<TmdbSeries>>;

    async fn popular_movies(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbMovie>>;

    async fn top_rated_movies(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbMovie>>;

    async fn popular_series(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbSeries>>;

    async fn top_rated_series(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbSeries>>;

    /// `(movies, series)` row counts.
    async fn counts(&self) -> Result<(u64, u64)>;

    async fn find_sync_metadata(&self) -> Result<Option<TmdbSyncMetadata>>;

    /// Delete rows synced before `cutoff` and record the cleanup at `now`.
    ///
    /// Runs in one transaction; returns the updated singleton metadata.
    async fn purge_expired(&self, cutoff: i64, now: i64) -> Result<TmdbSyncMetadata>;
}

pub struct SqliteTmdbCacheRepository {
    pool: SqlitePool,
}

impl SqliteTmdbCacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TmdbCacheRepository for SqliteTmdbCacheRepository {
    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn upsert_movies(&self, items: &[TmdbMovie], synced_at: i64) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for movie in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO tmdb_movie_cache (
                    tmdb_id, title, original_title, overview, poster_path,
                    backdrop_path, release_date, vote_average, vote_count,
                    runtime, genres, adult, budget, revenue, tagline, status,
                    original_language, popularity, homepage, imdb_id, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&movie.tmdb_id)
            .bind(&movie.title)
            .bind(&movie.original_title)
            .bind(&movie.overview)
            .bind(&movie.poster_path)
            .bind(&movie.backdrop_path)
            .bind(&movie.release_date)
            .bind(movie.vote_average)
            .bind(movie.vote_count)
            .bind(movie.runtime)
            .bind(sqlx::types::Json(&movie.genres))
            .bind(movie.adult)
            .bind(movie.budget)
            .bind(movie.revenue)
            .bind(&movie.tagline)
            .bind(&movie.status)
            .bind(&movie.original_language)
            .bind(movie.popularity)
            .bind(&movie.homepage)
            .bind(&movie.imdb_id)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("TMDB movies cached");
        Ok(items.len() as u64)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn upsert_series(&self, items: &[TmdbSeries], synced_at: i64) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for series in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO tmdb_series_cache (
                    tmdb_id, name, original_name, overview, poster_path,
                    backdrop_path, first_air_date, last_air_date, vote_average,
                    vote_count, genres, adult, episode_run_time, in_production,
                    number_of_episodes, number_of_seasons, original_language,
                    popularity, status, tagline, series_type, homepage, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&series.tmdb_id)
            .bind(&series.name)
            .bind(&series.original_name)
            .bind(&series.overview)
            .bind(&series.poster_path)
            .bind(&series.backdrop_path)
            .bind(&series.first_air_date)
            .bind(&series.last_air_date)
            .bind(series.vote_average)
            .bind(series.vote_count)
            .bind(sqlx::types::Json(&series.genres))
            .bind(series.adult)
            .bind(sqlx::types::Json(&series.episode_run_time))
            .bind(series.in_production)
            .bind(series.number_of_episodes)
            .bind(series.number_of_seasons)
            .bind(&series.original_language)
            .bind(series.popularity)
            .bind(&series.status)
            .bind(&series.tagline)
            .bind(&series.series_type)
            .bind(&series.homepage)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("TMDB series cached");
        Ok(items.len() as u64)
    }

    async fn find_movie(&self, tmdb_id: &str) -> Result<Option<TmdbMovie>> {
        let movie = query_as::<_, TmdbMovie>("SELECT * FROM tmdb_movie_cache WHERE tmdb_id = ?")
            .bind(tmdb_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(movie)
    }

    async fn find_series(&self, tmdb_id: &str) -> Result<Option<TmdbSeries>> {
        let series =
            query_as::<_, TmdbSeries>("SELECT * FROM tmdb_series_cache WHERE tmdb_id = ?")
                .bind(tmdb_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(series)
    }

    async fn find_movies_by_ids(&self, ids: &[String], min_sync: i64) -> Result<Vec<TmdbMovie>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut movies = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_CHUNK_SIZE) {
            let mut builder = batch_query("tmdb_movie_cache", chunk, min_sync);
            movies.extend(
                builder
                    .build_query_as::<TmdbMovie>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(movies)
    }

    async fn find_series_by_ids(
        &self,
        ids: &[String],
        min_sync: i64,
    ) -> Result<Vec<TmdbSeries>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut series = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(BATCH_CHUNK_SIZE) {
            let mut builder = batch_query("tmdb_series_cache", chunk, min_sync);
            series.extend(
                builder
                    .build_query_as::<TmdbSeries>()
                    .fetch_all(&self.pool)
                    .await?,
            );
        }

        Ok(series)
    }

    async fn search_movies(&self, query: &str, limit: u32) -> Result<Vec<TmdbMovie>> {
        let movies = query_as::<_, TmdbMovie>(
            r#"
            SELECT * FROM tmdb_movie_cache
            WHERE title LIKE ?1 ESCAPE '\' OR original_title LIKE ?1 ESCAPE '\'
            ORDER BY popularity DESC
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn search_series(&self, query: &str, limit: u32) -> Result<Vec<TmdbSeries>> {
        let series = query_as::<_, TmdbSeries>(
            r#"
            SELECT * FROM tmdb_series_cache
            WHERE name LIKE ?1 ESCAPE '\' OR original_name LIKE ?1 ESCAPE '\'
            ORDER BY popularity DESC
            LIMIT ?2
            "#,
        )
        .bind(like_pattern(query))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn popular_movies(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbMovie>> {
        let movies = query_as::<_, TmdbMovie>(
            "SELECT * FROM tmdb_movie_cache WHERE last_sync > ? ORDER BY popularity DESC LIMIT ?",
        )
        .bind(min_sync)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn top_rated_movies(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbMovie>> {
        let movies = query_as::<_, TmdbMovie>(
            "SELECT * FROM tmdb_movie_cache WHERE last_sync > ? ORDER BY vote_average DESC LIMIT ?",
        )
        .bind(min_sync)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn popular_series(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbSeries>> {
        let series = query_as::<_, TmdbSeries>(
            "SELECT * FROM tmdb_series_cache WHERE last_sync > ? ORDER BY popularity DESC LIMIT ?",
        )
        .bind(min_sync)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn top_rated_series(&self, limit: u32, min_sync: i64) -> Result<Vec<TmdbSeries>> {
        let series = query_as::<_, TmdbSeries>(
            "SELECT * FROM tmdb_series_cache WHERE last_sync > ? ORDER BY vote_average DESC LIMIT ?",
        )
        .bind(min_sync)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn counts(&self) -> Result<(u64, u64)> {
        let (movies, series): (i64, i64) = query_as(
            "SELECT (SELECT COUNT(*) FROM tmdb_movie_cache), (SELECT COUNT(*) FROM tmdb_series_cache)",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok((movies as u64, series as u64))
    }

    async fn find_sync_metadata(&self) -> Result<Option<TmdbSyncMetadata>> {
        let metadata =
            query_as::<_, TmdbSyncMetadata>("SELECT * FROM tmdb_sync_metadata WHERE id = 1")
                .fetch_optional(&self.pool)
                .await?;

        Ok(metadata)
    }

    #[instrument(skip(self))]
    async fn purge_expired(&self, cutoff: i64, now: i64) -> Result<TmdbSyncMetadata> {
        let mut tx = self.pool.begin().await?;

        let movies_removed = sqlx::query("DELETE FROM tmdb_movie_cache WHERE last_sync < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();
        let series_removed = sqlx::query("DELETE FROM tmdb_series_cache WHERE last_sync < ?")
            .bind(cutoff)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let (total_movies, total_series): (i64, i64) = query_as(
            "SELECT (SELECT COUNT(*) FROM tmdb_movie_cache), (SELECT COUNT(*) FROM tmdb_series_cache)",
        )
        .fetch_one(&mut *tx)
        .await?;

        let metadata = TmdbSyncMetadata {
            id: 1,
            last_cleanup: now,
            total_movies,
            total_series,
        };
        sqlx::query(
            "INSERT OR REPLACE INTO tmdb_sync_metadata (id, last_cleanup, total_movies, total_series) VALUES (?, ?, ?, ?)",
        )
        .bind(metadata.id)
        .bind(metadata.last_cleanup)
        .bind(metadata.total_movies)
        .bind(metadata.total_series)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(movies_removed, series_removed, "Expired TMDB rows purged");
        Ok(metadata)
    }
}

/// Ids per `IN (...)` list, well under SQLite's bound-variable limit.
const BATCH_CHUNK_SIZE: usize = 500;

/// `%query%` with LIKE wildcards in `query` matched literally.
fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for c in query.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

fn batch_query<'a>(table: &str, ids: &'a [String], min_sync: i64) -> QueryBuilder<'a, Sqlite> {
    let mut builder = QueryBuilder::new(format!("SELECT * FROM {} WHERE last_sync > ", table));
    builder.push_bind(min_sync);
    builder.push(" AND tmdb_id IN (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.as_str());
    }
    separated.push_unseparated(")");
    builder
}
