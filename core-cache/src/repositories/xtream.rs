//! Xtream catalog cache repository
//!
//! Every query is scoped to one partition. Bulk writes run inside a single
//! transaction and replace rows by primary key.

use crate::error::Result;
use crate::models::{Category, CategoryType, Channel, Movie, Series, SyncCounts, SyncMetadata};
use async_trait::async_trait;
use sqlx::{query_as, SqlitePool};
use tracing::{debug, instrument};

/// Partitioned tables, metadata last.
const PARTITIONED_TABLES: [&str; 5] = [
    "xtream_movies_cache",
    "xtream_series_cache",
    "xtream_channels_cache",
    "xtream_categories_cache",
    "xtream_sync_metadata",
];

/// Data access for the per-user Xtream cache
#[async_trait]
pub trait XtreamCacheRepository: Send + Sync {
    /// Upsert movies, stamping `last_sync = synced_at`. Returns rows written.
    async fn upsert_movies(&self, partition: &str, items: &[Movie], synced_at: i64)
        -> Result<u64>;

    async fn upsert_series(&self, partition: &str, items: &[Series], synced_at: i64)
        -> Result<u64>;

    async fn upsert_channels(
        &self,
        partition: &str,
        items: &[Channel],
        synced_at: i64,
    ) -> Result<u64>;

    /// Upsert categories under `kind`, ignoring each item's own type tag.
    async fn upsert_categories(
        &self,
        partition: &str,
        items: &[Category],
        kind: CategoryType,
        synced_at: i64,
    ) -> Result<u64>;

    async fn find_movies(&self, partition: &str) -> Result<Vec<Movie>>;

    async fn find_movies_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Movie>>;

    async fn find_movie(&self, partition: &str, stream_id: &str) -> Result<Option<Movie>>;

    async fn find_series(&self, partition: &str) -> Result<Vec<Series>>;

    async fn find_series_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Series>>;

    async fn find_series_by_id(&self, partition: &str, series_id: &str)
        -> Result<Option<Series>>;

    async fn find_channels(&self, partition: &str) -> Result<Vec<Channel>>;

    async fn find_channels_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Channel>>;

    async fn find_categories(&self, partition: &str, kind: CategoryType)
        -> Result<Vec<Category>>;

    async fn find_all_categories(&self, partition: &str) -> Result<Vec<Category>>;

    /// Distinct, non-empty TMDB ids referenced by cached movies.
    async fn movie_tmdb_ids(&self, partition: &str) -> Result<Vec<String>>;

    async fn series_tmdb_ids(&self, partition: &str) -> Result<Vec<String>>;

    async fn find_movies_by_tmdb_id(&self, partition: &str, tmdb_id: &str)
        -> Result<Vec<Movie>>;

    async fn find_series_by_tmdb_id(&self, partition: &str, tmdb_id: &str)
        -> Result<Vec<Series>>;

    /// Current row counts of the four entity tables.
    async fn row_counts(&self, partition: &str) -> Result<SyncCounts>;

    async fn upsert_sync_metadata(&self, metadata: &SyncMetadata) -> Result<()>;

    async fn find_sync_metadata(&self, partition: &str) -> Result<Option<SyncMetadata>>;

    /// Returns `false` when the partition has no metadata row.
    async fn set_sync_metadata_valid(&self, partition: &str, valid: bool) -> Result<bool>;

    /// Delete every row whose partition differs from `keep`. Returns rows removed.
    async fn delete_other_partitions(&self, keep: &str) -> Result<u64>;

    /// Delete every row of `partition`. Returns rows removed.
    async fn delete_partition(&self, partition: &str) -> Result<u64>;
}

/// SQLite implementation of XtreamCacheRepository
pub struct SqliteXtreamCacheRepository {
    pool: SqlitePool,
}

impl SqliteXtreamCacheRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl XtreamCacheRepository for SqliteXtreamCacheRepository {
    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn upsert_movies(
        &self,
        partition: &str,
        items: &[Movie],
        synced_at: i64,
    ) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for movie in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO xtream_movies_cache (
                    stream_id, partition_id, name, icon, category_id,
                    rating, rating_5based, added_timestamp, is_adult,
                    container_extension, tmdb_id, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&movie.stream_id)
            .bind(partition)
            .bind(&movie.name)
            .bind(&movie.icon)
            .bind(&movie.category_id)
            .bind(&movie.rating)
            .bind(movie.rating_5based)
            .bind(movie.added_timestamp)
            .bind(movie.is_adult)
            .bind(&movie.container_extension)
            .bind(&movie.tmdb_id)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Movies cached");
        Ok(items.len() as u64)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn upsert_series(
        &self,
        partition: &str,
        items: &[Series],
        synced_at: i64,
    ) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for series in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO xtream_series_cache (
                    series_id, partition_id, name, cover, category_id,
                    plot, "cast", director, genre, release_date,
                    last_modified, rating, rating_5based, backdrop_path,
                    youtube_trailer, episode_run_time, tmdb_id, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&series.series_id)
            .bind(partition)
            .bind(&series.name)
            .bind(&series.cover)
            .bind(&series.category_id)
            .bind(&series.plot)
            .bind(&series.cast)
            .bind(&series.director)
            .bind(&series.genre)
            .bind(&series.release_date)
            .bind(series.last_modified)
            .bind(&series.rating)
            .bind(series.rating_5based)
            .bind(sqlx::types::Json(&series.backdrop_path))
            .bind(&series.youtube_trailer)
            .bind(&series.episode_run_time)
            .bind(&series.tmdb_id)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Series cached");
        Ok(items.len() as u64)
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    async fn upsert_channels(
        &self,
        partition: &str,
        items: &[Channel],
        synced_at: i64,
    ) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for channel in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO xtream_channels_cache (
                    stream_id, partition_id, name, icon, category_id,
                    epg_channel_id, is_adult, tv_archive, tv_archive_duration,
                    added_timestamp, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&channel.stream_id)
            .bind(partition)
            .bind(&channel.name)
            .bind(&channel.icon)
            .bind(&channel.category_id)
            .bind(&channel.epg_channel_id)
            .bind(channel.is_adult)
            .bind(channel.tv_archive)
            .bind(channel.tv_archive_duration)
            .bind(channel.added_timestamp)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Channels cached");
        Ok(items.len() as u64)
    }

    #[instrument(skip(self, items), fields(count = items.len(), kind = %kind))]
    async fn upsert_categories(
        &self,
        partition: &str,
        items: &[Category],
        kind: CategoryType,
        synced_at: i64,
    ) -> Result<u64> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for category in items {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO xtream_categories_cache (
                    category_id, category_type, partition_id, name, parent_id, last_sync
                ) VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&category.category_id)
            .bind(kind)
            .bind(partition)
            .bind(&category.name)
            .bind(category.parent_id)
            .bind(synced_at)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Categories cached");
        Ok(items.len() as u64)
    }

    async fn find_movies(&self, partition: &str) -> Result<Vec<Movie>> {
        let movies = query_as::<_, Movie>(
            "SELECT * FROM xtream_movies_cache WHERE partition_id = ? ORDER BY name",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn find_movies_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Movie>> {
        let movies = query_as::<_, Movie>(
            "SELECT * FROM xtream_movies_cache WHERE partition_id = ? AND category_id = ? ORDER BY name",
        )
        .bind(partition)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn find_movie(&self, partition: &str, stream_id: &str) -> Result<Option<Movie>> {
        let movie = query_as::<_, Movie>(
            "SELECT * FROM xtream_movies_cache WHERE partition_id = ? AND stream_id = ?",
        )
        .bind(partition)
        .bind(stream_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(movie)
    }

    async fn find_series(&self, partition: &str) -> Result<Vec<Series>> {
        let series = query_as::<_, Series>(
            "SELECT * FROM xtream_series_cache WHERE partition_id = ? ORDER BY name",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn find_series_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Series>> {
        let series = query_as::<_, Series>(
            "SELECT * FROM xtream_series_cache WHERE partition_id = ? AND category_id = ? ORDER BY name",
        )
        .bind(partition)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn find_series_by_id(
        &self,
        partition: &str,
        series_id: &str,
    ) -> Result<Option<Series>> {
        let series = query_as::<_, Series>(
            "SELECT * FROM xtream_series_cache WHERE partition_id = ? AND series_id = ?",
        )
        .bind(partition)
        .bind(series_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(series)
    }

    async fn find_channels(&self, partition: &str) -> Result<Vec<Channel>> {
        let channels = query_as::<_, Channel>(
            "SELECT * FROM xtream_channels_cache WHERE partition_id = ? ORDER BY name",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    async fn find_channels_by_category(
        &self,
        partition: &str,
        category_id: &str,
    ) -> Result<Vec<Channel>> {
        let channels = query_as::<_, Channel>(
            "SELECT * FROM xtream_channels_cache WHERE partition_id = ? AND category_id = ? ORDER BY name",
        )
        .bind(partition)
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(channels)
    }

    async fn find_categories(
        &self,
        partition: &str,
        kind: CategoryType,
    ) -> Result<Vec<Category>> {
        let categories = query_as::<_, Category>(
            "SELECT * FROM xtream_categories_cache WHERE partition_id = ? AND category_type = ? ORDER BY name",
        )
        .bind(partition)
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn find_all_categories(&self, partition: &str) -> Result<Vec<Category>> {
        let categories = query_as::<_, Category>(
            "SELECT * FROM xtream_categories_cache WHERE partition_id = ? ORDER BY category_type, name",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    async fn movie_tmdb_ids(&self, partition: &str) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = query_as(
            "SELECT DISTINCT tmdb_id FROM xtream_movies_cache WHERE partition_id = ? AND tmdb_id IS NOT NULL AND tmdb_id != ''",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn series_tmdb_ids(&self, partition: &str) -> Result<Vec<String>> {
        let ids: Vec<(String,)> = query_as(
            "SELECT DISTINCT tmdb_id FROM xtream_series_cache WHERE partition_id = ? AND tmdb_id IS NOT NULL AND tmdb_id != ''",
        )
        .bind(partition)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids.into_iter().map(|(id,)| id).collect())
    }

    async fn find_movies_by_tmdb_id(
        &self,
        partition: &str,
        tmdb_id: &str,
    ) -> Result<Vec<Movie>> {
        let movies = query_as::<_, Movie>(
            "SELECT * FROM xtream_movies_cache WHERE partition_id = ? AND tmdb_id = ?",
        )
        .bind(partition)
        .bind(tmdb_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(movies)
    }

    async fn find_series_by_tmdb_id(
        &self,
        partition: &str,
        tmdb_id: &str,
    ) -> Result<Vec<Series>> {
        let series = query_as::<_, Series>(
            "SELECT * FROM xtream_series_cache WHERE partition_id = ? AND tmdb_id = ?",
        )
        .bind(partition)
        .bind(tmdb_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(series)
    }

    async fn row_counts(&self, partition: &str) -> Result<SyncCounts> {
        let (categories, channels, movies, series): (i64, i64, i64, i64) = query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM xtream_categories_cache WHERE partition_id = ?1),
                (SELECT COUNT(*) FROM xtream_channels_cache WHERE partition_id = ?1),
                (SELECT COUNT(*) FROM xtream_movies_cache WHERE partition_id = ?1),
                (SELECT COUNT(*) FROM xtream_series_cache WHERE partition_id = ?1)
            "#,
        )
        .bind(partition)
        .fetch_one(&self.pool)
        .await?;

        Ok(SyncCounts {
            categories: categories as u64,
            channels: channels as u64,
            movies: movies as u64,
            series: series as u64,
        })
    }

    #[instrument(skip(self, metadata))]
    async fn upsert_sync_metadata(&self, metadata: &SyncMetadata) -> Result<()> {
        sqlx::query(
            r#"
            INSERT OR REPLACE INTO xtream_sync_metadata (
                partition_id, last_full_sync, movies_count, series_count,
                channels_count, categories_count, is_valid
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&metadata.partition_id)
        .bind(metadata.last_full_sync)
        .bind(metadata.movies_count)
        .bind(metadata.series_count)
        .bind(metadata.channels_count)
        .bind(metadata.categories_count)
        .bind(metadata.is_valid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_sync_metadata(&self, partition: &str) -> Result<Option<SyncMetadata>> {
        let metadata = query_as::<_, SyncMetadata>(
            "SELECT * FROM xtream_sync_metadata WHERE partition_id = ?",
        )
        .bind(partition)
        .fetch_optional(&self.pool)
        .await?;

        Ok(metadata)
    }

    async fn set_sync_metadata_valid(&self, partition: &str, valid: bool) -> Result<bool> {
        let result = sqlx::query("UPDATE xtream_sync_metadata SET is_valid = ? WHERE partition_id = ?")
            .bind(valid)
            .bind(partition)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_other_partitions(&self, keep: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for table in PARTITIONED_TABLES {
            let sql = format!("DELETE FROM {} WHERE partition_id != ?", table);
            removed += sqlx::query(&sql)
                .bind(keep)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        debug!(removed, "Other partitions deleted");
        Ok(removed)
    }

    #[instrument(skip(self))]
    async fn delete_partition(&self, partition: &str) -> Result<u64> {
        let mut tx = self.pool.begin().await?;
        let mut removed = 0;

        for table in PARTITIONED_TABLES {
            let sql = format!("DELETE FROM {} WHERE partition_id = ?", table);
            removed += sqlx::query(&sql)
                .bind(partition)
                .execute(&mut *tx)
                .await?
                .rows_affected();
        }
        tx.commit().await?;

        debug!(removed, "Partition deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;

    fn movie(id: &str, category: &str, tmdb: Option<&str>) -> Movie {
        Movie {
            stream_id: id.to_string(),
            name: format!("Movie {}", id),
            icon: None,
            category_id: category.to_string(),
            rating: Some("7.1".to_string()),
            rating_5based: 3.5,
            added_timestamp: 1_700_000_000,
            is_adult: false,
            container_extension: Some("mkv".to_string()),
            tmdb_id: tmdb.map(str::to_string),
        }
    }

    fn series(id: &str, category: &str) -> Series {
        Series {
            series_id: id.to_string(),
            name: format!("Series {}", id),
            cover: None,
            category_id: category.to_string(),
            plot: Some("Plot".to_string()),
            cast: Some("A, B".to_string()),
            director: None,
            genre: Some("Drama".to_string()),
            release_date: None,
            last_modified: 1_700_000_000,
            rating: None,
            rating_5based: 4.0,
            backdrop_path: vec!["/a.jpg".to_string(), "/b.jpg".to_string()],
            youtube_trailer: None,
            episode_run_time: Some("45".to_string()),
            tmdb_id: Some("1399".to_string()),
        }
    }

    fn channel(id: &str, category: &str) -> Channel {
        Channel {
            stream_id: id.to_string(),
            name: format!("Channel {}", id),
            icon: None,
            category_id: category.to_string(),
            epg_channel_id: Some("news.uk".to_string()),
            is_adult: false,
            tv_archive: true,
            tv_archive_duration: 3,
            added_timestamp: 1_700_000_000,
        }
    }

    fn category(id: &str, kind: CategoryType) -> Category {
        Category {
            category_id: id.to_string(),
            name: format!("Category {}", id),
            parent_id: 0,
            category_type: kind,
        }
    }

    async fn repo() -> SqliteXtreamCacheRepository {
        SqliteXtreamCacheRepository::new(create_test_pool().await.unwrap())
    }

    #[tokio::test]
    async fn test_upsert_and_find_movies() {
        let repo = repo().await;
        let written = repo
            .upsert_movies("p1", &[movie("1", "10", None), movie("2", "11", None)], 1)
            .await
            .unwrap();
        assert_eq!(written, 2);

        let all = repo.find_movies("p1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0], movie("1", "10", None));

        let by_category = repo.find_movies_by_category("p1", "11").await.unwrap();
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].stream_id, "2");

        assert!(repo.find_movie("p1", "2").await.unwrap().is_some());
        assert!(repo.find_movie("p2", "2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_by_key() {
        let repo = repo().await;
        repo.upsert_movies("p1", &[movie("1", "10", None)], 1)
            .await
            .unwrap();

        let mut renamed = movie("1", "12", None);
        renamed.name = "Renamed".to_string();
        repo.upsert_movies("p1", &[renamed.clone()], 2).await.unwrap();

        let all = repo.find_movies("p1").await.unwrap();
        assert_eq!(all, vec![renamed]);

        let (last_sync,): (i64,) =
            query_as("SELECT last_sync FROM xtream_movies_cache WHERE stream_id = '1'")
                .fetch_one(&repo.pool)
                .await
                .unwrap();
        assert_eq!(last_sync, 2);
    }

    #[tokio::test]
    async fn test_same_id_in_two_partitions() {
        let repo = repo().await;
        repo.upsert_movies("p1", &[movie("1", "10", None)], 1)
            .await
            .unwrap();
        repo.upsert_movies("p2", &[movie("1", "10", None)], 1)
            .await
            .unwrap();

        assert_eq!(repo.find_movies("p1").await.unwrap().len(), 1);
        assert_eq!(repo.find_movies("p2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_series_backdrops_roundtrip_as_json() {
        let repo = repo().await;
        repo.upsert_series("p1", &[series("7", "20")], 1)
            .await
            .unwrap();

        let found = repo.find_series_by_id("p1", "7").await.unwrap().unwrap();
        assert_eq!(found, series("7", "20"));
        assert_eq!(repo.find_series_by_category("p1", "20").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_channels() {
        let repo = repo().await;
        repo.upsert_channels("p1", &[channel("1", "5"), channel("2", "6")], 1)
            .await
            .unwrap();

        assert_eq!(repo.find_channels("p1").await.unwrap().len(), 2);
        let news = repo.find_channels_by_category("p1", "5").await.unwrap();
        assert_eq!(news, vec![channel("1", "5")]);
    }

    #[tokio::test]
    async fn test_categories_keyed_by_type() {
        let repo = repo().await;
        // Same id under two catalogs must not collide.
        repo.upsert_categories("p1", &[category("1", CategoryType::Vod)], CategoryType::Live, 1)
            .await
            .unwrap();
        repo.upsert_categories("p1", &[category("1", CategoryType::Vod)], CategoryType::Vod, 1)
            .await
            .unwrap();

        let live = repo.find_categories("p1", CategoryType::Live).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(live[0].category_type, CategoryType::Live);

        assert_eq!(repo.find_all_categories("p1").await.unwrap().len(), 2);
        assert!(repo
            .find_categories("p1", CategoryType::Series)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_tmdb_links() {
        let repo = repo().await;
        repo.upsert_movies(
            "p1",
            &[
                movie("1", "10", Some("603")),
                movie("2", "10", Some("603")),
                movie("3", "10", Some("")),
                movie("4", "10", None),
            ],
            1,
        )
        .await
        .unwrap();

        assert_eq!(repo.movie_tmdb_ids("p1").await.unwrap(), vec!["603"]);
        assert_eq!(repo.find_movies_by_tmdb_id("p1", "603").await.unwrap().len(), 2);

        repo.upsert_series("p1", &[series("1", "20")], 1).await.unwrap();
        assert_eq!(repo.series_tmdb_ids("p1").await.unwrap(), vec!["1399"]);
        assert_eq!(repo.find_series_by_tmdb_id("p1", "1399").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_metadata_and_validity() {
        let repo = repo().await;
        assert!(repo.find_sync_metadata("p1").await.unwrap().is_none());
        assert!(!repo.set_sync_metadata_valid("p1", false).await.unwrap());

        let metadata = SyncMetadata {
            partition_id: "p1".to_string(),
            last_full_sync: 1000,
            movies_count: 1,
            series_count: 2,
            channels_count: 3,
            categories_count: 4,
            is_valid: true,
        };
        repo.upsert_sync_metadata(&metadata).await.unwrap();
        assert_eq!(repo.find_sync_metadata("p1").await.unwrap(), Some(metadata));

        assert!(repo.set_sync_metadata_valid("p1", false).await.unwrap());
        assert!(!repo.find_sync_metadata("p1").await.unwrap().unwrap().is_valid);
    }

    #[tokio::test]
    async fn test_delete_other_partitions() {
        let repo = repo().await;
        for partition in ["keep", "drop"] {
            repo.upsert_movies(partition, &[movie("1", "10", None)], 1)
                .await
                .unwrap();
            repo.upsert_channels(partition, &[channel("1", "5")], 1)
                .await
                .unwrap();
        }

        let removed = repo.delete_other_partitions("keep").await.unwrap();
        assert_eq!(removed, 2);
        assert_eq!(repo.row_counts("keep").await.unwrap().total(), 2);
        assert_eq!(repo.row_counts("drop").await.unwrap().total(), 0);
    }

    #[tokio::test]
    async fn test_delete_partition() {
        let repo = repo().await;
        repo.upsert_movies("p1", &[movie("1", "10", None)], 1)
            .await
            .unwrap();
        repo.upsert_series("p1", &[series("1", "20")], 1).await.unwrap();
        repo.upsert_movies("p2", &[movie("1", "10", None)], 1)
            .await
            .unwrap();

        assert_eq!(repo.delete_partition("p1").await.unwrap(), 2);
        assert_eq!(repo.row_counts("p1").await.unwrap(), SyncCounts::default());
        assert_eq!(repo.row_counts("p2").await.unwrap().movies, 1);
    }

    #[tokio::test]
    async fn test_empty_upsert_is_noop() {
        let repo = repo().await;
        assert_eq!(repo.upsert_movies("p1", &[], 1).await.unwrap(), 0);
        assert_eq!(
            repo.upsert_categories("p1", &[], CategoryType::Live, 1)
                .await
                .unwrap(),
            0
        );
    }
}
