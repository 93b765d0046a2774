//! # Database Cache Manager
//!
//! Facade over the Xtream and TMDB cache repositories.
//!
//! ## Overview
//!
//! The manager owns the freshness policy: Xtream data is valid for
//! [`CachePolicy::xtream_ttl`] after the last full sync of a partition, and
//! TMDB rows are kept for [`CachePolicy::tmdb_retention`]. Time comes from
//! the injected [`Clock`], so validity is deterministic under test.
//!
//! Every write stamps rows with the current time and announces itself on
//! the [`EventBus`] (when one is attached) so hosts can re-query.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let manager = DatabaseCacheManager::new(pool, Arc::new(SystemClock), CachePolicy::default())
//!     .with_event_bus(event_bus.clone());
//!
//! let partition = DatabaseCacheManager::partition_for("bob", "secret", "http://line.example.com");
//! if !manager.is_xtream_cache_valid(&partition).await? {
//!     // refresh from the panel
//! }
//! ```

use crate::error::Result;
use crate::models::{
    millis_to_datetime, Category, CategoryType, Channel, Movie, Series, SyncCounts, SyncMetadata,
    TmdbMovie, TmdbSeries, TmdbSyncMetadata,
};
use crate::repositories::{
    SqliteTmdbCacheRepository, SqliteXtreamCacheRepository, TmdbCacheRepository,
    XtreamCacheRepository,
};
use bridge_traits::Clock;
use chrono::{DateTime, Utc};
use core_auth::PartitionId;
use core_runtime::events::{CacheEvent, CoreEvent, EventBus};
use core_runtime::CachePolicy;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

pub struct DatabaseCacheManager {
    xtream: Arc<dyn XtreamCacheRepository>,
    tmdb: Arc<dyn TmdbCacheRepository>,
    clock: Arc<dyn Clock>,
    policy: CachePolicy,
    event_bus: Option<EventBus>,
}

impl DatabaseCacheManager {
    pub fn new(pool: SqlitePool, clock: Arc<dyn Clock>, policy: CachePolicy) -> Self {
        Self::with_repositories(
            Arc::new(SqliteXtreamCacheRepository::new(pool.clone())),
            Arc::new(SqliteTmdbCacheRepository::new(pool)),
            clock,
            policy,
        )
    }

    /// Build from explicit repositories.
    pub fn with_repositories(
        xtream: Arc<dyn XtreamCacheRepository>,
        tmdb: Arc<dyn TmdbCacheRepository>,
        clock: Arc<dyn Clock>,
        policy: CachePolicy,
    ) -> Self {
        Self {
            xtream,
            tmdb,
            clock,
            policy,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn policy(&self) -> CachePolicy {
        self.policy
    }

    /// Partition key for a set of credentials.
    pub fn partition_for(username: &str, password: &str, server: &str) -> PartitionId {
        PartitionId::derive(username, password, server)
    }

    // =========================================================================
    // Xtream validity
    // =========================================================================

    /// `true` when the partition has valid metadata younger than the TTL.
    pub async fn is_xtream_cache_valid(&self, partition: &PartitionId) -> Result<bool> {
        let Some(metadata) = self.xtream.find_sync_metadata(partition.as_str()).await? else {
            return Ok(false);
        };

        let cutoff = self.now_millis() - self.xtream_ttl_millis();
        Ok(metadata.is_valid && metadata.last_full_sync > cutoff)
    }

    /// End of the validity window, or `None` if the partition never synced.
    pub async fn xtream_cache_valid_until(
        &self,
        partition: &PartitionId,
    ) -> Result<Option<DateTime<Utc>>> {
        let metadata = self.xtream.find_sync_metadata(partition.as_str()).await?;
        Ok(metadata
            .and_then(|m| millis_to_datetime(m.last_full_sync + self.xtream_ttl_millis())))
    }

    // =========================================================================
    // Xtream writes
    // =========================================================================

    #[instrument(skip(self, items), fields(partition = %partition.short(), count = items.len()))]
    pub async fn cache_xtream_movies(&self, items: &[Movie], partition: &PartitionId) -> Result<()> {
        let written = self
            .xtream
            .upsert_movies(partition.as_str(), items, self.now_millis())
            .await?;
        self.notify_updated(Some(partition), "movies", written);
        Ok(())
    }

    #[instrument(skip(self, items), fields(partition = %partition.short(), count = items.len()))]
    pub async fn cache_xtream_series(
        &self,
        items: &[Series],
        partition: &PartitionId,
    ) -> Result<()> {
        let written = self
            .xtream
            .upsert_series(partition.as_str(), items, self.now_millis())
            .await?;
        self.notify_updated(Some(partition), "series", written);
        Ok(())
    }

    #[instrument(skip(self, items), fields(partition = %partition.short(), count = items.len()))]
    pub async fn cache_xtream_channels(
        &self,
        items: &[Channel],
        partition: &PartitionId,
    ) -> Result<()> {
        let written = self
            .xtream
            .upsert_channels(partition.as_str(), items, self.now_millis())
            .await?;
        self.notify_updated(Some(partition), "channels", written);
        Ok(())
    }

    #[instrument(skip(self, items), fields(partition = %partition.short(), count = items.len(), kind = %kind))]
    pub async fn cache_xtream_categories(
        &self,
        items: &[Category],
        kind: CategoryType,
        partition: &PartitionId,
    ) -> Result<()> {
        let written = self
            .xtream
            .upsert_categories(partition.as_str(), items, kind, self.now_millis())
            .await?;
        self.notify_updated(Some(partition), "categories", written);
        Ok(())
    }

    // =========================================================================
    // Xtream reads
    // =========================================================================

    pub async fn cached_xtream_movies(&self, partition: &PartitionId) -> Result<Vec<Movie>> {
        self.xtream.find_movies(partition.as_str()).await
    }

    pub async fn cached_xtream_series(&self, partition: &PartitionId) -> Result<Vec<Series>> {
        self.xtream.find_series(partition.as_str()).await
    }

    pub async fn cached_xtream_channels(&self, partition: &PartitionId) -> Result<Vec<Channel>> {
        self.xtream.find_channels(partition.as_str()).await
    }

    pub async fn cached_xtream_categories(
        &self,
        partition: &PartitionId,
        kind: CategoryType,
    ) -> Result<Vec<Category>> {
        self.xtream.find_categories(partition.as_str(), kind).await
    }

    pub async fn cached_all_categories(&self, partition: &PartitionId) -> Result<Vec<Category>> {
        self.xtream.find_all_categories(partition.as_str()).await
    }

    pub async fn cached_movies_by_category(
        &self,
        partition: &PartitionId,
        category_id: &str,
    ) -> Result<Vec<Movie>> {
        self.xtream
            .find_movies_by_category(partition.as_str(), category_id)
            .await
    }

    pub async fn cached_series_by_category(
        &self,
        partition: &PartitionId,
        category_id: &str,
    ) -> Result<Vec<Series>> {
        self.xtream
            .find_series_by_category(partition.as_str(), category_id)
            .await
    }

    pub async fn cached_channels_by_category(
        &self,
        partition: &PartitionId,
        category_id: &str,
    ) -> Result<Vec<Channel>> {
        self.xtream
            .find_channels_by_category(partition.as_str(), category_id)
            .await
    }

    pub async fn cached_movie(
        &self,
        partition: &PartitionId,
        stream_id: &str,
    ) -> Result<Option<Movie>> {
        self.xtream.find_movie(partition.as_str(), stream_id).await
    }

    pub async fn cached_series_by_id(
        &self,
        partition: &PartitionId,
        series_id: &str,
    ) -> Result<Option<Series>> {
        self.xtream
            .find_series_by_id(partition.as_str(), series_id)
            .await
    }

    pub async fn movie_tmdb_ids(&self, partition: &PartitionId) -> Result<Vec<String>> {
        self.xtream.movie_tmdb_ids(partition.as_str()).await
    }

    pub async fn series_tmdb_ids(&self, partition: &PartitionId) -> Result<Vec<String>> {
        self.xtream.series_tmdb_ids(partition.as_str()).await
    }

    pub async fn movies_by_tmdb_id(
        &self,
        partition: &PartitionId,
        tmdb_id: &str,
    ) -> Result<Vec<Movie>> {
        self.xtream
            .find_movies_by_tmdb_id(partition.as_str(), tmdb_id)
            .await
    }

    pub async fn series_by_tmdb_id(
        &self,
        partition: &PartitionId,
        tmdb_id: &str,
    ) -> Result<Vec<Series>> {
        self.xtream
            .find_series_by_tmdb_id(partition.as_str(), tmdb_id)
            .await
    }

    /// Row counts currently stored for the partition.
    pub async fn xtream_counts(&self, partition: &PartitionId) -> Result<SyncCounts> {
        self.xtream.row_counts(partition.as_str()).await
    }

    // =========================================================================
    // Xtream metadata and eviction
    // =========================================================================

    /// Record a completed full sync: valid, stamped now, with `counts`.
    #[instrument(skip(self), fields(partition = %partition.short()))]
    pub async fn update_xtream_sync_metadata(
        &self,
        partition: &PartitionId,
        counts: SyncCounts,
    ) -> Result<()> {
        let metadata = SyncMetadata {
            partition_id: partition.as_str().to_string(),
            last_full_sync: self.now_millis(),
            movies_count: counts.movies as i64,
            series_count: counts.series as i64,
            channels_count: counts.channels as i64,
            categories_count: counts.categories as i64,
            is_valid: true,
        };
        self.xtream.upsert_sync_metadata(&metadata).await?;

        debug!(total = counts.total(), "Sync metadata updated");
        Ok(())
    }

    pub async fn xtream_sync_metadata(
        &self,
        partition: &PartitionId,
    ) -> Result<Option<SyncMetadata>> {
        self.xtream.find_sync_metadata(partition.as_str()).await
    }

    /// Mark the partition stale. Cached rows stay readable.
    #[instrument(skip(self), fields(partition = %partition.short()))]
    pub async fn invalidate_xtream_cache(&self, partition: &PartitionId) -> Result<()> {
        let updated = self
            .xtream
            .set_sync_metadata_valid(partition.as_str(), false)
            .await?;
        if !updated {
            debug!("No sync metadata to invalidate");
        }

        info!("Xtream cache invalidated");
        self.emit(CacheEvent::Invalidated {
            partition: partition.short().to_string(),
        });
        Ok(())
    }

    /// Delete every partition except `current`. Returns rows removed.
    #[instrument(skip(self), fields(partition = %current.short()))]
    pub async fn cleanup_other_users_data(&self, current: &PartitionId) -> Result<u64> {
        let removed = self.xtream.delete_other_partitions(current.as_str()).await?;

        if removed > 0 {
            info!(rows_removed = removed, "Evicted other users' cache");
        }
        self.emit(CacheEvent::Evicted {
            kept_partition: current.short().to_string(),
            rows_removed: removed,
        });
        Ok(removed)
    }

    /// Delete every row of the partition.
    #[instrument(skip(self), fields(partition = %partition.short()))]
    pub async fn clear_xtream_cache(&self, partition: &PartitionId) -> Result<u64> {
        let removed = self.xtream.delete_partition(partition.as_str()).await?;

        info!(rows_removed = removed, "Xtream cache cleared");
        self.emit(CacheEvent::Cleared {
            partition: partition.short().to_string(),
        });
        Ok(removed)
    }

    // =========================================================================
    // TMDB
    // =========================================================================

    pub async fn cache_tmdb_movie(&self, movie: &TmdbMovie) -> Result<()> {
        self.cache_tmdb_movies(std::slice::from_ref(movie)).await
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn cache_tmdb_movies(&self, items: &[TmdbMovie]) -> Result<()> {
        let written = self.tmdb.upsert_movies(items, self.now_millis()).await?;
        self.notify_updated(None, "tmdb_movies", written);
        Ok(())
    }

    #[instrument(skip(self, items), fields(count = items.len()))]
    pub async fn cache_tmdb_series(&self, items: &[TmdbSeries]) -> Result<()> {
        let written = self.tmdb.upsert_series(items, self.now_millis()).await?;
        self.notify_updated(None, "tmdb_series", written);
        Ok(())
    }

    pub async fn cached_tmdb_movie(&self, tmdb_id: &str) -> Result<Option<TmdbMovie>> {
        self.tmdb.find_movie(tmdb_id).await
    }

    pub async fn cached_tmdb_series(&self, tmdb_id: &str) -> Result<Option<TmdbSeries>> {
        self.tmdb.find_series(tmdb_id).await
    }

    /// Movies among `ids` that are within retention, keyed by TMDB id.
    pub async fn cached_tmdb_movies(&self, ids: &[String]) -> Result<HashMap<String, TmdbMovie>> {
        let movies = self
            .tmdb
            .find_movies_by_ids(ids, self.tmdb_cutoff())
            .await?;
        Ok(movies.into_iter().map(|m| (m.tmdb_id.clone(), m)).collect())
    }

    pub async fn cached_tmdb_series_batch(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, TmdbSeries>> {
        let series = self
            .tmdb
            .find_series_by_ids(ids, self.tmdb_cutoff())
            .await?;
        Ok(series.into_iter().map(|s| (s.tmdb_id.clone(), s)).collect())
    }

    pub async fn is_tmdb_movie_cache_valid(&self, tmdb_id: &str) -> Result<bool> {
        let cutoff = self.tmdb_cutoff();
        Ok(self
            .tmdb
            .find_movie(tmdb_id)
            .await?
            .is_some_and(|m| m.last_sync > cutoff))
    }

    pub async fn is_tmdb_series_cache_valid(&self, tmdb_id: &str) -> Result<bool> {
        let cutoff = self.tmdb_cutoff();
        Ok(self
            .tmdb
            .find_series(tmdb_id)
            .await?
            .is_some_and(|s| s.last_sync > cutoff))
    }

    pub async fn search_tmdb_movies(&self, query: &str, limit: u32) -> Result<Vec<TmdbMovie>> {
        self.tmdb.search_movies(query, limit).await
    }

    pub async fn search_tmdb_series(&self, query: &str, limit: u32) -> Result<Vec<TmdbSeries>> {
        self.tmdb.search_series(query, limit).await
    }

    pub async fn popular_tmdb_movies(&self, limit: u32) -> Result<Vec<TmdbMovie>> {
        self.tmdb.popular_movies(limit, self.tmdb_cutoff()).await
    }

    pub async fn top_rated_tmdb_movies(&self, limit: u32) -> Result<Vec<TmdbMovie>> {
        self.tmdb.top_rated_movies(limit, self.tmdb_cutoff()).await
    }

    pub async fn popular_tmdb_series(&self, limit: u32) -> Result<Vec<TmdbSeries>> {
        self.tmdb.popular_series(limit, self.tmdb_cutoff()).await
    }

    pub async fn top_rated_tmdb_series(&self, limit: u32) -> Result<Vec<TmdbSeries>> {
        self.tmdb.top_rated_series(limit, self.tmdb_cutoff()).await
    }

    /// `(movies, series)` rows currently cached.
    pub async fn tmdb_counts(&self) -> Result<(u64, u64)> {
        self.tmdb.counts().await
    }

    pub async fn tmdb_sync_metadata(&self) -> Result<Option<TmdbSyncMetadata>> {
        self.tmdb.find_sync_metadata().await
    }

    /// Remove TMDB rows past retention and record the cleanup.
    #[instrument(skip(self))]
    pub async fn cleanup_expired_data(&self) -> Result<TmdbSyncMetadata> {
        let metadata = self
            .tmdb
            .purge_expired(self.tmdb_cutoff(), self.now_millis())
            .await?;

        info!(
            movies_remaining = metadata.total_movies,
            series_remaining = metadata.total_series,
            "Expired TMDB metadata cleaned"
        );
        self.emit(CacheEvent::Cleaned {
            movies_remaining: metadata.total_movies.max(0) as u64,
            series_remaining: metadata.total_series.max(0) as u64,
        });
        Ok(metadata)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn now_millis(&self) -> i64 {
        self.clock.unix_timestamp_millis()
    }

    fn xtream_ttl_millis(&self) -> i64 {
        self.policy.xtream_ttl.as_millis() as i64
    }

    fn tmdb_cutoff(&self) -> i64 {
        self.now_millis() - self.policy.tmdb_retention.as_millis() as i64
    }

    fn notify_updated(&self, partition: Option<&PartitionId>, entity: &str, count: u64) {
        if count == 0 {
            return;
        }
        self.emit(CacheEvent::Updated {
            partition: partition.map(|p| p.short().to_string()),
            entity: entity.to_string(),
            count,
        });
    }

    fn emit(&self, event: CacheEvent) {
        if let Some(bus) = &self.event_bus {
            let _ = bus.emit(CoreEvent::Cache(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_test_pool;
    use bridge_traits::ManualClock;
    use chrono::{Duration, TimeZone};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    async fn manager() -> (DatabaseCacheManager, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(start()));
        let pool = create_test_pool().await.unwrap();
        let manager = DatabaseCacheManager::new(pool, clock.clone(), CachePolicy::default());
        (manager, clock)
    }

    fn partition(name: &str) -> PartitionId {
        DatabaseCacheManager::partition_for(name, "pw", "http://line.example.com")
    }

    fn movie(id: &str) -> Movie {
        Movie {
            stream_id: id.to_string(),
            name: format!("Movie {}", id),
            icon: None,
            category_id: "1".to_string(),
            rating: None,
            rating_5based: 0.0,
            added_timestamp: 0,
            is_adult: false,
            container_extension: None,
            tmdb_id: Some("603".to_string()),
        }
    }

    fn channel(id: &str) -> Channel {
        Channel {
            stream_id: id.to_string(),
            name: format!("Channel {}", id),
            icon: None,
            category_id: "2".to_string(),
            epg_channel_id: None,
            is_adult: false,
            tv_archive: false,
            tv_archive_duration: 0,
            added_timestamp: 0,
        }
    }

    #[tokio::test]
    async fn test_cache_validity_follows_ttl() {
        let (manager, clock) = manager().await;
        let p = partition("bob");

        assert!(!manager.is_xtream_cache_valid(&p).await.unwrap());
        assert!(manager.xtream_cache_valid_until(&p).await.unwrap().is_none());

        manager
            .update_xtream_sync_metadata(&p, SyncCounts::default())
            .await
            .unwrap();
        assert!(manager.is_xtream_cache_valid(&p).await.unwrap());
        assert_eq!(
            manager.xtream_cache_valid_until(&p).await.unwrap(),
            Some(start() + Duration::hours(12))
        );

        clock.advance(Duration::hours(11));
        assert!(manager.is_xtream_cache_valid(&p).await.unwrap());

        clock.advance(Duration::hours(1));
        assert!(!manager.is_xtream_cache_valid(&p).await.unwrap());
    }

    #[tokio::test]
    async fn test_invalidate_keeps_rows() {
        let (manager, _clock) = manager().await;
        let p = partition("bob");

        manager.cache_xtream_movies(&[movie("1")], &p).await.unwrap();
        manager
            .update_xtream_sync_metadata(&p, SyncCounts { movies: 1, ..Default::default() })
            .await
            .unwrap();

        manager.invalidate_xtream_cache(&p).await.unwrap();
        assert!(!manager.is_xtream_cache_valid(&p).await.unwrap());
        assert_eq!(manager.cached_xtream_movies(&p).await.unwrap().len(), 1);

        // A new sync makes it valid again.
        manager
            .update_xtream_sync_metadata(&p, SyncCounts::default())
            .await
            .unwrap();
        assert!(manager.is_xtream_cache_valid(&p).await.unwrap());
    }

    #[tokio::test]
    async fn test_reads_ignore_row_age() {
        let (manager, clock) = manager().await;
        let p = partition("bob");

        manager.cache_xtream_channels(&[channel("1")], &p).await.unwrap();
        clock.advance(Duration::days(30));

        assert_eq!(manager.cached_xtream_channels(&p).await.unwrap().len(), 1);
        assert_eq!(
            manager.cached_channels_by_category(&p, "2").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_cleanup_other_users_data() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let (manager, _clock) = manager().await;
        let manager = manager.with_event_bus(bus);
        let bob = partition("bob");
        let alice = partition("alice");

        manager.cache_xtream_movies(&[movie("1")], &bob).await.unwrap();
        manager.cache_xtream_movies(&[movie("1"), movie("2")], &alice).await.unwrap();
        manager
            .update_xtream_sync_metadata(&alice, SyncCounts::default())
            .await
            .unwrap();

        let removed = manager.cleanup_other_users_data(&bob).await.unwrap();
        assert_eq!(removed, 3);
        assert!(manager.cached_xtream_movies(&alice).await.unwrap().is_empty());
        assert!(manager.xtream_sync_metadata(&alice).await.unwrap().is_none());
        assert_eq!(manager.cached_xtream_movies(&bob).await.unwrap().len(), 1);

        let mut evicted = None;
        while let Ok(event) = events.try_recv() {
            if let CoreEvent::Cache(CacheEvent::Evicted { rows_removed, .. }) = event {
                evicted = Some(rows_removed);
            }
        }
        assert_eq!(evicted, Some(3));
    }

    #[tokio::test]
    async fn test_clear_xtream_cache() {
        let (manager, _clock) = manager().await;
        let p = partition("bob");

        manager.cache_xtream_movies(&[movie("1")], &p).await.unwrap();
        manager
            .update_xtream_sync_metadata(&p, SyncCounts::default())
            .await
            .unwrap();

        assert_eq!(manager.clear_xtream_cache(&p).await.unwrap(), 2);
        assert_eq!(manager.xtream_counts(&p).await.unwrap(), SyncCounts::default());
        assert!(!manager.is_xtream_cache_valid(&p).await.unwrap());
    }

    #[tokio::test]
    async fn test_updated_event_only_for_non_empty_writes() {
        let bus = EventBus::new(16);
        let mut events = bus.subscribe();
        let (manager, _clock) = manager().await;
        let manager = manager.with_event_bus(bus);
        let p = partition("bob");

        manager.cache_xtream_movies(&[], &p).await.unwrap();
        manager.cache_xtream_movies(&[movie("1")], &p).await.unwrap();

        assert_eq!(
            events.try_recv().unwrap(),
            CoreEvent::Cache(CacheEvent::Updated {
                partition: Some(p.short().to_string()),
                entity: "movies".to_string(),
                count: 1,
            })
        );
        assert!(events.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_tmdb_retention() {
        let (manager, clock) = manager().await;

        manager
            .cache_tmdb_movie(&TmdbMovie::new("603", "The Matrix"))
            .await
            .unwrap();
        manager
            .cache_tmdb_series(&[TmdbSeries::new("1399", "Game of Thrones")])
            .await
            .unwrap();
        assert!(manager.is_tmdb_movie_cache_valid("603").await.unwrap());
        assert!(manager.is_tmdb_series_cache_valid("1399").await.unwrap());

        clock.advance(Duration::days(6));
        manager
            .cache_tmdb_movie(&TmdbMovie::new("604", "The Matrix Reloaded"))
            .await
            .unwrap();

        clock.advance(Duration::days(2));
        assert!(!manager.is_tmdb_movie_cache_valid("603").await.unwrap());
        assert!(manager.is_tmdb_movie_cache_valid("604").await.unwrap());

        let ids = vec!["603".to_string(), "604".to_string()];
        let batch = manager.cached_tmdb_movies(&ids).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.contains_key("604"));

        let metadata = manager.cleanup_expired_data().await.unwrap();
        assert_eq!(metadata.total_movies, 1);
        assert_eq!(metadata.total_series, 0);
        assert_eq!(
            metadata.last_cleanup_at(),
            Some(start() + Duration::days(8))
        );
        assert!(manager.cached_tmdb_movie("603").await.unwrap().is_none());
        assert_eq!(manager.tmdb_sync_metadata().await.unwrap(), Some(metadata));
    }

    #[tokio::test]
    async fn test_tmdb_links_through_xtream_rows() {
        let (manager, _clock) = manager().await;
        let p = partition("bob");

        manager.cache_xtream_movies(&[movie("1"), movie("2")], &p).await.unwrap();
        assert_eq!(manager.movie_tmdb_ids(&p).await.unwrap(), vec!["603"]);
        assert_eq!(manager.movies_by_tmdb_id(&p, "603").await.unwrap().len(), 2);
        assert!(manager.series_tmdb_ids(&p).await.unwrap().is_empty());
    }
}
