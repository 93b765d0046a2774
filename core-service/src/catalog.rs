//! # Catalog Use Cases
//!
//! Cache-first access to the signed-in user's Xtream catalog.
//!
//! ## Overview
//!
//! Every list request first reads the user's cache partition. Cached rows
//! are returned whenever there are any, regardless of age; freshness is the
//! sync manager's job. Only an empty partition falls through to the panel,
//! and a successful fetch is written back before it is returned.
//!
//! A `category_id` narrows the returned rows. On a miss the full list is
//! fetched and cached, then filtered, so a filtered request never leaves a
//! partial list behind in the cache.

use crate::error::{CoreError, Result};
use core_auth::{AuthError, PartitionId, SessionProvider};
use core_cache::{Category, CategoryType, Channel, DatabaseCacheManager, Movie, Series};
use provider_xtream::{XtreamRepository, XtreamResult};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Cache-first catalog reads for the active user.
#[derive(Clone)]
pub struct CatalogService {
    cache: Arc<DatabaseCacheManager>,
    repository: Arc<dyn XtreamRepository>,
    session: Arc<dyn SessionProvider>,
}

impl CatalogService {
    pub fn new(
        cache: Arc<DatabaseCacheManager>,
        repository: Arc<dyn XtreamRepository>,
        session: Arc<dyn SessionProvider>,
    ) -> Self {
        Self {
            cache,
            repository,
            session,
        }
    }

    /// VOD movies, optionally limited to one category.
    #[instrument(skip(self))]
    pub async fn vod_streams(&self, category_id: Option<&str>) -> Result<Vec<Movie>> {
        let partition = self.partition().await?;

        let cached = self.cache.cached_xtream_movies(&partition).await?;
        let movies = if cached.is_empty() {
            match fetched(self.repository.vod_streams(None).await, "movies")? {
                Some(movies) => {
                    if let Err(e) = self.cache.cache_xtream_movies(&movies, &partition).await {
                        warn!(error = %e, "Failed to cache fetched movies");
                    }
                    movies
                }
                None => return Ok(Vec::new()),
            }
        } else {
            debug!(count = cached.len(), "Serving movies from cache");
            cached
        };

        Ok(in_category(movies, category_id, |m| &m.category_id))
    }

    /// Series, optionally limited to one category.
    #[instrument(skip(self))]
    pub async fn series(&self, category_id: Option<&str>) -> Result<Vec<Series>> {
        let partition = self.partition().await?;

        let cached = self.cache.cached_xtream_series(&partition).await?;
        let series = if cached.is_empty() {
            match fetched(self.repository.series(None).await, "series")? {
                Some(series) => {
                    if let Err(e) = self.cache.cache_xtream_series(&series, &partition).await {
                        warn!(error = %e, "Failed to cache fetched series");
                    }
                    series
                }
                None => return Ok(Vec::new()),
            }
        } else {
            debug!(count = cached.len(), "Serving series from cache");
            cached
        };

        Ok(in_category(series, category_id, |s| &s.category_id))
    }

    /// Live channels, optionally limited to one category.
    #[instrument(skip(self))]
    pub async fn live_streams(&self, category_id: Option<&str>) -> Result<Vec<Channel>> {
        let partition = self.partition().await?;

        let cached = self.cache.cached_xtream_channels(&partition).await?;
        let channels = if cached.is_empty() {
            match fetched(self.repository.live_streams(None).await, "channels")? {
                Some(channels) => {
                    if let Err(e) = self.cache.cache_xtream_channels(&channels, &partition).await
                    {
                        warn!(error = %e, "Failed to cache fetched channels");
                    }
                    channels
                }
                None => return Ok(Vec::new()),
            }
        } else {
            debug!(count = cached.len(), "Serving channels from cache");
            cached
        };

        Ok(in_category(channels, category_id, |c| &c.category_id))
    }

    /// Categories of one content type.
    #[instrument(skip(self))]
    pub async fn categories(&self, kind: CategoryType) -> Result<Vec<Category>> {
        let partition = self.partition().await?;

        let cached = self.cache.cached_xtream_categories(&partition, kind).await?;
        if !cached.is_empty() {
            debug!(count = cached.len(), "Serving categories from cache");
            return Ok(cached);
        }

        let result = match kind {
            CategoryType::Live => self.repository.live_categories().await,
            CategoryType::Vod => self.repository.vod_categories().await,
            CategoryType::Series => self.repository.series_categories().await,
        };

        let Some(categories) = fetched(result, kind.as_str())? else {
            return Ok(Vec::new());
        };
        if let Err(e) = self
            .cache
            .cache_xtream_categories(&categories, kind, &partition)
            .await
        {
            warn!(error = %e, "Failed to cache fetched categories");
        }
        Ok(categories)
    }

    async fn partition(&self) -> Result<PartitionId> {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(AuthError::NotAuthenticated)?;
        Ok(user.partition_id())
    }
}

/// `Some(items)` on success, `None` while the panel reports `Loading`.
fn fetched<T>(result: XtreamResult<Vec<T>>, entity: &str) -> Result<Option<Vec<T>>> {
    match result {
        XtreamResult::Success(items) => Ok(Some(items)),
        XtreamResult::Error { message, code } => {
            warn!(entity, ?code, %message, "Catalog fetch failed");
            Err(CoreError::Remote { message, code })
        }
        XtreamResult::Loading => {
            debug!(entity, "Catalog fetch still loading");
            Ok(None)
        }
    }
}

fn in_category<T>(items: Vec<T>, category_id: Option<&str>, key: impl Fn(&T) -> &String) -> Vec<T> {
    match category_id {
        Some(id) => items.into_iter().filter(|item| key(item) == id).collect(),
        None => items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::ManualClock;
    use core_auth::{SessionStore, UserProfile};
    use core_cache::{create_test_pool, CachePolicy};
    use provider_xtream::XtreamErrorCode;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubRepository {
        calls: AtomicU32,
        movies: Mutex<Vec<Movie>>,
        fail: bool,
    }

    impl StubRepository {
        fn with_movies(movies: Vec<Movie>) -> Self {
            Self {
                movies: Mutex::new(movies),
                ..Default::default()
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }

        fn answer<T>(&self, items: Vec<T>) -> XtreamResult<Vec<T>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                XtreamResult::error("Server unavailable", XtreamErrorCode::ServerError)
            } else {
                XtreamResult::Success(items)
            }
        }
    }

    #[async_trait]
    impl XtreamRepository for StubRepository {
        async fn live_categories(&self) -> XtreamResult<Vec<Category>> {
            self.answer(vec![category("1", CategoryType::Live)])
        }

        async fn vod_categories(&self) -> XtreamResult<Vec<Category>> {
            self.answer(vec![
                category("10", CategoryType::Vod),
                category("11", CategoryType::Vod),
            ])
        }

        async fn series_categories(&self) -> XtreamResult<Vec<Category>> {
            self.answer(vec![])
        }

        async fn live_streams(&self, _category_id: Option<String>) -> XtreamResult<Vec<Channel>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            XtreamResult::Loading
        }

        async fn vod_streams(&self, category_id: Option<String>) -> XtreamResult<Vec<Movie>> {
            assert!(category_id.is_none(), "misses fetch the full list");
            let movies = self.movies.lock().unwrap().clone();
            self.answer(movies)
        }

        async fn series(&self, _category_id: Option<String>) -> XtreamResult<Vec<Series>> {
            self.answer(vec![])
        }
    }

    fn category(id: &str, kind: CategoryType) -> Category {
        Category {
            category_id: id.to_string(),
            name: format!("Category {id}"),
            parent_id: 0,
            category_type: kind,
        }
    }

    fn movie(id: &str, category_id: &str) -> Movie {
        Movie {
            stream_id: id.to_string(),
            name: format!("Movie {id}"),
            icon: None,
            category_id: category_id.to_string(),
            rating: None,
            rating_5based: 0.0,
            added_timestamp: 0,
            is_adult: false,
            container_extension: Some("mp4".to_string()),
            tmdb_id: None,
        }
    }

    async fn catalog(
        repository: Arc<StubRepository>,
        signed_in: bool,
    ) -> (CatalogService, Arc<DatabaseCacheManager>) {
        let pool = create_test_pool().await.unwrap();
        let cache = Arc::new(DatabaseCacheManager::new(
            pool,
            Arc::new(ManualClock::default()),
            CachePolicy::default(),
        ));
        let session = Arc::new(SessionStore::new());
        if signed_in {
            session
                .sign_in(UserProfile::new("http://panel.example", "alice", "secret").unwrap())
                .unwrap();
        }
        let service = CatalogService::new(Arc::clone(&cache), repository, session);
        (service, cache)
    }

    fn alice() -> PartitionId {
        DatabaseCacheManager::partition_for("alice", "secret", "http://panel.example")
    }

    #[tokio::test]
    async fn test_requires_user() {
        let (catalog, _) = catalog(Arc::new(StubRepository::default()), false).await;

        let err = catalog.vod_streams(None).await.unwrap_err();
        assert!(matches!(err, CoreError::Auth(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_miss_fetches_and_caches() {
        let repository = Arc::new(StubRepository::with_movies(vec![
            movie("1", "10"),
            movie("2", "11"),
        ]));
        let (catalog, cache) = catalog(Arc::clone(&repository), true).await;

        let movies = catalog.vod_streams(None).await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(repository.calls(), 1);
        assert_eq!(cache.cached_xtream_movies(&alice()).await.unwrap().len(), 2);

        // Served from cache now
        let movies = catalog.vod_streams(None).await.unwrap();
        assert_eq!(movies.len(), 2);
        assert_eq!(repository.calls(), 1);
    }

    #[tokio::test]
    async fn test_category_filter_keeps_full_cache() {
        let repository = Arc::new(StubRepository::with_movies(vec![
            movie("1", "10"),
            movie("2", "11"),
            movie("3", "10"),
        ]));
        let (catalog, cache) = catalog(Arc::clone(&repository), true).await;

        let movies = catalog.vod_streams(Some("10")).await.unwrap();
        let ids: Vec<_> = movies.iter().map(|m| m.stream_id.as_str()).collect();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&"1") && ids.contains(&"3"));

        assert_eq!(cache.cached_xtream_movies(&alice()).await.unwrap().len(), 3);
        assert_eq!(catalog.vod_streams(Some("11")).await.unwrap().len(), 1);
        assert!(catalog.vod_streams(Some("99")).await.unwrap().is_empty());
        assert_eq!(repository.calls(), 1);
    }

    #[tokio::test]
    async fn test_cached_rows_win_over_remote() {
        let repository = Arc::new(StubRepository::failing());
        let (catalog, cache) = catalog(Arc::clone(&repository), true).await;
        cache
            .cache_xtream_movies(&[movie("7", "10")], &alice())
            .await
            .unwrap();
        cache.invalidate_xtream_cache(&alice()).await.unwrap();

        let movies = catalog.vod_streams(None).await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(repository.calls(), 0);
    }

    #[tokio::test]
    async fn test_remote_error_without_cache() {
        let (catalog, _) = catalog(Arc::new(StubRepository::failing()), true).await;

        match catalog.vod_streams(None).await.unwrap_err() {
            CoreError::Remote { code, .. } => assert_eq!(code, XtreamErrorCode::ServerError),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_loading_is_empty_and_not_cached() {
        let repository = Arc::new(StubRepository::default());
        let (catalog, cache) = catalog(Arc::clone(&repository), true).await;

        assert!(catalog.live_streams(None).await.unwrap().is_empty());
        assert!(catalog.live_streams(None).await.unwrap().is_empty());
        assert_eq!(repository.calls(), 2);
        assert!(cache.cached_xtream_channels(&alice()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_categories_by_type() {
        let repository = Arc::new(StubRepository::default());
        let (catalog, cache) = catalog(Arc::clone(&repository), true).await;

        let vod = catalog.categories(CategoryType::Vod).await.unwrap();
        assert_eq!(vod.len(), 2);
        let live = catalog.categories(CategoryType::Live).await.unwrap();
        assert_eq!(live.len(), 1);
        assert_eq!(repository.calls(), 2);

        catalog.categories(CategoryType::Vod).await.unwrap();
        assert_eq!(repository.calls(), 2);
        assert_eq!(cache.cached_all_categories(&alice()).await.unwrap().len(), 3);
    }
}
