//! Integration tests for the sync manager
//!
//! These tests drive full sync passes against a fake Xtream repository and a
//! real in-memory cache:
//! - Skipping when the cache is valid, re-syncing after the TTL
//! - Per-entity degradation on remote errors and `Loading`
//! - Ordered progress reporting
//! - Eviction of other users' rows
//! - The auto-sync loop lifecycle and recovery after a failed pass

use async_trait::async_trait;
use bridge_traits::{Clock, ManualClock};
use chrono::{Duration as ChronoDuration, TimeZone, Utc};
use core_auth::{SessionProvider, UserProfile};
use core_cache::{
    create_test_pool, CachePolicy, Category, CategoryType, Channel, DatabaseCacheManager, Movie,
    Series, SyncCounts,
};
use core_runtime::events::{CoreEvent, EventBus, SyncEvent};
use core_sync::{SyncConfig, SyncError, SyncManager, SyncOutcome, SyncStage};
use provider_xtream::{XtreamErrorCode, XtreamRepository, XtreamResult};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Default)]
struct FakeSession {
    user: Mutex<Option<UserProfile>>,
    lookups: AtomicU32,
}

impl FakeSession {
    fn signed_in(username: &str) -> Arc<Self> {
        let session = Self::default();
        session.set(Some(profile(username)));
        Arc::new(session)
    }

    fn set(&self, user: Option<UserProfile>) {
        *self.user.lock().unwrap() = user;
    }

    /// Number of times a sync pass asked for the active user.
    fn lookups(&self) -> u32 {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionProvider for FakeSession {
    async fn current_user(&self) -> Option<UserProfile> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        self.user.lock().unwrap().clone()
    }
}

/// Serves a fixed catalog; individual endpoints can be made to fail.
#[derive(Default)]
struct FakeXtreamRepository {
    calls: AtomicU32,
    failing_movies: bool,
    loading_series: bool,
    /// Delay for the categories endpoints, to finish them last
    slow_categories: Option<Duration>,
}

impl FakeXtreamRepository {
    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    async fn categories(&self, prefix: &str, kind: CategoryType) -> XtreamResult<Vec<Category>> {
        self.hit();
        if let Some(delay) = self.slow_categories {
            tokio::time::sleep(delay).await;
        }
        XtreamResult::Success(vec![
            category(&format!("{}1", prefix), kind),
            category(&format!("{}2", prefix), kind),
        ])
    }
}

#[async_trait]
impl XtreamRepository for FakeXtreamRepository {
    async fn live_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("l", CategoryType::Live).await
    }

    async fn vod_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("v", CategoryType::Vod).await
    }

    async fn series_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("s", CategoryType::Series).await
    }

    async fn live_streams(&self, _category_id: Option<String>) -> XtreamResult<Vec<Channel>> {
        self.hit();
        XtreamResult::Success((1..=3).map(|i| channel(&i.to_string())).collect())
    }

    async fn vod_streams(&self, _category_id: Option<String>) -> XtreamResult<Vec<Movie>> {
        self.hit();
        if self.failing_movies {
            return XtreamResult::error("Server error 500", XtreamErrorCode::ServerError);
        }
        XtreamResult::Success((1..=4).map(|i| movie(&i.to_string())).collect())
    }

    async fn series(&self, _category_id: Option<String>) -> XtreamResult<Vec<Series>> {
        self.hit();
        if self.loading_series {
            return XtreamResult::Loading;
        }
        XtreamResult::Success(vec![series("1"), series("2")])
    }
}

// ============================================================================
// Fixtures
// ============================================================================

fn profile(username: &str) -> UserProfile {
    UserProfile::new("http://line.example.com", username, "secret").unwrap()
}

fn category(id: &str, kind: CategoryType) -> Category {
    Category {
        category_id: id.to_string(),
        name: format!("Category {}", id),
        parent_id: 0,
        category_type: kind,
    }
}

fn channel(id: &str) -> Channel {
    Channel {
        stream_id: id.to_string(),
        name: format!("Channel {}", id),
        icon: None,
        category_id: "l1".to_string(),
        epg_channel_id: None,
        is_adult: false,
        tv_archive: false,
        tv_archive_duration: 0,
        added_timestamp: 0,
    }
}

fn movie(id: &str) -> Movie {
    Movie {
        stream_id: id.to_string(),
        name: format!("Movie {}", id),
        icon: None,
        category_id: "v1".to_string(),
        rating: None,
        rating_5based: 0.0,
        added_timestamp: 0,
        is_adult: false,
        container_extension: Some("mp4".to_string()),
        tmdb_id: None,
    }
}

fn series(id: &str) -> Series {
    Series {
        series_id: id.to_string(),
        name: format!("Series {}", id),
        cover: None,
        category_id: "s1".to_string(),
        plot: None,
        cast: None,
        director: None,
        genre: None,
        release_date: None,
        last_modified: 0,
        rating: None,
        rating_5based: 0.0,
        backdrop_path: Vec::new(),
        youtube_trailer: None,
        episode_run_time: None,
        tmdb_id: None,
    }
}

struct Harness {
    sync: SyncManager,
    cache: Arc<DatabaseCacheManager>,
    repository: Arc<FakeXtreamRepository>,
    session: Arc<FakeSession>,
    clock: Arc<ManualClock>,
}

async fn harness(repository: FakeXtreamRepository) -> Harness {
    let clock = Arc::new(ManualClock::new(
        Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap(),
    ));
    let pool = create_test_pool().await.unwrap();
    let cache = Arc::new(DatabaseCacheManager::new(
        pool,
        clock.clone(),
        CachePolicy::default(),
    ));
    let repository = Arc::new(repository);
    let session = FakeSession::signed_in("bob");

    let sync = SyncManager::new(
        cache.clone(),
        repository.clone(),
        session.clone(),
        SyncConfig::default(),
    );

    Harness {
        sync,
        cache,
        repository,
        session,
        clock,
    }
}

/// Poll `condition` on 1ms ticks. Keeps a short timer pending so a paused
/// clock only ever auto-advances by a tick.
async fn wait_until(condition: impl Fn() -> bool) -> bool {
    for _ in 0..10_000 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    false
}

const FULL_COUNTS: SyncCounts = SyncCounts {
    categories: 6,
    channels: 3,
    movies: 4,
    series: 2,
};

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_sync_requires_user() {
    let h = harness(FakeXtreamRepository::default()).await;
    h.session.set(None);

    let result = h.sync.perform_initial_sync().await;
    assert!(matches!(result, Err(SyncError::NotAuthenticated)));
    assert_eq!(h.repository.calls(), 0);
}

#[tokio::test]
async fn test_full_sync_writes_rows_and_metadata() {
    let h = harness(FakeXtreamRepository::default()).await;
    let partition = profile("bob").partition_id();

    let outcome = h.sync.perform_initial_sync().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced(FULL_COUNTS));
    assert_eq!(h.repository.calls(), 6);

    assert_eq!(h.cache.xtream_counts(&partition).await.unwrap(), FULL_COUNTS);
    assert_eq!(
        h.cache
            .cached_xtream_categories(&partition, CategoryType::Vod)
            .await
            .unwrap()
            .len(),
        2
    );

    let metadata = h.cache.xtream_sync_metadata(&partition).await.unwrap().unwrap();
    assert!(metadata.is_valid);
    assert_eq!(metadata.counts(), FULL_COUNTS);
    assert!(h.cache.is_xtream_cache_valid(&partition).await.unwrap());
}

#[tokio::test]
async fn test_valid_cache_skips_remote() {
    let h = harness(FakeXtreamRepository::default()).await;

    h.sync.perform_initial_sync().await.unwrap();
    let calls = h.repository.calls();

    let outcome = h.sync.perform_initial_sync().await.unwrap();
    assert_eq!(outcome, SyncOutcome::AlreadyValid);
    assert_eq!(h.repository.calls(), calls);
}

#[tokio::test]
async fn test_resyncs_after_ttl() {
    let h = harness(FakeXtreamRepository::default()).await;

    h.sync.perform_initial_sync().await.unwrap();
    h.clock.advance(ChronoDuration::hours(12) + ChronoDuration::seconds(1));

    let outcome = h.sync.perform_initial_sync().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced(FULL_COUNTS));
    assert_eq!(h.repository.calls(), 12);
}

#[tokio::test]
async fn test_failed_entities_degrade_to_empty() {
    let h = harness(FakeXtreamRepository {
        failing_movies: true,
        loading_series: true,
        ..Default::default()
    })
    .await;
    let bus = EventBus::new(64);
    let mut events = bus.subscribe();
    let sync = SyncManager::new(
        h.cache.clone(),
        h.repository.clone(),
        h.session.clone(),
        SyncConfig::default(),
    )
    .with_event_bus(bus);

    let outcome = sync.perform_initial_sync().await.unwrap();
    assert_eq!(
        outcome,
        SyncOutcome::Synced(SyncCounts {
            movies: 0,
            series: 0,
            ..FULL_COUNTS
        })
    );

    let partition = profile("bob").partition_id();
    assert!(h.cache.cached_xtream_movies(&partition).await.unwrap().is_empty());
    assert!(h.cache.is_xtream_cache_valid(&partition).await.unwrap());

    let mut degraded = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let CoreEvent::Sync(SyncEvent::StageDegraded { stage, .. }) = event {
            degraded.push(stage);
        }
    }
    degraded.sort();
    assert_eq!(degraded, vec!["movies", "series"]);
}

#[tokio::test]
async fn test_single_failed_entity_keeps_the_rest() {
    let h = harness(FakeXtreamRepository {
        failing_movies: true,
        ..Default::default()
    })
    .await;
    let partition = profile("bob").partition_id();
    let expected = SyncCounts {
        movies: 0,
        ..FULL_COUNTS
    };

    let outcome = h.sync.perform_initial_sync().await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced(expected));

    assert_eq!(h.cache.cached_xtream_channels(&partition).await.unwrap().len(), 3);
    assert_eq!(h.cache.cached_xtream_series(&partition).await.unwrap().len(), 2);
    for kind in [CategoryType::Live, CategoryType::Vod, CategoryType::Series] {
        assert_eq!(
            h.cache
                .cached_xtream_categories(&partition, kind)
                .await
                .unwrap()
                .len(),
            2
        );
    }
    assert!(h.cache.cached_xtream_movies(&partition).await.unwrap().is_empty());

    let metadata = h.cache.xtream_sync_metadata(&partition).await.unwrap().unwrap();
    assert!(metadata.is_valid);
    assert_eq!(metadata.counts(), expected);
    assert_eq!(h.cache.xtream_counts(&partition).await.unwrap(), expected);
}

#[tokio::test]
async fn test_progress_reported_in_order() {
    let h = harness(FakeXtreamRepository {
        slow_categories: Some(Duration::from_millis(50)),
        ..Default::default()
    })
    .await;

    let reported = Arc::new(Mutex::new(Vec::new()));
    let sink = reported.clone();
    h.sync
        .perform_initial_sync_with_callback(move |stage, fraction| {
            sink.lock().unwrap().push((stage, fraction));
        })
        .await
        .unwrap();

    let reported = reported.lock().unwrap().clone();
    assert_eq!(
        reported,
        vec![
            (SyncStage::Starting, 0.1),
            (SyncStage::Categories, 0.2),
            (SyncStage::Channels, 0.4),
            (SyncStage::Movies, 0.6),
            (SyncStage::Series, 0.8),
            (SyncStage::Finalizing, 0.9),
            (SyncStage::Completed, 1.0),
        ]
    );
}

#[tokio::test]
async fn test_sync_evicts_other_users() {
    let h = harness(FakeXtreamRepository::default()).await;
    let alice = profile("alice").partition_id();
    h.cache.cache_xtream_movies(&[movie("9")], &alice).await.unwrap();

    h.sync.perform_initial_sync().await.unwrap();

    assert!(h.cache.cached_xtream_movies(&alice).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalidate_forces_resync() {
    let h = harness(FakeXtreamRepository::default()).await;

    h.sync.perform_initial_sync().await.unwrap();
    h.sync.invalidate_cache().await.unwrap();

    let info = h.sync.cache_info().await.unwrap().unwrap();
    assert!(!info.is_valid);
    assert_eq!(info.partition, profile("bob").partition_id());

    let outcome = h.sync.perform_initial_sync().await.unwrap();
    assert!(matches!(outcome, SyncOutcome::Synced(_)));
}

#[tokio::test]
async fn test_cache_info_without_user() {
    let h = harness(FakeXtreamRepository::default()).await;
    h.session.set(None);

    assert!(h.sync.cache_info().await.unwrap().is_none());
    // No-op without a user.
    h.sync.invalidate_cache().await.unwrap();
}

#[tokio::test]
async fn test_cache_info_reports_validity_window() {
    let h = harness(FakeXtreamRepository::default()).await;
    let start = h.clock.as_ref().now();

    let info = h.sync.cache_info().await.unwrap().unwrap();
    assert!(!info.is_valid);
    assert!(info.valid_until.is_none());

    h.sync.perform_initial_sync().await.unwrap();
    let info = h.sync.cache_info().await.unwrap().unwrap();
    assert!(info.is_valid);
    assert_eq!(info.valid_until, Some(start + ChronoDuration::hours(12)));
}

#[tokio::test]
async fn test_auto_sync_lifecycle() {
    let h = harness(FakeXtreamRepository::default()).await;
    assert!(!h.sync.is_auto_sync_running());

    h.sync.start_auto_sync();
    assert!(h.sync.is_auto_sync_running());

    let partition = profile("bob").partition_id();
    let mut synced = false;
    for _ in 0..200 {
        if h.cache.is_xtream_cache_valid(&partition).await.unwrap() {
            synced = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(synced, "auto-sync should run a pass immediately");
    assert!(h.cache.tmdb_sync_metadata().await.unwrap().is_some());

    // Restarting replaces the loop.
    h.sync.start_auto_sync();
    assert!(h.sync.is_auto_sync_running());

    h.sync.stop_auto_sync();
    assert!(!h.sync.is_auto_sync_running());
    h.sync.stop_auto_sync();
}

#[tokio::test]
async fn test_auto_sync_retries_after_failed_pass() {
    let h = harness(FakeXtreamRepository::default()).await;
    let interval = Duration::from_secs(60);
    let sync = SyncManager::new(
        h.cache.clone(),
        h.repository.clone(),
        h.session.clone(),
        SyncConfig {
            auto_sync_interval: interval,
        },
    );

    // Pause only once the pool is migrated: sqlx's acquire timeout would
    // otherwise fire while the clock auto-advances during migrations.
    tokio::time::pause();

    // First pass fails: nobody is signed in.
    h.session.set(None);
    sync.start_auto_sync();
    assert!(wait_until(|| h.session.lookups() == 1).await);
    assert_eq!(h.repository.calls(), 0);

    tokio::time::sleep(interval / 2).await;
    assert_eq!(h.session.lookups(), 1, "no retry before the interval");
    assert!(sync.is_auto_sync_running());

    h.session.set(Some(profile("bob")));
    tokio::time::advance(interval).await;

    assert!(wait_until(|| h.repository.calls() == 6).await);
    assert_eq!(h.session.lookups(), 2);
    assert!(sync.is_auto_sync_running());

    sync.stop_auto_sync();
    assert!(!sync.is_auto_sync_running());
}
