//! Remote catalog contract

use crate::error::XtreamResult;
use async_trait::async_trait;
use core_cache::{Category, Channel, Movie, Series};

/// Read access to an Xtream panel for the signed-in user.
///
/// Implementations never fail with `Err`; every failure is folded into
/// [`XtreamResult::Error`] so callers can degrade per call.
#[async_trait]
pub trait XtreamRepository: Send + Sync {
    async fn live_categories(&self) -> XtreamResult<Vec<Category>>;

    async fn vod_categories(&self) -> XtreamResult<Vec<Category>>;

    async fn series_categories(&self) -> XtreamResult<Vec<Category>>;

    /// Live channels, optionally limited to one category.
    async fn live_streams(&self, category_id: Option<String>) -> XtreamResult<Vec<Channel>>;

    async fn vod_streams(&self, category_id: Option<String>) -> XtreamResult<Vec<Movie>>;

    async fn series(&self, category_id: Option<String>) -> XtreamResult<Vec<Series>>;
}
