//! Xtream Codes `player_api.php` connector
//!
//! Implements [`XtreamRepository`] over the host [`HttpClient`], taking
//! credentials from the active session on every call.

use async_trait::async_trait;
use bridge_traits::http::{HttpClient, HttpRequest};
use core_auth::SessionProvider;
use core_cache::{Category, CategoryType, Channel, Movie, Series};
use core_runtime::config::DEFAULT_HTTP_TIMEOUT;
use core_runtime::logging::redact_url;
use core_runtime::{NetworkError, RetryConfig, RetryProfile, RetryStrategy};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{Result, XtreamError, XtreamResult};
use crate::repository::XtreamRepository;
use crate::types::{CatalogEntry, CategoryDto, LiveStreamDto, SeriesDto, VodStreamDto};

/// Xtream API endpoint, relative to the server URL
const PLAYER_API_PATH: &str = "player_api.php";

/// Xtream Codes API connector
///
/// # Example
///
/// ```ignore
/// use provider_xtream::{XtreamConnector, XtreamRepository};
///
/// let connector = XtreamConnector::new(http_client, session, retry_strategy);
/// let movies = connector.vod_streams(None).await;
/// ```
pub struct XtreamConnector {
    http_client: Arc<dyn HttpClient>,
    session: Arc<dyn SessionProvider>,
    retry: RetryStrategy,
    retry_config: RetryConfig,
    request_timeout: Duration,
}

impl XtreamConnector {
    /// Connector with the `Normal` retry profile.
    pub fn new(
        http_client: Arc<dyn HttpClient>,
        session: Arc<dyn SessionProvider>,
        retry: RetryStrategy,
    ) -> Self {
        Self {
            http_client,
            session,
            retry,
            retry_config: RetryConfig::profile(RetryProfile::Normal),
            request_timeout: DEFAULT_HTTP_TIMEOUT,
        }
    }

    pub fn with_retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Build a `player_api.php` URL. Credentials are percent-encoded.
    pub fn player_api_url(
        server: &str,
        username: &str,
        password: &str,
        action: &str,
        category_id: Option<&str>,
    ) -> String {
        let mut url = format!(
            "{}/{}?username={}&password={}&action={}",
            server.trim_end_matches('/'),
            PLAYER_API_PATH,
            urlencoding::encode(username),
            urlencoding::encode(password),
            action
        );

        if let Some(category_id) = category_id {
            url.push_str(&format!("&category_id={}", urlencoding::encode(category_id)));
        }

        url
    }

    /// Fetch one catalog list for the signed-in user, with retries.
    #[instrument(skip(self), fields(category_id = ?category_id))]
    async fn fetch_list<T>(&self, action: &str, category_id: Option<&str>) -> Result<Vec<T>>
    where
        T: DeserializeOwned + CatalogEntry + Send,
    {
        let user = self
            .session
            .current_user()
            .await
            .ok_or(XtreamError::NotAuthenticated)?;

        let url = Self::player_api_url(
            &user.server,
            &user.username,
            &user.password,
            action,
            category_id,
        );
        debug!(url = %redact_url(&url), "Requesting Xtream catalog");

        let items = self
            .retry
            .execute(&self.retry_config, || {
                let request = HttpRequest::get(url.clone())
                    .header("Accept", "application/json")
                    .timeout(self.request_timeout);
                let client = Arc::clone(&self.http_client);

                async move {
                    let response = client.execute(request).await.map_err(NetworkError::from)?;
                    if !response.is_success() {
                        let message = response.text().ok();
                        return Err(NetworkError::from_status(
                            response.status,
                            message.as_deref(),
                        ));
                    }
                    parse_list::<T>(action, &response.body)
                }
            })
            .await?;

        Ok(items)
    }

    async fn categories(&self, action: &str, kind: CategoryType) -> XtreamResult<Vec<Category>> {
        let result = self
            .fetch_list::<CategoryDto>(action, None)
            .await
            .map(|dtos| dtos.into_iter().map(|d| d.into_category(kind)).collect());
        finish(action, result)
    }
}

/// Decode a catalog response body.
///
/// `null` and `{}` are empty catalogs. A `user_info` object with `auth = 0`
/// is the panel's way of rejecting credentials. Entries that fail to decode
/// or carry no id are skipped.
fn parse_list<T: DeserializeOwned + CatalogEntry>(
    action: &str,
    body: &[u8],
) -> std::result::Result<Vec<T>, NetworkError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| NetworkError::parse(action, e.to_string()))?;

    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(entries) => {
            let total = entries.len();
            let items: Vec<T> = entries
                .into_iter()
                .filter_map(|entry| serde_json::from_value::<T>(entry).ok())
                .filter(CatalogEntry::has_id)
                .collect();

            if items.len() < total {
                warn!(action, skipped = total - items.len(), "Skipped malformed catalog entries");
            }
            Ok(items)
        }
        Value::Object(map) if map.is_empty() => Ok(Vec::new()),
        Value::Object(map) if is_auth_rejection(&map) => Err(NetworkError::AuthenticationError {
            message: "Panel rejected the credentials".to_string(),
        }),
        _ => Err(NetworkError::parse(action, "expected a JSON array")),
    }
}

fn is_auth_rejection(map: &serde_json::Map<String, Value>) -> bool {
    map.get("user_info")
        .and_then(|info| info.get("auth"))
        .is_some_and(|auth| auth == &Value::from(0) || auth == &Value::from("0"))
}

fn finish<T>(action: &str, result: Result<Vec<T>>) -> XtreamResult<Vec<T>> {
    match &result {
        Ok(items) => debug!(action, count = items.len(), "Xtream request succeeded"),
        Err(e) => warn!(action, error = %e, "Xtream request failed"),
    }
    result.into()
}

#[async_trait]
impl XtreamRepository for XtreamConnector {
    async fn live_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("get_live_categories", CategoryType::Live).await
    }

    async fn vod_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("get_vod_categories", CategoryType::Vod).await
    }

    async fn series_categories(&self) -> XtreamResult<Vec<Category>> {
        self.categories("get_series_categories", CategoryType::Series)
            .await
    }

    async fn live_streams(&self, category_id: Option<String>) -> XtreamResult<Vec<Channel>> {
        let action = "get_live_streams";
        let result = self
            .fetch_list::<LiveStreamDto>(action, category_id.as_deref())
            .await
            .map(|dtos| dtos.into_iter().map(Channel::from).collect());
        finish(action, result)
    }

    async fn vod_streams(&self, category_id: Option<String>) -> XtreamResult<Vec<Movie>> {
        let action = "get_vod_streams";
        let result = self
            .fetch_list::<VodStreamDto>(action, category_id.as_deref())
            .await
            .map(|dtos| dtos.into_iter().map(Movie::from).collect());
        finish(action, result)
    }

    async fn series(&self, category_id: Option<String>) -> XtreamResult<Vec<Series>> {
        let action = "get_series";
        let result = self
            .fetch_list::<SeriesDto>(action, category_id.as_deref())
            .await
            .map(|dtos| dtos.into_iter().map(Series::from).collect());
        finish(action, result)
    }
}
