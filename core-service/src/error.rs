use provider_xtream::XtreamErrorCode;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Core initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Configuration error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] core_auth::AuthError),

    #[error("Cache error: {0}")]
    Cache(#[from] core_cache::CacheError),

    #[error("Sync error: {0}")]
    Sync(#[from] core_sync::SyncError),

    /// The Xtream panel call failed and nothing was cached to fall back on
    #[error("Remote catalog error ({code:?}): {message}")]
    Remote {
        message: String,
        code: XtreamErrorCode,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
