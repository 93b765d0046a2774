use core_cache::CacheError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("Sync task failed: {0}")]
    Task(String),
}

impl SyncError {
    /// Whether retrying the same sync later can succeed.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, SyncError::NotAuthenticated)
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
