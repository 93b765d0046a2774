use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Invalid server URL: {0}")]
    InvalidServerUrl(String),
}

pub type Result<T> = std::result::Result<T, AuthError>;
