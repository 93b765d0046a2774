//! Error types for the Xtream provider

use core_runtime::NetworkError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Xtream provider errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum XtreamError {
    /// No signed-in user to take credentials from
    #[error("User not authenticated")]
    NotAuthenticated,

    #[error(transparent)]
    Network(#[from] NetworkError),
}

/// Result type for Xtream operations
pub type Result<T> = std::result::Result<T, XtreamError>;

/// Coarse failure category surfaced to callers of the repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum XtreamErrorCode {
    InvalidCredentials,
    NetworkError,
    ServerError,
    ConnectionLimitExceeded,
    InvalidUrl,
    Timeout,
    Unknown,
}

impl From<&NetworkError> for XtreamErrorCode {
    fn from(error: &NetworkError) -> Self {
        match error {
            NetworkError::AuthenticationError { .. }
            | NetworkError::AuthorizationError { .. }
            | NetworkError::AccountSuspended { .. } => XtreamErrorCode::InvalidCredentials,
            NetworkError::NetworkUnavailable | NetworkError::ConnectionFailed { .. } => {
                XtreamErrorCode::NetworkError
            }
            NetworkError::ConnectionTimeout { .. } => XtreamErrorCode::Timeout,
            NetworkError::ServerError { .. } => XtreamErrorCode::ServerError,
            NetworkError::ConnectionLimitExceeded { .. } => {
                XtreamErrorCode::ConnectionLimitExceeded
            }
            _ => XtreamErrorCode::Unknown,
        }
    }
}

impl From<&XtreamError> for XtreamErrorCode {
    fn from(error: &XtreamError) -> Self {
        match error {
            XtreamError::NotAuthenticated => XtreamErrorCode::InvalidCredentials,
            XtreamError::Network(e) => e.into(),
        }
    }
}

/// Outcome of a remote catalog call.
#[derive(Debug, Clone, PartialEq)]
pub enum XtreamResult<T> {
    Success(T),
    Error {
        message: String,
        code: XtreamErrorCode,
    },
    /// The request has not completed yet
    Loading,
}

impl<T> XtreamResult<T> {
    pub fn error(message: impl Into<String>, code: XtreamErrorCode) -> Self {
        XtreamResult::Error {
            message: message.into(),
            code,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, XtreamResult::Success(_))
    }

    /// The payload, if the call succeeded.
    pub fn success(self) -> Option<T> {
        match self {
            XtreamResult::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> XtreamResult<U> {
        match self {
            XtreamResult::Success(value) => XtreamResult::Success(f(value)),
            XtreamResult::Error { message, code } => XtreamResult::Error { message, code },
            XtreamResult::Loading => XtreamResult::Loading,
        }
    }
}

impl<T> From<Result<T>> for XtreamResult<T> {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(value) => XtreamResult::Success(value),
            Err(error) => {
                let message = match &error {
                    XtreamError::Network(e) => e.user_message(),
                    other => other.to_string(),
                };
                XtreamResult::error(message, XtreamErrorCode::from(&error))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_from_network_errors() {
        let cases = [
            (
                NetworkError::AuthenticationError {
                    message: "bad".into(),
                },
                XtreamErrorCode::InvalidCredentials,
            ),
            (NetworkError::NetworkUnavailable, XtreamErrorCode::NetworkError),
            (
                NetworkError::ConnectionTimeout { timeout_ms: 30_000 },
                XtreamErrorCode::Timeout,
            ),
            (
                NetworkError::ServerError {
                    status_code: 502,
                    message: "bad gateway".into(),
                },
                XtreamErrorCode::ServerError,
            ),
            (
                NetworkError::ConnectionLimitExceeded { current: 2, max: 1 },
                XtreamErrorCode::ConnectionLimitExceeded,
            ),
            (
                NetworkError::parse("JSON", "eof"),
                XtreamErrorCode::Unknown,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(XtreamErrorCode::from(&error), expected, "{:?}", error);
        }
    }

    #[test]
    fn test_result_from_error() {
        let result: XtreamResult<Vec<u32>> = Err(XtreamError::NotAuthenticated).into();
        assert_eq!(
            result,
            XtreamResult::Error {
                message: "User not authenticated".to_string(),
                code: XtreamErrorCode::InvalidCredentials,
            }
        );
    }

    #[test]
    fn test_map_and_success() {
        let result: XtreamResult<Vec<u32>> = XtreamResult::Success(vec![1, 2]);
        assert_eq!(result.clone().map(|v| v.len()).success(), Some(2));
        assert!(result.is_success());
        assert_eq!(XtreamResult::<u32>::Loading.success(), None);
    }
}
