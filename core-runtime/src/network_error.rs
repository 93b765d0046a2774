//! # Network Error Taxonomy
//!
//! Unified classification of remote-call failures. Every failure that reaches
//! the retry layer is converted into a [`NetworkError`], which knows whether
//! it is transient and how to describe itself to an end user.

use bridge_traits::BridgeError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default timeout reported when the transport does not say how long it waited.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Classified network failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    #[error("Authentication failed: {message}")]
    AuthenticationError { message: String },

    #[error("Authorization failed: {message}")]
    AuthorizationError { message: String },

    #[error("HTTP {status_code}: {message}")]
    ServerError { status_code: u16, message: String },

    #[error("Network unavailable")]
    NetworkUnavailable,

    #[error("Connection timed out ({timeout_ms}ms)")]
    ConnectionTimeout { timeout_ms: u64 },

    #[error("Could not connect to {host}: {message}")]
    ConnectionFailed { host: String, message: String },

    #[error("Content not found: {content_type}/{content_id}")]
    ContentNotFound {
        content_id: String,
        content_type: String,
    },

    #[error("Stream not found: {stream_id}")]
    StreamNotFound { stream_id: String },

    #[error("Connection limit exceeded: {current}/{max}")]
    ConnectionLimitExceeded { current: u32, max: u32 },

    #[error("Account suspended: {}", .reason.as_deref().unwrap_or("unspecified"))]
    AccountSuspended { reason: Option<String> },

    #[error("Unsupported format: {}", .mime_type.as_deref().unwrap_or("unknown"))]
    UnsupportedFormat { mime_type: Option<String> },

    #[error("Decoder error: {message}")]
    DecoderError { message: String },

    #[error("Corrupted or invalid stream")]
    CorruptedStream { stream_url: String },

    #[error("Failed to parse {data_type}: {message}")]
    ParseError { data_type: String, message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

/// Fieldless discriminant of [`NetworkError`], used for retryable sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkErrorKind {
    Authentication,
    Authorization,
    ServerError,
    NetworkUnavailable,
    ConnectionTimeout,
    ConnectionFailed,
    ContentNotFound,
    StreamNotFound,
    ConnectionLimitExceeded,
    AccountSuspended,
    UnsupportedFormat,
    DecoderError,
    CorruptedStream,
    ParseError,
    Unknown,
}

impl NetworkError {
    /// Map an HTTP status (and optional server message) to an error.
    ///
    /// Only meaningful for non-success statuses.
    pub fn from_status(status: u16, message: Option<&str>) -> Self {
        match status {
            401 => Self::AuthenticationError {
                message: message.unwrap_or("Unauthorized").to_string(),
            },
            403 => Self::AuthorizationError {
                message: message.unwrap_or("Forbidden").to_string(),
            },
            404 => {
                let mentions_stream = message
                    .map(|m| m.to_ascii_lowercase().contains("stream"))
                    .unwrap_or(false);
                if mentions_stream {
                    Self::StreamNotFound {
                        stream_id: "unknown".to_string(),
                    }
                } else {
                    Self::ContentNotFound {
                        content_id: "unknown".to_string(),
                        content_type: "content".to_string(),
                    }
                }
            }
            429 => Self::ConnectionLimitExceeded { current: 1, max: 1 },
            500..=599 => Self::ServerError {
                status_code: status,
                message: message.unwrap_or("Server error").to_string(),
            },
            _ => Self::Unknown {
                message: format!("HTTP {}: {}", status, message.unwrap_or("")),
            },
        }
    }

    /// Build a parse failure for a payload of `data_type`.
    pub fn parse(data_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ParseError {
            data_type: data_type.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> NetworkErrorKind {
        match self {
            Self::AuthenticationError { .. } => NetworkErrorKind::Authentication,
            Self::AuthorizationError { .. } => NetworkErrorKind::Authorization,
            Self::ServerError { .. } => NetworkErrorKind::ServerError,
            Self::NetworkUnavailable => NetworkErrorKind::NetworkUnavailable,
            Self::ConnectionTimeout { .. } => NetworkErrorKind::ConnectionTimeout,
            Self::ConnectionFailed { .. } => NetworkErrorKind::ConnectionFailed,
            Self::ContentNotFound { .. } => NetworkErrorKind::ContentNotFound,
            Self::StreamNotFound { .. } => NetworkErrorKind::StreamNotFound,
            Self::ConnectionLimitExceeded { .. } => NetworkErrorKind::ConnectionLimitExceeded,
            Self::AccountSuspended { .. } => NetworkErrorKind::AccountSuspended,
            Self::UnsupportedFormat { .. } => NetworkErrorKind::UnsupportedFormat,
            Self::DecoderError { .. } => NetworkErrorKind::DecoderError,
            Self::CorruptedStream { .. } => NetworkErrorKind::CorruptedStream,
            Self::ParseError { .. } => NetworkErrorKind::ParseError,
            Self::Unknown { .. } => NetworkErrorKind::Unknown,
        }
    }

    /// Whether the failure is transient in principle.
    ///
    /// The retry policy additionally filters by [`NetworkErrorKind`].
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ServerError { status_code, .. } => (500..=599).contains(status_code),
            Self::NetworkUnavailable
            | Self::ConnectionTimeout { .. }
            | Self::ConnectionFailed { .. }
            | Self::StreamNotFound { .. }
            | Self::CorruptedStream { .. }
            | Self::ParseError { .. }
            | Self::Unknown { .. } => true,
            Self::AuthenticationError { .. }
            | Self::AuthorizationError { .. }
            | Self::ContentNotFound { .. }
            | Self::ConnectionLimitExceeded { .. }
            | Self::AccountSuspended { .. }
            | Self::UnsupportedFormat { .. }
            | Self::DecoderError { .. } => false,
        }
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            Self::AuthenticationError { .. } => {
                "Invalid credentials. Check your username and password.".to_string()
            }
            Self::AuthorizationError { .. } => {
                "You do not have permission to access this content.".to_string()
            }
            Self::ServerError { status_code, .. } => match status_code {
                500 => "Internal server error. Try again later.".to_string(),
                502 => "Service temporarily unavailable.".to_string(),
                503 => "Service under maintenance. Try again later.".to_string(),
                code => format!("Server error ({}). Try again later.", code),
            },
            Self::NetworkUnavailable => {
                "No internet connection. Check your connectivity.".to_string()
            }
            Self::ConnectionTimeout { .. } => {
                "The connection took too long. Check your internet speed.".to_string()
            }
            Self::ConnectionFailed { .. } => {
                "Cannot reach the server. Check the server URL.".to_string()
            }
            Self::ContentNotFound { .. } => "The requested content is not available.".to_string(),
            Self::StreamNotFound { .. } => {
                "This channel or stream is not available right now.".to_string()
            }
            Self::ConnectionLimitExceeded { max, .. } => format!(
                "The maximum number of simultaneous connections ({}) was reached.",
                max
            ),
            Self::AccountSuspended { reason } => format!(
                "Your account has been suspended. {}",
                reason.as_deref().unwrap_or("")
            )
            .trim_end()
            .to_string(),
            Self::UnsupportedFormat { .. } => {
                "This video format is not supported on this device.".to_string()
            }
            Self::DecoderError { .. } => "The video could not be decoded.".to_string(),
            Self::CorruptedStream { .. } => "The stream is damaged or invalid.".to_string(),
            Self::ParseError { .. } => "Could not process the server response.".to_string(),
            Self::Unknown { .. } => "An unexpected error occurred.".to_string(),
        }
    }

    /// Suggested next step for the user, if any.
    pub fn suggested_action(&self) -> Option<&'static str> {
        Some(match self {
            Self::AuthenticationError { .. } => "Sign in again",
            Self::AuthorizationError { .. } | Self::AccountSuspended { .. } => {
                "Contact your service provider"
            }
            Self::ServerError { .. } => "Retry in a few minutes",
            Self::NetworkUnavailable => "Check Wi-Fi or mobile data",
            Self::ConnectionTimeout { .. } => "Retry on a faster connection",
            Self::ConnectionFailed { .. } => "Verify the server URL in settings",
            Self::ContentNotFound { .. } => "Pick other content",
            Self::StreamNotFound { .. } | Self::UnsupportedFormat { .. } => {
                "Try another channel or format"
            }
            Self::ConnectionLimitExceeded { .. } => "Close other active sessions",
            Self::CorruptedStream { .. } => "Retry or try another channel",
            Self::ParseError { .. } | Self::Unknown { .. } => "Retry the operation",
            Self::DecoderError { .. } => return None,
        })
    }
}

impl From<BridgeError> for NetworkError {
    fn from(error: BridgeError) -> Self {
        match error {
            BridgeError::Timeout(_) => Self::ConnectionTimeout {
                timeout_ms: DEFAULT_TIMEOUT_MS,
            },
            BridgeError::ConnectionFailed(message) => Self::ConnectionFailed {
                host: "server".to_string(),
                message,
            },
            BridgeError::Io(e) => {
                let message = e.to_string();
                if message.to_ascii_lowercase().contains("network") {
                    Self::NetworkUnavailable
                } else {
                    Self::Unknown { message }
                }
            }
            BridgeError::NotAvailable(message) | BridgeError::OperationFailed(message) => {
                if message.to_ascii_lowercase().contains("network") {
                    Self::NetworkUnavailable
                } else {
                    Self::Unknown { message }
                }
            }
        }
    }
}

impl From<serde_json::Error> for NetworkError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse("JSON", error.to_string())
    }
}
