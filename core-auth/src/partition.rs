//! Per-user cache partition key.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Stable identifier of one user's slice of the catalog cache.
///
/// Lowercase hex SHA-256 of `"{username}:{password}:{server}"`. The same
/// credentials always map to the same partition, on any device.
///
/// ```
/// use core_auth::PartitionId;
///
/// let id = PartitionId::derive("bob", "hunter2", "http://line.example.com");
/// assert_eq!(id.as_str().len(), 64);
/// assert_eq!(id.short().len(), 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartitionId(String);

impl PartitionId {
    pub fn derive(username: &str, password: &str, server: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(username.as_bytes());
        hasher.update(b":");
        hasher.update(password.as_bytes());
        hasher.update(b":");
        hasher.update(server.as_bytes());

        Self(hex::encode(hasher.finalize()))
    }

    /// Wrap an already derived id, e.g. one read back from storage.
    pub fn from_raw(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 8 hex characters, for log output.
    pub fn short(&self) -> &str {
        self.0.get(..8).unwrap_or(&self.0)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for PartitionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
