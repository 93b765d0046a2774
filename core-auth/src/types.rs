use crate::error::{AuthError, Result};
use crate::partition::PartitionId;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a stored account profile.
///
/// # Examples
///
/// ```
/// use core_auth::ProfileId;
///
/// let id = ProfileId::from_string("550e8400-e29b-41d4-a716-446655440000").unwrap();
/// assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileId(Uuid);

impl ProfileId {
    /// Create a new random profile ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a profile ID from a string
    pub fn from_string(s: &str) -> std::result::Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ProfileId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Uuid> for ProfileId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// An Xtream Codes account.
///
/// # Security
///
/// The password is part of every Xtream request and of the partition hash,
/// so it is kept in memory, but the `Debug` implementation redacts it.
///
/// # Examples
///
/// ```
/// use core_auth::UserProfile;
///
/// let profile = UserProfile::new("http://line.example.com:8080", "bob", "hunter2").unwrap();
/// assert_eq!(profile.display_name, "bob");
/// assert!(!format!("{:?}", profile).contains("hunter2"));
/// ```
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: ProfileId,
    /// Panel base URL, e.g. `http://line.example.com:8080`
    pub server: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
}

impl UserProfile {
    /// Create a profile, validating that no credential is blank and that the
    /// server looks like an HTTP(S) URL. A trailing `/` on the server is dropped.
    pub fn new(
        server: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let server = server.into().trim().trim_end_matches('/').to_string();
        let username = username.into();
        let password = password.into();

        if username.trim().is_empty() {
            return Err(AuthError::InvalidCredentials(
                "username cannot be empty".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "password cannot be empty".to_string(),
            ));
        }
        if !(server.starts_with("http://") || server.starts_with("https://")) {
            return Err(AuthError::InvalidServerUrl(server));
        }

        Ok(Self {
            id: ProfileId::new(),
            display_name: username.clone(),
            server,
            username,
            password,
        })
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    /// Cache partition owned by this account.
    pub fn partition_id(&self) -> PartitionId {
        PartitionId::derive(&self.username, &self.password, &self.server)
    }
}

impl fmt::Debug for UserProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserProfile")
            .field("id", &self.id)
            .field("server", &self.server)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("display_name", &self.display_name)
            .finish()
    }
}
