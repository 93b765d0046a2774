//! # Session Store
//!
//! Tracks the signed-in Xtream account.
//!
//! ## Overview
//!
//! [`SessionProvider`] is the read-only view the cache and sync layers use
//! to find the active user. [`SessionStore`] is the reactive implementation:
//! it holds the current profile in a `tokio::sync::watch` channel so hosts
//! can observe sign-in and sign-out, and it announces both on the
//! [`EventBus`].

use crate::error::{AuthError, Result};
use crate::types::UserProfile;
use async_trait::async_trait;
use core_runtime::events::{AuthEvent, CoreEvent, EventBus};
use tokio::sync::watch;
use tracing::{debug, info, instrument};

/// Source of the currently authenticated user.
#[async_trait]
pub trait SessionProvider: Send + Sync {
    /// The active profile, or `None` when nobody is signed in.
    async fn current_user(&self) -> Option<UserProfile>;
}

/// In-memory session holder.
pub struct SessionStore {
    current: watch::Sender<Option<UserProfile>>,
    event_bus: Option<EventBus>,
}

impl SessionStore {
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current,
            event_bus: None,
        }
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    /// Make `profile` the active user, replacing any previous one.
    #[instrument(skip(self, profile), fields(profile_id = %profile.id))]
    pub fn sign_in(&self, profile: UserProfile) -> Result<()> {
        if profile.username.trim().is_empty() || profile.password.is_empty() {
            return Err(AuthError::InvalidCredentials(
                "username and password are required".to_string(),
            ));
        }

        let partition = profile.partition_id();
        let profile_id = profile.id.to_string();
        self.current.send_replace(Some(profile));

        info!(partition = %partition.short(), "Signed in");
        self.emit(AuthEvent::SignedIn {
            profile_id,
            partition: partition.short().to_string(),
        });
        Ok(())
    }

    /// Clear the active user. Returns the profile that was signed in.
    #[instrument(skip(self))]
    pub fn sign_out(&self) -> Option<UserProfile> {
        let previous = self.current.send_replace(None);

        match &previous {
            Some(profile) => {
                info!(profile_id = %profile.id, "Signed out");
                self.emit(AuthEvent::SignedOut {
                    profile_id: profile.id.to_string(),
                });
            }
            None => debug!("Sign-out without active session"),
        }

        previous
    }

    /// Snapshot of the active user.
    pub fn current(&self) -> Option<UserProfile> {
        self.current.borrow().clone()
    }

    /// Active user or [`AuthError::NotAuthenticated`].
    pub fn require_user(&self) -> Result<UserProfile> {
        self.current().ok_or(AuthError::NotAuthenticated)
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.borrow().is_some()
    }

    /// Receiver that observes every sign-in and sign-out.
    pub fn subscribe(&self) -> watch::Receiver<Option<UserProfile>> {
        self.current.subscribe()
    }

    fn emit(&self, event: AuthEvent) {
        if let Some(bus) = &self.event_bus {
            // No subscribers is fine.
            let _ = bus.emit(CoreEvent::Auth(event));
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionProvider for SessionStore {
    async fn current_user(&self) -> Option<UserProfile> {
        self.current()
    }
}
