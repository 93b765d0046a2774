//! # Authentication Module
//!
//! Xtream account identity and the active session.
//!
//! ## Overview
//!
//! An Xtream account is a `(server, username, password)` triple. This crate
//! models it as a [`UserProfile`], derives the per-user cache partition from
//! it ([`PartitionId`]), and tracks which profile is currently signed in
//! ([`SessionStore`]). Consumers that only need to read the active user
//! depend on the [`SessionProvider`] trait.

pub mod error;
pub mod partition;
pub mod session;
pub mod types;

pub use error::{AuthError, Result};
pub use partition::PartitionId;
pub use session::{SessionProvider, SessionStore};
pub use types::{ProfileId, UserProfile};
