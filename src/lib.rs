//! Workspace facade crate.
//!
//! Re-exports the [`core_service`] application context so hosts can depend on
//! `iptv-core-workspace` alone and toggle the `desktop-shims` feature instead
//! of wiring each workspace crate individually.

#[cfg(feature = "desktop-shims")]
pub use core_service::*;
