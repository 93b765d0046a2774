//! Xtream Codes provider
//!
//! Remote catalog access for the IPTV core: the [`XtreamRepository`]
//! contract, its `player_api.php` implementation [`XtreamConnector`], and
//! the lenient response types the panels actually send.

pub mod connector;
pub mod error;
pub mod repository;
pub mod types;

pub use connector::XtreamConnector;
pub use error::{Result, XtreamError, XtreamErrorCode, XtreamResult};
pub use repository::XtreamRepository;
