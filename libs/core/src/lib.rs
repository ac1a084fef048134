//! Core contracts and value types for the activity relay.
//!
//! This crate exposes the data structures exchanged between the gateway's
//! turn processor, the translator, and the external collaborators
//! (conversation engine, configuration store, channel transport), plus the
//! HTTP clients for those collaborators. Test doubles live in [`testkit`].
pub mod activity;
pub mod config_store;
pub mod engine;
pub mod error;
pub mod testkit;
pub mod transport;
pub mod types;

pub use activity::*;
pub use config_store::*;
pub use engine::*;
pub use error::*;
pub use transport::*;
pub use types::*;

/// Returns the semantic version advertised by this crate.
///
/// ```
/// assert_eq!(relay_core::version(), "0.1.0");
/// ```
pub fn version() -> &'static str {
    "0.1.0"
}
