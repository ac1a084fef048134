//! Relay gateway: per-bot adapter registry, turn processor, and the
//! channel-facing HTTP boundary.
pub mod config;
pub mod http;
pub mod registry;
pub mod turn;
