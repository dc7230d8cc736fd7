//! feedrelay: maps `(platform, topic)` pairs to upstream RSS/Atom feeds and
//! re-serves them as JSON over HTTP.
//!
//! - [`registry`] - immutable platform → topic → URL table
//! - [`feed`] - single-shot fetch and XML decoding
//! - [`server`] - axum router, handlers and middleware
//! - [`config`] - optional TOML configuration

pub mod config;
pub mod feed;
pub mod registry;
pub mod server;
pub mod util;
