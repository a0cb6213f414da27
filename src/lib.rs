//! Administrative console for the Atrium agent platform.
//!
//! The interesting part lives in [`api`]: every read of the backend goes
//! through a request coordinator that collapses concurrent identical calls
//! into one network round-trip, memoizes settled results for a TTL window,
//! and supports targeted invalidation after mutations. Everything else is a
//! thin consumer: typed wrappers over the platform's REST endpoints and a
//! CLI that renders what the backend returns.

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod logging;
pub mod resources;
pub mod utils;
