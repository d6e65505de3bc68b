//! Launchpad Journal kernel library.
//!
//! Content types, the read-time lifecycle hook, first-boot seeding, and the
//! REST surface. The `launchpad` binary is a thin CLI over this library.

pub mod bootstrap;
pub mod config;
pub mod content;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod permissions;
pub mod routes;
pub mod session;
pub mod state;
pub mod store;
