//! HTTP API module.
//!
//! This module provides the HTTP server, API types and the shared log
//! broadcaster for the campaign review backend.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{router, start_server, AppState};
pub use types::*;
pub use logs::*;
