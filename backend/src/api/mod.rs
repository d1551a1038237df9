//! HTTP API module.
//!
//! This module provides the HTTP server, response bodies and the log stream
//! for the course import service.

pub mod server;
pub mod types;
pub mod logs;

pub use server::{build_router, start_server, AppState};
pub use types::*;
pub use logs::*;
