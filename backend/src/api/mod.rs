//! HTTP API module.
//!
//! This module provides the HTTP trigger, its response types and the job
//! log stream.

pub mod logs;
pub mod server;
pub mod types;

pub use logs::*;
pub use server::start_server;
pub use types::*;
