//! Transaction monitor service
//!
//! HTTP surface and configuration for the classification endpoint. The
//! binary in `main.rs` wires these together; integration tests drive the
//! router directly.

pub mod api;
pub mod config;
