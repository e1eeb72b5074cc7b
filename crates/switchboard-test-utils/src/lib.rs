#![deny(unsafe_code)]

//! Shared test utilities for the Switchboard workspace.
//!
//! Provides reusable fixtures, config builders, and tracing helpers so that
//! individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! switchboard-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod daemon;
pub mod fixtures;
pub mod tracing_setup;
