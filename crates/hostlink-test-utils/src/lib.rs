#![deny(unsafe_code)]

//! Shared test utilities for the hostlink workspace.
//!
//! Provides a scripted TCP stand-in for the host and config builders so
//! that individual crate tests stay concise.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! hostlink-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod mock_host;

pub use mock_host::{MockHost, Reply};
