//! # merida-core
//!
//! Configuration and error handling shared by the MERIDA Smart Grow client
//! crates.
//!
//! Configuration is read once at start-up from the process environment (and
//! an optional `.env` file). Every other crate receives the pieces it needs
//! from [`Config`] rather than reading the environment itself.

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod config;
pub mod error;

pub use config::{ApiConfig, AppConfig, AuthConfig, Config, QueryConfig};
pub use error::{Error, Result};
