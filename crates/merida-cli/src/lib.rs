//! # merida-cli
//!
//! Command-line front end for the MERIDA Smart Grow platform.
//!
//! This crate provides:
//! - Login with the new-password challenge, logout and session inspection
//! - Facility, plot and species management
//! - Live and historical plot sensor readings
//! - Irrigation records and recommendations
//! - User profiles

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use context::Context;
pub use error::{CliError, CliResult};
