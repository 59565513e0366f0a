//! # merida-api
//!
//! Typed access to the MERIDA Smart Grow REST backend.
//!
//! - [`ApiClient`]: HTTP plumbing. Every request carries the bearer token of
//!   the active session, read through [`TokenSource`].
//! - [`resources`]: one request handle per backend router (facilities, plots,
//!   species, irrigation, users).
//! - [`QueryCache`] and [`Queries`]: stale-time caching, invalidation after
//!   mutations and polling of live plot state.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use merida_api::{ApiClient, Queries};
//!
//! let client = ApiClient::new(&config.api)?.with_token_source(session_manager.clone());
//! let queries = Arc::new(Queries::new(client, &config.query));
//!
//! let plots = queries.plots(&session.user_id).await?;
//! let mut live = queries.watch_plot_state(&plots[0].plot_id);
//! while live.changed().await.is_ok() {
//!     println!("{:?}", *live.borrow());
//! }
//! ```

#![forbid(unsafe_code)]
#![deny(warnings)]
#![deny(missing_docs)]

pub mod cache;
pub mod client;
pub mod dto;
pub mod error;
pub mod queries;
pub mod resources;

pub use cache::{QueryCache, QueryKey};
pub use client::{ApiClient, TokenSource};
pub use error::{ApiError, ApiResult};
pub use queries::Queries;
