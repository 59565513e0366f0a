//! Typed resource clients, one per backend router.
//!
//! Each handle borrows the [`ApiClient`](crate::ApiClient) and is obtained
//! from it (`client.plots()`, `client.species()`, ...).

pub mod facilities;
pub mod irrigation;
pub mod plots;
pub mod species;
pub mod users;

pub use facilities::Facilities;
pub use irrigation::Irrigation;
pub use plots::Plots;
pub use species::SpeciesApi;
pub use users::Users;

use serde::Deserialize;

/// A list returned either bare or inside an envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum Listing<T, E> {
    Bare(Vec<T>),
    Wrapped(E),
}

impl<T, E: Into<Vec<T>>> Listing<T, E> {
    pub(crate) fn into_vec(self) -> Vec<T> {
        match self {
            Self::Bare(items) => items,
            Self::Wrapped(envelope) => envelope.into(),
        }
    }
}
