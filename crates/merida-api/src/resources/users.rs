//! User requests.

use crate::client::{segment, ApiClient};
use crate::dto::{Facility, FacilityList, UpdateUser, User};
use crate::error::ApiResult;
use crate::resources::Listing;

/// User requests.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// User requests.
    #[must_use]
    pub const fn users(&self) -> Users<'_> {
        Users { client: self }
    }
}

impl Users<'_> {
    /// Gets a user profile.
    pub async fn get(self, user_id: &str) -> ApiResult<User> {
        let path = format!("/users/{}", segment(user_id)?);
        self.client.get(&path).await
    }

    /// Updates a user profile.
    pub async fn update(self, user_id: &str, update: &UpdateUser) -> ApiResult<User> {
        let path = format!("/users/{}", segment(user_id)?);
        self.client.put(&path, update).await
    }

    /// Lists the facilities assigned to a user.
    pub async fn facilities(self, user_id: &str) -> ApiResult<Vec<Facility>> {
        let path = format!("/users/{}/facilities", segment(user_id)?);
        let listing: Listing<Facility, FacilityList> = self.client.get(&path).await?;
        Ok(listing.into_vec())
    }
}
