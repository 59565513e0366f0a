//! Facility requests.

use crate::client::{segment, ApiClient};
use crate::dto::{
    CreateFacility, Facility, FacilityCreated, FacilityList, FacilityUpdated, Message, PlotList, PlotMetadata,
    Responsibles, UpdateFacility,
};
use crate::error::{ApiError, ApiResult};
use crate::resources::Listing;

/// Facility requests.
#[derive(Debug, Clone, Copy)]
pub struct Facilities<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Facility requests.
    #[must_use]
    pub const fn facilities(&self) -> Facilities<'_> {
        Facilities { client: self }
    }
}

impl Facilities<'_> {
    /// Lists all facilities.
    pub async fn list(self) -> ApiResult<Vec<Facility>> {
        let listing: Listing<Facility, FacilityList> = self.client.get("/facilities/").await?;
        Ok(listing.into_vec())
    }

    /// Gets one facility.
    pub async fn get(self, facility_id: &str) -> ApiResult<Facility> {
        let path = format!("/facilities/{}", segment(facility_id)?);
        let facility: Option<Facility> = self.client.get(&path).await?;
        facility.ok_or(ApiError::NotFound(path))
    }

    /// Creates a facility.
    pub async fn create(self, facility: &CreateFacility) -> ApiResult<Facility> {
        if facility.name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("facility name is required".to_string()));
        }
        let created: FacilityCreated = self.client.post("/facilities/", facility).await?;
        tracing::info!(facility_id = %created.facility.facility_id, "facility created");
        Ok(created.facility)
    }

    /// Updates a facility.
    pub async fn update(self, facility_id: &str, update: &UpdateFacility) -> ApiResult<Facility> {
        if update.is_empty() {
            return Err(ApiError::InvalidRequest("no fields to update".to_string()));
        }
        let path = format!("/facilities/{}", segment(facility_id)?);
        let updated: FacilityUpdated = self.client.put(&path, update).await?;
        Ok(updated.updated_facility)
    }

    /// Deletes a facility.
    pub async fn delete(self, facility_id: &str) -> ApiResult<Message> {
        let path = format!("/facilities/{}", segment(facility_id)?);
        self.client.delete(&path).await
    }

    /// Lists the plots of a facility.
    pub async fn plots(self, facility_id: &str) -> ApiResult<Vec<PlotMetadata>> {
        let path = format!("/plots/facility/{}", segment(facility_id)?);
        let listing: Listing<PlotMetadata, PlotList> = self.client.get(&path).await?;
        Ok(listing.into_vec())
    }

    /// Gets the users responsible for a facility.
    pub async fn responsibles(self, facility_id: &str) -> ApiResult<Responsibles> {
        let path = format!("/facilities/{}/responsibles", segment(facility_id)?);
        self.client.get(&path).await
    }

    /// Replaces the users responsible for a facility.
    pub async fn set_responsibles(self, facility_id: &str, responsibles: &[String]) -> ApiResult<Responsibles> {
        let path = format!("/facilities/{}/responsibles", segment(facility_id)?);
        let body = Responsibles {
            responsibles: responsibles.to_vec(),
        };
        self.client.put(&path, &body).await
    }
}
