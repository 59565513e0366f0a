//! Species requests.

use crate::client::{segment, ApiClient};
use crate::dto::{CreateSpecies, Message, Species, SpeciesCreated, SpeciesList};
use crate::error::{ApiError, ApiResult};
use crate::resources::Listing;

/// Species requests.
#[derive(Debug, Clone, Copy)]
pub struct SpeciesApi<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Species requests.
    #[must_use]
    pub const fn species(&self) -> SpeciesApi<'_> {
        SpeciesApi { client: self }
    }
}

impl SpeciesApi<'_> {
    /// Lists all species.
    ///
    /// The backend answers 404 when the catalog is empty; that is reported as
    /// an empty list.
    pub async fn list(self) -> ApiResult<Vec<Species>> {
        match self.client.get::<Listing<Species, SpeciesList>>("/species/").await {
            Ok(listing) => Ok(listing.into_vec()),
            Err(ApiError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Creates a species.
    pub async fn create(self, name: &str) -> ApiResult<Species> {
        if name.trim().is_empty() {
            return Err(ApiError::InvalidRequest("species name is required".to_string()));
        }
        let body = CreateSpecies {
            name: name.trim().to_string(),
        };
        let created: SpeciesCreated = self.client.post("/species/", &body).await?;
        tracing::info!(species_id = created.created_species.species_id(), "species created");
        Ok(created.created_species)
    }

    /// Deletes a species.
    pub async fn delete(self, species_id: &str) -> ApiResult<Message> {
        let path = format!("/species/{}", segment(species_id)?);
        self.client.delete(&path).await
    }

    /// Assigns a species to a plot of a facility.
    pub async fn assign_to_plot(self, species_id: &str, plot_id: &str, facility_id: &str) -> ApiResult<Message> {
        if facility_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("facility_id is required".to_string()));
        }
        let path = format!(
            "/species/{}/assign-to-plot/{}",
            segment(species_id)?,
            segment(plot_id)?
        );
        let query = [("facility_id", facility_id)];
        self.client
            .put_with_query(&path, &serde_json::Value::Null, Some(&query))
            .await
    }
}
