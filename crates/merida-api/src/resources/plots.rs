//! Plot requests.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::client::{segment, ApiClient};
use crate::dto::{CreatePlot, Message, PlotList, PlotMetadata, PlotState, UpdatePlot};
use crate::error::{ApiError, ApiResult};
use crate::resources::Listing;

/// Plot requests.
#[derive(Debug, Clone, Copy)]
pub struct Plots<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Plot requests.
    #[must_use]
    pub const fn plots(&self) -> Plots<'_> {
        Plots { client: self }
    }
}

/// Formats a history bound the way the backend parses it.
#[must_use]
pub fn format_bound(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

impl Plots<'_> {
    /// Lists the plots visible to a user.
    pub async fn list_for_user(self, user_id: &str) -> ApiResult<Vec<PlotMetadata>> {
        let path = format!("/users/{}/plots", segment(user_id)?);
        let listing: Listing<PlotMetadata, PlotList> = self.client.get(&path).await?;
        Ok(listing.into_vec())
    }

    /// Gets one plot.
    pub async fn get(self, plot_id: &str) -> ApiResult<PlotMetadata> {
        let path = format!("/plot/{}", segment(plot_id)?);
        self.client.get(&path).await
    }

    /// Creates a plot.
    pub async fn create(self, plot: &CreatePlot) -> ApiResult<PlotMetadata> {
        if plot.facility_id.trim().is_empty() {
            return Err(ApiError::InvalidRequest("facility_id is required".to_string()));
        }
        let created: PlotMetadata = self.client.post("/plot", plot).await?;
        tracing::info!(plot_id = %created.plot_id, facility_id = %created.facility_id, "plot created");
        Ok(created)
    }

    /// Updates a plot.
    pub async fn update(self, plot_id: &str, update: &UpdatePlot) -> ApiResult<PlotMetadata> {
        let path = format!("/plot/{}", segment(plot_id)?);
        self.client.put(&path, update).await
    }

    /// Deletes a plot.
    pub async fn delete(self, plot_id: &str) -> ApiResult<Message> {
        let path = format!("/plot/{}", segment(plot_id)?);
        self.client.delete(&path).await
    }

    /// Gets the latest reading of a plot.
    pub async fn state(self, plot_id: &str) -> ApiResult<PlotState> {
        let path = format!("/plot/{}/state", segment(plot_id)?);
        self.client.get(&path).await
    }

    /// Gets the readings of a plot, optionally bounded in time.
    pub async fn history(
        self,
        plot_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<PlotState>> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ApiError::InvalidRequest("start_date is after end_date".to_string()));
            }
        }
        let path = format!("/plot/{}/history", segment(plot_id)?);
        let mut query = Vec::new();
        if let Some(start) = start {
            query.push(("start_date", format_bound(&start)));
        }
        if let Some(end) = end {
            query.push(("end_date", format_bound(&end)));
        }
        self.client.get_with_query(&path, Some(&query)).await
    }

    /// Gets the raw sensor values of a plot.
    pub async fn sensor_values(self, plot_id: &str) -> ApiResult<Vec<PlotState>> {
        let path = format!("/sensors/plot/{}/sensor-values", segment(plot_id)?);
        self.client.get(&path).await
    }
}
