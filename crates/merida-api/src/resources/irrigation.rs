//! Irrigation and recommended irrigation requests.

use crate::client::{segment, ApiClient};
use crate::dto::{CreateIrrigation, IrrigationEvent, RecommendIrrigation, RecommendedIrrigation};
use crate::error::{ApiError, ApiResult};

/// Irrigation requests.
#[derive(Debug, Clone, Copy)]
pub struct Irrigation<'a> {
    client: &'a ApiClient,
}

impl ApiClient {
    /// Irrigation requests.
    #[must_use]
    pub const fn irrigation(&self) -> Irrigation<'_> {
        Irrigation { client: self }
    }
}

impl Irrigation<'_> {
    /// Lists the irrigations of a plot.
    pub async fn list(self, plot_id: &str) -> ApiResult<Vec<IrrigationEvent>> {
        let path = format!("/irrigations/plot/{}/irrigations", segment(plot_id)?);
        self.client.get(&path).await
    }

    /// Gets the most recent irrigation of a plot, if any.
    pub async fn last(self, plot_id: &str) -> ApiResult<Option<IrrigationEvent>> {
        let path = format!("/irrigations/plot/{}/last-irrigation", segment(plot_id)?);
        match self.client.get(&path).await {
            Ok(event) => Ok(event),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Records an irrigation.
    pub async fn create(self, plot_id: &str, irrigation: &CreateIrrigation) -> ApiResult<IrrigationEvent> {
        let path = format!("/irrigations/plot/{}/irrigation", segment(plot_id)?);
        let event: IrrigationEvent = self.client.post(&path, irrigation).await?;
        tracing::info!(plot_id, timestamp = %event.timestamp, "irrigation recorded");
        Ok(event)
    }

    /// Gets the irrigation recommended for a plot, if any.
    pub async fn recommended(self, plot_id: &str) -> ApiResult<Option<RecommendedIrrigation>> {
        let path = format!("/plot/{}/recommended-irrigation", segment(plot_id)?);
        match self.client.get(&path).await {
            Ok(recommendation) => Ok(recommendation),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Creates a recommendation for a plot.
    pub async fn create_recommended(
        self,
        plot_id: &str,
        recommendation: &RecommendIrrigation,
    ) -> ApiResult<RecommendedIrrigation> {
        let path = format!("/plot/{}/recommended-irrigation", segment(plot_id)?);
        self.client.post(&path, recommendation).await
    }

    /// Updates the recommendation identified by `timestamp`.
    pub async fn update_recommended(
        self,
        plot_id: &str,
        timestamp: &str,
        recommendation: &RecommendIrrigation,
    ) -> ApiResult<RecommendedIrrigation> {
        let path = format!(
            "/plot/{}/recommended-irrigation/{}",
            segment(plot_id)?,
            segment(timestamp)?
        );
        self.client.put(&path, recommendation).await
    }
}
