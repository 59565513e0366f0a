//! Cached queries and invalidating mutations.
//!
//! [`Queries`] pairs an [`ApiClient`] with a [`QueryCache`]. Reads go through
//! the cache; mutations call the backend and then drop the keys whose data
//! they changed.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use merida_core::QueryConfig;
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

use crate::cache::{QueryCache, QueryKey};
use crate::client::ApiClient;
use crate::dto::{
    CreateFacility, CreateIrrigation, CreatePlot, Facility, IrrigationEvent, Message, PlotMetadata, PlotState,
    Species, UpdateFacility, UpdatePlot, UpdateUser, User,
};
use crate::error::ApiResult;
use crate::resources::plots::format_bound;

/// Query keys.
pub mod keys {
    use super::QueryKey;

    /// `["user", id]`
    pub fn user(user_id: &str) -> QueryKey {
        QueryKey::new(["user", user_id])
    }

    /// `["plots"]`, prefix of every plot list.
    pub fn all_plots() -> QueryKey {
        QueryKey::new(["plots"])
    }

    /// `["plots", user id]`
    pub fn plots(user_id: &str) -> QueryKey {
        QueryKey::new(["plots", user_id])
    }

    /// `["plot", id]`
    pub fn plot(plot_id: &str) -> QueryKey {
        QueryKey::new(["plot", plot_id])
    }

    /// `["plotState", id]`
    pub fn plot_state(plot_id: &str) -> QueryKey {
        QueryKey::new(["plotState", plot_id])
    }

    /// `["plotHistory", id, start, end]`, empty strings for open bounds.
    pub fn plot_history(plot_id: &str, start: &str, end: &str) -> QueryKey {
        QueryKey::new(["plotHistory", plot_id, start, end])
    }

    /// `["facilities"]`
    pub fn facilities() -> QueryKey {
        QueryKey::new(["facilities"])
    }

    /// `["facility", id]`
    pub fn facility(facility_id: &str) -> QueryKey {
        QueryKey::new(["facility", facility_id])
    }

    /// `["facilityPlots"]`, or `["facilityPlots", id]` with an id.
    pub fn facility_plots(facility_id: Option<&str>) -> QueryKey {
        match facility_id {
            Some(id) => QueryKey::new(["facilityPlots", id]),
            None => QueryKey::new(["facilityPlots"]),
        }
    }

    /// `["species"]`
    pub fn species() -> QueryKey {
        QueryKey::new(["species"])
    }

    /// `["irrigations", plot id]`
    pub fn irrigations(plot_id: &str) -> QueryKey {
        QueryKey::new(["irrigations", plot_id])
    }
}

const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Cached access to the backend.
#[derive(Debug)]
pub struct Queries {
    client: ApiClient,
    cache: QueryCache,
    poll_interval: Duration,
    owner: Mutex<Option<String>>,
}

impl Queries {
    /// Creates the query layer.
    #[must_use]
    pub fn new(client: ApiClient, config: &QueryConfig) -> Self {
        Self {
            client,
            cache: QueryCache::new(config),
            poll_interval: config.poll_interval.max(MIN_POLL_INTERVAL),
            owner: Mutex::new(None),
        }
    }

    /// Replaces the cache (for custom retry delays).
    #[must_use]
    pub fn with_cache(mut self, cache: QueryCache) -> Self {
        self.cache = cache;
        self
    }

    /// Gets the client.
    #[must_use]
    pub const fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Gets the cache.
    #[must_use]
    pub const fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// Returns the cache, emptied first if the session changed hands.
    fn scoped(&self) -> &QueryCache {
        let current = self.client.session_owner();
        let mut owner = self.owner.lock();
        if *owner != current {
            if owner.is_some() {
                tracing::debug!(previous = ?*owner, current = ?current, "session changed, clearing query cache");
                self.cache.clear();
            }
            *owner = current;
        }
        drop(owner);
        &self.cache
    }

    fn invalidate(&self, keys: &[QueryKey]) {
        for key in keys {
            self.cache.invalidate(key);
        }
    }

    // ============================================
    // Queries
    // ============================================

    /// Gets a user profile.
    pub async fn user(&self, user_id: &str) -> ApiResult<User> {
        self.scoped()
            .fetch(keys::user(user_id), || self.client.users().get(user_id))
            .await
    }

    /// Lists the plots of a user.
    pub async fn plots(&self, user_id: &str) -> ApiResult<Vec<PlotMetadata>> {
        self.scoped()
            .fetch(keys::plots(user_id), || self.client.plots().list_for_user(user_id))
            .await
    }

    /// Gets one plot.
    pub async fn plot(&self, plot_id: &str) -> ApiResult<PlotMetadata> {
        self.scoped()
            .fetch(keys::plot(plot_id), || self.client.plots().get(plot_id))
            .await
    }

    /// Gets the latest reading of a plot.
    pub async fn plot_state(&self, plot_id: &str) -> ApiResult<PlotState> {
        self.scoped()
            .fetch(keys::plot_state(plot_id), || self.client.plots().state(plot_id))
            .await
    }

    /// Gets the reading history of a plot.
    pub async fn plot_history(
        &self,
        plot_id: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ApiResult<Vec<PlotState>> {
        let bound = |instant: Option<DateTime<Utc>>| instant.as_ref().map(format_bound).unwrap_or_default();
        let key = keys::plot_history(plot_id, &bound(start), &bound(end));
        self.scoped()
            .fetch(key, || self.client.plots().history(plot_id, start, end))
            .await
    }

    /// Lists all facilities.
    pub async fn facilities(&self) -> ApiResult<Vec<Facility>> {
        self.scoped()
            .fetch(keys::facilities(), || self.client.facilities().list())
            .await
    }

    /// Gets one facility.
    pub async fn facility(&self, facility_id: &str) -> ApiResult<Facility> {
        self.scoped()
            .fetch(keys::facility(facility_id), || self.client.facilities().get(facility_id))
            .await
    }

    /// Lists the plots of a facility.
    pub async fn facility_plots(&self, facility_id: &str) -> ApiResult<Vec<PlotMetadata>> {
        self.scoped()
            .fetch(keys::facility_plots(Some(facility_id)), || {
                self.client.facilities().plots(facility_id)
            })
            .await
    }

    /// Lists all species.
    pub async fn species(&self) -> ApiResult<Vec<Species>> {
        self.scoped()
            .fetch(keys::species(), || self.client.species().list())
            .await
    }

    /// Lists the irrigations of a plot.
    pub async fn irrigations(&self, plot_id: &str) -> ApiResult<Vec<IrrigationEvent>> {
        self.scoped()
            .fetch(keys::irrigations(plot_id), || self.client.irrigation().list(plot_id))
            .await
    }

    // ============================================
    // Mutations
    // ============================================

    /// Creates a plot.
    pub async fn create_plot(&self, plot: &CreatePlot) -> ApiResult<PlotMetadata> {
        let created = self.client.plots().create(plot).await?;
        self.invalidate(&[keys::all_plots(), keys::facility_plots(Some(&plot.facility_id))]);
        Ok(created)
    }

    /// Updates a plot.
    pub async fn update_plot(&self, plot_id: &str, update: &UpdatePlot) -> ApiResult<PlotMetadata> {
        let updated = self.client.plots().update(plot_id, update).await?;
        self.invalidate(&[keys::plot(plot_id), keys::all_plots()]);
        Ok(updated)
    }

    /// Deletes a plot.
    pub async fn delete_plot(&self, plot_id: &str) -> ApiResult<Message> {
        let message = self.client.plots().delete(plot_id).await?;
        self.invalidate(&[keys::all_plots(), keys::plot(plot_id), keys::facility_plots(None)]);
        Ok(message)
    }

    /// Creates a facility.
    pub async fn create_facility(&self, facility: &CreateFacility) -> ApiResult<Facility> {
        let created = self.client.facilities().create(facility).await?;
        self.invalidate(&[keys::facilities()]);
        Ok(created)
    }

    /// Updates a facility.
    pub async fn update_facility(&self, facility_id: &str, update: &UpdateFacility) -> ApiResult<Facility> {
        let updated = self.client.facilities().update(facility_id, update).await?;
        self.invalidate(&[keys::facility(facility_id), keys::facilities()]);
        Ok(updated)
    }

    /// Deletes a facility.
    pub async fn delete_facility(&self, facility_id: &str) -> ApiResult<Message> {
        let message = self.client.facilities().delete(facility_id).await?;
        self.invalidate(&[
            keys::facility(facility_id),
            keys::facilities(),
            keys::facility_plots(Some(facility_id)),
        ]);
        Ok(message)
    }

    /// Creates a species.
    pub async fn create_species(&self, name: &str) -> ApiResult<Species> {
        let created = self.client.species().create(name).await?;
        self.invalidate(&[keys::species()]);
        Ok(created)
    }

    /// Deletes a species.
    pub async fn delete_species(&self, species_id: &str) -> ApiResult<Message> {
        let message = self.client.species().delete(species_id).await?;
        self.invalidate(&[keys::species()]);
        Ok(message)
    }

    /// Assigns a species to a plot.
    pub async fn assign_species(&self, species_id: &str, plot_id: &str, facility_id: &str) -> ApiResult<Message> {
        let message = self
            .client
            .species()
            .assign_to_plot(species_id, plot_id, facility_id)
            .await?;
        self.invalidate(&[keys::plot(plot_id), keys::all_plots()]);
        Ok(message)
    }

    /// Records an irrigation.
    pub async fn record_irrigation(&self, plot_id: &str, irrigation: &CreateIrrigation) -> ApiResult<IrrigationEvent> {
        let event = self.client.irrigation().create(plot_id, irrigation).await?;
        self.invalidate(&[keys::irrigations(plot_id)]);
        Ok(event)
    }

    /// Updates a user profile.
    pub async fn update_user(&self, user_id: &str, update: &UpdateUser) -> ApiResult<User> {
        let user = self.client.users().update(user_id, update).await?;
        self.invalidate(&[keys::user(user_id)]);
        Ok(user)
    }

    // ============================================
    // Polling
    // ============================================

    /// Polls the live state of a plot.
    ///
    /// The first reading is fetched immediately, then one per poll interval.
    /// Polling stops once every receiver is dropped. Failed polls are logged
    /// and keep the last reading.
    pub fn watch_plot_state(self: &Arc<Self>, plot_id: &str) -> watch::Receiver<Option<PlotState>> {
        let (tx, rx) = watch::channel(None);
        let queries = Arc::clone(self);
        let plot_id = plot_id.to_string();

        tokio::spawn(async move {
            let key = keys::plot_state(&plot_id);
            let mut ticker = tokio::time::interval(queries.poll_interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    () = tx.closed() => break,
                    _ = ticker.tick() => {}
                }
                queries.cache.invalidate(&key);
                match queries.plot_state(&plot_id).await {
                    Ok(state) => {
                        if tx.send(Some(state)).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::warn!(plot_id = %plot_id, error = %e, "plot state poll failed"),
                }
            }
            tracing::debug!(plot_id = %plot_id, "plot state watch stopped");
        });

        rx
    }
}
