//! Request and response bodies of the REST backend.
//!
//! Timestamps are kept as the backend's strings; fields the backend may omit
//! are optional.

use serde::{Deserialize, Serialize};

/// Key prefix of species records.
pub const SPECIES_KEY_PREFIX: &str = "SPECIES#";

// ============================================
// Facilities
// ============================================

/// A facility (greenhouse, field, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Facility {
    /// Facility identifier.
    pub facility_id: String,
    /// Display name.
    pub name: String,
    /// Free-form location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Body of a facility creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateFacility {
    /// Display name.
    pub name: String,
    /// Free-form location.
    pub location: String,
}

/// Body of a facility update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateFacility {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}

impl UpdateFacility {
    /// Checks if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.location.is_none()
    }
}

/// Facility list envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacilityList {
    /// Number of facilities.
    #[serde(default)]
    pub count: usize,
    /// The facilities.
    #[serde(default)]
    pub facilities: Vec<Facility>,
}

impl From<FacilityList> for Vec<Facility> {
    fn from(list: FacilityList) -> Self {
        list.facilities
    }
}

/// Facility creation envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityCreated {
    /// Backend message.
    pub message: String,
    /// The stored facility.
    pub facility: Facility,
}

/// Facility update envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityUpdated {
    /// Backend message.
    pub message: String,
    /// The facility after the update.
    pub updated_facility: Facility,
}

/// Users responsible for a facility.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Responsibles {
    /// User identifiers.
    #[serde(default)]
    pub responsibles: Vec<String>,
}

// ============================================
// Plots
// ============================================

/// Plot metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotMetadata {
    /// Plot identifier.
    pub plot_id: String,
    /// Owning facility.
    pub facility_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Species grown on the plot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// Area in square meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
    /// MAC address of the plot's sensor node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// Body of a plot creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreatePlot {
    /// Owning facility.
    pub facility_id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Free-form location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// MAC address of the sensor node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    /// Species grown on the plot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// Area in square meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

/// Body of a plot update; absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdatePlot {
    /// New name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// New species.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub species: Option<String>,
    /// New area.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub area: Option<f64>,
}

/// Plot list envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlotList {
    /// The plots.
    #[serde(default)]
    pub plots: Vec<PlotMetadata>,
}

impl From<PlotList> for Vec<PlotMetadata> {
    fn from(list: PlotList) -> Self {
        list.plots
    }
}

/// A sensor reading of a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotState {
    /// Plot identifier.
    pub plot_id: String,
    /// Reading timestamp.
    pub timestamp: String,
    /// Air temperature (°C).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Relative humidity (%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub humidity: Option<f64>,
    /// Soil moisture (%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_moisture: Option<f64>,
    /// Light level (lux).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<f64>,
}

// ============================================
// Species
// ============================================

/// A species record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    /// Partition key (`SPECIES#<id>`).
    pub pk: String,
    /// Sort key.
    pub sk: String,
    /// Species name.
    pub name: String,
    /// Record type.
    #[serde(rename = "type")]
    pub kind: String,
}

impl Species {
    /// Returns the species identifier carried in the partition key.
    #[must_use]
    pub fn species_id(&self) -> &str {
        self.pk.strip_prefix(SPECIES_KEY_PREFIX).unwrap_or(&self.pk)
    }
}

/// Body of a species creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSpecies {
    /// Species name.
    pub name: String,
}

/// Species list envelope.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeciesList {
    /// Number of species.
    #[serde(default)]
    pub count: usize,
    /// The species.
    #[serde(default)]
    pub species: Vec<Species>,
}

impl From<SpeciesList> for Vec<Species> {
    fn from(list: SpeciesList) -> Self {
        list.species
    }
}

/// Species creation envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeciesCreated {
    /// Backend message.
    pub message: String,
    /// The stored species.
    pub created_species: Species,
}

// ============================================
// Irrigation
// ============================================

/// A recorded irrigation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IrrigationEvent {
    /// Plot identifier.
    pub plot_id: String,
    /// When the irrigation happened.
    pub timestamp: String,
    /// Event type (`start`, `stop`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Water volume in liters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_amount: Option<f64>,
    /// Manual or automatic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation_type: Option<String>,
}

/// Body of an irrigation record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CreateIrrigation {
    /// When the irrigation happened; the backend stamps it when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// Event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<String>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Water volume in liters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_amount: Option<f64>,
    /// Manual or automatic.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub irrigation_type: Option<String>,
}

/// An irrigation recommended for a plot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendedIrrigation {
    /// Plot identifier.
    pub plot_id: String,
    /// Recommendation timestamp; identifies the record.
    pub timestamp: String,
    /// Recommended water volume in liters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_amount: Option<f64>,
    /// Recommended duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Why the irrigation is recommended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Body of a recommended irrigation creation or update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendIrrigation {
    /// Recommended water volume in liters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water_amount: Option<f64>,
    /// Recommended duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
    /// Why the irrigation is recommended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ============================================
// Users
// ============================================

/// A platform user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// User identifier.
    pub user_id: String,
    /// Email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Creation timestamp.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Facilities assigned to the user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facilities: Option<Vec<String>>,
}

/// Body of a user profile update.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateUser {
    /// New email address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// New display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ============================================
// Generic
// ============================================

/// Acknowledgement returned by mutations without a payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Backend message.
    #[serde(default)]
    pub message: String,
}
