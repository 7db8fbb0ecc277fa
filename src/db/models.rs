use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A monitored building and the thermal parameters the deriver needs.
///
/// The thermal columns are nullable: a building can be registered before it
/// has been surveyed. Deriving a reading for such a building fails with
/// `ConfigurationMissing`.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Building {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Whole-envelope heat-loss coefficient (UA), W/K.
    pub loss_coefficient_w_per_k: Option<f64>,
    /// Installed boiler capacity, kW.
    pub installed_capacity_kw: Option<f64>,
    /// Energy tariff, EUR/kWh. Falls back to the configured default.
    pub tariff_eur_per_kwh: Option<f64>,
    /// Degrees Celsius
    pub target_indoor_c: f64,
}

impl Building {
    /// `(latitude, longitude)` when both are known.
    pub fn location(&self) -> Option<(f64, f64)> {
        self.latitude.zip(self.longitude)
    }
}

/// One timestamped sample with every derived field populated.
///
/// Rows are only ever produced by `Deriver::derive_reading`; nothing updates
/// a stored reading in place.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct BuildingReading {
    pub id: Uuid,
    pub building_id: Uuid,
    pub building_name: String,
    pub recorded_at: DateTime<Utc>,
    /// Degrees Celsius
    pub indoor_temperature: f64,
    /// Degrees Celsius
    pub outdoor_temperature: f64,
    /// indoor - outdoor, signed
    pub temperature_difference: f64,
    pub heat_loss_watts: f64,
    pub required_power_kw: f64,
    pub available_power_kw: f64,
    pub has_sufficient_capacity: bool,
    pub daily_cost_eur: f64,
}

/// Read view of a user account joined with the number of boilers it owns.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub boiler_count: i64,
    pub is_blocked: bool,
}
