use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    db::models::{Building, BuildingReading, UserAccount},
    readings::RawSample,
    seeding::{SeedFailure, SeedRequest, SeedSummary},
    thermal::{ThermalInputs, ThermalOutput},
};

// ---------------------------------------------------------------------------
// Buildings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingDto {
    pub id: Uuid,
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// W/K
    pub loss_coefficient_w_per_k: Option<f64>,
    /// kW
    pub installed_capacity_kw: Option<f64>,
    /// EUR/kWh
    pub tariff_eur_per_kwh: Option<f64>,
    /// Degrees Celsius
    pub target_indoor_c: f64,
}

impl From<Building> for BuildingDto {
    fn from(b: Building) -> Self {
        Self {
            id: b.id,
            name: b.name,
            latitude: b.latitude,
            longitude: b.longitude,
            loss_coefficient_w_per_k: b.loss_coefficient_w_per_k,
            installed_capacity_kw: b.installed_capacity_kw,
            tariff_eur_per_kwh: b.tariff_eur_per_kwh,
            target_indoor_c: b.target_indoor_c,
        }
    }
}

// ---------------------------------------------------------------------------
// Readings
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BuildingReadingDto {
    pub id: Uuid,
    pub building_id: Uuid,
    pub building_name: String,
    pub timestamp: DateTime<Utc>,
    /// Degrees Celsius
    pub indoor_temperature: f64,
    /// Degrees Celsius
    pub outdoor_temperature: f64,
    /// indoor - outdoor
    pub temperature_difference: f64,
    pub heat_loss_watts: f64,
    pub required_power_kw: f64,
    pub available_power_kw: f64,
    pub has_sufficient_capacity: bool,
    pub daily_cost_eur: f64,
}

impl From<BuildingReading> for BuildingReadingDto {
    fn from(r: BuildingReading) -> Self {
        Self {
            id: r.id,
            building_id: r.building_id,
            building_name: r.building_name,
            timestamp: r.recorded_at,
            indoor_temperature: r.indoor_temperature,
            outdoor_temperature: r.outdoor_temperature,
            temperature_difference: r.temperature_difference,
            heat_loss_watts: r.heat_loss_watts,
            required_power_kw: r.required_power_kw,
            available_power_kw: r.available_power_kw,
            has_sufficient_capacity: r.has_sufficient_capacity,
            daily_cost_eur: r.daily_cost_eur,
        }
    }
}

/// Request body for `POST /buildings/{building_id}/readings`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RecordReadingRequest {
    /// Degrees Celsius
    pub indoor_temperature: f64,
    /// Degrees Celsius. Looked up from the weather source when omitted.
    pub outdoor_temperature: Option<f64>,
    /// Sample instant (RFC3339). Defaults to now.
    pub timestamp: Option<DateTime<Utc>>,
}

impl From<RecordReadingRequest> for RawSample {
    fn from(r: RecordReadingRequest) -> Self {
        Self {
            indoor_c: r.indoor_temperature,
            outdoor_c: r.outdoor_temperature,
            recorded_at: r.timestamp,
        }
    }
}

/// Request body for `POST /readings/derive`.
///
/// `tariff_eur_per_kwh` and `window_hours` fall back to the service
/// configuration when omitted.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DeriveRequest {
    pub indoor_temperature: f64,
    pub outdoor_temperature: f64,
    pub loss_coefficient_w_per_k: f64,
    pub available_power_kw: f64,
    pub tariff_eur_per_kwh: Option<f64>,
    pub window_hours: Option<f64>,
}

impl DeriveRequest {
    pub fn into_inputs(self, tariff_eur_per_kwh: f64, default_window_hours: f64) -> ThermalInputs {
        ThermalInputs {
            indoor_c: self.indoor_temperature,
            outdoor_c: self.outdoor_temperature,
            loss_coefficient_w_per_k: self.loss_coefficient_w_per_k,
            available_power_kw: self.available_power_kw,
            tariff_eur_per_kwh,
            window_hours: self.window_hours.unwrap_or(default_window_hours),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DerivedFieldsDto {
    pub temperature_difference: f64,
    pub heat_loss_watts: f64,
    pub required_power_kw: f64,
    pub available_power_kw: f64,
    pub has_sufficient_capacity: bool,
    pub daily_cost_eur: f64,
}

impl From<ThermalOutput> for DerivedFieldsDto {
    fn from(o: ThermalOutput) -> Self {
        Self {
            temperature_difference: o.temperature_difference,
            heat_loss_watts: o.heat_loss_watts,
            required_power_kw: o.required_power_kw,
            available_power_kw: o.available_power_kw,
            has_sufficient_capacity: o.has_sufficient_capacity,
            daily_cost_eur: o.daily_cost_eur,
        }
    }
}

// ---------------------------------------------------------------------------
// Seeding
// ---------------------------------------------------------------------------

fn default_interval_minutes() -> u32 {
    60
}

/// Request body for `POST /seed`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SeedHistoricalDataRequest {
    /// Buildings to seed. All buildings when omitted.
    pub building_ids: Option<Vec<Uuid>>,
    pub days: u32,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Exclusive end date (UTC). Defaults to today.
    pub end_date: Option<NaiveDate>,
}

impl From<SeedHistoricalDataRequest> for SeedRequest {
    fn from(r: SeedHistoricalDataRequest) -> Self {
        Self {
            building_ids: r.building_ids,
            days: r.days,
            interval_minutes: r.interval_minutes,
            end_date: r.end_date,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeedFailureDto {
    pub building_id: Option<Uuid>,
    pub timestamp: Option<DateTime<Utc>>,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SeedHistoricalDataResponse {
    pub readings_generated: u64,
    pub buildings_processed: u64,
    pub days_generated: u32,
    /// Units that could not be derived or persisted.
    pub failed: u64,
    /// The first failures, in completion order.
    pub failures: Vec<SeedFailureDto>,
}

impl From<SeedSummary> for SeedHistoricalDataResponse {
    fn from(s: SeedSummary) -> Self {
        Self {
            readings_generated: s.readings_generated,
            buildings_processed: s.buildings_processed,
            days_generated: s.days_generated,
            failed: s.failed,
            failures: s.failures.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<SeedFailure> for SeedFailureDto {
    fn from(f: SeedFailure) -> Self {
        Self {
            building_id: f.building_id,
            timestamp: f.recorded_at,
            error: f.error,
        }
    }
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UserResponseDto {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
    pub boiler_count: i64,
    pub is_blocked: bool,
}

impl From<UserAccount> for UserResponseDto {
    fn from(u: UserAccount) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
            boiler_count: u.boiler_count,
            is_blocked: u.is_blocked,
        }
    }
}
