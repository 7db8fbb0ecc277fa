//! Thermal/energy derivation for a single building reading.
//!
//! The model is a steady-state lumped envelope: heat flows out through a
//! single loss coefficient (UA, W/K) proportional to the indoor/outdoor
//! difference. Only positive differences create heating demand.
//!
//! ```text
//! dT        = indoor - outdoor
//! Q_loss    = UA * max(0, dT)                        [W]
//! P_req     = Q_loss / 1000                          [kW]
//! P_del     = min(P_req, P_available)                [kW]
//! cost      = P_del * window_hours * tariff          [EUR]
//! ```
//!
//! Cost is billed on delivered power: a boiler that cannot meet demand only
//! burns fuel up to its installed capacity.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
    db::models::{Building, BuildingReading},
    errors::{Error, Result},
};

pub const ABSOLUTE_ZERO_C: f64 = -273.15;

/// Raw inputs for one derivation. Every field is required; building lookup
/// and tariff fallback happen before this point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalInputs {
    /// Degrees Celsius
    pub indoor_c: f64,
    /// Degrees Celsius
    pub outdoor_c: f64,
    /// W/K
    pub loss_coefficient_w_per_k: f64,
    /// Installed capacity, kW
    pub available_power_kw: f64,
    /// EUR/kWh
    pub tariff_eur_per_kwh: f64,
    /// Hours over which cost is amortised.
    pub window_hours: f64,
}

/// The derived fields of a reading.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalOutput {
    pub temperature_difference: f64,
    pub heat_loss_watts: f64,
    pub required_power_kw: f64,
    pub available_power_kw: f64,
    pub has_sufficient_capacity: bool,
    pub daily_cost_eur: f64,
}

/// Stateless deriver carrying the configured limits and defaults.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deriver {
    /// Highest accepted temperature, degrees Celsius.
    pub temperature_ceiling_c: f64,
    pub window_hours: f64,
    pub default_tariff_eur_per_kwh: Option<f64>,
}

impl Default for Deriver {
    fn default() -> Self {
        Self {
            temperature_ceiling_c: 60.0,
            window_hours: 24.0,
            default_tariff_eur_per_kwh: None,
        }
    }
}

impl Deriver {
    /// Compute all derived fields from `inputs`.
    ///
    /// Pure: identical inputs always give bit-identical output.
    pub fn derive(&self, inputs: &ThermalInputs) -> Result<ThermalOutput> {
        self.validate(inputs)?;

        let temperature_difference = inputs.indoor_c - inputs.outdoor_c;
        let heat_loss_watts = if temperature_difference > 0.0 {
            inputs.loss_coefficient_w_per_k * temperature_difference
        } else {
            0.0
        };
        let required_power_kw = heat_loss_watts / 1000.0;
        let available_power_kw = inputs.available_power_kw;
        let has_sufficient_capacity = available_power_kw >= required_power_kw;

        let delivered_kw = required_power_kw.min(available_power_kw);
        let daily_cost_eur = delivered_kw * inputs.window_hours * inputs.tariff_eur_per_kwh;

        Ok(ThermalOutput {
            temperature_difference,
            heat_loss_watts,
            required_power_kw,
            available_power_kw,
            has_sufficient_capacity,
            daily_cost_eur,
        })
    }

    /// Resolve `building`'s parameters and derive a complete reading.
    pub fn derive_reading(
        &self,
        id: Uuid,
        building: &Building,
        recorded_at: DateTime<Utc>,
        indoor_c: f64,
        outdoor_c: f64,
    ) -> Result<BuildingReading> {
        let inputs = self.inputs_for(building, indoor_c, outdoor_c)?;
        let out = self.derive(&inputs)?;

        Ok(BuildingReading {
            id,
            building_id: building.id,
            building_name: building.name.clone(),
            recorded_at,
            indoor_temperature: indoor_c,
            outdoor_temperature: outdoor_c,
            temperature_difference: out.temperature_difference,
            heat_loss_watts: out.heat_loss_watts,
            required_power_kw: out.required_power_kw,
            available_power_kw: out.available_power_kw,
            has_sufficient_capacity: out.has_sufficient_capacity,
            daily_cost_eur: out.daily_cost_eur,
        })
    }

    /// Build `ThermalInputs` from a building record, failing with
    /// `ConfigurationMissing` when a parameter is absent.
    pub fn inputs_for(
        &self,
        building: &Building,
        indoor_c: f64,
        outdoor_c: f64,
    ) -> Result<ThermalInputs> {
        let loss_coefficient_w_per_k = building.loss_coefficient_w_per_k.ok_or_else(|| {
            Error::missing(format!("building {} has no loss coefficient", building.id))
        })?;
        let available_power_kw = building.installed_capacity_kw.ok_or_else(|| {
            Error::missing(format!("building {} has no installed capacity", building.id))
        })?;
        let tariff_eur_per_kwh = building
            .tariff_eur_per_kwh
            .or(self.default_tariff_eur_per_kwh)
            .ok_or_else(|| {
                Error::missing(format!(
                    "building {} has no tariff and no default tariff is configured",
                    building.id
                ))
            })?;

        Ok(ThermalInputs {
            indoor_c,
            outdoor_c,
            loss_coefficient_w_per_k,
            available_power_kw,
            tariff_eur_per_kwh,
            window_hours: self.window_hours,
        })
    }

    fn validate(&self, inputs: &ThermalInputs) -> Result<()> {
        for (name, t) in [("indoor", inputs.indoor_c), ("outdoor", inputs.outdoor_c)] {
            if !t.is_finite() {
                return Err(Error::invalid(format!("{name} temperature is not a number")));
            }
            if t < ABSOLUTE_ZERO_C {
                return Err(Error::invalid(format!(
                    "{name} temperature {t} °C is below absolute zero"
                )));
            }
            if t > self.temperature_ceiling_c {
                return Err(Error::invalid(format!(
                    "{name} temperature {t} °C exceeds ceiling of {} °C",
                    self.temperature_ceiling_c
                )));
            }
        }

        for (name, v) in [
            ("loss coefficient", inputs.loss_coefficient_w_per_k),
            ("available power", inputs.available_power_kw),
            ("tariff", inputs.tariff_eur_per_kwh),
            ("window", inputs.window_hours),
        ] {
            if !v.is_finite() || v < 0.0 {
                return Err(Error::invalid(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }

        Ok(())
    }
}
