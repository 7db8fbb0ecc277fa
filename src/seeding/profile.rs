//! Deterministic synthetic temperatures for historical seeding.
//!
//! Outdoor temperature follows a seasonal cosine (coldest mid-January,
//! warmest mid-July) plus a diurnal cosine peaking at 15:00 UTC. Indoor
//! temperature holds the building's target with a night setback.

use std::f64::consts::TAU;

use chrono::{DateTime, Datelike, Timelike, Utc};

/// Annual mean outdoor temperature, °C.
const ANNUAL_MEAN_C: f64 = 9.0;
/// Half the summer/winter swing, °C.
const SEASONAL_AMPLITUDE_C: f64 = 9.0;
/// Day of year with the warmest mean.
const WARMEST_DAY: f64 = 196.0;
/// Half the day/night swing, °C.
const DIURNAL_AMPLITUDE_C: f64 = 4.0;
const WARMEST_HOUR: f64 = 15.0;

pub const NIGHT_SETBACK_C: f64 = 2.0;

pub fn outdoor_temperature_at(at: DateTime<Utc>) -> f64 {
    let day = at.ordinal0() as f64;
    let hour = at.hour() as f64 + at.minute() as f64 / 60.0;

    let seasonal = SEASONAL_AMPLITUDE_C * (TAU * (day - WARMEST_DAY) / 365.25).cos();
    let diurnal = DIURNAL_AMPLITUDE_C * (TAU * (hour - WARMEST_HOUR) / 24.0).cos();

    ANNUAL_MEAN_C + seasonal + diurnal
}

/// Indoor temperature for a building held at `target_c`, set back between
/// 22:00 and 06:00.
pub fn indoor_temperature_at(at: DateTime<Utc>, target_c: f64) -> f64 {
    let hour = at.hour();
    if !(6..22).contains(&hour) {
        target_c - NIGHT_SETBACK_C
    } else {
        target_c
    }
}
