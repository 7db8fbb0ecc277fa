use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// ---------------------------------------------------------------------------
// OpenWeather current-weather payload: GET /data/2.5/weather
//
// Only the fields we consume are modelled; serde ignores the rest.
// `weather` and `wind` are absent for some stations, so both are optional.
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    pub main: MainReadings,

    #[serde(default)]
    pub weather: Option<Vec<ConditionEntry>>,

    #[serde(default)]
    pub wind: Option<WindEntry>,

    /// Unix timestamp (seconds) of the observation.
    pub dt: Option<i64>,

    /// City name resolved by the provider.
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MainReadings {
    /// Degrees Celsius when requested with `units=metric`.
    pub temp: f64,
    /// Relative humidity percentage
    pub humidity: f64,
}

#[derive(Debug, Deserialize)]
pub struct ConditionEntry {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Deserialize)]
pub struct WindEntry {
    /// m/s with `units=metric`.
    pub speed: f64,
    pub deg: Option<f64>,
}

// ---------------------------------------------------------------------------
// WeatherSnapshot: the shape the rest of the service consumes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherSnapshot {
    /// Degrees Celsius
    pub temperature_c: f64,
    /// Relative humidity percentage
    pub humidity_pct: f64,
    pub conditions: Vec<WeatherCondition>,
    pub wind: Option<Wind>,
    pub location_name: Option<String>,
    pub observed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WeatherCondition {
    pub description: String,
    pub icon: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Wind {
    pub speed_mps: f64,
    pub direction_deg: Option<f64>,
}

impl CurrentWeatherResponse {
    /// Convert the provider payload, stamping `fetched_at` when the payload
    /// carries no observation time.
    pub fn into_snapshot(self, fetched_at: DateTime<Utc>) -> WeatherSnapshot {
        let observed_at = self
            .dt
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .unwrap_or(fetched_at);

        WeatherSnapshot {
            temperature_c: self.main.temp,
            humidity_pct: self.main.humidity,
            conditions: self
                .weather
                .unwrap_or_default()
                .into_iter()
                .map(|c| WeatherCondition {
                    description: c.description,
                    icon: c.icon,
                })
                .collect(),
            wind: self.wind.map(|w| Wind {
                speed_mps: w.speed,
                direction_deg: w.deg,
            }),
            location_name: self.name,
            observed_at,
        }
    }
}
