use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::{
    db::models::{Building, BuildingReading},
    errors::{Error, Result},
    store::Store,
    thermal::Deriver,
    weather::{models::WeatherSnapshot, WeatherSource},
};

/// A raw sample as it arrives from a building.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawSample {
    /// Degrees Celsius
    pub indoor_c: f64,
    /// Degrees Celsius. Fetched from the weather source when absent.
    pub outdoor_c: Option<f64>,
    pub recorded_at: Option<DateTime<Utc>>,
}

pub struct ReadingService {
    store: Arc<dyn Store>,
    weather: Option<Arc<dyn WeatherSource>>,
    deriver: Deriver,
}

impl ReadingService {
    pub fn new(
        store: Arc<dyn Store>,
        weather: Option<Arc<dyn WeatherSource>>,
        deriver: Deriver,
    ) -> Self {
        Self {
            store,
            weather,
            deriver,
        }
    }

    /// Derives a reading for `building_id` from `sample`, persists it, and
    /// returns it.
    ///
    /// The outdoor temperature comes from the sample when present, otherwise
    /// from the weather source at the building's coordinates.
    pub async fn record(&self, building_id: Uuid, sample: RawSample) -> Result<BuildingReading> {
        let building = self.building(building_id).await?;

        let outdoor_c = match sample.outdoor_c {
            Some(t) => t,
            None => self.weather_for(&building).await?.temperature_c,
        };
        let recorded_at = sample.recorded_at.unwrap_or_else(Utc::now);

        let reading = self.deriver.derive_reading(
            Uuid::new_v4(),
            &building,
            recorded_at,
            sample.indoor_c,
            outdoor_c,
        )?;
        self.store.save_reading(&reading).await?;

        info!(
            building_id = %building_id,
            reading_id = %reading.id,
            required_power_kw = reading.required_power_kw,
            sufficient = reading.has_sufficient_capacity,
            "Reading derived and persisted"
        );
        Ok(reading)
    }

    /// Current weather at `building_id`'s location.
    pub async fn current_weather(&self, building_id: Uuid) -> Result<WeatherSnapshot> {
        let building = self.building(building_id).await?;
        self.weather_for(&building).await
    }

    async fn building(&self, building_id: Uuid) -> Result<Building> {
        self.store
            .building(building_id)
            .await?
            .ok_or_else(|| Error::not_found("Building", building_id))
    }

    async fn weather_for(&self, building: &Building) -> Result<WeatherSnapshot> {
        let source = self
            .weather
            .as_ref()
            .ok_or_else(|| Error::missing("no weather source is configured"))?;
        let (lat, lon) = building.location().ok_or_else(|| {
            Error::missing(format!("building {} has no coordinates", building.id))
        })?;
        source.current(lat, lon).await
    }
}
