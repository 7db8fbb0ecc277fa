pub mod models;

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::{
    config::Config,
    errors::{Error, Result},
};

use self::models::{CurrentWeatherResponse, WeatherSnapshot};

/// Supplier of current outdoor conditions for a coordinate.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot>;
}

/// OpenWeather current-weather client.
///
/// The API key travels in the query string, so request URLs are stripped
/// from errors before they are reported.
///
/// Every failure (transport, HTTP status, body decoding) surfaces as
/// `Error::UpstreamUnavailable`; the caller decides what to do with it.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                http: Client::new(),
                base_url: base_url.into(),
                api_key: api_key.into(),
            }),
        }
    }

    /// Returns a client when `OPENWEATHER_API_KEY` is configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        config
            .openweather_api_key
            .as_ref()
            .map(|key| Self::new(config.openweather_base_url.clone(), key.clone()))
    }

    async fn fetch(&self, latitude: f64, longitude: f64) -> anyhow::Result<WeatherSnapshot> {
        debug!(latitude, longitude, "Fetching current weather");
        let url = format!(
            "{}/weather?lat={latitude}&lon={longitude}&units=metric&appid={}",
            self.inner.base_url, self.inner.api_key
        );

        let bytes = self
            .inner
            .http
            .get(&url)
            .send()
            .await
            .map_err(reqwest::Error::without_url)
            .context("OpenWeather request failed")?
            .error_for_status()
            .map_err(reqwest::Error::without_url)
            .context("OpenWeather returned error status")?
            .bytes()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to read OpenWeather response body")?;

        let resp = serde_json::from_slice::<CurrentWeatherResponse>(&bytes)
            .context("Failed to deserialize OpenWeather response")?;

        Ok(resp.into_snapshot(chrono::Utc::now()))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherSnapshot> {
        self.fetch(latitude, longitude)
            .await
            .map_err(|e| Error::UpstreamUnavailable(format!("{e:#}")))
    }
}
