use std::str::FromStr;

use anyhow::{Context, Result};

use crate::thermal::{Deriver, ABSOLUTE_ZERO_C};

pub const DEFAULT_OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. When unset the service runs on the
    /// in-memory store and loses its data on restart.
    pub database_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    /// Enables the OpenWeather source when present.
    pub openweather_api_key: Option<String>,
    pub openweather_base_url: String,
    /// EUR/kWh, used for buildings without their own tariff.
    pub default_tariff_eur_per_kwh: Option<f64>,
    /// Hours over which the reading cost is amortised.
    pub cost_window_hours: f64,
    /// Degrees Celsius
    pub temperature_ceiling_c: f64,
    /// Upper bound on `days` in a single seed request.
    pub seed_max_days: u32,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. `from_env` is the
    /// production entry point; tests pass a map.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_owned());

        Ok(Self {
            database_url: get("DATABASE_URL"),
            server_host: or("SERVER_HOST", "0.0.0.0"),
            server_port: parse("SERVER_PORT", &or("SERVER_PORT", "8080"))?,
            openweather_api_key: get("OPENWEATHER_API_KEY"),
            openweather_base_url: or("OPENWEATHER_BASE_URL", DEFAULT_OPENWEATHER_BASE_URL)
                .trim_end_matches('/')
                .to_owned(),
            default_tariff_eur_per_kwh: get("DEFAULT_TARIFF_EUR_PER_KWH")
                .map(|v| parse_non_negative("DEFAULT_TARIFF_EUR_PER_KWH", &v))
                .transpose()?,
            cost_window_hours: parse_non_negative(
                "COST_WINDOW_HOURS",
                &or("COST_WINDOW_HOURS", "24"),
            )?,
            temperature_ceiling_c: parse_ceiling(&or("TEMPERATURE_CEILING_C", "60"))?,
            seed_max_days: parse("SEED_MAX_DAYS", &or("SEED_MAX_DAYS", "366"))?,
        })
    }

    pub fn deriver(&self) -> Deriver {
        Deriver {
            temperature_ceiling_c: self.temperature_ceiling_c,
            window_hours: self.cost_window_hours,
            default_tariff_eur_per_kwh: self.default_tariff_eur_per_kwh,
        }
    }
}

fn parse<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value: {raw:?}"))
}

fn parse_non_negative(key: &str, raw: &str) -> Result<f64> {
    let v: f64 = parse(key, raw)?;
    anyhow::ensure!(
        v.is_finite() && v >= 0.0,
        "{key} must be a non-negative number, got {raw:?}"
    );
    Ok(v)
}

fn parse_ceiling(raw: &str) -> Result<f64> {
    let v: f64 = parse("TEMPERATURE_CEILING_C", raw)?;
    anyhow::ensure!(
        v.is_finite() && v > ABSOLUTE_ZERO_C,
        "TEMPERATURE_CEILING_C must be above absolute zero, got {raw:?}"
    );
    Ok(v)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let c = config(&[]).unwrap();
        assert_eq!(c.database_url, None);
        assert_eq!(c.server_host, "0.0.0.0");
        assert_eq!(c.server_port, 8080);
        assert_eq!(c.openweather_api_key, None);
        assert_eq!(c.openweather_base_url, DEFAULT_OPENWEATHER_BASE_URL);
        assert_eq!(c.default_tariff_eur_per_kwh, None);
        assert_eq!(c.cost_window_hours, 24.0);
        assert_eq!(c.temperature_ceiling_c, 60.0);
        assert_eq!(c.seed_max_days, 366);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let c = config(&[("DATABASE_URL", "  "), ("OPENWEATHER_API_KEY", "")]).unwrap();
        assert_eq!(c.database_url, None);
        assert_eq!(c.openweather_api_key, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let c = config(&[
            ("DATABASE_URL", "postgres://localhost/boilers"),
            ("SERVER_PORT", "9000"),
            ("OPENWEATHER_BASE_URL", "http://localhost:1234/"),
            ("DEFAULT_TARIFF_EUR_PER_KWH", "0.31"),
            ("COST_WINDOW_HOURS", "12"),
        ])
        .unwrap();
        assert_eq!(c.database_url.as_deref(), Some("postgres://localhost/boilers"));
        assert_eq!(c.server_port, 9000);
        assert_eq!(c.openweather_base_url, "http://localhost:1234");
        assert_eq!(c.default_tariff_eur_per_kwh, Some(0.31));

        let d = c.deriver();
        assert_eq!(d.window_hours, 12.0);
        assert_eq!(d.default_tariff_eur_per_kwh, Some(0.31));
    }

    #[test]
    fn malformed_port_errors() {
        let err = config(&[("SERVER_PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("SERVER_PORT"));
    }

    #[test]
    fn negative_tariff_errors() {
        let err = config(&[("DEFAULT_TARIFF_EUR_PER_KWH", "-1")]).unwrap_err();
        assert!(err.to_string().contains("non-negative"));
    }

    #[test]
    fn ceiling_at_or_below_absolute_zero_errors() {
        for raw in ["-273.15", "-300", "NaN", "inf"] {
            let err = config(&[("TEMPERATURE_CEILING_C", raw)]).unwrap_err();
            assert!(err.to_string().contains("TEMPERATURE_CEILING_C"), "{raw}: {err}");
        }
        let c = config(&[("TEMPERATURE_CEILING_C", "-10")]).unwrap();
        assert_eq!(c.temperature_ceiling_c, -10.0);
    }
}
