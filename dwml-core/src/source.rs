use std::{fmt::Debug, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{config::NwsConfig, error::FetchError};

/// A point on the map.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Anything that can hand back raw DWML text for a location.
#[async_trait]
pub trait ForecastSource: Send + Sync + Debug {
    async fn fetch_dwml(&self, coords: Coordinates) -> Result<String, FetchError>;

    /// Label recorded in the forecast report.
    fn name(&self) -> &str;
}

/// The National Weather Service `MapClick.php` digital DWML endpoint.
#[derive(Debug, Clone)]
pub struct NwsDwmlSource {
    base_url: String,
    http: Client,
}

impl NwsDwmlSource {
    pub fn new(config: &NwsConfig) -> Result<Self, FetchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn with_defaults() -> Result<Self, FetchError> {
        Self::new(&NwsConfig::default())
    }

    pub fn forecast_url(&self) -> String {
        format!("{}/MapClick.php", self.base_url)
    }
}

#[async_trait]
impl ForecastSource for NwsDwmlSource {
    #[instrument(skip(self), fields(lat = coords.latitude, lon = coords.longitude))]
    async fn fetch_dwml(&self, coords: Coordinates) -> Result<String, FetchError> {
        let url = self.forecast_url();
        info!("Fetching weather data from: {url}");

        let res = self
            .http
            .get(&url)
            .query(&[
                ("lat", coords.latitude.to_string()),
                ("lon", coords.longitude.to_string()),
                ("FcstType", "digitalDWML".to_string()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = res.text().await?;
        debug!(bytes = body.len(), "received DWML document");

        Ok(body)
    }

    fn name(&self) -> &str {
        "National Weather Service DWML"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_url_ignores_trailing_slash() {
        let config = NwsConfig {
            base_url: "http://localhost:9000/".into(),
            ..NwsConfig::default()
        };
        let source = NwsDwmlSource::new(&config).expect("client must build");

        assert_eq!(source.forecast_url(), "http://localhost:9000/MapClick.php");
    }

    #[test]
    fn default_source_targets_forecast_weather_gov() {
        let source = NwsDwmlSource::with_defaults().expect("client must build");
        assert_eq!(source.forecast_url(), "https://forecast.weather.gov/MapClick.php");
        assert_eq!(source.name(), "National Weather Service DWML");
    }
}
