use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::{
    aligner::{Diagnostic, align},
    config::DEFAULT_HOURS,
    document::DwmlDocument,
    error::ForecastError,
    model::HourlyForecastRecord,
    source::{Coordinates, ForecastSource},
};

/// One week of hourly data.
pub const MAX_HOURS: u16 = 168;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForecastRequest {
    pub coords: Coordinates,
    pub hours: u16,
}

impl ForecastRequest {
    pub fn new(coords: Coordinates) -> Self {
        Self {
            coords,
            hours: DEFAULT_HOURS,
        }
    }

    pub fn with_hours(mut self, hours: u16) -> Self {
        self.hours = hours;
        self
    }

    pub fn validate(&self) -> Result<(), ForecastError> {
        let Coordinates {
            latitude,
            longitude,
        } = self.coords;

        if !(-90.0..=90.0).contains(&latitude) {
            return Err(ForecastError::InvalidRequest(
                "Latitude must be between -90 and 90".into(),
            ));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(ForecastError::InvalidRequest(
                "Longitude must be between -180 and 180".into(),
            ));
        }
        if !(1..=MAX_HOURS).contains(&self.hours) {
            return Err(ForecastError::InvalidRequest(format!(
                "Hours must be between 1 and {MAX_HOURS}"
            )));
        }

        Ok(())
    }
}

/// The structured forecast handed to downstream consumers.
#[derive(Debug, Clone, Serialize)]
pub struct ForecastReport {
    pub location: Coordinates,
    pub forecast_hours: usize,
    pub requested_hours: u16,
    pub hourly_forecasts: Vec<HourlyForecastRecord>,
    pub source: String,
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub diagnostics: Vec<Diagnostic>,
}

impl ForecastReport {
    /// Pretty-printed JSON, as handed to downstream consumers.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Fetch, align and truncate an hourly forecast for `request`.
pub async fn get_hourly_forecast(
    source: &dyn ForecastSource,
    request: &ForecastRequest,
) -> Result<ForecastReport, ForecastError> {
    request.validate()?;

    let text = source.fetch_dwml(request.coords).await?;
    let document = DwmlDocument::parse(&text)?;
    let (hourly_forecasts, diagnostics) = align(&document)
        .truncate(usize::from(request.hours))
        .into_parts();

    for diagnostic in &diagnostics {
        debug!(%diagnostic, "alignment diagnostic");
    }
    info!(
        records = hourly_forecasts.len(),
        requested = request.hours,
        "hourly forecast assembled"
    );

    Ok(ForecastReport {
        location: request.coords,
        forecast_hours: hourly_forecasts.len(),
        requested_hours: request.hours,
        hourly_forecasts,
        source: source.name().to_string(),
        generated_at: Utc::now(),
        diagnostics,
    })
}
