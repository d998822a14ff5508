use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, FixedOffset};
use serde::{Serialize, Serializer, ser::SerializeMap};

/// Human-readable rendering used for `datetime_readable`.
pub const READABLE_FORMAT: &str = "%Y-%m-%d %I:%M:%S %p";

/// A numeric reading paired with the units its series declared.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Measurement {
    pub value: f64,
    pub units: String,
}

impl Measurement {
    pub fn new(value: f64, units: impl Into<String>) -> Self {
        Self {
            value,
            units: units.into(),
        }
    }
}

impl fmt::Display for Measurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.units)
    }
}

/// Wind direction as the feed supplied it: degrees, or a compass name such
/// as `"NNW"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DirectionValue {
    Degrees(f64),
    Compass(String),
}

impl DirectionValue {
    /// Numeric cells become degrees, anything else is kept verbatim.
    pub fn from_cell(cell: &str) -> Self {
        match cell.parse::<f64>() {
            Ok(degrees) if degrees.is_finite() => DirectionValue::Degrees(degrees),
            _ => DirectionValue::Compass(cell.to_string()),
        }
    }
}

impl fmt::Display for DirectionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DirectionValue::Degrees(d) => write!(f, "{d}"),
            DirectionValue::Compass(c) => f.write_str(c),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindDirection {
    pub value: DirectionValue,
    pub units: String,
}

/// Nested wind reading. At least one member is present whenever a record
/// carries a `Wind` at all.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Wind {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<Measurement>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub gust: Option<Measurement>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<WindDirection>,
}

/// Normalize a temperature subtype tag into the suffix used for its key,
/// e.g. `"Dew Point"` -> `"dew_point"`.
pub fn temperature_subtype(tag: Option<&str>) -> String {
    let tag = tag.map(str::trim).filter(|t| !t.is_empty()).unwrap_or("unknown");

    tag.split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

/// One hour of forecast data.
///
/// Every parameter is optional: a missing value means the feed had nothing
/// usable for this hour, never zero.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForecastRecord {
    valid_time: DateTime<FixedOffset>,
    temperatures: BTreeMap<String, Measurement>,
    humidity: Option<Measurement>,
    wind: Option<Wind>,
    weather_conditions: Option<String>,
    precipitation_probability: Option<Measurement>,
    cloud_cover: Option<Measurement>,
}

impl HourlyForecastRecord {
    pub(crate) fn new(valid_time: DateTime<FixedOffset>) -> Self {
        Self {
            valid_time,
            temperatures: BTreeMap::new(),
            humidity: None,
            wind: None,
            weather_conditions: None,
            precipitation_probability: None,
            cloud_cover: None,
        }
    }

    pub fn valid_time(&self) -> DateTime<FixedOffset> {
        self.valid_time
    }

    pub fn datetime_readable(&self) -> String {
        self.valid_time.format(READABLE_FORMAT).to_string()
    }

    /// Temperature for a subtype tag as it appears in the feed (`"hourly"`,
    /// `"dew point"`, ...).
    pub fn temperature(&self, subtype: &str) -> Option<&Measurement> {
        self.temperatures.get(&temperature_subtype(Some(subtype)))
    }

    /// All temperatures keyed by normalized subtype.
    pub fn temperatures(&self) -> &BTreeMap<String, Measurement> {
        &self.temperatures
    }

    pub fn humidity(&self) -> Option<&Measurement> {
        self.humidity.as_ref()
    }

    pub fn wind(&self) -> Option<&Wind> {
        self.wind.as_ref()
    }

    pub fn weather_conditions(&self) -> Option<&str> {
        self.weather_conditions.as_deref()
    }

    pub fn precipitation_probability(&self) -> Option<&Measurement> {
        self.precipitation_probability.as_ref()
    }

    pub fn cloud_cover(&self) -> Option<&Measurement> {
        self.cloud_cover.as_ref()
    }

    pub(crate) fn set_temperature(&mut self, subtype: String, reading: Measurement) {
        self.temperatures.insert(subtype, reading);
    }

    pub(crate) fn set_humidity(&mut self, reading: Measurement) {
        self.humidity = Some(reading);
    }

    pub(crate) fn wind_mut(&mut self) -> &mut Wind {
        self.wind.get_or_insert_with(Wind::default)
    }

    pub(crate) fn set_weather_conditions(&mut self, summary: String) {
        self.weather_conditions = Some(summary);
    }

    pub(crate) fn set_precipitation_probability(&mut self, reading: Measurement) {
        self.precipitation_probability = Some(reading);
    }

    pub(crate) fn set_cloud_cover(&mut self, reading: Measurement) {
        self.cloud_cover = Some(reading);
    }
}

/// Flat key/value view: `temperature_<subtype>` keys sit next to the fixed
/// parameter keys, and absent parameters are left out entirely. Subtypes are
/// normalized first, so `"dew point"` is emitted as `temperature_dew_point`.
impl Serialize for HourlyForecastRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("valid_time", &self.valid_time.to_rfc3339())?;
        map.serialize_entry("datetime_readable", &self.datetime_readable())?;

        for (subtype, reading) in &self.temperatures {
            map.serialize_entry(&format!("temperature_{subtype}"), reading)?;
        }
        if let Some(humidity) = &self.humidity {
            map.serialize_entry("humidity", humidity)?;
        }
        if let Some(wind) = &self.wind {
            map.serialize_entry("wind", wind)?;
        }
        if let Some(summary) = &self.weather_conditions {
            map.serialize_entry("weather_conditions", summary)?;
        }
        if let Some(pop) = &self.precipitation_probability {
            map.serialize_entry("precipitation_probability", pop)?;
        }
        if let Some(cloud) = &self.cloud_cover {
            map.serialize_entry("cloud_cover", cloud)?;
        }

        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(ts: &str) -> HourlyForecastRecord {
        HourlyForecastRecord::new(DateTime::parse_from_rfc3339(ts).expect("valid timestamp"))
    }

    #[test]
    fn readable_time_uses_twelve_hour_clock() {
        let record = at("2025-05-28T18:00:00-05:00");
        assert_eq!(record.datetime_readable(), "2025-05-28 06:00:00 PM");

        let record = at("2025-05-29T00:00:00-05:00");
        assert_eq!(record.datetime_readable(), "2025-05-29 12:00:00 AM");
    }

    #[test]
    fn bare_record_serializes_only_time_fields() {
        let record = at("2025-05-28T18:00:00-05:00");
        let value = serde_json::to_value(&record).expect("serializable");

        assert_eq!(
            value,
            json!({
                "valid_time": "2025-05-28T18:00:00-05:00",
                "datetime_readable": "2025-05-28 06:00:00 PM",
            })
        );
    }

    #[test]
    fn populated_record_serializes_external_shape() {
        let mut record = at("2025-05-28T18:00:00-05:00");
        record.set_temperature("hourly".into(), Measurement::new(72.0, "Fahrenheit"));
        record.set_temperature("dew_point".into(), Measurement::new(60.0, "Fahrenheit"));
        record.set_humidity(Measurement::new(55.0, "percent"));
        record.wind_mut().speed = Some(Measurement::new(8.0, "knots"));
        record.wind_mut().direction = Some(WindDirection {
            value: DirectionValue::Compass("NNW".into()),
            units: "degrees".into(),
        });
        record.set_weather_conditions("Chance Showers".into());

        let value = serde_json::to_value(&record).expect("serializable");
        assert_eq!(value["temperature_hourly"], json!({ "value": 72.0, "units": "Fahrenheit" }));
        assert_eq!(value["temperature_dew_point"]["value"], json!(60.0));
        assert_eq!(value["humidity"], json!({ "value": 55.0, "units": "percent" }));
        assert_eq!(
            value["wind"],
            json!({
                "speed": { "value": 8.0, "units": "knots" },
                "direction": { "value": "NNW", "units": "degrees" },
            })
        );
        assert_eq!(value["weather_conditions"], json!("Chance Showers"));
        assert!(value.get("cloud_cover").is_none());
        assert!(value.get("precipitation_probability").is_none());
    }

    #[test]
    fn temperature_subtype_normalization() {
        assert_eq!(temperature_subtype(Some("hourly")), "hourly");
        assert_eq!(temperature_subtype(Some("Dew Point")), "dew_point");
        assert_eq!(temperature_subtype(Some("heat-index")), "heat_index");
        assert_eq!(temperature_subtype(None), "unknown");
        assert_eq!(temperature_subtype(Some("  ")), "unknown");
    }

    #[test]
    fn direction_cells_keep_their_form() {
        assert_eq!(DirectionValue::from_cell("270"), DirectionValue::Degrees(270.0));
        assert_eq!(
            DirectionValue::from_cell("SW"),
            DirectionValue::Compass("SW".into())
        );
        assert_eq!(
            DirectionValue::from_cell("NaN"),
            DirectionValue::Compass("NaN".into())
        );
    }
}
