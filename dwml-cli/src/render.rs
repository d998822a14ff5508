use dwml_core::{HourlyForecastRecord, Measurement, Wind};

const MISSING: &str = "-";

fn short_units(units: &str) -> &str {
    match units {
        "Fahrenheit" => "°F",
        "Celsius" => "°C",
        "percent" => "%",
        other => other,
    }
}

fn measurement(reading: Option<&Measurement>) -> String {
    match reading {
        Some(m) => {
            let units = short_units(&m.units);
            if units == "%" || units.starts_with('°') {
                format!("{}{units}", m.value)
            } else {
                format!("{} {units}", m.value)
            }
        }
        None => MISSING.to_string(),
    }
}

fn wind(wind: Option<&Wind>) -> String {
    let Some(wind) = wind else {
        return MISSING.to_string();
    };

    let mut out = match &wind.speed {
        Some(speed) => measurement(Some(speed)),
        None => MISSING.to_string(),
    };
    if let Some(direction) = &wind.direction {
        out.push_str(&format!(" from {}", direction.value));
    }
    if let Some(gust) = &wind.gust {
        out.push_str(&format!(" (G{})", gust.value));
    }
    out
}

/// Plain-text table, one line per hour.
pub fn table(records: &[HourlyForecastRecord]) -> String {
    let mut out = format!(
        "{:<24} {:>7} {:>6} {:>6} {:<26} {:>5} {:>5}  {}\n",
        "Time", "Temp", "Dew", "RH", "Wind", "PoP", "Sky", "Conditions"
    );

    for record in records {
        out.push_str(&format!(
            "{:<24} {:>7} {:>6} {:>6} {:<26} {:>5} {:>5}  {}\n",
            record.datetime_readable(),
            measurement(record.temperature("hourly")),
            measurement(record.temperature("dew point")),
            measurement(record.humidity()),
            wind(record.wind()),
            measurement(record.precipitation_probability()),
            measurement(record.cloud_cover()),
            record.weather_conditions().unwrap_or(MISSING),
        ));
    }

    out
}
