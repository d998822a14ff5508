//! Re-joins DWML parameter series into per-hour records.
//!
//! DWML stores every parameter as its own flat list of `<value>` cells that
//! only line up with each other through a shared `time-layout` key. The
//! aligner picks the hourly layout, turns its start times into a skeleton of
//! records, then fills each record by list position from every series that
//! claims that layout.
//!
//! Anything short of malformed XML degrades to an omitted field plus a
//! [`Diagnostic`], never to an error.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use tracing::{debug, warn};

use crate::{
    document::{DwmlDocument, Element, Query},
    error::DwmlError,
    model::{DirectionValue, HourlyForecastRecord, Measurement, WindDirection, temperature_subtype},
};

/// A layout needs more start times than this to count as hourly.
pub const HOURLY_LAYOUT_THRESHOLD: usize = 24;

const DEFAULT_TEMPERATURE_UNITS: &str = "Fahrenheit";
const DEFAULT_HUMIDITY_UNITS: &str = "percent";
const DEFAULT_WIND_SPEED_UNITS: &str = "knots";
const DEFAULT_DIRECTION_UNITS: &str = "degrees";
const DEFAULT_PRECIPITATION_UNITS: &str = "percent";
const DEFAULT_CLOUD_UNITS: &str = "percent";

/// A named, ordered list of start times from the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLayout {
    pub key: String,
    pub start_times: Vec<Option<String>>,
}

impl TimeLayout {
    pub fn is_hourly_eligible(&self) -> bool {
        self.start_times.len() > HOURLY_LAYOUT_THRESHOLD
    }
}

/// Every `time-layout` carrying a non-empty `layout-key`, in document order.
pub fn time_layouts(document: &DwmlDocument<'_>) -> Vec<TimeLayout> {
    document
        .root()
        .find_all(Query::tag("time-layout"))
        .filter_map(|layout| {
            let key = layout
                .children("layout-key")
                .next()
                .and_then(|k| k.text())?;

            let start_times = layout
                .children("start-valid-time")
                .map(|t| t.text().map(str::to_string))
                .collect();

            Some(TimeLayout {
                key: key.to_string(),
                start_times,
            })
        })
        .collect()
}

/// First layout, in document order, with more than
/// [`HOURLY_LAYOUT_THRESHOLD`] start times.
pub fn select_hourly_layout(document: &DwmlDocument<'_>) -> Option<TimeLayout> {
    time_layouts(document)
        .into_iter()
        .find(TimeLayout::is_hourly_eligible)
}

/// Something the aligner skipped over. None of these stop alignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// No layout had enough start times to be hourly.
    NoHourlyLayout,
    /// The document has no `parameters` element; records carry times only.
    MissingParameters,
    /// A start time that is not an offset-aware ISO-8601 instant.
    UnparseableTimestamp { index: usize, raw: Option<String> },
    /// A series tied to a layout other than the hourly one.
    LayoutMismatch {
        parameter: String,
        layout_key: Option<String>,
    },
    /// A non-empty cell that could not be read as a number.
    UnparseableValue {
        parameter: String,
        index: usize,
        raw: String,
    },
    /// Cells beyond the end of the hourly layout.
    SurplusValues { parameter: String, ignored: usize },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NoHourlyLayout => f.write_str("no hourly time layout found"),
            Diagnostic::MissingParameters => f.write_str("document has no parameters element"),
            Diagnostic::UnparseableTimestamp { index, raw } => write!(
                f,
                "could not parse start time #{index}: {}",
                raw.as_deref().unwrap_or("<empty>")
            ),
            Diagnostic::LayoutMismatch {
                parameter,
                layout_key,
            } => write!(
                f,
                "{parameter} ignored: references layout {}",
                layout_key.as_deref().unwrap_or("<none>")
            ),
            Diagnostic::UnparseableValue {
                parameter,
                index,
                raw,
            } => write!(f, "{parameter} value #{index} is not numeric: {raw}"),
            Diagnostic::SurplusValues { parameter, ignored } => {
                write!(f, "{parameter}: {ignored} value(s) beyond the hourly layout ignored")
            }
        }
    }
}

/// Result of aligning one document: the hourly records in timestamp order
/// plus whatever was skipped on the way.
#[derive(Debug, Clone, Default)]
pub struct Alignment {
    layout_key: Option<String>,
    records: Vec<HourlyForecastRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl Alignment {
    /// Key of the layout the records were built from, if one was found.
    pub fn layout_key(&self) -> Option<&str> {
        self.layout_key.as_deref()
    }

    pub fn records(&self) -> &[HourlyForecastRecord] {
        &self.records
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Keep only the first `max` records.
    pub fn truncate(mut self, max: usize) -> Self {
        self.records.truncate(max);
        self
    }

    pub fn into_records(self) -> Vec<HourlyForecastRecord> {
        self.records
    }

    pub fn into_parts(self) -> (Vec<HourlyForecastRecord>, Vec<Diagnostic>) {
        (self.records, self.diagnostics)
    }
}

/// Parse `text` and return at most `max_hours` leading hourly records.
///
/// Only malformed XML is an error. A document without hourly data yields
/// an empty list.
pub fn parse_hourly_forecast(
    text: &str,
    max_hours: usize,
) -> Result<Vec<HourlyForecastRecord>, DwmlError> {
    let document = DwmlDocument::parse(text)?;
    Ok(align(&document).truncate(max_hours).into_records())
}

/// Build hourly records from a parsed document.
pub fn align(document: &DwmlDocument<'_>) -> Alignment {
    let Some(layout) = select_hourly_layout(document) else {
        warn!("Could not find hourly time layout");
        return Alignment {
            diagnostics: vec![Diagnostic::NoHourlyLayout],
            ..Alignment::default()
        };
    };

    debug!(
        layout_key = %layout.key,
        start_times = layout.start_times.len(),
        "selected hourly time layout"
    );

    let mut aligner = Aligner::new(&layout);

    match document.root().find_first(Query::tag("parameters")) {
        Some(parameters) => {
            aligner.merge_temperatures(parameters);
            aligner.merge_humidity(parameters);
            aligner.merge_wind(parameters);
            aligner.merge_weather_conditions(parameters);
            aligner.merge_precipitation(parameters);
            aligner.merge_cloud_cover(parameters);
        }
        None => {
            warn!("No parameters found in DWML");
            aligner.diagnostics.push(Diagnostic::MissingParameters);
        }
    }

    let Aligner {
        records,
        diagnostics,
        ..
    } = aligner;

    Alignment {
        layout_key: Some(layout.key),
        records,
        diagnostics,
    }
}

fn parse_start_time(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// Working state while one document is being aligned.
struct Aligner<'l> {
    layout_key: &'l str,
    /// Parsed start times only; position here is the alignment key.
    records: Vec<HourlyForecastRecord>,
    diagnostics: Vec<Diagnostic>,
}

impl<'l> Aligner<'l> {
    fn new(layout: &'l TimeLayout) -> Self {
        let mut records = Vec::with_capacity(layout.start_times.len());
        let mut diagnostics = Vec::new();

        for (index, raw) in layout.start_times.iter().enumerate() {
            match raw.as_deref().and_then(parse_start_time) {
                Some(valid_time) => records.push(HourlyForecastRecord::new(valid_time)),
                None => {
                    warn!(index, raw = ?raw, "Could not parse start time");
                    diagnostics.push(Diagnostic::UnparseableTimestamp {
                        index,
                        raw: raw.clone(),
                    });
                }
            }
        }

        Self {
            layout_key: &layout.key,
            records,
            diagnostics,
        }
    }

    fn matches_layout(&self, series: Element<'_, '_>) -> bool {
        series.attribute("time-layout") == Some(self.layout_key)
    }

    fn mismatch(&mut self, parameter: &str, series: Element<'_, '_>) {
        let layout_key = series.attribute("time-layout").map(str::to_string);
        debug!(parameter, layout_key = ?layout_key, "series references another layout");
        self.diagnostics.push(Diagnostic::LayoutMismatch {
            parameter: parameter.to_string(),
            layout_key,
        });
    }

    /// First series named `tag` on the hourly layout that passes `accept`.
    /// Every other candidate on a foreign layout is reported.
    fn pick_series<'a, 'input: 'a>(
        &mut self,
        parameters: Element<'a, 'input>,
        tag: &str,
        accept: impl Fn(Element<'a, 'input>) -> bool,
    ) -> Option<Element<'a, 'input>> {
        let mut picked = None;
        for series in parameters.find_all(Query::tag(tag)).filter(|s| accept(*s)) {
            if !self.matches_layout(series) {
                self.mismatch(tag, series);
            } else if picked.is_none() {
                picked = Some(series);
            }
        }
        picked
    }

    /// Walk `cells` in order, handing cell N to record N. Cells past the
    /// last record are counted as surplus.
    fn for_each_cell<'a, 'input: 'a>(
        &mut self,
        parameter: &str,
        cells: impl Iterator<Item = Element<'a, 'input>>,
        mut fill: impl FnMut(
            &mut HourlyForecastRecord,
            Element<'a, 'input>,
            &mut Vec<Diagnostic>,
            usize,
        ),
    ) {
        let mut surplus = 0;
        for (index, cell) in cells.enumerate() {
            match self.records.get_mut(index) {
                Some(record) => fill(record, cell, &mut self.diagnostics, index),
                None => surplus += 1,
            }
        }

        if surplus > 0 {
            debug!(parameter, surplus, "values beyond the hourly layout");
            self.diagnostics.push(Diagnostic::SurplusValues {
                parameter: parameter.to_string(),
                ignored: surplus,
            });
        }
    }

    /// Merge numeric `<value>` cells of `series`, each paired with the
    /// series' units (or `default_units`).
    fn merge_numeric(
        &mut self,
        parameter: &str,
        series: Element<'_, '_>,
        default_units: &str,
        mut apply: impl FnMut(&mut HourlyForecastRecord, Measurement),
    ) {
        let units = series.attribute("units").unwrap_or(default_units);

        let cells = series.children("value");
        self.for_each_cell(parameter, cells, |record, cell, diagnostics, index| {
            let Some(raw) = cell.text() else {
                return;
            };
            match raw.parse::<f64>() {
                Ok(value) if value.is_finite() => apply(record, Measurement::new(value, units)),
                _ => {
                    debug!(parameter, index, raw, "skipping non-numeric value");
                    diagnostics.push(Diagnostic::UnparseableValue {
                        parameter: parameter.to_string(),
                        index,
                        raw: raw.to_string(),
                    });
                }
            }
        });
    }

    fn merge_temperatures(&mut self, parameters: Element<'_, '_>) {
        for series in parameters.find_all(Query::tag("temperature")) {
            let subtype = temperature_subtype(series.attribute("type"));
            let parameter = format!("temperature_{subtype}");

            if !self.matches_layout(series) {
                self.mismatch(&parameter, series);
                continue;
            }

            self.merge_numeric(&parameter, series, DEFAULT_TEMPERATURE_UNITS, |record, reading| {
                record.set_temperature(subtype.clone(), reading)
            });
        }
    }

    fn merge_humidity(&mut self, parameters: Element<'_, '_>) {
        if let Some(series) = self.pick_series(parameters, "humidity", |_| true) {
            self.merge_numeric("humidity", series, DEFAULT_HUMIDITY_UNITS, |record, reading| {
                record.set_humidity(reading)
            });
        }
    }

    fn merge_wind(&mut self, parameters: Element<'_, '_>) {
        if let Some(series) = self.pick_series(parameters, "wind-speed", |s| !is_gust(s)) {
            self.merge_numeric("wind_speed", series, DEFAULT_WIND_SPEED_UNITS, |record, reading| {
                record.wind_mut().speed = Some(reading)
            });
        }

        if let Some(series) = self.pick_series(parameters, "wind-speed", is_gust) {
            self.merge_numeric("wind_gust", series, DEFAULT_WIND_SPEED_UNITS, |record, reading| {
                record.wind_mut().gust = Some(reading)
            });
        }

        if let Some(series) = self.pick_series(parameters, "direction", |_| true) {
            let units = series.attribute("units").unwrap_or(DEFAULT_DIRECTION_UNITS);
            self.for_each_cell("wind_direction", series.children("value"), |record, cell, _, _| {
                if let Some(raw) = cell.text() {
                    record.wind_mut().direction = Some(WindDirection {
                        value: DirectionValue::from_cell(raw),
                        units: units.to_string(),
                    });
                }
            });
        }
    }

    fn merge_weather_conditions(&mut self, parameters: Element<'_, '_>) {
        if let Some(series) = self.pick_series(parameters, "weather", |_| true) {
            self.for_each_cell(
                "weather_conditions",
                series.children("weather-conditions"),
                |record, condition, _, _| {
                    if let Some(summary) = condition_summary(condition) {
                        record.set_weather_conditions(summary);
                    }
                },
            );
        }
    }

    fn merge_precipitation(&mut self, parameters: Element<'_, '_>) {
        if let Some(series) = self.pick_series(parameters, "probability-of-precipitation", |_| true) {
            self.merge_numeric(
                "precipitation_probability",
                series,
                DEFAULT_PRECIPITATION_UNITS,
                |record, reading| record.set_precipitation_probability(reading),
            );
        }
    }

    fn merge_cloud_cover(&mut self, parameters: Element<'_, '_>) {
        if let Some(series) = self.pick_series(parameters, "cloud-amount", |_| true) {
            self.merge_numeric("cloud_cover", series, DEFAULT_CLOUD_UNITS, |record, reading| {
                record.set_cloud_cover(reading)
            });
        }
    }
}

fn is_gust(series: Element<'_, '_>) -> bool {
    series.attribute("type") == Some("gust")
}

/// Text summary of one `weather-conditions` element.
///
/// Prefers the `weather-summary` attribute. Digital feeds leave it out and
/// describe each condition as a `<value>` with coverage, intensity and type
/// attributes instead, so those are stitched together as a fallback.
fn condition_summary(condition: Element<'_, '_>) -> Option<String> {
    if let Some(summary) = condition
        .attribute("weather-summary")
        .map(str::trim)
        .filter(|s| !s.is_empty())
    {
        return Some(summary.to_string());
    }

    let parts: Vec<String> = condition
        .children("value")
        .filter_map(|value| {
            let words: Vec<&str> = ["coverage", "intensity", "weather-type"]
                .iter()
                .filter_map(|attr| value.attribute(attr))
                .map(str::trim)
                .filter(|w| !w.is_empty() && *w != "none")
                .collect();
            (!words.is_empty()).then(|| words.join(" "))
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join("; "))
}
