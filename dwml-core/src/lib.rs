//! Core library for the `dwml` CLI.
//!
//! This crate defines:
//! - Loading DWML XML into a navigable element tree
//! - Aligning DWML parameter series into per-hour forecast records
//! - Fetching DWML from the National Weather Service
//! - Configuration handling
//!
//! It is used by `dwml-cli`, but can also be reused by other binaries or services.

pub mod aligner;
pub mod config;
pub mod document;
pub mod error;
pub mod model;
pub mod service;
pub mod source;

pub use aligner::{Alignment, Diagnostic, TimeLayout, align, parse_hourly_forecast};
pub use config::{Config, NwsConfig};
pub use document::{DwmlDocument, Element, Query};
pub use error::{DwmlError, FetchError, ForecastError};
pub use model::{DirectionValue, HourlyForecastRecord, Measurement, Wind, WindDirection};
pub use service::{ForecastReport, ForecastRequest, MAX_HOURS, get_hourly_forecast};
pub use source::{Coordinates, ForecastSource, NwsDwmlSource};
