use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{Parser, Subcommand};
use dwml_core::{
    Config, Coordinates, DwmlDocument, ForecastReport, ForecastRequest, MAX_HOURS, NwsDwmlSource,
    align, get_hourly_forecast,
};
use inquire::CustomType;
use tracing::debug;

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "dwml", version, about = "NWS hourly forecast CLI")]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Save a named location. Prompts for coordinates unless both are given.
    Configure {
        /// Location name, e.g. "houston".
        name: String,

        #[arg(long, allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Make this the default location.
        #[arg(long)]
        default: bool,
    },

    /// Fetch the hourly forecast for a saved location or explicit coordinates.
    Forecast {
        /// Saved location name; the default location is used when absent.
        #[arg(conflicts_with_all = ["lat", "lon"])]
        location: Option<String>,

        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Number of hours to return (1-168).
        #[arg(long)]
        hours: Option<u16>,

        /// Print the full JSON report instead of a table.
        #[arg(long)]
        json: bool,

        /// Also save the JSON report to this file.
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Align a DWML document saved on disk.
    Parse {
        file: PathBuf,

        #[arg(long, default_value_t = MAX_HOURS)]
        hours: u16,

        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure {
                name,
                lat,
                lon,
                default,
            } => configure(&name, lat, lon, default),
            Command::Forecast {
                location,
                lat,
                lon,
                hours,
                json,
                output,
            } => forecast(location, lat.zip(lon), hours, json, output).await,
            Command::Parse { file, hours, json } => parse_file(&file, hours, json),
        }
    }
}

fn prompt_coordinate(label: &str, help: &str) -> anyhow::Result<f64> {
    CustomType::<f64>::new(label)
        .with_help_message(help)
        .with_error_message("Please type a decimal number")
        .prompt()
        .with_context(|| format!("Failed to read {label}"))
}

fn configure(name: &str, lat: Option<f64>, lon: Option<f64>, default: bool) -> anyhow::Result<()> {
    let mut cfg = Config::load()?;

    let latitude = match lat {
        Some(lat) => lat,
        None => prompt_coordinate("Latitude:", "Decimal degrees, -90 to 90")?,
    };
    let longitude = match lon {
        Some(lon) => lon,
        None => prompt_coordinate("Longitude:", "Decimal degrees, -180 to 180")?,
    };

    let coords = Coordinates::new(latitude, longitude);
    ForecastRequest::new(coords).validate()?;

    cfg.upsert_location(name, coords);
    if default {
        cfg.set_default_location(name)?;
    }
    cfg.save()?;

    println!(
        "Saved location '{}' ({latitude}, {longitude}) to {}",
        name.to_lowercase(),
        Config::config_file_path()?.display()
    );
    Ok(())
}

async fn forecast(
    location: Option<String>,
    coords: Option<(f64, f64)>,
    hours: Option<u16>,
    json: bool,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    let cfg = Config::load()?;

    let coords = match (coords, location) {
        (Some((lat, lon)), _) => Coordinates::new(lat, lon),
        (None, Some(name)) => cfg.location(&name)?,
        (None, None) => cfg.default_location()?,
    };
    let request = ForecastRequest::new(coords).with_hours(hours.unwrap_or(cfg.default_hours));
    debug!(?request, "requesting forecast");

    let source = NwsDwmlSource::new(&cfg.nws)?;
    let report = get_hourly_forecast(&source, &request).await?;

    if let Some(path) = &output {
        save_report(&report, path)?;
        eprintln!("Forecast saved to {}", path.display());
    }

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!(
            "{} hour(s) for ({}, {}) from {}",
            report.forecast_hours, coords.latitude, coords.longitude, report.source
        );
        print!("{}", render::table(&report.hourly_forecasts));
    }

    Ok(())
}

fn save_report(report: &ForecastReport, path: &Path) -> anyhow::Result<()> {
    let body = report.to_json().context("Failed to serialize report")?;
    fs::write(path, body)
        .with_context(|| format!("Failed to write forecast file: {}", path.display()))
}

fn parse_file(file: &Path, hours: u16, json: bool) -> anyhow::Result<()> {
    let text = fs::read_to_string(file)
        .with_context(|| format!("Failed to read DWML file: {}", file.display()))?;

    let document = DwmlDocument::parse(&text)
        .with_context(|| format!("Failed to load {}", file.display()))?;
    let (records, diagnostics) = align(&document).truncate(usize::from(hours)).into_parts();

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else {
        print!("{}", render::table(&records));
    }

    for diagnostic in &diagnostics {
        eprintln!("warning: {diagnostic}");
    }

    Ok(())
}
