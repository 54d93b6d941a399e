#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the safety map risk engine.
//!
//! Loads a JSON snapshot of incidents and facilities, runs one engine query
//! and prints the result as pretty JSON in the same shape the HTTP API
//! returns.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use safety_map_incident_models::GeoPoint;
use safety_map_risk::{RiskConfig, SafetyEngine};
use safety_map_risk_models::RiskSample;
use safety_map_server_models::{
    ApiAreaAnalysis, ApiChoropleth, ApiFacility, ApiNearbyIncidents, ApiPointRisk, ApiSafetyZones,
};
use safety_map_store::InMemoryStore;

#[derive(Parser)]
#[command(name = "safety_map", about = "Query the safety map risk engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Risk score and level at a point
    Risk(QueryArgs),
    /// Classified choropleth grid around a point
    Grid(QueryArgs),
    /// Safe and danger zones around a point
    Zones(QueryArgs),
    /// Risk and infrastructure summary for an area
    Analyze(QueryArgs),
    /// Reports and open SOS alerts near a point, newest first
    Nearby(QueryArgs),
    /// Hospitals and police stations near a point, nearest first
    Facilities(QueryArgs),
}

impl Commands {
    const fn args(&self) -> &QueryArgs {
        match self {
            Self::Risk(args)
            | Self::Grid(args)
            | Self::Zones(args)
            | Self::Analyze(args)
            | Self::Nearby(args)
            | Self::Facilities(args) => args,
        }
    }
}

#[derive(Args)]
struct QueryArgs {
    /// Snapshot JSON with `incidents` and `facilities` arrays
    #[arg(long, default_value = "data/sample_snapshot.json")]
    data: PathBuf,

    /// Latitude of the query center in degrees
    #[arg(long, allow_negative_numbers = true)]
    latitude: f64,

    /// Longitude of the query center in degrees
    #[arg(long, allow_negative_numbers = true)]
    longitude: f64,

    /// Query radius in meters [default: from config]
    #[arg(long)]
    radius: Option<f64>,

    /// TOML file overriding the default risk config
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init_custom_env("RUST_LOG");
    let cli = Cli::parse();

    let output = run(&cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

/// Runs one subcommand and returns its JSON output.
fn run(command: &Commands) -> Result<serde_json::Value, Box<dyn std::error::Error>> {
    let args = command.args();
    let config = RiskConfig::load(args.config.as_deref())?;
    let store = InMemoryStore::load(&args.data)?;
    let engine = SafetyEngine::new(store, config)?;

    let center = GeoPoint::new(args.latitude, args.longitude);
    let radius = args
        .radius
        .unwrap_or(engine.config().default_query_radius_meters);
    log::debug!("Query center ({}, {}) radius {radius}m", center.latitude, center.longitude);

    let output = match command {
        Commands::Risk(_) => {
            let score = engine.risk_at(center)?;
            serde_json::to_value(ApiPointRisk::from(RiskSample::new(center, score)))?
        }
        Commands::Grid(_) => serde_json::to_value(ApiChoropleth::new(
            engine.sample_grid(center, radius)?,
            engine.config().grid.cell_size_degrees,
        ))?,
        Commands::Zones(_) => serde_json::to_value(ApiSafetyZones::from(
            engine.safety_zones(center, radius, Utc::now())?,
        ))?,
        Commands::Analyze(_) => {
            serde_json::to_value(ApiAreaAnalysis::from(engine.analyze_area(center, radius)?))?
        }
        Commands::Nearby(_) => serde_json::to_value(ApiNearbyIncidents::from(
            engine.nearby_incidents(center, radius)?,
        ))?,
        Commands::Facilities(_) => {
            let facilities: Vec<ApiFacility> = engine
                .nearby_facilities(center, radius)?
                .into_iter()
                .map(ApiFacility::from)
                .collect();
            serde_json::to_value(facilities)?
        }
    };

    Ok(output)
}
