#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Geospatial risk scoring for the safety map.
//!
//! Turns incident reports, SOS alerts, and safety facilities into:
//!
//! - a continuous risk score at any point ([`surface`]),
//! - a classified lattice for choropleth rendering ([`grid`]),
//! - incident clusters and the safe/danger zones built on them
//!   ([`cluster`], [`zones`]),
//! - area summaries and nearby listings ([`area`]).
//!
//! The algorithm modules are pure functions over borrowed records.
//! [`SafetyEngine`] wraps them with input validation and an
//! [`IncidentStore`](safety_map_store::IncidentStore) lookup.

pub mod area;
pub mod cluster;
pub mod config;
pub mod engine;
pub mod grid;
pub mod surface;
pub mod zones;

use safety_map_geo::ValidationError;
use safety_map_store::StoreError;
use thiserror::Error;

pub use config::{ConfigError, RiskConfig};
pub use engine::SafetyEngine;

/// Errors returned by [`SafetyEngine`] queries.
#[derive(Debug, Error)]
pub enum RiskError {
    /// A query parameter was out of range.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The engine configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}
