#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Incident, SOS alert, and safety facility types.
//!
//! These are the raw records the risk engine consumes. Citizen reports and
//! SOS alerts are both represented as [`Incident`]s distinguished by their
//! [`IncidentCategory`]; hospitals and police stations are
//! [`SafetyFacility`] records. All of them are read-only snapshots supplied
//! by the record store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate pair.
///
/// Construction does not validate ranges; boundary code validates with
/// `safety_map_geo::validate_point` before handing points to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// An axis-aligned latitude/longitude rectangle.
///
/// Used as a cheap pre-filter before exact distance checks, so it is
/// always a superset of the circular region it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    /// Southern latitude boundary.
    pub min_lat: f64,
    /// Northern latitude boundary.
    pub max_lat: f64,
    /// Western longitude boundary.
    pub min_lon: f64,
    /// Eastern longitude boundary.
    pub max_lon: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given bounds.
    #[must_use]
    pub const fn new(min_lat: f64, max_lat: f64, min_lon: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }
    }

    /// Returns `true` if the point lies inside the box (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

/// Category of a citizen report or alert.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IncidentCategory {
    /// Criminal activity (theft, assault, robbery).
    Crime,
    /// Harassment or stalking.
    Harassment,
    /// General safety hazards (poor lighting, unsafe crowds).
    Safety,
    /// Infrastructure problems (broken streetlights, potholes).
    Infrastructure,
    /// Anything not fitting another category.
    Other,
    /// Emergency SOS alert raised from the panic button.
    Sos,
    /// A category name this build does not know. Weighted with the
    /// severity table's fallback.
    Unrecognized,
}

impl<'de> Deserialize<'de> for IncidentCategory {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(name.trim().parse().unwrap_or(Self::Unrecognized))
    }
}

impl IncidentCategory {
    /// Whether this category counts toward a cluster's critical count.
    #[must_use]
    pub const fn is_critical(self) -> bool {
        matches!(self, Self::Crime | Self::Harassment)
    }

    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Crime,
            Self::Harassment,
            Self::Safety,
            Self::Infrastructure,
            Self::Other,
            Self::Sos,
            Self::Unrecognized,
        ]
    }
}

/// A single report or SOS alert at a point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// Store identifier, empty when the source has none.
    #[serde(default)]
    pub id: String,
    /// Where the incident happened.
    pub location: GeoPoint,
    /// What kind of incident this is.
    pub category: IncidentCategory,
    /// When the incident was reported.
    pub timestamp: DateTime<Utc>,
    /// Whether an SOS alert is still open. Ignored for reports.
    #[serde(default = "default_true")]
    pub active: bool,
}

const fn default_true() -> bool {
    true
}

impl Incident {
    /// Creates an active incident with no identifier.
    #[must_use]
    pub const fn new(location: GeoPoint, category: IncidentCategory, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: String::new(),
            location,
            category,
            timestamp,
            active: true,
        }
    }

    /// Returns `true` for SOS alerts.
    #[must_use]
    pub fn is_sos(&self) -> bool {
        self.category == IncidentCategory::Sos
    }

    /// Returns `true` for SOS alerts that are still open.
    #[must_use]
    pub fn is_active_sos(&self) -> bool {
        self.is_sos() && self.active
    }

    /// Whether the incident should be considered by the engine at all.
    ///
    /// Reports are always live; closed SOS alerts are not.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.is_sos() || self.active
    }
}

/// Type of safety infrastructure.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum FacilityKind {
    /// Hospital or emergency clinic.
    Hospital,
    /// Police station or outpost.
    Police,
}

impl FacilityKind {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Hospital, Self::Police]
    }
}

/// A hospital or police station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyFacility {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Facility location.
    pub location: GeoPoint,
    /// Facility type.
    pub kind: FacilityKind,
}

impl SafetyFacility {
    /// Creates a named facility.
    #[must_use]
    pub fn new(name: impl Into<String>, location: GeoPoint, kind: FacilityKind) -> Self {
        Self {
            name: name.into(),
            location,
            kind,
        }
    }
}
