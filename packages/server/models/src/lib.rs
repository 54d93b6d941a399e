#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the safety map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine's result types to allow independent evolution of the API
//! contract.

use chrono::{DateTime, Utc};
use safety_map_geo::{ValidationError, parse_param, require_param, validate_point, validate_radius};
use safety_map_incident_models::{FacilityKind, GeoPoint, IncidentCategory};
use safety_map_risk_models::{
    AreaAnalysis, AreaRiskLevel, DangerLevel, IncidentStats, NearbyFacility, NearbyIncident,
    NearbyIncidents, RiskLevel, RiskSample, SafetyZone, SafetyZones, ZoneType,
};
use serde::{Deserialize, Serialize};

/// Query parameters shared by every safety endpoint.
///
/// Values are kept as raw strings so malformed numbers surface as
/// [`ValidationError`]s instead of generic deserialization failures.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaQueryParams {
    /// Latitude of the query center.
    pub latitude: Option<String>,
    /// Longitude of the query center.
    pub longitude: Option<String>,
    /// Query radius in meters.
    pub radius: Option<String>,
}

impl AreaQueryParams {
    /// Parses and validates the query center.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a coordinate is missing, not a
    /// number, or out of range.
    pub fn point(&self) -> Result<GeoPoint, ValidationError> {
        let latitude = require_param("latitude", self.latitude.as_deref())?;
        let longitude = require_param("longitude", self.longitude.as_deref())?;
        validate_point(latitude, longitude)
    }

    /// Parses and validates the center and radius, using
    /// `default_radius_meters` when no radius was given.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] if a coordinate is invalid or the radius
    /// is not a positive number.
    pub fn area(&self, default_radius_meters: f64) -> Result<(GeoPoint, f64), ValidationError> {
        let center = self.point()?;
        let radius = parse_param("radius", self.radius.as_deref())?.unwrap_or(default_radius_meters);
        Ok((center, validate_radius(radius)?))
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Incidents loaded into the store.
    pub incident_count: usize,
    /// Facilities loaded into the store.
    pub facility_count: usize,
}

/// Risk at a single point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPointRisk {
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Score in `[0, 15]`.
    pub risk_score: f64,
    /// Choropleth level for the score.
    pub risk_level: RiskLevel,
    /// Display color for the level.
    pub color: String,
}

impl From<RiskSample> for ApiPointRisk {
    fn from(sample: RiskSample) -> Self {
        let risk_score = round2(sample.score);
        let risk_level = RiskLevel::from_score(risk_score);
        Self {
            latitude: sample.location.latitude,
            longitude: sample.location.longitude,
            risk_score,
            risk_level,
            color: risk_level.color().to_string(),
        }
    }
}

/// One choropleth cell.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRiskCell {
    /// Cell latitude.
    pub latitude: f64,
    /// Cell longitude.
    pub longitude: f64,
    /// Score in `[0, 15]`, rounded to two decimals.
    pub risk_score: f64,
    /// Choropleth level.
    pub risk_level: RiskLevel,
    /// Fill color.
    pub color: String,
    /// Fill opacity.
    pub opacity: f64,
}

impl From<RiskSample> for ApiRiskCell {
    fn from(sample: RiskSample) -> Self {
        let risk_score = round2(sample.score);
        let risk_level = RiskLevel::from_score(risk_score);
        Self {
            latitude: sample.location.latitude,
            longitude: sample.location.longitude,
            risk_score,
            risk_level,
            color: risk_level.color().to_string(),
            opacity: risk_level.opacity(),
        }
    }
}

/// Choropleth response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiChoropleth {
    /// Sampled cells.
    pub cells: Vec<ApiRiskCell>,
    /// Lattice step in degrees.
    pub grid_size: f64,
    /// Number of cells.
    pub total_cells: usize,
}

impl ApiChoropleth {
    /// Builds the response from engine samples.
    #[must_use]
    pub fn new(samples: Vec<RiskSample>, grid_size: f64) -> Self {
        let cells: Vec<ApiRiskCell> = samples.into_iter().map(ApiRiskCell::from).collect();
        Self {
            total_cells: cells.len(),
            cells,
            grid_size,
        }
    }
}

/// A zone overlay.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSafetyZone {
    /// `safe` or `danger`.
    pub zone_type: ZoneType,
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
    /// Zone score.
    pub risk_score: f64,
    /// Danger bucket, danger zones only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger_level: Option<DangerLevel>,
    /// Human-readable explanation.
    pub reason: String,
    /// Facility type, safe zones only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_type: Option<FacilityKind>,
    /// Incidents in the cluster, danger zones only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_count: Option<usize>,
    /// SOS alerts in the cluster, danger zones only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sos_count: Option<usize>,
    /// Crime/harassment reports in the cluster, danger zones only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_count: Option<usize>,
}

impl From<SafetyZone> for ApiSafetyZone {
    fn from(zone: SafetyZone) -> Self {
        Self {
            zone_type: zone.zone_type,
            latitude: zone.center.latitude,
            longitude: zone.center.longitude,
            radius: zone.radius_meters,
            risk_score: round2(zone.risk_score),
            danger_level: zone.danger_level,
            reason: zone.reason,
            facility_type: zone.facility_kind,
            incident_count: zone.incident_count,
            sos_count: zone.sos_count,
            critical_count: zone.critical_count,
        }
    }
}

/// Zone overlays response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSafetyZones {
    /// Zones around hospitals and police stations.
    pub safe_zones: Vec<ApiSafetyZone>,
    /// Zones around incident clusters.
    pub danger_zones: Vec<ApiSafetyZone>,
}

impl From<SafetyZones> for ApiSafetyZones {
    fn from(zones: SafetyZones) -> Self {
        Self {
            safe_zones: zones.safe_zones.into_iter().map(Into::into).collect(),
            danger_zones: zones.danger_zones.into_iter().map(Into::into).collect(),
        }
    }
}

/// Area analysis response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAreaAnalysis {
    /// Center latitude.
    pub latitude: f64,
    /// Center longitude.
    pub longitude: f64,
    /// Radius in meters.
    pub radius: f64,
    /// Risk at the center, rounded to two decimals.
    pub overall_risk_score: f64,
    /// Coarse risk level.
    pub risk_level: AreaRiskLevel,
    /// Badge color for `risk_level`.
    pub risk_color: String,
    /// Reports and open SOS alerts within the radius.
    pub total_incidents: usize,
    /// Crime/harassment reports and open SOS alerts within the radius.
    pub critical_incidents: usize,
    /// Weighted count of hospitals and police stations.
    pub safety_infrastructure_score: usize,
    /// Hospitals within the radius.
    pub nearby_hospitals: usize,
    /// Police stations within the radius.
    pub nearby_police_stations: usize,
}

impl From<AreaAnalysis> for ApiAreaAnalysis {
    fn from(analysis: AreaAnalysis) -> Self {
        let overall_risk_score = round2(analysis.overall_risk_score);
        let risk_level = AreaRiskLevel::from_score(overall_risk_score);
        Self {
            latitude: analysis.center.latitude,
            longitude: analysis.center.longitude,
            radius: analysis.radius_meters,
            overall_risk_score,
            risk_level,
            risk_color: risk_level.color().to_string(),
            total_incidents: analysis.total_incidents,
            critical_incidents: analysis.critical_incidents,
            safety_infrastructure_score: analysis.safety_infrastructure_score,
            nearby_hospitals: analysis.nearby_hospitals,
            nearby_police_stations: analysis.nearby_police_stations,
        }
    }
}

/// An incident near the query center.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNearbyIncident {
    /// Store identifier.
    pub id: String,
    /// Incident category.
    pub category: IncidentCategory,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// When the incident was reported.
    pub timestamp: DateTime<Utc>,
    /// Whether this is an SOS alert.
    pub is_sos: bool,
    /// Distance from the query center in whole meters.
    pub distance: f64,
}

impl From<NearbyIncident> for ApiNearbyIncident {
    fn from(nearby: NearbyIncident) -> Self {
        let is_sos = nearby.incident.is_sos();
        Self {
            id: nearby.incident.id,
            category: nearby.incident.category,
            latitude: nearby.incident.location.latitude,
            longitude: nearby.incident.location.longitude,
            timestamp: nearby.incident.timestamp,
            is_sos,
            distance: nearby.distance_meters,
        }
    }
}

/// Counts over a nearby incident listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIncidentStats {
    /// All incidents.
    pub total: usize,
    /// SOS alerts.
    pub sos: usize,
    /// Crime and harassment reports.
    pub critical: usize,
}

impl From<IncidentStats> for ApiIncidentStats {
    fn from(stats: IncidentStats) -> Self {
        Self {
            total: stats.total,
            sos: stats.sos,
            critical: stats.critical,
        }
    }
}

/// Nearby incidents response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiNearbyIncidents {
    /// Incidents, newest first.
    pub incidents: Vec<ApiNearbyIncident>,
    /// Counts over `incidents`.
    pub stats: ApiIncidentStats,
}

impl From<NearbyIncidents> for ApiNearbyIncidents {
    fn from(nearby: NearbyIncidents) -> Self {
        Self {
            incidents: nearby.incidents.into_iter().map(Into::into).collect(),
            stats: nearby.stats.into(),
        }
    }
}

/// A facility near the query center.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiFacility {
    /// Display name.
    pub name: String,
    /// `hospital` or `police`.
    #[serde(rename = "type")]
    pub kind: FacilityKind,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Distance from the query center in whole meters.
    pub distance: f64,
}

impl From<NearbyFacility> for ApiFacility {
    fn from(nearby: NearbyFacility) -> Self {
        Self {
            name: nearby.facility.name,
            kind: nearby.facility.kind,
            latitude: nearby.facility.location.latitude,
            longitude: nearby.facility.location.longitude,
            distance: nearby.distance_meters,
        }
    }
}

/// Error body for failed requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// What went wrong.
    pub error: String,
}

impl ApiError {
    /// Creates an error body.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

/// Display rounding. Levels in API responses are classified from the
/// rounded score so the two always agree.
fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
