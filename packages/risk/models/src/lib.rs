#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Result types produced by the risk engine.
//!
//! Everything here is computed per query and never persisted: grid samples
//! for the choropleth layer, incident clusters, the safe/danger zone
//! overlays, and the area summaries. The API layer in
//! `safety_map_server_models` maps these onto its wire types.

use safety_map_incident_models::{FacilityKind, GeoPoint, Incident, SafetyFacility};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Seven-step classification of a grid cell's risk score.
///
/// Variants are ordered from safest to most dangerous.
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
pub enum RiskLevel {
    /// Score below 0.5.
    Safe,
    /// Score in `[0.5, 2)`.
    Low,
    /// Score in `[2, 4)`.
    #[serde(rename = "Low-Medium")]
    #[strum(serialize = "Low-Medium")]
    LowMedium,
    /// Score in `[4, 6)`.
    Medium,
    /// Score in `[6, 9)`.
    #[serde(rename = "Medium-High")]
    #[strum(serialize = "Medium-High")]
    MediumHigh,
    /// Score in `[9, 12)`.
    High,
    /// Score of 12 or more.
    Critical,
}

impl RiskLevel {
    /// Classifies a score. Lower bounds are inclusive.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 12.0 {
            Self::Critical
        } else if score >= 9.0 {
            Self::High
        } else if score >= 6.0 {
            Self::MediumHigh
        } else if score >= 4.0 {
            Self::Medium
        } else if score >= 2.0 {
            Self::LowMedium
        } else if score >= 0.5 {
            Self::Low
        } else {
            Self::Safe
        }
    }

    /// Fill opacity for choropleth rendering.
    #[must_use]
    pub const fn opacity(self) -> f64 {
        match self {
            Self::Critical => 0.8,
            Self::High => 0.7,
            Self::MediumHigh => 0.6,
            Self::Medium => 0.45,
            Self::LowMedium => 0.35,
            Self::Low => 0.25,
            Self::Safe => 0.15,
        }
    }

    /// Fill color for choropleth rendering.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Critical => "#7f1d1d",
            Self::High => "#dc2626",
            Self::MediumHigh => "#ea580c",
            Self::Medium => "#f59e0b",
            Self::LowMedium => "#eab308",
            Self::Low => "#84cc16",
            Self::Safe => "#22c55e",
        }
    }

    /// Returns all variants of this enum, safest first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Safe,
            Self::Low,
            Self::LowMedium,
            Self::Medium,
            Self::MediumHigh,
            Self::High,
            Self::Critical,
        ]
    }
}

/// One classified lattice point of the risk surface.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSample {
    /// Lattice point.
    pub location: GeoPoint,
    /// Risk score in `[0, 15]`.
    pub score: f64,
    /// Discrete level derived from `score`.
    pub level: RiskLevel,
}

impl RiskSample {
    /// Creates a sample, deriving the level from the score.
    #[must_use]
    pub fn new(location: GeoPoint, score: f64) -> Self {
        Self {
            location,
            score,
            level: RiskLevel::from_score(score),
        }
    }
}

/// A group of nearby incidents formed by first-fit clustering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncidentCluster {
    /// Severity-weighted mean of member coordinates.
    pub centroid: GeoPoint,
    /// Members in the order they joined.
    pub members: Vec<Incident>,
    /// Number of members.
    pub total_count: usize,
    /// Number of SOS members.
    pub sos_count: usize,
    /// Number of crime or harassment members.
    pub critical_count: usize,
}

impl IncidentCluster {
    /// Clusters with fewer members than this are not danger zones.
    pub const MIN_DANGER_ZONE_SIZE: usize = 2;

    /// Whether this cluster is large enough to be shown as a danger zone.
    #[must_use]
    pub const fn is_danger_zone(&self) -> bool {
        self.total_count >= Self::MIN_DANGER_ZONE_SIZE
    }
}

/// Severity bucket for a danger zone.
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
#[strum(serialize_all = "lowercase")]
pub enum DangerLevel {
    /// Cluster score below 4.
    Medium,
    /// Cluster score in `[4, 7)`.
    High,
    /// Cluster score of 7 or more.
    Critical,
}

impl DangerLevel {
    /// Buckets a cluster risk score. Lower bounds are inclusive.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 7.0 {
            Self::Critical
        } else if score >= 4.0 {
            Self::High
        } else {
            Self::Medium
        }
    }
}

/// Whether a zone marks a refuge or a hazard.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneType {
    /// Area around a hospital or police station.
    Safe,
    /// Area around a multi-incident cluster.
    Danger,
}

/// A circular overlay for the safety map.
///
/// This is a display artifact recomputed on demand, not an administrative
/// record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetyZone {
    /// Safe or danger.
    pub zone_type: ZoneType,
    /// Circle center.
    pub center: GeoPoint,
    /// Circle radius in meters.
    pub radius_meters: f64,
    /// Score shown for the zone.
    pub risk_score: f64,
    /// Bucket for danger zones, `None` for safe zones.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub danger_level: Option<DangerLevel>,
    /// Human-readable explanation.
    pub reason: String,
    /// Facility type behind a safe zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facility_kind: Option<FacilityKind>,
    /// Incidents behind a danger zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub incident_count: Option<usize>,
    /// SOS alerts behind a danger zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sos_count: Option<usize>,
    /// Crime/harassment reports behind a danger zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub critical_count: Option<usize>,
}

/// The zone overlays for one query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafetyZones {
    /// Zones around facilities, nearest first.
    pub safe_zones: Vec<SafetyZone>,
    /// Zones around incident clusters, highest risk first.
    pub danger_zones: Vec<SafetyZone>,
}

/// Coarse five-step classification used for whole-area summaries.
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
pub enum AreaRiskLevel {
    /// Score below 2.
    Safe,
    /// Score in `[2, 4)`.
    Low,
    /// Score in `[4, 7)`.
    Medium,
    /// Score in `[7, 10)`.
    High,
    /// Score of 10 or more.
    Critical,
}

impl AreaRiskLevel {
    /// Classifies an area score. Lower bounds are inclusive.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 10.0 {
            Self::Critical
        } else if score >= 7.0 {
            Self::High
        } else if score >= 4.0 {
            Self::Medium
        } else if score >= 2.0 {
            Self::Low
        } else {
            Self::Safe
        }
    }

    /// Badge color for the level.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Critical => "#dc2626",
            Self::High => "#ea580c",
            Self::Medium => "#f59e0b",
            Self::Low => "#84cc16",
            Self::Safe => "#22c55e",
        }
    }
}

/// Summary of risk and infrastructure around a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaAnalysis {
    /// Query center.
    pub center: GeoPoint,
    /// Query radius in meters.
    pub radius_meters: f64,
    /// Risk surface value at the center.
    pub overall_risk_score: f64,
    /// Coarse level for `overall_risk_score`.
    pub risk_level: AreaRiskLevel,
    /// Reports plus open SOS alerts within the radius.
    pub total_incidents: usize,
    /// Crime/harassment reports plus open SOS alerts within the radius.
    pub critical_incidents: usize,
    /// `2 × hospitals + 3 × police stations` within the radius.
    pub safety_infrastructure_score: usize,
    /// Hospitals within the radius.
    pub nearby_hospitals: usize,
    /// Police stations within the radius.
    pub nearby_police_stations: usize,
}

/// An incident annotated with its distance from the query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyIncident {
    /// The incident.
    pub incident: Incident,
    /// Distance from the query center, rounded to whole meters.
    pub distance_meters: f64,
}

/// Counts over a set of nearby incidents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncidentStats {
    /// All incidents.
    pub total: usize,
    /// SOS alerts.
    pub sos: usize,
    /// Crime and harassment reports.
    pub critical: usize,
}

/// Incidents around a point, newest first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NearbyIncidents {
    /// Incidents within the radius.
    pub incidents: Vec<NearbyIncident>,
    /// Counts over `incidents`.
    pub stats: IncidentStats,
}

/// A facility annotated with its distance from the query center.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyFacility {
    /// The facility.
    pub facility: SafetyFacility,
    /// Distance from the query center, rounded to whole meters.
    pub distance_meters: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_level_boundaries_are_inclusive() {
        assert_eq!(RiskLevel::from_score(6.0), RiskLevel::MediumHigh);
        assert_eq!(RiskLevel::from_score(11.999), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(12.0), RiskLevel::Critical);
        assert_eq!(RiskLevel::from_score(0.5), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.499), RiskLevel::Safe);
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Safe);
    }

    #[test]
    fn risk_level_order_matches_opacity() {
        for pair in RiskLevel::all().windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].opacity() < pair[1].opacity());
        }
    }

    #[test]
    fn risk_level_names_use_hyphens() {
        assert_eq!(RiskLevel::LowMedium.to_string(), "Low-Medium");
        assert_eq!(
            serde_json::to_value(RiskLevel::MediumHigh).unwrap(),
            serde_json::json!("Medium-High")
        );
        assert_eq!(
            "Medium-High".parse::<RiskLevel>().unwrap(),
            RiskLevel::MediumHigh
        );
    }

    #[test]
    fn danger_level_buckets() {
        assert_eq!(DangerLevel::from_score(7.0), DangerLevel::Critical);
        assert_eq!(DangerLevel::from_score(6.99), DangerLevel::High);
        assert_eq!(DangerLevel::from_score(4.0), DangerLevel::High);
        assert_eq!(DangerLevel::from_score(3.5), DangerLevel::Medium);
    }

    #[test]
    fn area_risk_level_buckets() {
        assert_eq!(AreaRiskLevel::from_score(10.0), AreaRiskLevel::Critical);
        assert_eq!(AreaRiskLevel::from_score(9.9), AreaRiskLevel::High);
        assert_eq!(AreaRiskLevel::from_score(1.99), AreaRiskLevel::Safe);
    }

    #[test]
    fn safe_zone_omits_cluster_fields() {
        let zone = SafetyZone {
            zone_type: ZoneType::Safe,
            center: GeoPoint::new(1.0, 2.0),
            radius_meters: 400.0,
            risk_score: 0.2,
            danger_level: None,
            reason: "Safe zone around City Hospital".to_string(),
            facility_kind: Some(FacilityKind::Hospital),
            incident_count: None,
            sos_count: None,
            critical_count: None,
        };
        let json = serde_json::to_value(&zone).unwrap();
        assert_eq!(json["zone_type"], "safe");
        assert_eq!(json["facility_kind"], "hospital");
        assert!(json.get("danger_level").is_none());
        assert!(json.get("incident_count").is_none());
    }
}
