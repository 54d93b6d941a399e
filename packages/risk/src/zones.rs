//! Safe and danger zone overlays around a query point.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use safety_map_geo::haversine_distance_meters;
use safety_map_incident_models::{FacilityKind, GeoPoint, Incident, SafetyFacility};
use safety_map_risk_models::{DangerLevel, IncidentCluster, SafetyZone, SafetyZones, ZoneType};

use crate::cluster::{cluster_risk_score, danger_clusters};
use crate::config::{RiskConfig, ZoneConfig};

/// Builds the zone overlays for everything within `radius_meters` of
/// `center`.
///
/// Safe zones surround each hospital and police station in range, nearest
/// first. Danger zones surround each cluster of two or more live incidents
/// in range, highest score first. Both lists are then capped.
#[must_use]
pub fn build_safety_zones(
    center: GeoPoint,
    radius_meters: f64,
    incidents: &[Incident],
    facilities: &[SafetyFacility],
    now: DateTime<Utc>,
    config: &RiskConfig,
) -> SafetyZones {
    let zones = &config.zones;

    let mut safe: Vec<(f64, SafetyZone)> = facilities
        .iter()
        .filter_map(|facility| {
            let distance = haversine_distance_meters(center, facility.location);
            (distance <= radius_meters).then(|| (distance, safe_zone(facility, zones)))
        })
        .collect();
    safe.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));
    let mut safe_zones: Vec<SafetyZone> = safe.into_iter().map(|(_, zone)| zone).collect();
    safe_zones.truncate(zones.max_safe_zones);

    let in_range: Vec<Incident> = incidents
        .iter()
        .filter(|incident| {
            incident.is_live()
                && haversine_distance_meters(center, incident.location) <= radius_meters
        })
        .cloned()
        .collect();

    let mut danger_zones: Vec<SafetyZone> = danger_clusters(&in_range, config)
        .iter()
        .map(|cluster| danger_zone(cluster, now, config))
        .collect();
    danger_zones.sort_by(|a, b| {
        b.risk_score
            .partial_cmp(&a.risk_score)
            .unwrap_or(Ordering::Equal)
    });
    danger_zones.truncate(zones.max_danger_zones);

    log::debug!(
        "Built {} safe zones and {} danger zones from {} incidents",
        safe_zones.len(),
        danger_zones.len(),
        in_range.len()
    );

    SafetyZones {
        safe_zones,
        danger_zones,
    }
}

fn safe_zone(facility: &SafetyFacility, zones: &ZoneConfig) -> SafetyZone {
    let (radius_meters, risk_score) = match facility.kind {
        FacilityKind::Hospital => (zones.hospital_radius_meters, zones.hospital_risk_score),
        FacilityKind::Police => (zones.police_radius_meters, zones.police_risk_score),
    };
    let name = if facility.name.trim().is_empty() {
        facility.kind.as_ref()
    } else {
        facility.name.as_str()
    };

    SafetyZone {
        zone_type: ZoneType::Safe,
        center: facility.location,
        radius_meters,
        risk_score,
        danger_level: None,
        reason: format!("Safe zone around {name}"),
        facility_kind: Some(facility.kind),
        incident_count: None,
        sos_count: None,
        critical_count: None,
    }
}

fn danger_zone(cluster: &IncidentCluster, now: DateTime<Utc>, config: &RiskConfig) -> SafetyZone {
    let risk_score = cluster_risk_score(cluster, now, config);
    let level = DangerLevel::from_score(risk_score);

    SafetyZone {
        zone_type: ZoneType::Danger,
        center: cluster.centroid,
        radius_meters: danger_radius(level, &config.zones),
        risk_score,
        danger_level: Some(level),
        reason: format!("{} incidents reported in this area", cluster.total_count),
        facility_kind: None,
        incident_count: Some(cluster.total_count),
        sos_count: Some(cluster.sos_count),
        critical_count: Some(cluster.critical_count),
    }
}

/// Display radius for a danger zone of the given level.
#[must_use]
pub const fn danger_radius(level: DangerLevel, zones: &ZoneConfig) -> f64 {
    match level {
        DangerLevel::Critical => zones.critical_radius_meters,
        DangerLevel::High => zones.high_radius_meters,
        DangerLevel::Medium => zones.medium_radius_meters,
    }
}
