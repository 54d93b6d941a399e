//! Whole-area summaries: risk analysis, nearby incidents, nearby facilities.

use std::cmp::Ordering;

use safety_map_geo::haversine_distance_meters;
use safety_map_incident_models::{FacilityKind, GeoPoint, Incident, SafetyFacility};
use safety_map_risk_models::{
    AreaAnalysis, AreaRiskLevel, IncidentStats, NearbyFacility, NearbyIncident, NearbyIncidents,
};

use crate::config::RiskConfig;
use crate::surface::risk_at;

const HOSPITAL_INFRASTRUCTURE_WEIGHT: usize = 2;
const POLICE_INFRASTRUCTURE_WEIGHT: usize = 3;

/// Summarizes risk and safety infrastructure within `radius_meters`.
///
/// The overall score is the risk surface at `center`. `incidents` and
/// `facilities` may extend past the radius; only records inside it are
/// counted.
#[must_use]
pub fn analyze_area(
    center: GeoPoint,
    radius_meters: f64,
    incidents: &[Incident],
    facilities: &[SafetyFacility],
    config: &RiskConfig,
) -> AreaAnalysis {
    let overall_risk_score = risk_at(center, incidents, facilities, config);

    let mut total_incidents = 0;
    let mut critical_incidents = 0;
    for incident in incidents
        .iter()
        .filter(|i| i.is_live() && within(center, i.location, radius_meters))
    {
        total_incidents += 1;
        if incident.is_active_sos() || incident.category.is_critical() {
            critical_incidents += 1;
        }
    }

    let mut nearby_hospitals = 0;
    let mut nearby_police_stations = 0;
    for facility in facilities
        .iter()
        .filter(|f| within(center, f.location, radius_meters))
    {
        match facility.kind {
            FacilityKind::Hospital => nearby_hospitals += 1,
            FacilityKind::Police => nearby_police_stations += 1,
        }
    }

    AreaAnalysis {
        center,
        radius_meters,
        overall_risk_score,
        risk_level: AreaRiskLevel::from_score(overall_risk_score),
        total_incidents,
        critical_incidents,
        safety_infrastructure_score: nearby_hospitals * HOSPITAL_INFRASTRUCTURE_WEIGHT
            + nearby_police_stations * POLICE_INFRASTRUCTURE_WEIGHT,
        nearby_hospitals,
        nearby_police_stations,
    }
}

/// Live incidents within `radius_meters`, newest first, with counts.
#[must_use]
pub fn nearby_incidents(
    center: GeoPoint,
    radius_meters: f64,
    incidents: &[Incident],
) -> NearbyIncidents {
    let mut nearby: Vec<NearbyIncident> = incidents
        .iter()
        .filter(|incident| incident.is_live())
        .filter_map(|incident| {
            let distance = haversine_distance_meters(center, incident.location);
            (distance <= radius_meters).then(|| NearbyIncident {
                incident: incident.clone(),
                distance_meters: distance.round(),
            })
        })
        .collect();
    nearby.sort_by(|a, b| b.incident.timestamp.cmp(&a.incident.timestamp));

    let stats = IncidentStats {
        total: nearby.len(),
        sos: nearby.iter().filter(|n| n.incident.is_sos()).count(),
        critical: nearby
            .iter()
            .filter(|n| n.incident.category.is_critical())
            .count(),
    };

    NearbyIncidents {
        incidents: nearby,
        stats,
    }
}

/// Facilities within `radius_meters`, nearest first.
///
/// A facility is dropped when one of the same kind already kept lies within
/// `facilities.dedup_distance_meters` of it, which collapses duplicate map
/// entries for the same building.
#[must_use]
pub fn nearby_facilities(
    center: GeoPoint,
    radius_meters: f64,
    facilities: &[SafetyFacility],
    config: &RiskConfig,
) -> Vec<NearbyFacility> {
    let mut candidates: Vec<(f64, &SafetyFacility)> = facilities
        .iter()
        .filter_map(|facility| {
            let distance = haversine_distance_meters(center, facility.location);
            (distance <= radius_meters).then_some((distance, facility))
        })
        .collect();
    candidates.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

    let dedup = config.facilities.dedup_distance_meters;
    let mut kept: Vec<NearbyFacility> = Vec::with_capacity(candidates.len());

    for (distance, facility) in candidates {
        let duplicate = kept.iter().any(|existing| {
            existing.facility.kind == facility.kind
                && haversine_distance_meters(existing.facility.location, facility.location) < dedup
        });
        if duplicate {
            log::trace!("Dropping duplicate facility '{}'", facility.name);
            continue;
        }
        kept.push(NearbyFacility {
            facility: facility.clone(),
            distance_meters: distance.round(),
        });
    }

    kept
}

fn within(center: GeoPoint, point: GeoPoint, radius_meters: f64) -> bool {
    haversine_distance_meters(center, point) <= radius_meters
}
