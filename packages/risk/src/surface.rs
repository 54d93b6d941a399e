//! Distance-decayed risk score at an arbitrary point.
//!
//! Each nearby incident adds its weight scaled by
//! `exp(-d / (search_radius × decay_fraction))`, so influence fades smoothly
//! toward the search radius instead of dropping off a cliff. Nearby
//! hospitals and police stations then subtract their own decayed discount.
//! The result is clamped to `[0, max_score]`.
//!
//! [`risk_at`] scans its inputs linearly. [`RiskSurface`] indexes the same
//! inputs in R-trees so that repeated evaluations (the choropleth grid)
//! only visit records near each point.

use rstar::{AABB, RTree, RTreeObject};
use safety_map_geo::{bounding_box, haversine_distance_meters};
use safety_map_incident_models::{BoundingBox, FacilityKind, GeoPoint, Incident, SafetyFacility};

use crate::config::{FacilityInfluence, RiskConfig};

/// Scores `point` against every incident and facility given.
///
/// Closed SOS alerts contribute nothing. Open SOS alerts use
/// `surface.sos_weight` instead of their severity. Hospitals are applied
/// before police stations and the running score never drops below zero.
#[must_use]
pub fn risk_at(
    point: GeoPoint,
    incidents: &[Incident],
    facilities: &[SafetyFacility],
    config: &RiskConfig,
) -> f64 {
    score_point(point, incidents.iter(), facilities.iter(), config)
}

fn score_point<'a>(
    point: GeoPoint,
    incidents: impl Iterator<Item = &'a Incident>,
    facilities: impl Iterator<Item = &'a SafetyFacility> + Clone,
    config: &RiskConfig,
) -> f64 {
    let surface = &config.surface;
    let decay_length = surface.decay_length_meters();
    let mut score = 0.0;

    for incident in incidents {
        let weight = if incident.is_sos() {
            if !incident.active {
                continue;
            }
            surface.sos_weight
        } else {
            config.severity.severity(incident.category)
        };

        let distance = haversine_distance_meters(point, incident.location);
        if distance <= surface.search_radius_meters {
            score += weight * (-distance / decay_length).exp();
        }
    }

    score = apply_discount(
        score,
        point,
        facilities.clone().filter(|f| f.kind == FacilityKind::Hospital),
        &surface.hospital,
    );
    score = apply_discount(
        score,
        point,
        facilities.filter(|f| f.kind == FacilityKind::Police),
        &surface.police,
    );

    score.clamp(0.0, config.max_score)
}

fn apply_discount<'a>(
    mut score: f64,
    point: GeoPoint,
    facilities: impl Iterator<Item = &'a SafetyFacility>,
    influence: &FacilityInfluence,
) -> f64 {
    for facility in facilities {
        let distance = haversine_distance_meters(point, facility.location);
        if distance <= influence.influence_radius_meters {
            let discount = (-distance / influence.decay_meters).exp() * influence.weight;
            score = (score - discount).max(0.0);
        }
    }
    score
}

/// A borrowed record in an R-tree keyed by its `[lon, lat]` point.
struct Indexed<'a, T> {
    envelope: AABB<[f64; 2]>,
    record: &'a T,
}

impl<'a, T> Indexed<'a, T> {
    fn new(location: GeoPoint, record: &'a T) -> Self {
        Self {
            envelope: AABB::from_point([location.longitude, location.latitude]),
            record,
        }
    }
}

impl<T> RTreeObject for Indexed<'_, T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Spatially indexed view over a snapshot for repeated point scoring.
pub struct RiskSurface<'a> {
    config: &'a RiskConfig,
    incidents: RTree<Indexed<'a, Incident>>,
    facilities: RTree<Indexed<'a, SafetyFacility>>,
}

impl<'a> RiskSurface<'a> {
    /// Indexes the given records. Closed SOS alerts are dropped up front.
    #[must_use]
    pub fn new(
        incidents: &'a [Incident],
        facilities: &'a [SafetyFacility],
        config: &'a RiskConfig,
    ) -> Self {
        let incidents = incidents
            .iter()
            .filter(|incident| incident.is_live())
            .map(|incident| Indexed::new(incident.location, incident))
            .collect();
        let facilities = facilities
            .iter()
            .map(|facility| Indexed::new(facility.location, facility))
            .collect();

        Self {
            config,
            incidents: RTree::bulk_load(incidents),
            facilities: RTree::bulk_load(facilities),
        }
    }

    /// The configuration this surface scores with.
    #[must_use]
    pub const fn config(&self) -> &'a RiskConfig {
        self.config
    }

    /// Same result as [`risk_at`] over the indexed records.
    #[must_use]
    pub fn risk_at(&self, point: GeoPoint) -> f64 {
        let surface = &self.config.surface;

        let incident_box = bounding_box(point, surface.search_radius_meters);
        let facility_box = bounding_box(
            point,
            surface
                .hospital
                .influence_radius_meters
                .max(surface.police.influence_radius_meters),
        );

        let nearby_facilities: Vec<&SafetyFacility> = self
            .facilities
            .locate_in_envelope(&to_envelope(&facility_box))
            .map(|entry| entry.record)
            .collect();

        score_point(
            point,
            self.incidents
                .locate_in_envelope(&to_envelope(&incident_box))
                .map(|entry| entry.record),
            nearby_facilities.iter().copied(),
            self.config,
        )
    }
}

fn to_envelope(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat])
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone as _, Utc};
    use safety_map_incident_models::IncidentCategory;

    use super::*;

    const CENTER: GeoPoint = GeoPoint::new(28.6139, 77.2090);

    /// Point roughly `meters` north of `CENTER`.
    fn north(meters: f64) -> GeoPoint {
        GeoPoint::new(CENTER.latitude + meters / 111_195.0, CENTER.longitude)
    }

    fn incident(category: IncidentCategory, location: GeoPoint) -> Incident {
        Incident::new(
            location,
            category,
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        )
    }

    fn hospital(location: GeoPoint) -> SafetyFacility {
        SafetyFacility::new("General Hospital", location, FacilityKind::Hospital)
    }

    fn police(location: GeoPoint) -> SafetyFacility {
        SafetyFacility::new("Central Station", location, FacilityKind::Police)
    }

    #[test]
    fn empty_inputs_score_zero() {
        assert!(risk_at(CENTER, &[], &[], &RiskConfig::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn coincident_open_sos_scores_exactly_twelve() {
        let incidents = [incident(IncidentCategory::Sos, CENTER)];
        let score = risk_at(CENTER, &incidents, &[], &RiskConfig::default());
        assert!((score - 12.0).abs() < 1e-12, "got {score}");
    }

    #[test]
    fn closed_sos_contributes_nothing() {
        let mut sos = incident(IncidentCategory::Sos, CENTER);
        sos.active = false;
        assert!(risk_at(CENTER, &[sos], &[], &RiskConfig::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn coincident_report_scores_its_severity() {
        let incidents = [incident(IncidentCategory::Harassment, CENTER)];
        let score = risk_at(CENTER, &incidents, &[], &RiskConfig::default());
        assert!((score - 7.0).abs() < 1e-12);
    }

    #[test]
    fn decay_follows_exponential_curve() {
        let location = north(75.0);
        let distance = haversine_distance_meters(CENTER, location);
        let incidents = [incident(IncidentCategory::Crime, location)];
        let score = risk_at(CENTER, &incidents, &[], &RiskConfig::default());
        let expected = 8.0 * (-distance / 75.0).exp();
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn incidents_beyond_search_radius_are_ignored() {
        let incidents = [incident(IncidentCategory::Crime, north(260.0))];
        assert!(risk_at(CENTER, &incidents, &[], &RiskConfig::default()).abs() < f64::EPSILON);
    }

    #[test]
    fn unrecognized_category_uses_fallback_severity() {
        let mut config = RiskConfig::default();
        config.severity.fallback = 4.0;
        let incidents = [incident(IncidentCategory::Unrecognized, CENTER)];
        let score = risk_at(CENTER, &incidents, &[], &config);
        assert!((score - 4.0).abs() < 1e-12);
    }

    #[test]
    fn score_is_clamped_to_max() {
        let incidents: Vec<Incident> = (0..10)
            .map(|_| incident(IncidentCategory::Sos, CENTER))
            .collect();
        let score = risk_at(CENTER, &incidents, &[], &RiskConfig::default());
        assert!((score - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn facilities_never_push_score_negative() {
        let incidents = [incident(IncidentCategory::Other, north(50.0))];
        let facilities = [hospital(CENTER), police(CENTER)];
        let score = risk_at(CENTER, &incidents, &facilities, &RiskConfig::default());
        assert!(score.abs() < f64::EPSILON);
    }

    #[test]
    fn hospital_discount_uses_its_decay() {
        let incidents = [incident(IncidentCategory::Sos, CENTER)];
        let location = north(100.0);
        let distance = haversine_distance_meters(CENTER, location);
        let score = risk_at(
            CENTER,
            &incidents,
            &[hospital(location)],
            &RiskConfig::default(),
        );
        let expected = 12.0 - (-distance / 200.0).exp() * 4.0;
        assert!((score - expected).abs() < 1e-9);
    }

    #[test]
    fn police_beyond_influence_radius_are_ignored() {
        let incidents = [incident(IncidentCategory::Sos, CENTER)];
        let score = risk_at(
            CENTER,
            &incidents,
            &[police(north(710.0))],
            &RiskConfig::default(),
        );
        assert!((score - 12.0).abs() < 1e-12);
    }

    #[test]
    fn adding_incidents_never_lowers_score() {
        let config = RiskConfig::default();
        let facilities = [hospital(north(150.0))];
        let mut incidents = Vec::new();
        let mut previous = risk_at(CENTER, &incidents, &facilities, &config);

        for (i, category) in (0_u32..).zip(IncidentCategory::all().iter().cycle().take(18)) {
            incidents.push(incident(*category, north(f64::from(i) * 12.0)));
            let score = risk_at(CENTER, &incidents, &facilities, &config);
            assert!(score + 1e-12 >= previous, "score fell from {previous} to {score}");
            previous = score;
        }
    }

    #[test]
    fn adding_facilities_never_raises_score() {
        let config = RiskConfig::default();
        let incidents = [
            incident(IncidentCategory::Crime, CENTER),
            incident(IncidentCategory::Sos, north(40.0)),
        ];
        let mut facilities = Vec::new();
        let mut previous = risk_at(CENTER, &incidents, &facilities, &config);

        for i in 0..6 {
            let location = north(f64::from(i) * 90.0);
            facilities.push(if i % 2 == 0 { hospital(location) } else { police(location) });
            let score = risk_at(CENTER, &incidents, &facilities, &config);
            assert!(score <= previous + 1e-12, "score rose from {previous} to {score}");
            previous = score;
        }
    }

    #[test]
    fn indexed_surface_matches_linear_scan() {
        let config = RiskConfig::default();
        let mut closed = incident(IncidentCategory::Sos, north(30.0));
        closed.active = false;
        let incidents = vec![
            incident(IncidentCategory::Crime, north(20.0)),
            incident(IncidentCategory::Safety, north(180.0)),
            incident(IncidentCategory::Sos, north(240.0)),
            incident(IncidentCategory::Infrastructure, north(400.0)),
            closed,
        ];
        let facilities = vec![hospital(north(500.0)), police(north(-650.0))];
        let surface = RiskSurface::new(&incidents, &facilities, &config);

        for meters in [-300.0, -100.0, 0.0, 50.0, 200.0, 350.0] {
            let point = north(meters);
            let linear = risk_at(point, &incidents, &facilities, &config);
            let indexed = surface.risk_at(point);
            assert!(
                (linear - indexed).abs() < 1e-9,
                "mismatch at {meters}m: {linear} vs {indexed}"
            );
        }
    }
}
