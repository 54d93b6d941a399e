//! Greedy first-fit clustering of incidents into candidate danger zones.
//!
//! Incidents are visited in input order. Each one joins the first existing
//! cluster whose current centroid lies within `cluster.radius_meters`, or
//! starts a new cluster. Clusters are never merged or revisited, so the
//! result depends on input order.

use chrono::{DateTime, Duration, Utc};
use safety_map_geo::haversine_distance_meters;
use safety_map_incident_models::{GeoPoint, Incident};
use safety_map_risk_models::IncidentCluster;

use crate::config::RiskConfig;

/// Running weighted coordinate sums for one cluster under construction.
struct Accumulator {
    cluster: IncidentCluster,
    weighted_latitude: f64,
    weighted_longitude: f64,
    weight_sum: f64,
}

impl Accumulator {
    fn new(incident: Incident, weight: f64) -> Self {
        let mut accumulator = Self {
            cluster: IncidentCluster {
                centroid: incident.location,
                members: Vec::new(),
                total_count: 0,
                sos_count: 0,
                critical_count: 0,
            },
            weighted_latitude: 0.0,
            weighted_longitude: 0.0,
            weight_sum: 0.0,
        };
        accumulator.push(incident, weight);
        accumulator
    }

    fn push(&mut self, incident: Incident, weight: f64) {
        self.weighted_latitude += incident.location.latitude * weight;
        self.weighted_longitude += incident.location.longitude * weight;
        self.weight_sum += weight;

        // Zero-weight members cannot move the centroid.
        if self.weight_sum > 0.0 {
            self.cluster.centroid = GeoPoint::new(
                self.weighted_latitude / self.weight_sum,
                self.weighted_longitude / self.weight_sum,
            );
        }

        self.cluster.total_count += 1;
        if incident.is_sos() {
            self.cluster.sos_count += 1;
        }
        if incident.category.is_critical() {
            self.cluster.critical_count += 1;
        }
        self.cluster.members.push(incident);
    }
}

/// Weight an incident contributes to its cluster's centroid.
#[must_use]
pub fn cluster_weight(incident: &Incident, config: &RiskConfig) -> f64 {
    if incident.is_active_sos() {
        config.cluster.sos_weight
    } else {
        config.severity.severity(incident.category)
    }
}

/// Groups `incidents` by first-fit proximity. Every cluster is returned,
/// singletons included.
#[must_use]
pub fn cluster(incidents: &[Incident], config: &RiskConfig) -> Vec<IncidentCluster> {
    cluster_weighted(
        incidents
            .iter()
            .map(|incident| (incident, cluster_weight(incident, config))),
        config.cluster.radius_meters,
    )
}

/// First-fit clustering over incidents paired with their centroid weights.
fn cluster_weighted<'a>(
    weighted: impl IntoIterator<Item = (&'a Incident, f64)>,
    radius: f64,
) -> Vec<IncidentCluster> {
    let mut accumulators: Vec<Accumulator> = Vec::new();
    let mut visited = 0_usize;

    for (incident, weight) in weighted {
        visited += 1;
        let existing = accumulators.iter_mut().find(|acc| {
            haversine_distance_meters(acc.cluster.centroid, incident.location) <= radius
        });

        match existing {
            Some(acc) => acc.push(incident.clone(), weight),
            None => accumulators.push(Accumulator::new(incident.clone(), weight)),
        }
    }

    log::debug!(
        "Formed {} clusters from {visited} incidents",
        accumulators.len()
    );

    accumulators.into_iter().map(|acc| acc.cluster).collect()
}

/// Clusters `incidents` and keeps only those large enough to be danger zones.
#[must_use]
pub fn danger_clusters(incidents: &[Incident], config: &RiskConfig) -> Vec<IncidentCluster> {
    cluster(incidents, config)
        .into_iter()
        .filter(IncidentCluster::is_danger_zone)
        .collect()
}

/// Scores a cluster from its member counts.
///
/// `total + 5·sos + 3·critical + 1.5·recent` with the default weights, where
/// recent members were reported within `recent_window_days` of `now`.
/// Clamped to `[0, max_score]`.
#[must_use]
pub fn cluster_risk_score(cluster: &IncidentCluster, now: DateTime<Utc>, config: &RiskConfig) -> f64 {
    let weights = &config.cluster;
    let cutoff = now - Duration::days(i64::from(weights.recent_window_days));
    let recent = cluster
        .members
        .iter()
        .filter(|member| member.timestamp >= cutoff)
        .count();

    let score = count(cluster.total_count).mul_add(
        weights.count_weight,
        count(cluster.sos_count).mul_add(
            weights.sos_count_weight,
            count(cluster.critical_count).mul_add(
                weights.critical_count_weight,
                count(recent) * weights.recent_count_weight,
            ),
        ),
    );

    score.clamp(0.0, config.max_score)
}

#[allow(clippy::cast_precision_loss)]
const fn count(n: usize) -> f64 {
    n as f64
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use safety_map_incident_models::IncidentCategory;

    use super::*;

    const ORIGIN: GeoPoint = GeoPoint::new(19.0760, 72.8777);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn north(meters: f64) -> GeoPoint {
        GeoPoint::new(ORIGIN.latitude + meters / 111_195.0, ORIGIN.longitude)
    }

    fn incident_at(category: IncidentCategory, location: GeoPoint, days_ago: i64) -> Incident {
        Incident::new(location, category, now() - Duration::days(days_ago))
    }

    #[test]
    fn two_nearby_crimes_form_one_cluster() {
        let config = RiskConfig::default();
        let incidents = [
            incident_at(IncidentCategory::Crime, ORIGIN, 60),
            incident_at(IncidentCategory::Crime, north(100.0), 60),
        ];
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 1);

        let c = &clusters[0];
        assert_eq!(c.total_count, 2);
        assert_eq!(c.critical_count, 2);
        assert_eq!(c.sos_count, 0);
        assert!(c.is_danger_zone());

        // 2 members + 3 × 2 critical, nothing recent.
        assert!((cluster_risk_score(c, now(), &config) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn recent_members_add_to_score() {
        let config = RiskConfig::default();
        let incidents = [
            incident_at(IncidentCategory::Crime, ORIGIN, 1),
            incident_at(IncidentCategory::Crime, north(100.0), 30),
        ];
        let clusters = cluster(&incidents, &config);
        // Both fall inside the 30-day window (inclusive).
        assert!((cluster_risk_score(&clusters[0], now(), &config) - 11.0).abs() < 1e-12);
    }

    #[test]
    fn far_apart_incidents_stay_singletons() {
        let config = RiskConfig::default();
        let incidents = [
            incident_at(IncidentCategory::Safety, ORIGIN, 5),
            incident_at(IncidentCategory::Harassment, north(1_000.0), 5),
            incident_at(IncidentCategory::Other, north(2_000.0), 5),
        ];
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(|c| c.total_count == 1));
        assert!(danger_clusters(&incidents, &config).is_empty());
    }

    #[test]
    fn centroid_is_severity_weighted() {
        let config = RiskConfig::default();
        let incidents = [
            incident_at(IncidentCategory::Crime, ORIGIN, 5),
            incident_at(IncidentCategory::Other, north(200.0), 5),
        ];
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 1);

        let expected = (ORIGIN.latitude * 8.0 + north(200.0).latitude * 2.0) / 10.0;
        assert!((clusters[0].centroid.latitude - expected).abs() < 1e-12);
        assert!((clusters[0].centroid.longitude - ORIGIN.longitude).abs() < 1e-12);
    }

    #[test]
    fn sos_members_are_counted_and_weighted() {
        let config = RiskConfig::default();
        let incidents = [
            incident_at(IncidentCategory::Crime, ORIGIN, 2),
            incident_at(IncidentCategory::Sos, north(200.0), 0),
        ];
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].sos_count, 1);
        assert_eq!(clusters[0].critical_count, 1);

        let expected = (ORIGIN.latitude * 8.0 + north(200.0).latitude * 10.0) / 18.0;
        assert!((clusters[0].centroid.latitude - expected).abs() < 1e-12);

        // 2 members + 5 × 1 sos + 3 × 1 critical + 1.5 × 2 recent.
        assert!((cluster_risk_score(&clusters[0], now(), &config) - 13.0).abs() < 1e-12);
    }

    #[test]
    fn first_fit_depends_on_input_order() {
        let config = RiskConfig::default();
        let a = incident_at(IncidentCategory::Crime, ORIGIN, 5);
        let b = incident_at(IncidentCategory::Crime, north(250.0), 5);
        let c = incident_at(IncidentCategory::Crime, north(500.0), 5);

        let from_south = cluster(&[a.clone(), b.clone(), c.clone()], &config);
        let from_north = cluster(&[c, b, a], &config);

        assert_eq!(from_south.len(), 2);
        assert_eq!(from_north.len(), 2);
        // The middle incident sides with whichever neighbour came first.
        assert_eq!(from_south[1].members[0].location, north(500.0));
        assert_eq!(from_north[1].members[0].location, ORIGIN);
    }

    #[test]
    fn reclustering_centroids_does_not_add_clusters() {
        let config = RiskConfig::default();
        let incidents: Vec<Incident> = [
            (IncidentCategory::Crime, 0.0),
            (IncidentCategory::Sos, 90.0),
            (IncidentCategory::Infrastructure, 180.0),
            (IncidentCategory::Harassment, 420.0),
            (IncidentCategory::Safety, 700.0),
            (IncidentCategory::Crime, 760.0),
            (IncidentCategory::Other, 1_000.0),
            (IncidentCategory::Sos, 1_600.0),
            (IncidentCategory::Crime, 2_900.0),
        ]
        .into_iter()
        .map(|(category, m)| incident_at(category, north(m), 3))
        .collect();
        let first = cluster(&incidents, &config);

        // Each cluster becomes one incident at its centroid carrying the
        // summed weight of its members.
        let aggregates: Vec<(Incident, f64)> = first
            .iter()
            .map(|c| {
                let weight: f64 = c.members.iter().map(|m| cluster_weight(m, &config)).sum();
                (incident_at(IncidentCategory::Crime, c.centroid, 3), weight)
            })
            .collect();
        let second = cluster_weighted(
            aggregates.iter().map(|(incident, weight)| (incident, *weight)),
            config.cluster.radius_meters,
        );
        assert!(second.len() <= first.len());
    }

    #[test]
    fn cluster_score_is_clamped() {
        let config = RiskConfig::default();
        let incidents: Vec<Incident> = (0..6)
            .map(|_| incident_at(IncidentCategory::Sos, ORIGIN, 0))
            .collect();
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 1);
        assert!((cluster_risk_score(&clusters[0], now(), &config) - 15.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_weight_members_keep_centroid() {
        let mut config = RiskConfig::default();
        config.severity.other = 0.0;
        let incidents = [
            incident_at(IncidentCategory::Other, ORIGIN, 5),
            incident_at(IncidentCategory::Other, north(100.0), 5),
        ];
        let clusters = cluster(&incidents, &config);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].centroid, ORIGIN);
        assert!(clusters[0].centroid.latitude.is_finite());
    }
}
