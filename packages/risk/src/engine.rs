//! Store-backed facade that validates queries and runs the algorithms.

use chrono::{DateTime, Utc};
use safety_map_geo::{ValidationError, bounding_box, validate_point, validate_radius};
use safety_map_incident_models::{FacilityKind, GeoPoint, Incident, SafetyFacility};
use safety_map_risk_models::{
    AreaAnalysis, NearbyFacility, NearbyIncidents, RiskSample, SafetyZones,
};
use safety_map_store::IncidentStore;

use crate::config::RiskConfig;
use crate::surface::RiskSurface;
use crate::{RiskError, area, grid, zones};

/// Records fetched for one query.
struct Fetched {
    incidents: Vec<Incident>,
    facilities: Vec<SafetyFacility>,
}

/// Risk engine bound to a record store and a validated configuration.
///
/// Every query validates its center and radius, pulls the records in the
/// surrounding bounding box from the store, and runs the matching
/// algorithm. The engine holds no mutable state and can be shared across
/// threads behind an `Arc`.
pub struct SafetyEngine<S> {
    store: S,
    config: RiskConfig,
}

impl<S: IncidentStore> SafetyEngine<S> {
    /// Creates an engine after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Config`] if a config value is out of range.
    pub fn new(store: S, config: RiskConfig) -> Result<Self, RiskError> {
        config.validate()?;
        Ok(Self { store, config })
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// The underlying record store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Risk score at a single point.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for out-of-range coordinates, or
    /// [`RiskError::Store`] if the store query fails.
    pub fn risk_at(&self, point: GeoPoint) -> Result<f64, RiskError> {
        let point = validate(point)?;
        let fetched = self.fetch(point, 0.0)?;
        let surface = RiskSurface::new(&fetched.incidents, &fetched.facilities, &self.config);
        Ok(surface.risk_at(point))
    }

    /// Choropleth samples within `radius_meters` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for bad coordinates, a non-positive
    /// radius, a radius above `grid.max_radius_meters`, or a lattice larger
    /// than `grid.max_cells` (polar requests span every longitude), or
    /// [`RiskError::Store`] if the store query fails.
    pub fn sample_grid(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<RiskSample>, RiskError> {
        let center = validate(center)?;
        let radius_meters = validate_radius(radius_meters)?;
        let max = self.config.grid.max_radius_meters;
        if radius_meters > max {
            return Err(ValidationError::RadiusTooLarge {
                value: radius_meters,
                max,
            }
            .into());
        }

        let cell_size = self.config.grid.cell_size_degrees;
        let max_cells = self.config.grid.max_cells;
        let cells = grid::lattice_cells(center, radius_meters, cell_size).unwrap_or(0);
        if cells > max_cells {
            return Err(ValidationError::GridTooLarge {
                cells,
                max: max_cells,
            }
            .into());
        }

        let fetched = self.fetch(center, radius_meters)?;
        let surface = RiskSurface::new(&fetched.incidents, &fetched.facilities, &self.config);
        Ok(grid::sample_surface(
            center,
            radius_meters,
            self.config.grid.cell_size_degrees,
            &surface,
        ))
    }

    /// Safe and danger zones within `radius_meters` of `center`, with
    /// recency judged against `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for bad coordinates or radius, or
    /// [`RiskError::Store`] if the store query fails.
    pub fn safety_zones(
        &self,
        center: GeoPoint,
        radius_meters: f64,
        now: DateTime<Utc>,
    ) -> Result<SafetyZones, RiskError> {
        let center = validate(center)?;
        let radius_meters = validate_radius(radius_meters)?;
        let fetched = self.fetch(center, radius_meters)?;
        Ok(zones::build_safety_zones(
            center,
            radius_meters,
            &fetched.incidents,
            &fetched.facilities,
            now,
            &self.config,
        ))
    }

    /// Area risk summary within `radius_meters` of `center`.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for bad coordinates or radius, or
    /// [`RiskError::Store`] if the store query fails.
    pub fn analyze_area(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<AreaAnalysis, RiskError> {
        let center = validate(center)?;
        let radius_meters = validate_radius(radius_meters)?;
        let fetched = self.fetch(center, radius_meters)?;
        Ok(area::analyze_area(
            center,
            radius_meters,
            &fetched.incidents,
            &fetched.facilities,
            &self.config,
        ))
    }

    /// Live incidents within `radius_meters` of `center`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for bad coordinates or radius, or
    /// [`RiskError::Store`] if the store query fails.
    pub fn nearby_incidents(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<NearbyIncidents, RiskError> {
        let center = validate(center)?;
        let radius_meters = validate_radius(radius_meters)?;
        let incidents = self
            .store
            .query_incidents(&bounding_box(center, radius_meters))?;
        log::debug!("Store returned {} incidents", incidents.len());
        Ok(area::nearby_incidents(center, radius_meters, &incidents))
    }

    /// De-duplicated facilities within `radius_meters` of `center`, nearest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`RiskError::Validation`] for bad coordinates or radius, or
    /// [`RiskError::Store`] if the store query fails.
    pub fn nearby_facilities(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<NearbyFacility>, RiskError> {
        let center = validate(center)?;
        let radius_meters = validate_radius(radius_meters)?;
        let facilities = self.query_facilities(center, radius_meters)?;
        Ok(area::nearby_facilities(
            center,
            radius_meters,
            &facilities,
            &self.config,
        ))
    }

    /// Pulls everything that can influence a point within `radius_meters`
    /// of `center`, widened by the surface's reach so edge points see
    /// records just outside the radius.
    fn fetch(&self, center: GeoPoint, radius_meters: f64) -> Result<Fetched, RiskError> {
        let reach = radius_meters + self.config.surface.reach_meters();
        let incidents = self.store.query_incidents(&bounding_box(center, reach))?;
        let facilities = self.query_facilities(center, reach)?;

        log::debug!(
            "Store returned {} incidents and {} facilities within {reach}m of ({}, {})",
            incidents.len(),
            facilities.len(),
            center.latitude,
            center.longitude
        );

        Ok(Fetched {
            incidents,
            facilities,
        })
    }

    fn query_facilities(
        &self,
        center: GeoPoint,
        radius_meters: f64,
    ) -> Result<Vec<SafetyFacility>, RiskError> {
        let bbox = bounding_box(center, radius_meters);
        let mut facilities = Vec::new();
        for kind in FacilityKind::all() {
            facilities.extend(self.store.query_facilities(&bbox, *kind)?);
        }
        Ok(facilities)
    }
}

fn validate(point: GeoPoint) -> Result<GeoPoint, ValidationError> {
    validate_point(point.latitude, point.longitude)
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone as _};
    use safety_map_incident_models::{BoundingBox, IncidentCategory};
    use safety_map_store::{InMemoryStore, Snapshot, StoreError};

    use super::*;

    const CENTER: GeoPoint = GeoPoint::new(13.0827, 80.2707);

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 12, 5, 20, 0, 0).unwrap()
    }

    fn north(meters: f64) -> GeoPoint {
        GeoPoint::new(CENTER.latitude + meters / 111_195.0, CENTER.longitude)
    }

    fn incident(category: IncidentCategory, location: GeoPoint) -> Incident {
        Incident::new(location, category, now() - Duration::days(2))
    }

    fn engine() -> SafetyEngine<InMemoryStore> {
        let store = InMemoryStore::from_snapshot(Snapshot {
            incidents: vec![
                incident(IncidentCategory::Crime, CENTER),
                incident(IncidentCategory::Harassment, north(80.0)),
                incident(IncidentCategory::Sos, north(120.0)),
                incident(IncidentCategory::Safety, north(3_000.0)),
            ],
            facilities: vec![
                SafetyFacility::new("Government General", north(900.0), FacilityKind::Hospital),
                SafetyFacility::new("Egmore PS", north(1_500.0), FacilityKind::Police),
                SafetyFacility::new("Egmore PS (dup)", north(1_520.0), FacilityKind::Police),
            ],
        });
        SafetyEngine::new(store, RiskConfig::default()).unwrap()
    }

    struct FailingStore;

    impl IncidentStore for FailingStore {
        fn query_incidents(&self, _bbox: &BoundingBox) -> Result<Vec<Incident>, StoreError> {
            Err(StoreError::Unavailable {
                message: "connection refused".to_string(),
            })
        }

        fn query_facilities(
            &self,
            _bbox: &BoundingBox,
            _kind: FacilityKind,
        ) -> Result<Vec<SafetyFacility>, StoreError> {
            Ok(Vec::new())
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = RiskConfig::default();
        config.grid.cell_size_degrees = 0.0;
        let result = SafetyEngine::new(FailingStore, config);
        assert!(matches!(result, Err(RiskError::Config(_))));
    }

    #[test]
    fn risk_at_sees_nearby_records() {
        let score = engine().risk_at(CENTER).unwrap();
        assert!(score > 8.0, "got {score}");
        assert!(score <= 15.0);
    }

    #[test]
    fn risk_at_rejects_bad_latitude() {
        let result = engine().risk_at(GeoPoint::new(91.0, 0.0));
        assert!(matches!(
            result,
            Err(RiskError::Validation(ValidationError::Latitude { .. }))
        ));
    }

    #[test]
    fn zero_radius_is_rejected() {
        let result = engine().safety_zones(CENTER, 0.0, now());
        assert!(matches!(
            result,
            Err(RiskError::Validation(ValidationError::Radius { .. }))
        ));
    }

    #[test]
    fn grid_radius_is_capped() {
        let result = engine().sample_grid(CENTER, 10_001.0);
        assert!(matches!(
            result,
            Err(RiskError::Validation(ValidationError::RadiusTooLarge { .. }))
        ));
    }

    #[test]
    fn polar_grid_is_rejected_before_sampling() {
        let result = engine().sample_grid(GeoPoint::new(89.99, 0.0), 10_000.0);
        assert!(matches!(
            result,
            Err(RiskError::Validation(ValidationError::GridTooLarge { .. }))
        ));
    }

    #[test]
    fn full_radius_grid_fits_at_mid_latitudes() {
        let samples = engine().sample_grid(CENTER, 10_000.0).unwrap();
        assert!(samples.len() > 3_000);
    }

    #[test]
    fn grid_edge_points_see_records_outside_radius() {
        let engine = engine();
        let center = north(2_640.0);
        // The only incident in range of this grid lies 360 m from its center.
        assert_eq!(engine.nearby_incidents(center, 300.0).unwrap().stats.total, 0);

        let samples = engine.sample_grid(center, 300.0).unwrap();
        let hottest = samples
            .iter()
            .map(|s| s.score)
            .fold(0.0_f64, f64::max);
        assert!(hottest > 0.0);
    }

    #[test]
    fn zones_cluster_nearby_incidents() {
        let zones = engine().safety_zones(CENTER, 2_000.0, now()).unwrap();
        assert_eq!(zones.danger_zones.len(), 1);
        assert_eq!(zones.danger_zones[0].incident_count, Some(3));
        assert_eq!(zones.safe_zones.len(), 3);
    }

    #[test]
    fn area_analysis_counts_within_radius() {
        let analysis = engine().analyze_area(CENTER, 1_000.0).unwrap();
        assert_eq!(analysis.total_incidents, 3);
        assert_eq!(analysis.critical_incidents, 3);
        assert_eq!(analysis.nearby_hospitals, 1);
        assert_eq!(analysis.nearby_police_stations, 0);
    }

    #[test]
    fn nearby_lists_respect_radius_and_dedup() {
        let engine = engine();
        let incidents = engine.nearby_incidents(CENTER, 500.0).unwrap();
        assert_eq!(incidents.stats.total, 3);
        assert_eq!(incidents.stats.sos, 1);

        let facilities = engine.nearby_facilities(CENTER, 2_000.0).unwrap();
        assert_eq!(facilities.len(), 2);
    }

    #[test]
    fn store_errors_propagate() {
        let engine = SafetyEngine::new(FailingStore, RiskConfig::default()).unwrap();
        let result = engine.analyze_area(CENTER, 1_000.0);
        assert!(matches!(
            result,
            Err(RiskError::Store(StoreError::Unavailable { .. }))
        ));
    }
}
