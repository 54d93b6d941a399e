//! Regular lattice sampling of the risk surface for choropleth rendering.

use safety_map_geo::{bounding_box, haversine_distance_meters};
use safety_map_incident_models::{GeoPoint, Incident, SafetyFacility};
use safety_map_risk_models::RiskSample;

use crate::config::RiskConfig;
use crate::surface::RiskSurface;

/// Slack for the last lattice step so rounding never drops the far edge.
const EDGE_TOLERANCE_DEGREES: f64 = 1e-12;

/// Samples the risk surface on a lattice around `center`.
///
/// The lattice covers the bounding box of `radius_meters`, stepping
/// `cell_size_degrees` on both axes from the south-west corner. Only points
/// within `radius_meters` of `center` (Haversine) are scored. Samples are
/// returned row by row, south to north and west to east.
///
/// A zero radius yields exactly the center sample. A non-positive cell
/// size yields nothing.
#[must_use]
pub fn sample_grid(
    center: GeoPoint,
    radius_meters: f64,
    cell_size_degrees: f64,
    incidents: &[Incident],
    facilities: &[SafetyFacility],
    config: &RiskConfig,
) -> Vec<RiskSample> {
    let surface = RiskSurface::new(incidents, facilities, config);
    sample_surface(center, radius_meters, cell_size_degrees, &surface)
}

/// Same as [`sample_grid`] over an already indexed surface.
#[must_use]
pub fn sample_surface(
    center: GeoPoint,
    radius_meters: f64,
    cell_size_degrees: f64,
    surface: &RiskSurface<'_>,
) -> Vec<RiskSample> {
    if !(cell_size_degrees > 0.0 && cell_size_degrees.is_finite()) {
        log::warn!("Refusing to sample grid with cell size {cell_size_degrees}");
        return Vec::new();
    }

    let bbox = bounding_box(center, radius_meters);
    let mut samples = Vec::new();

    for latitude in lattice(bbox.min_lat, bbox.max_lat, cell_size_degrees) {
        for longitude in lattice(bbox.min_lon, bbox.max_lon, cell_size_degrees) {
            let point = GeoPoint::new(latitude, longitude);
            if haversine_distance_meters(center, point) <= radius_meters {
                samples.push(RiskSample::new(point, surface.risk_at(point)));
            }
        }
    }

    log::debug!(
        "Sampled {} grid points within {radius_meters}m of ({}, {})",
        samples.len(),
        center.latitude,
        center.longitude
    );

    samples
}

/// Number of lattice points [`sample_surface`] walks before the radius
/// filter, or `None` for a non-positive cell size.
#[must_use]
pub fn lattice_cells(center: GeoPoint, radius_meters: f64, cell_size_degrees: f64) -> Option<u64> {
    if !(cell_size_degrees > 0.0 && cell_size_degrees.is_finite()) {
        return None;
    }
    let bbox = bounding_box(center, radius_meters);
    let rows = lattice(bbox.min_lat, bbox.max_lat, cell_size_degrees).count();
    let columns = lattice(bbox.min_lon, bbox.max_lon, cell_size_degrees).count();
    let cells = rows.saturating_mul(columns);
    Some(u64::try_from(cells).unwrap_or(u64::MAX))
}

/// `start + i × step` for every `i` that stays within `end`.
fn lattice(start: f64, end: f64, step: f64) -> impl Iterator<Item = f64> {
    (0_u32..)
        .map(move |i| f64::from(i).mul_add(step, start))
        .take_while(move |value| *value <= end + EDGE_TOLERANCE_DEGREES)
}
