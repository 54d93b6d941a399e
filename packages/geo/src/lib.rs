#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spherical geometry helpers shared by every safety-map component.
//!
//! All distance math in the workspace goes through
//! [`haversine_distance_meters`] with a single Earth radius constant, and
//! every bounding-box pre-filter goes through [`bounding_box`]. Coordinate
//! and radius validation for request boundaries lives in [`validate`].

pub mod validate;

use safety_map_incident_models::{BoundingBox, GeoPoint};

pub use validate::{
    ValidationError, parse_param, require_param, validate_point, validate_radius,
};

/// Mean Earth radius used for all great-circle distances.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Approximate length of one degree of latitude.
pub const METERS_PER_DEGREE: f64 = 111_000.0;

/// Below this `cos(latitude)` the longitude offset is treated as unbounded.
const POLE_COS_EPSILON: f64 = 1e-9;

/// Great-circle distance between two points in meters (Haversine formula).
#[must_use]
pub fn haversine_distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let delta_lat = (b.latitude - a.latitude).to_radians();
    let delta_lon = (b.longitude - a.longitude).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_METERS * c
}

/// Latitude half-span in degrees covering `radius_meters`.
#[must_use]
pub fn latitude_offset_degrees(radius_meters: f64) -> f64 {
    radius_meters / METERS_PER_DEGREE
}

/// Longitude half-span in degrees covering `radius_meters` at `latitude`.
///
/// Returns `None` when the offset is unbounded: at (or numerically next to)
/// the poles, or when the span would wrap the whole globe.
#[must_use]
pub fn longitude_offset_degrees(latitude: f64, radius_meters: f64) -> Option<f64> {
    let cos_lat = latitude.to_radians().cos();
    if cos_lat < POLE_COS_EPSILON {
        return None;
    }
    let offset = radius_meters / (METERS_PER_DEGREE * cos_lat);
    (offset < 180.0).then_some(offset)
}

/// Approximate square box around `center` covering `radius_meters`.
///
/// Not geodesically exact: callers must apply an exact
/// [`haversine_distance_meters`] filter to anything the box admits.
/// Latitude bounds are clamped to `[-90, 90]`. When the longitude offset is
/// unbounded (see [`longitude_offset_degrees`]) the box spans every
/// longitude; otherwise longitude bounds are clamped to `[-180, 180]`.
#[must_use]
pub fn bounding_box(center: GeoPoint, radius_meters: f64) -> BoundingBox {
    let lat_offset = latitude_offset_degrees(radius_meters);
    let (min_lon, max_lon) = longitude_offset_degrees(center.latitude, radius_meters).map_or(
        (-180.0, 180.0),
        |lon_offset| {
            (
                (center.longitude - lon_offset).max(-180.0),
                (center.longitude + lon_offset).min(180.0),
            )
        },
    );

    BoundingBox::new(
        (center.latitude - lat_offset).max(-90.0),
        (center.latitude + lat_offset).min(90.0),
        min_lon,
        max_lon,
    )
}
