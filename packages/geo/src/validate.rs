//! Boundary validation for coordinates, radii, and raw numeric parameters.
//!
//! The engine's core functions assume validated inputs. Everything that
//! arrives from outside (query strings, CLI flags, config) passes through
//! these functions first. Out-of-range values are rejected, never clamped.

use safety_map_incident_models::GeoPoint;
use thiserror::Error;

/// A request value failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Latitude outside `[-90, 90]` or not finite.
    #[error("Invalid latitude {value}: expected a finite value in [-90, 90]")]
    Latitude {
        /// The rejected value.
        value: f64,
    },

    /// Longitude outside `[-180, 180]` or not finite.
    #[error("Invalid longitude {value}: expected a finite value in [-180, 180]")]
    Longitude {
        /// The rejected value.
        value: f64,
    },

    /// Radius zero, negative, or not finite.
    #[error("Invalid radius {value}: expected a positive number of meters")]
    Radius {
        /// The rejected value.
        value: f64,
    },

    /// Radius larger than the configured maximum for the operation.
    #[error("Radius {value} exceeds the maximum of {max} meters")]
    RadiusTooLarge {
        /// The rejected value.
        value: f64,
        /// The configured limit.
        max: f64,
    },

    /// A grid request would sample more lattice points than allowed.
    #[error("Grid of {cells} cells exceeds the maximum of {max} cells")]
    GridTooLarge {
        /// Lattice points the request would cover.
        cells: u64,
        /// The configured limit.
        max: u64,
    },

    /// A required parameter was not supplied.
    #[error("Missing required parameter '{name}'")]
    Missing {
        /// Parameter name.
        name: String,
    },

    /// A parameter could not be parsed as a number.
    #[error("Parameter '{name}' is not a valid number: '{value}'")]
    Unparseable {
        /// Parameter name.
        name: String,
        /// The raw value as received.
        value: String,
    },
}

/// Validates a latitude/longitude pair and returns it as a [`GeoPoint`].
///
/// # Errors
///
/// Returns [`ValidationError::Latitude`] or [`ValidationError::Longitude`]
/// if either coordinate is non-finite or out of range.
pub fn validate_point(latitude: f64, longitude: f64) -> Result<GeoPoint, ValidationError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(ValidationError::Latitude { value: latitude });
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(ValidationError::Longitude { value: longitude });
    }
    Ok(GeoPoint::new(latitude, longitude))
}

/// Validates a search radius in meters.
///
/// # Errors
///
/// Returns [`ValidationError::Radius`] if the radius is zero, negative, or
/// non-finite.
pub fn validate_radius(radius_meters: f64) -> Result<f64, ValidationError> {
    if radius_meters.is_finite() && radius_meters > 0.0 {
        Ok(radius_meters)
    } else {
        Err(ValidationError::Radius {
            value: radius_meters,
        })
    }
}

/// Parses an optional raw parameter into an `f64`.
///
/// Surrounding whitespace is ignored. An absent or blank value yields
/// `Ok(None)` so callers can apply defaults.
///
/// # Errors
///
/// Returns [`ValidationError::Unparseable`] if a non-blank value is not a
/// number.
pub fn parse_param(name: &str, raw: Option<&str>) -> Result<Option<f64>, ValidationError> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| ValidationError::Unparseable {
            name: name.to_string(),
            value: raw.to_string(),
        })
}

/// Like [`parse_param`], but the parameter must be present.
///
/// # Errors
///
/// Returns [`ValidationError::Missing`] if the value is absent or blank,
/// or [`ValidationError::Unparseable`] if it is not a number.
pub fn require_param(name: &str, raw: Option<&str>) -> Result<f64, ValidationError> {
    parse_param(name, raw)?.ok_or_else(|| ValidationError::Missing {
        name: name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_extreme_valid_coordinates() {
        assert!(validate_point(90.0, 180.0).is_ok());
        assert!(validate_point(-90.0, -180.0).is_ok());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            validate_point(90.5, 0.0),
            Err(ValidationError::Latitude { value: 90.5 })
        );
        assert_eq!(
            validate_point(0.0, -180.1),
            Err(ValidationError::Longitude { value: -180.1 })
        );
        assert!(validate_point(f64::NAN, 0.0).is_err());
        assert!(validate_point(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_non_positive_radius() {
        assert!(validate_radius(0.0).is_err());
        assert!(validate_radius(-5.0).is_err());
        assert!(validate_radius(f64::NAN).is_err());
        assert_eq!(validate_radius(250.0), Ok(250.0));
    }

    #[test]
    fn parse_param_handles_blank_and_garbage() {
        assert_eq!(parse_param("radius", None), Ok(None));
        assert_eq!(parse_param("radius", Some("  ")), Ok(None));
        assert_eq!(parse_param("radius", Some(" 1500 ")), Ok(Some(1500.0)));
        assert_eq!(
            parse_param("radius", Some("far")),
            Err(ValidationError::Unparseable {
                name: "radius".to_string(),
                value: "far".to_string(),
            })
        );
    }

    #[test]
    fn require_param_reports_missing_name() {
        let err = require_param("latitude", None).unwrap_err();
        assert_eq!(err.to_string(), "Missing required parameter 'latitude'");
    }
}
