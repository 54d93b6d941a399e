//! Tunable weights, radii, and limits for the risk engine.
//!
//! [`RiskConfig::default()`] matches the embedded
//! `config/default.toml`. Override files only need the fields they change;
//! everything else falls back to the defaults.

use std::path::Path;

use safety_map_incident_models::IncidentCategory;
use serde::Deserialize;
use thiserror::Error;

/// The shipped defaults, kept in sync with [`RiskConfig::default()`] by a
/// test.
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../config/default.toml");

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML for [`RiskConfig`].
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is outside its allowed range.
    #[error("Invalid config value for {field}: {message}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Description of the constraint.
        message: String,
    },
}

/// Complete engine configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RiskConfig {
    /// Radius used when a request omits one.
    pub default_query_radius_meters: f64,
    /// Upper clamp for every risk score.
    pub max_score: f64,
    /// Per-category incident weights.
    pub severity: SeverityTable,
    /// Point risk surface parameters.
    pub surface: SurfaceConfig,
    /// Choropleth grid parameters.
    pub grid: GridConfig,
    /// Incident clustering and cluster scoring parameters.
    pub cluster: ClusterConfig,
    /// Safe/danger zone presentation parameters.
    pub zones: ZoneConfig,
    /// Nearby facility listing parameters.
    pub facilities: FacilityConfig,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            default_query_radius_meters: 5_000.0,
            max_score: 15.0,
            severity: SeverityTable::default(),
            surface: SurfaceConfig::default(),
            grid: GridConfig::default(),
            cluster: ClusterConfig::default(),
            zones: ZoneConfig::default(),
            facilities: FacilityConfig::default(),
        }
    }
}

/// Severity weight for each incident category.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeverityTable {
    /// SOS alerts.
    pub sos: f64,
    /// Crime reports.
    pub crime: f64,
    /// Harassment reports.
    pub harassment: f64,
    /// General safety reports.
    pub safety: f64,
    /// Infrastructure reports.
    pub infrastructure: f64,
    /// Other reports.
    pub other: f64,
    /// Weight for category names that are not recognized.
    pub fallback: f64,
}

impl Default for SeverityTable {
    fn default() -> Self {
        Self {
            sos: 10.0,
            crime: 8.0,
            harassment: 7.0,
            safety: 5.0,
            infrastructure: 3.0,
            other: 2.0,
            fallback: 2.0,
        }
    }
}

impl SeverityTable {
    /// Severity weight for a category.
    #[must_use]
    pub const fn severity(&self, category: IncidentCategory) -> f64 {
        match category {
            IncidentCategory::Sos => self.sos,
            IncidentCategory::Crime => self.crime,
            IncidentCategory::Harassment => self.harassment,
            IncidentCategory::Safety => self.safety,
            IncidentCategory::Infrastructure => self.infrastructure,
            IncidentCategory::Other => self.other,
            IncidentCategory::Unrecognized => self.fallback,
        }
    }

    /// Severity weight for a raw category name.
    ///
    /// Names are matched case-insensitively; anything unrecognized gets the
    /// fallback weight.
    #[must_use]
    pub fn severity_of_name(&self, name: &str) -> f64 {
        name.trim()
            .parse::<IncidentCategory>()
            .map_or(self.fallback, |category| self.severity(category))
    }
}

/// Parameters for [`crate::surface`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurfaceConfig {
    /// Incidents farther than this from the query point are ignored.
    pub search_radius_meters: f64,
    /// Decay length as a fraction of the search radius.
    pub decay_fraction: f64,
    /// Weight of an open SOS alert in place of its severity.
    pub sos_weight: f64,
    /// Hospital discount.
    pub hospital: FacilityInfluence,
    /// Police station discount.
    pub police: FacilityInfluence,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            search_radius_meters: 250.0,
            decay_fraction: 0.3,
            sos_weight: 12.0,
            hospital: FacilityInfluence {
                influence_radius_meters: 600.0,
                decay_meters: 200.0,
                weight: 4.0,
            },
            police: FacilityInfluence {
                influence_radius_meters: 700.0,
                decay_meters: 200.0,
                weight: 5.0,
            },
        }
    }
}

impl SurfaceConfig {
    /// Decay length for incident influence, in meters.
    #[must_use]
    pub fn decay_length_meters(&self) -> f64 {
        self.search_radius_meters * self.decay_fraction
    }

    /// Farthest distance at which any record can affect a point score.
    #[must_use]
    pub fn reach_meters(&self) -> f64 {
        self.search_radius_meters
            .max(self.hospital.influence_radius_meters)
            .max(self.police.influence_radius_meters)
    }
}

/// How strongly one kind of facility lowers nearby risk.
///
/// Unlike the other sections, an override must give all three fields.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FacilityInfluence {
    /// Facilities farther than this have no effect.
    pub influence_radius_meters: f64,
    /// Exponential decay length.
    pub decay_meters: f64,
    /// Discount at distance zero.
    pub weight: f64,
}

/// Parameters for [`crate::grid`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Lattice step in degrees on both axes.
    pub cell_size_degrees: f64,
    /// Largest radius a grid request may cover.
    pub max_radius_meters: f64,
    /// Most lattice points one grid request may walk. Near the poles the
    /// longitude span widens without bound, so the radius cap alone does
    /// not bound the work.
    pub max_cells: u64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            cell_size_degrees: 0.0025,
            max_radius_meters: 10_000.0,
            max_cells: 50_000,
        }
    }
}

/// Parameters for [`crate::cluster`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterConfig {
    /// Maximum distance from a cluster centroid for an incident to join.
    pub radius_meters: f64,
    /// Centroid weight of an open SOS alert.
    pub sos_weight: f64,
    /// Score per member.
    pub count_weight: f64,
    /// Extra score per SOS member.
    pub sos_count_weight: f64,
    /// Extra score per crime/harassment member.
    pub critical_count_weight: f64,
    /// Extra score per recent member.
    pub recent_count_weight: f64,
    /// Members newer than this many days count as recent.
    pub recent_window_days: u32,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            radius_meters: 300.0,
            sos_weight: 10.0,
            count_weight: 1.0,
            sos_count_weight: 5.0,
            critical_count_weight: 3.0,
            recent_count_weight: 1.5,
            recent_window_days: 30,
        }
    }
}

/// Parameters for [`crate::zones`].
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ZoneConfig {
    /// Safe-zone radius around a hospital.
    pub hospital_radius_meters: f64,
    /// Score shown for a hospital safe zone.
    pub hospital_risk_score: f64,
    /// Safe-zone radius around a police station.
    pub police_radius_meters: f64,
    /// Score shown for a police safe zone.
    pub police_risk_score: f64,
    /// Danger-zone radius for medium clusters.
    pub medium_radius_meters: f64,
    /// Danger-zone radius for high clusters.
    pub high_radius_meters: f64,
    /// Danger-zone radius for critical clusters.
    pub critical_radius_meters: f64,
    /// Cap on returned safe zones.
    pub max_safe_zones: usize,
    /// Cap on returned danger zones.
    pub max_danger_zones: usize,
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            hospital_radius_meters: 400.0,
            hospital_risk_score: 0.2,
            police_radius_meters: 500.0,
            police_risk_score: 0.1,
            medium_radius_meters: 300.0,
            high_radius_meters: 400.0,
            critical_radius_meters: 600.0,
            max_safe_zones: 20,
            max_danger_zones: 20,
        }
    }
}

/// Parameters for nearby facility listings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FacilityConfig {
    /// Facilities of the same kind closer than this are duplicates.
    pub dedup_distance_meters: f64,
}

impl Default for FacilityConfig {
    fn default() -> Self {
        Self {
            dedup_distance_meters: 50.0,
        }
    }
}

impl RiskConfig {
    /// Parses a TOML document, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the document is malformed or a value is
    /// out of range.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or a
    /// value is out of range.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        log::info!("Loading risk config from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` if given, otherwise the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be loaded.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::from_path)
    }

    /// Checks every value the algorithms rely on being in range.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive: [(&'static str, f64); 15] = [
            ("default_query_radius_meters", self.default_query_radius_meters),
            ("max_score", self.max_score),
            ("surface.search_radius_meters", self.surface.search_radius_meters),
            ("surface.decay_fraction", self.surface.decay_fraction),
            (
                "surface.hospital.decay_meters",
                self.surface.hospital.decay_meters,
            ),
            ("surface.police.decay_meters", self.surface.police.decay_meters),
            ("grid.cell_size_degrees", self.grid.cell_size_degrees),
            ("grid.max_radius_meters", self.grid.max_radius_meters),
            ("cluster.radius_meters", self.cluster.radius_meters),
            ("cluster.sos_weight", self.cluster.sos_weight),
            ("severity.sos", self.severity.sos),
            ("severity.crime", self.severity.crime),
            ("severity.harassment", self.severity.harassment),
            ("severity.safety", self.severity.safety),
            ("severity.infrastructure", self.severity.infrastructure),
        ];
        for (field, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected a positive number, got {value}"),
                });
            }
        }

        let non_negative: [(&'static str, f64); 4] = [
            ("severity.other", self.severity.other),
            ("severity.fallback", self.severity.fallback),
            (
                "surface.hospital.influence_radius_meters",
                self.surface.hospital.influence_radius_meters,
            ),
            (
                "surface.police.influence_radius_meters",
                self.surface.police.influence_radius_meters,
            ),
        ];
        for (field, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return Err(ConfigError::Invalid {
                    field,
                    message: format!("expected a non-negative number, got {value}"),
                });
            }
        }

        if self.grid.max_cells == 0 {
            return Err(ConfigError::Invalid {
                field: "grid.max_cells",
                message: "expected at least one cell".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_default_impl() {
        let parsed = RiskConfig::from_toml_str(DEFAULT_CONFIG_TOML).unwrap();
        assert_eq!(parsed, RiskConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let config = RiskConfig::from_toml_str(
            r"
            [surface]
            search_radius_meters = 400.0

            [cluster]
            recent_window_days = 7
            ",
        )
        .unwrap();
        assert!((config.surface.search_radius_meters - 400.0).abs() < f64::EPSILON);
        assert!((config.surface.sos_weight - 12.0).abs() < f64::EPSILON);
        assert_eq!(config.cluster.recent_window_days, 7);
        assert!((config.cluster.radius_meters - 300.0).abs() < f64::EPSILON);
        assert_eq!(config.zones, ZoneConfig::default());
    }

    #[test]
    fn rejects_unknown_fields() {
        let err = RiskConfig::from_toml_str("[grid]\ncell_size = 0.01\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn rejects_non_positive_cell_size() {
        let err = RiskConfig::from_toml_str("[grid]\ncell_size_degrees = 0.0\n").unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field: "grid.cell_size_degrees", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn rejects_zero_max_cells() {
        let err = RiskConfig::from_toml_str("[grid]\nmax_cells = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "grid.max_cells", .. }));
    }

    #[test]
    fn severity_table_matches_reference_weights() {
        let table = SeverityTable::default();
        assert!((table.severity(IncidentCategory::Sos) - 10.0).abs() < f64::EPSILON);
        assert!((table.severity(IncidentCategory::Crime) - 8.0).abs() < f64::EPSILON);
        assert!((table.severity(IncidentCategory::Harassment) - 7.0).abs() < f64::EPSILON);
        assert!((table.severity(IncidentCategory::Safety) - 5.0).abs() < f64::EPSILON);
        assert!((table.severity(IncidentCategory::Infrastructure) - 3.0).abs() < f64::EPSILON);
        assert!((table.severity(IncidentCategory::Other) - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn unknown_category_names_get_fallback_weight() {
        let table = SeverityTable::default();
        assert!((table.severity_of_name("vandalism") - 2.0).abs() < f64::EPSILON);
        assert!((table.severity_of_name("") - 2.0).abs() < f64::EPSILON);
        assert!((table.severity_of_name(" Crime ") - 8.0).abs() < f64::EPSILON);
        assert!(
            (table.severity(IncidentCategory::Unrecognized) - table.fallback).abs() < f64::EPSILON
        );
    }

    #[test]
    fn reach_covers_largest_influence_radius() {
        assert!((SurfaceConfig::default().reach_meters() - 700.0).abs() < f64::EPSILON);
    }
}
