#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Read-only record store for incidents and safety facilities.
//!
//! The risk engine never talks to persistence directly. It asks an
//! [`IncidentStore`] for every record inside a bounding box and applies the
//! exact radius filter itself. [`InMemoryStore`] is the bundled
//! implementation: it loads a JSON snapshot once and answers box queries
//! from R-tree indexes.

use std::path::Path;

use rstar::{AABB, RTree, RTreeObject};
use safety_map_incident_models::{
    BoundingBox, FacilityKind, GeoPoint, Incident, IncidentCategory, SafetyFacility,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by a record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the backing file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The backing service could not answer the query.
    #[error("Store unavailable: {message}")]
    Unavailable {
        /// Description of what went wrong.
        message: String,
    },
}

/// Read contract the engine requires from persistence.
///
/// Implementations must only return records whose coordinates fall inside
/// the given box. Ordering is unspecified.
pub trait IncidentStore: Send + Sync {
    /// Returns every report and SOS alert inside `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be queried.
    fn query_incidents(&self, bbox: &BoundingBox) -> Result<Vec<Incident>, StoreError>;

    /// Returns every facility of `kind` inside `bbox`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backing store cannot be queried.
    fn query_facilities(
        &self,
        bbox: &BoundingBox,
        kind: FacilityKind,
    ) -> Result<Vec<SafetyFacility>, StoreError>;
}

/// Serialized form of an [`InMemoryStore`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    /// Reports and SOS alerts.
    #[serde(default)]
    pub incidents: Vec<Incident>,
    /// Hospitals and police stations.
    #[serde(default)]
    pub facilities: Vec<SafetyFacility>,
}

/// A record stored in an R-tree keyed by its `[lon, lat]` point.
struct PointEntry<T> {
    envelope: AABB<[f64; 2]>,
    record: T,
}

impl<T> PointEntry<T> {
    fn new(location: GeoPoint, record: T) -> Self {
        Self {
            envelope: AABB::from_point([location.longitude, location.latitude]),
            record,
        }
    }
}

impl<T> RTreeObject for PointEntry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Snapshot-backed store with R-tree indexes per record type.
pub struct InMemoryStore {
    incidents: RTree<PointEntry<Incident>>,
    hospitals: RTree<PointEntry<SafetyFacility>>,
    police: RTree<PointEntry<SafetyFacility>>,
}

impl InMemoryStore {
    /// Builds the indexes from a snapshot.
    ///
    /// Records with out-of-range coordinates are skipped with a warning.
    /// Incidents with an unknown category are kept and weighted as
    /// unrecognized.
    #[must_use]
    pub fn from_snapshot(snapshot: Snapshot) -> Self {
        let unrecognized = snapshot
            .incidents
            .iter()
            .filter(|incident| incident.category == IncidentCategory::Unrecognized)
            .count();
        if unrecognized > 0 {
            log::warn!("{unrecognized} incidents have an unrecognized category");
        }

        let incidents: Vec<_> = snapshot
            .incidents
            .into_iter()
            .filter(|incident| {
                has_valid_location(incident.location, || format!("incident '{}'", incident.id))
            })
            .map(|incident| PointEntry::new(incident.location, incident))
            .collect();

        let mut hospitals = Vec::new();
        let mut police = Vec::new();
        for facility in snapshot.facilities {
            if !has_valid_location(facility.location, || format!("facility '{}'", facility.name)) {
                continue;
            }
            let entry = PointEntry::new(facility.location, facility);
            match entry.record.kind {
                FacilityKind::Hospital => hospitals.push(entry),
                FacilityKind::Police => police.push(entry),
            }
        }

        log::info!(
            "Indexed {} incidents, {} hospitals, {} police stations",
            incidents.len(),
            hospitals.len(),
            police.len()
        );

        Self {
            incidents: RTree::bulk_load(incidents),
            hospitals: RTree::bulk_load(hospitals),
            police: RTree::bulk_load(police),
        }
    }

    /// Loads a JSON [`Snapshot`] from disk and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the file cannot be read or decoded.
    pub fn load(path: &Path) -> Result<Self, StoreError> {
        log::info!("Loading snapshot from {}", path.display());
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Decodes a JSON [`Snapshot`] and indexes it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Json`] if the document is malformed.
    pub fn from_json(contents: &str) -> Result<Self, StoreError> {
        let snapshot: Snapshot = serde_json::from_str(contents)?;
        Ok(Self::from_snapshot(snapshot))
    }

    /// Total number of indexed incidents.
    #[must_use]
    pub fn incident_count(&self) -> usize {
        self.incidents.size()
    }

    /// Total number of indexed facilities of every kind.
    #[must_use]
    pub fn facility_count(&self) -> usize {
        self.hospitals.size() + self.police.size()
    }

    fn facility_tree(&self, kind: FacilityKind) -> &RTree<PointEntry<SafetyFacility>> {
        match kind {
            FacilityKind::Hospital => &self.hospitals,
            FacilityKind::Police => &self.police,
        }
    }
}

impl IncidentStore for InMemoryStore {
    fn query_incidents(&self, bbox: &BoundingBox) -> Result<Vec<Incident>, StoreError> {
        Ok(self
            .incidents
            .locate_in_envelope(&to_envelope(bbox))
            .map(|entry| entry.record.clone())
            .collect())
    }

    fn query_facilities(
        &self,
        bbox: &BoundingBox,
        kind: FacilityKind,
    ) -> Result<Vec<SafetyFacility>, StoreError> {
        Ok(self
            .facility_tree(kind)
            .locate_in_envelope(&to_envelope(bbox))
            .map(|entry| entry.record.clone())
            .collect())
    }
}

fn to_envelope(bbox: &BoundingBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.min_lon, bbox.min_lat], [bbox.max_lon, bbox.max_lat])
}

fn has_valid_location(location: GeoPoint, describe: impl FnOnce() -> String) -> bool {
    match safety_map_geo::validate_point(location.latitude, location.longitude) {
        Ok(_) => true,
        Err(e) => {
            log::warn!("Skipping {}: {e}", describe());
            false
        }
    }
}
