use std::path::Path;

use thiserror::Error;

use super::loader::{LoadError, load_geometry, load_records};
use super::model::{DisasterRecord, GeoCollection, GeoFeature};

/// Which dataset a query needed but could not use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Unavailable {
    #[error("Data not loaded")]
    Records,
    #[error("GeoJSON not loaded")]
    Geometry,
}

/// Read access to the loaded datasets.
///
/// The query engine only sees data through this trait so callers can swap in
/// fixtures or instrumented sources.
pub trait DatasetSource {
    fn records(&self) -> Result<&[DisasterRecord], Unavailable>;
    fn features(&self) -> Result<&[GeoFeature], Unavailable>;
}

/// Both datasets, loaded once and read-only afterwards.
///
/// A dataset that failed to load stays unavailable for the lifetime of the
/// store; the failure is logged once here instead of on every request.
#[derive(Debug)]
pub struct DatasetStore {
    records: Option<Vec<DisasterRecord>>,
    geometry: Option<GeoCollection>,
}

impl DatasetStore {
    /// Load both datasets. Never fails: a load error leaves that half unavailable.
    pub fn load(records_path: &Path, geometry_path: &Path) -> Self {
        Self::from_results(load_records(records_path), load_geometry(geometry_path))
    }

    pub fn from_results(
        records: Result<Vec<DisasterRecord>, LoadError>,
        geometry: Result<GeoCollection, LoadError>,
    ) -> Self {
        let records = match records {
            Ok(records) => {
                log::info!("Loaded {} disaster records", records.len());
                Some(records)
            }
            Err(err) => {
                log::error!("Error loading data: {err}");
                None
            }
        };
        let geometry = match geometry {
            Ok(geometry) => {
                log::info!("Loaded {} boundary features", geometry.features.len());
                Some(geometry)
            }
            Err(err) => {
                log::error!("Error loading GeoJSON: {err}");
                None
            }
        };
        DatasetStore { records, geometry }
    }

    pub fn new(records: Vec<DisasterRecord>, geometry: GeoCollection) -> Self {
        DatasetStore {
            records: Some(records),
            geometry: Some(geometry),
        }
    }

    /// A store where neither dataset is available.
    pub fn unavailable() -> Self {
        DatasetStore {
            records: None,
            geometry: None,
        }
    }
}

impl DatasetSource for DatasetStore {
    fn records(&self) -> Result<&[DisasterRecord], Unavailable> {
        self.records.as_deref().ok_or(Unavailable::Records)
    }

    fn features(&self) -> Result<&[GeoFeature], Unavailable> {
        self.geometry
            .as_ref()
            .map(|g| g.features.as_slice())
            .ok_or(Unavailable::Geometry)
    }
}
