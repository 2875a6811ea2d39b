#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident store interface for the risk engine.
//!
//! [`AccidentStore`] is the boundary to whatever persists accident records
//! and segment statistics. The engine only needs coarse bounding-box
//! lookups for accidents and cells, cell-bounds lookups, a predicate count
//! over cells, and simple listings. [`memory::MemoryStore`] implements the interface on top of an
//! `rstar` R-tree and is what the server runs against; [`import`] loads
//! accident history from CSV.

pub mod import;
pub mod memory;

use accident_risk_accident_models::{AccidentRecord, NewAccident};
use accident_risk_database_models::{
    AccidentQuery, BoundingBox, CellPredicate, CellQuery, SpatialCell,
};

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A lock guarding the store was poisoned by a panicking writer.
    #[error("Store lock poisoned")]
    Poisoned,

    /// I/O error while reading an import file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Data conversion error.
    #[error("Data conversion error: {message}")]
    Conversion {
        /// Description of what went wrong.
        message: String,
    },
}

/// Storage collaborator consumed by the risk engine.
///
/// Implementations return read-only snapshots; callers never mutate stored
/// records through the returned values.
pub trait AccidentStore: Send + Sync {
    /// Returns every accident whose coordinates fall inside `bbox`
    /// (edges inclusive), ordered by id.
    ///
    /// This is a coarse prefilter; callers confirm exact distances
    /// themselves.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn query_by_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<AccidentRecord>, StoreError>;

    /// Returns every accident inside the stored bounds of the cell `key`,
    /// padded by `padding_deg`, ordered by id.
    ///
    /// Returns `None` when no such cell exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn query_by_cell_bounds(
        &self,
        key: &str,
        padding_deg: f64,
    ) -> Result<Option<Vec<AccidentRecord>>, StoreError> {
        let Some(cell) = self.get_cell(key)? else {
            return Ok(None);
        };
        self.query_by_bounding_box(&cell.bounds(padding_deg))
            .map(Some)
    }

    /// Returns every cell whose corner box intersects `bbox` (edges
    /// inclusive), ordered by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn cells_intersecting(&self, bbox: &BoundingBox) -> Result<Vec<SpatialCell>, StoreError>;

    /// Counts cells matching `predicate`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn count_cells(&self, predicate: CellPredicate) -> Result<u64, StoreError>;

    /// Stores a new accident and returns the stored record with its
    /// assigned id and derived time fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    fn insert_accident(&self, accident: NewAccident) -> Result<AccidentRecord, StoreError>;

    /// Fetches a single accident by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn get_accident(&self, id: i64) -> Result<Option<AccidentRecord>, StoreError>;

    /// Removes an accident, returning it if it existed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    fn remove_accident(&self, id: i64) -> Result<Option<AccidentRecord>, StoreError>;

    /// Lists accidents matching `query`, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn list_accidents(&self, query: &AccidentQuery) -> Result<Vec<AccidentRecord>, StoreError>;

    /// Fetches a cell by key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn get_cell(&self, key: &str) -> Result<Option<SpatialCell>, StoreError>;

    /// Inserts or replaces a cell, keyed by [`SpatialCell::key`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be written.
    fn upsert_cell(&self, cell: SpatialCell) -> Result<(), StoreError>;

    /// Lists cells matching `query`, highest risk score first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store cannot be read.
    fn list_cells(&self, query: &CellQuery) -> Result<Vec<SpatialCell>, StoreError>;
}

/// Applies `offset`/`limit` paging where a `limit` of `0` means unbounded.
pub(crate) fn paginate<T>(items: Vec<T>, offset: u32, limit: u32) -> Vec<T> {
    let iter = items.into_iter().skip(offset as usize);
    if limit == 0 {
        iter.collect()
    } else {
        iter.take(limit as usize).collect()
    }
}
