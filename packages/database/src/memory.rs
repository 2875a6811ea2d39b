//! In-memory [`AccidentStore`] backed by an R-tree.
//!
//! Accident points are indexed as `[longitude, latitude]` pairs tagged with
//! the record id, and cells as rectangles tagged with their key, so
//! bounding-box lookups are envelope queries against the trees. Records and cells themselves live in ordered maps, which keeps
//! every result ordered by id (insertion order) and therefore
//! reproducible.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use accident_risk_accident_models::{AccidentRecord, NewAccident};
use accident_risk_database_models::{
    AccidentQuery, BoundingBox, CellPredicate, CellQuery, SpatialCell,
};
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::{AABB, RTree};

use crate::{AccidentStore, StoreError, paginate};

/// An accident location in the R-tree, tagged with its record id.
type IndexedPoint = GeomWithData<[f64; 2], i64>;

fn indexed_point(record: &AccidentRecord) -> IndexedPoint {
    GeomWithData::new(
        [record.location.longitude, record.location.latitude],
        record.id,
    )
}

/// A cell's corner box in the R-tree, tagged with its key.
type IndexedCell = GeomWithData<Rectangle<[f64; 2]>, String>;

fn indexed_cell(cell: &SpatialCell) -> IndexedCell {
    let bounds = cell.bounds(0.0);
    GeomWithData::new(
        Rectangle::from_corners([bounds.west, bounds.south], [bounds.east, bounds.north]),
        cell.key.clone(),
    )
}

fn envelope(bbox: &BoundingBox) -> Option<AABB<[f64; 2]>> {
    // AABB::from_corners would silently normalise an inverted box.
    if bbox.west > bbox.east || bbox.south > bbox.north {
        return None;
    }
    Some(AABB::from_corners(
        [bbox.west, bbox.south],
        [bbox.east, bbox.north],
    ))
}

#[derive(Default)]
struct Inner {
    next_id: i64,
    index: RTree<IndexedPoint>,
    accidents: BTreeMap<i64, AccidentRecord>,
    cell_index: RTree<IndexedCell>,
    cells: BTreeMap<String, SpatialCell>,
}

/// Thread-safe in-memory accident store.
///
/// Reads take a shared lock, so concurrent assessments never block each
/// other; inserts and cell recomputations take the write lock briefly.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `accidents`, bulk-loading the
    /// R-tree. Ids are assigned from `1` in iteration order.
    #[must_use]
    pub fn with_accidents(accidents: impl IntoIterator<Item = NewAccident>) -> Self {
        let mut inner = Inner::default();
        let mut points = Vec::new();

        for accident in accidents {
            inner.next_id += 1;
            let record = AccidentRecord::from_new(inner.next_id, accident);
            points.push(indexed_point(&record));
            inner.accidents.insert(record.id, record);
        }

        inner.index = RTree::bulk_load(points);
        log::debug!("Bulk-loaded {} accidents into memory store", inner.accidents.len());

        Self {
            inner: RwLock::new(inner),
        }
    }

    /// Number of stored accidents.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the lock is poisoned.
    pub fn accident_count(&self) -> Result<usize, StoreError> {
        Ok(self.read()?.accidents.len())
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Inner>, StoreError> {
        self.inner.read().map_err(|_| StoreError::Poisoned)
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Inner>, StoreError> {
        self.inner.write().map_err(|_| StoreError::Poisoned)
    }
}

impl AccidentStore for MemoryStore {
    fn query_by_bounding_box(&self, bbox: &BoundingBox) -> Result<Vec<AccidentRecord>, StoreError> {
        let Some(envelope) = envelope(bbox) else {
            return Ok(Vec::new());
        };

        let inner = self.read()?;

        let mut ids: Vec<i64> = inner
            .index
            .locate_in_envelope_intersecting(&envelope)
            .map(|point| point.data)
            .collect();
        ids.sort_unstable();

        Ok(ids
            .into_iter()
            .filter_map(|id| inner.accidents.get(&id).cloned())
            .collect())
    }

    fn cells_intersecting(&self, bbox: &BoundingBox) -> Result<Vec<SpatialCell>, StoreError> {
        let Some(envelope) = envelope(bbox) else {
            return Ok(Vec::new());
        };

        let inner = self.read()?;
        let mut keys: Vec<&str> = inner
            .cell_index
            .locate_in_envelope_intersecting(&envelope)
            .map(|cell| cell.data.as_str())
            .collect();
        keys.sort_unstable();

        Ok(keys
            .into_iter()
            .filter_map(|key| inner.cells.get(key).cloned())
            .collect())
    }

    fn count_cells(&self, predicate: CellPredicate) -> Result<u64, StoreError> {
        let inner = self.read()?;
        Ok(inner
            .cells
            .values()
            .filter(|cell| predicate.matches(cell))
            .count() as u64)
    }

    fn insert_accident(&self, accident: NewAccident) -> Result<AccidentRecord, StoreError> {
        let mut inner = self.write()?;
        inner.next_id += 1;
        let record = AccidentRecord::from_new(inner.next_id, accident);
        inner.index.insert(indexed_point(&record));
        inner.accidents.insert(record.id, record.clone());
        Ok(record)
    }

    fn get_accident(&self, id: i64) -> Result<Option<AccidentRecord>, StoreError> {
        Ok(self.read()?.accidents.get(&id).cloned())
    }

    fn remove_accident(&self, id: i64) -> Result<Option<AccidentRecord>, StoreError> {
        let mut inner = self.write()?;
        let Some(record) = inner.accidents.remove(&id) else {
            return Ok(None);
        };
        if inner.index.remove(&indexed_point(&record)).is_none() {
            log::warn!("Accident {id} was missing from the spatial index");
        }
        Ok(Some(record))
    }

    fn list_accidents(&self, query: &AccidentQuery) -> Result<Vec<AccidentRecord>, StoreError> {
        let inner = self.read()?;
        let mut records: Vec<AccidentRecord> = inner
            .accidents
            .values()
            .filter(|record| query.matches(record))
            .cloned()
            .collect();
        records.sort_by(|a, b| {
            b.occurred_at
                .cmp(&a.occurred_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(paginate(records, query.offset, query.limit))
    }

    fn get_cell(&self, key: &str) -> Result<Option<SpatialCell>, StoreError> {
        Ok(self.read()?.cells.get(key).cloned())
    }

    fn upsert_cell(&self, cell: SpatialCell) -> Result<(), StoreError> {
        let mut inner = self.write()?;
        let entry = indexed_cell(&cell);
        if let Some(previous) = inner.cells.insert(cell.key.clone(), cell) {
            inner.cell_index.remove(&indexed_cell(&previous));
        }
        inner.cell_index.insert(entry);
        Ok(())
    }

    fn list_cells(&self, query: &CellQuery) -> Result<Vec<SpatialCell>, StoreError> {
        let inner = self.read()?;
        let mut cells: Vec<SpatialCell> = inner
            .cells
            .values()
            .filter(|cell| query.risk_level.is_none_or(|l| cell.stats.risk_level == l))
            .cloned()
            .collect();
        cells.sort_by(|a, b| {
            b.stats
                .risk_score
                .total_cmp(&a.stats.risk_score)
                .then_with(|| a.key.cmp(&b.key))
        });
        Ok(paginate(cells, query.offset, query.limit))
    }
}
