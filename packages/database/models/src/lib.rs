#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Stored row types and query parameter definitions for the accident store.
//!
//! These types describe data as the store holds it: spatial cells with
//! their aggregate statistics, bounding boxes used for coarse spatial
//! prefiltering, and the filters accepted by listing and counting queries.
//! They are distinct from the API types in `accident_risk_server_models`.

use accident_risk_accident_models::{AccidentRecord, Coordinate, RiskLevel, RoadType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A geographic bounding box in WGS84 coordinates. Edges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Western longitude boundary.
    pub west: f64,
    /// Southern latitude boundary.
    pub south: f64,
    /// Eastern longitude boundary.
    pub east: f64,
    /// Northern latitude boundary.
    pub north: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from the given coordinates.
    #[must_use]
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Smallest box containing both corners, in any order.
    #[must_use]
    pub fn from_corners(a: Coordinate, b: Coordinate) -> Self {
        Self {
            west: a.longitude.min(b.longitude),
            south: a.latitude.min(b.latitude),
            east: a.longitude.max(b.longitude),
            north: a.latitude.max(b.latitude),
        }
    }

    /// Grows the box by `degrees` on every side.
    #[must_use]
    pub fn padded(self, degrees: f64) -> Self {
        Self {
            west: self.west - degrees,
            south: self.south - degrees,
            east: self.east + degrees,
            north: self.north + degrees,
        }
    }

    /// Whether `point` lies inside the box or on its edge.
    #[must_use]
    pub fn contains(&self, point: Coordinate) -> bool {
        (self.south..=self.north).contains(&point.latitude)
            && (self.west..=self.east).contains(&point.longitude)
    }
}

/// Aggregate statistics stored on a [`SpatialCell`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CellStatistics {
    /// Accidents inside the padded cell bounds.
    pub total_accidents: u32,
    /// Accidents in the last 365 days.
    pub accidents_last_year: u32,
    /// Accidents in the last 30 days.
    pub accidents_last_month: u32,
    /// Mean severity score (`0..=1`); unset when the cell has no accidents.
    pub avg_severity: Option<f64>,
    /// Hour of day with the most accidents; unset when the cell has none.
    pub peak_accident_hour: Option<u8>,
    /// Derived risk score as a `0..=1` fraction.
    pub risk_score: f64,
    /// Classification of `risk_score`.
    pub risk_level: RiskLevel,
}

/// A coarse geographic bucket (road segment) with aggregate accident
/// statistics.
///
/// Created lazily when the first accident is reported inside it and
/// recomputed whenever its membership changes. Never deleted automatically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialCell {
    /// Stable key derived from rounded coordinates (e.g. `SEG_21.028_105.854`).
    pub key: String,
    /// First defining corner.
    pub start: Coordinate,
    /// Second defining corner.
    pub end: Coordinate,
    /// Road name, if known.
    pub road_name: Option<String>,
    /// Road category, if known.
    pub road_type: Option<RoadType>,
    /// Aggregate statistics from the last recomputation.
    pub stats: CellStatistics,
    /// When `stats` were last recomputed.
    pub last_updated: Option<DateTime<Utc>>,
}

impl SpatialCell {
    /// Creates an empty cell spanning the two corners.
    #[must_use]
    pub fn new(key: impl Into<String>, start: Coordinate, end: Coordinate) -> Self {
        Self {
            key: key.into(),
            start,
            end,
            road_name: None,
            road_type: None,
            stats: CellStatistics::default(),
            last_updated: None,
        }
    }

    /// The cell's defining corners grown by `padding_deg` on every side.
    ///
    /// The padding catches accidents that sit just across a cell edge.
    #[must_use]
    pub fn bounds(&self, padding_deg: f64) -> BoundingBox {
        BoundingBox::from_corners(self.start, self.end).padded(padding_deg)
    }
}

/// Predicates accepted by the store's cell counting query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CellPredicate {
    /// Cells currently classified at this level.
    RiskLevel(RiskLevel),
}

impl CellPredicate {
    /// Whether `cell` satisfies the predicate.
    #[must_use]
    pub fn matches(&self, cell: &SpatialCell) -> bool {
        match self {
            Self::RiskLevel(level) => cell.stats.risk_level == *level,
        }
    }
}

/// Parameters for listing accidents from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccidentQuery {
    /// Only accidents of this severity.
    pub severity: Option<Severity>,
    /// Minimum occurrence date (inclusive).
    pub from: Option<DateTime<Utc>>,
    /// Maximum occurrence date (inclusive).
    pub to: Option<DateTime<Utc>>,
    /// Maximum number of results to return (`0` means no limit).
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}

impl AccidentQuery {
    /// Whether `record` passes the severity and date filters.
    #[must_use]
    pub fn matches(&self, record: &AccidentRecord) -> bool {
        self.severity.is_none_or(|s| record.severity == s)
            && self.from.is_none_or(|from| record.occurred_at >= from)
            && self.to.is_none_or(|to| record.occurred_at <= to)
    }
}

/// Parameters for listing cells from the store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CellQuery {
    /// Only cells at this risk level.
    pub risk_level: Option<RiskLevel>,
    /// Maximum number of results to return (`0` means no limit).
    pub limit: u32,
    /// Number of results to skip.
    pub offset: u32,
}
