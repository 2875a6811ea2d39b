#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Result types produced by the accident risk engine.
//!
//! Point and route assessments, per-leg breakdowns, accident statistics and
//! the localized advisory messages attached to them. These are values
//! returned to the caller; the engine never persists them.

use std::collections::BTreeMap;

use accident_risk_accident_models::{Coordinate, RiskLevel, RoadType, WeatherCondition};
use accident_risk_model::PredictionSource;
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Language for user-facing messages.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Language {
    /// Vietnamese.
    #[default]
    Vi,
    /// English.
    En,
}

impl Language {
    /// Parses a language tag, falling back to Vietnamese for anything
    /// unrecognised.
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        tag.parse().unwrap_or_default()
    }
}

/// Headline message and driver warning for a risk level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskMessage {
    pub message: String,
    pub warning: String,
}

/// Conditions for a single-location assessment.
///
/// Unset fields take the assessment defaults: the current time, clear
/// weather and an urban road.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointQuery {
    pub location: Coordinate,
    /// Time-of-day rules use this value's own offset.
    pub timestamp: Option<DateTime<FixedOffset>>,
    pub weather: Option<WeatherCondition>,
    pub road_type: Option<RoadType>,
}

impl PointQuery {
    /// A query at `location` with every condition left to its default.
    #[must_use]
    pub const fn at(location: Coordinate) -> Self {
        Self {
            location,
            timestamp: None,
            weather: None,
            road_type: None,
        }
    }
}

/// Risk assessment for a single location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// The assessed location.
    pub location: Coordinate,
    pub risk_level: RiskLevel,
    /// Accident probability, `0..=1`.
    pub risk_probability: f64,
    /// `risk_probability` on a `0..=100` scale.
    pub risk_score: f64,
    /// Which model path produced the probability.
    pub source: PredictionSource,
    /// Historical accidents within the context radius.
    pub nearby_accidents: u32,
    /// Key of the cell containing `location`.
    pub cell_key: Option<String>,
    pub message: RiskMessage,
    /// The time the assessment was made for.
    pub assessed_at: DateTime<FixedOffset>,
}

/// A point on a route. Points are processed in ascending `order`,
/// regardless of submission order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    pub location: Coordinate,
    pub order: i64,
}

/// Assessment of one leg between two consecutive route points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegAssessment {
    pub start: RoutePoint,
    pub end: RoutePoint,
    /// Where the leg was scored.
    pub midpoint: Coordinate,
    pub distance_km: f64,
    pub estimated_time_min: f64,
    pub risk_level: RiskLevel,
    /// Accident probability scaled to `0..=100`.
    pub risk_score: f64,
    /// Historical accidents near the midpoint.
    pub nearby_accidents: u32,
}

/// Assessment of a whole route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAssessment {
    /// One entry per consecutive pair of points, in route order.
    pub legs: Vec<LegAssessment>,
    pub total_distance_km: f64,
    pub total_time_min: f64,
    /// Mean of the leg scores, `0..=100`.
    pub overall_risk_score: f64,
    /// `overall_risk_score` classified against the route thresholds.
    pub overall_risk_level: RiskLevel,
    /// Legs classified [`RiskLevel::High`].
    pub high_risk_legs: u32,
    /// Advisories in priority order. Never empty.
    pub recommendations: Vec<String>,
}

/// Accident counts over a trailing window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccidentStatistics {
    /// Length of the window in days.
    pub period_days: u32,
    pub total_accidents: u64,
    /// Counts keyed by severity name.
    pub by_severity: BTreeMap<String, u64>,
    /// Counts keyed by road type name, `unknown` when unset.
    pub by_road_type: BTreeMap<String, u64>,
    /// Counts keyed by hour of day.
    pub by_hour: BTreeMap<u8, u64>,
    /// Counts keyed by day name (`Monday`..`Sunday`).
    pub by_day: BTreeMap<String, u64>,
    /// Cells currently classified high risk.
    pub high_risk_segments: u64,
    pub generated_at: Option<DateTime<Utc>>,
}
