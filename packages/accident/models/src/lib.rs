#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident record types, road condition taxonomies, and risk levels.
//!
//! This crate defines the vocabulary shared by every other accident-risk
//! crate: coordinates, the ordinal severity scale, road and weather
//! categories, the three-level risk classification, and the
//! [`scoring::ScoringTables`] consumed by both the heuristic risk model and
//! the segment aggregator.

pub mod scoring;
pub mod timestamp;

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A WGS84 coordinate.
///
/// Range checks happen at the boundary via [`Coordinate::validated`]; the
/// scoring core assumes every coordinate it receives is already valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a coordinate without range checks.
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Creates a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCoordinateError`] if the latitude is outside
    /// `[-90, 90]` or the longitude is outside `[-180, 180]`.
    pub fn validated(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinateError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidCoordinateError::Latitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinateError::Longitude(longitude));
        }
        Ok(Self::new(latitude, longitude))
    }
}

/// Error returned when a coordinate falls outside the WGS84 ranges.
#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum InvalidCoordinateError {
    #[error("latitude {0} must be between -90 and 90")]
    Latitude(f64),
    #[error("longitude {0} must be between -180 and 180")]
    Longitude(f64),
}

/// Ordinal accident severity.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Severity {
    /// Property damage or light injuries.
    Minor,
    /// Injuries requiring treatment.
    Moderate,
    /// Serious injuries.
    Severe,
    /// At least one fatality.
    Fatal,
}

impl Severity {
    /// Returns all variants of this enum, least severe first.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Minor, Self::Moderate, Self::Severe, Self::Fatal]
    }
}

/// Road category the accident happened on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum RoadType {
    /// Controlled-access highway.
    Highway,
    /// National road between cities.
    NationalRoad,
    /// City street.
    Urban,
    /// Countryside road.
    Rural,
}

impl RoadType {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Highway, Self::NationalRoad, Self::Urban, Self::Rural]
    }
}

/// Weather at the time of an accident or assessment.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum WeatherCondition {
    /// No precipitation, good visibility.
    Clear,
    /// Rain.
    Rain,
    /// Fog.
    Fog,
    /// Snow.
    Snow,
    /// Storm.
    Storm,
}

impl WeatherCondition {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Clear, Self::Rain, Self::Fog, Self::Snow, Self::Storm]
    }
}

/// Three-level ordinal risk classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
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
pub enum RiskLevel {
    /// Below the low threshold.
    #[default]
    Low,
    /// Between the low and high thresholds.
    Medium,
    /// At or above the high threshold.
    High,
}

/// An accident to be stored. The store assigns the id and derives the
/// time-of-week fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAccident {
    /// Where the accident happened.
    pub location: Coordinate,
    /// When the accident happened, in the reporter's offset.
    pub occurred_at: DateTime<FixedOffset>,
    /// How severe it was.
    pub severity: Severity,
    /// Road category, if known.
    pub road_type: Option<RoadType>,
    /// Weather at the time, if known.
    pub weather: Option<WeatherCondition>,
    /// Road name, if known.
    pub road_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Number of casualties.
    pub num_casualties: u32,
    /// Number of vehicles involved.
    pub num_vehicles: u32,
}

impl NewAccident {
    /// Creates a minimal accident with unknown road and weather details.
    #[must_use]
    pub fn new(
        location: Coordinate,
        occurred_at: impl Into<DateTime<FixedOffset>>,
        severity: Severity,
    ) -> Self {
        Self {
            location,
            occurred_at: occurred_at.into(),
            severity,
            road_type: None,
            weather: None,
            road_name: None,
            description: None,
            num_casualties: 0,
            num_vehicles: 1,
        }
    }
}

/// A stored accident record.
///
/// Owned by the store; the scoring core only ever reads snapshots of it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccidentRecord {
    /// Store-assigned id.
    pub id: i64,
    /// Where the accident happened.
    pub location: Coordinate,
    /// When the accident happened, in the reporter's offset.
    pub occurred_at: DateTime<FixedOffset>,
    /// Local hour of day, `0..=23`, derived from `occurred_at`.
    pub hour_of_day: u8,
    /// Local day of week, `0` = Monday .. `6` = Sunday, derived from
    /// `occurred_at`.
    pub day_of_week: u8,
    /// How severe it was.
    pub severity: Severity,
    /// Road category, if known.
    pub road_type: Option<RoadType>,
    /// Weather at the time, if known.
    pub weather: Option<WeatherCondition>,
    /// Road name, if known.
    pub road_name: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// Number of casualties.
    pub num_casualties: u32,
    /// Number of vehicles involved.
    pub num_vehicles: u32,
}

impl AccidentRecord {
    /// Builds a stored record from a new accident, computing the derived
    /// hour-of-day and day-of-week once.
    #[must_use]
    pub fn from_new(id: i64, accident: NewAccident) -> Self {
        let (hour_of_day, day_of_week) = time_of_week(accident.occurred_at);
        Self {
            id,
            location: accident.location,
            occurred_at: accident.occurred_at,
            hour_of_day,
            day_of_week,
            severity: accident.severity,
            road_type: accident.road_type,
            weather: accident.weather,
            road_name: accident.road_name,
            description: accident.description,
            num_casualties: accident.num_casualties,
            num_vehicles: accident.num_vehicles,
        }
    }
}

/// Returns the wall-clock `(hour_of_day, day_of_week)` of `at`, with
/// Monday as day `0`. Zoned values are read in their own offset, never
/// converted to UTC first.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn time_of_week(at: impl Datelike + Timelike) -> (u8, u8) {
    (
        at.hour() as u8,
        at.weekday().num_days_from_monday() as u8,
    )
}

/// English day names indexed by [`AccidentRecord::day_of_week`].
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];
