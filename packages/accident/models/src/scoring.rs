//! Categorical score tables shared by the risk model and the segment
//! aggregator.
//!
//! There are two distinct scales per category: the *feature* score fed to
//! a trained estimator (`0..=1`, higher is worse) and the *bonus* added by
//! the heuristic model. Both live here so the rush-hour, late-night and
//! weekend definitions cannot drift between feature construction and
//! heuristic scoring.

use crate::{RoadType, Severity, WeatherCondition};

/// Scores for each [`WeatherCondition`], plus a value for unknown weather.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeatherScores {
    pub clear: f64,
    pub rain: f64,
    pub fog: f64,
    pub snow: f64,
    pub storm: f64,
    pub unknown: f64,
}

impl WeatherScores {
    /// Looks up the score for `weather`, `None` meaning unknown.
    #[must_use]
    pub const fn get(&self, weather: Option<WeatherCondition>) -> f64 {
        match weather {
            Some(WeatherCondition::Clear) => self.clear,
            Some(WeatherCondition::Rain) => self.rain,
            Some(WeatherCondition::Fog) => self.fog,
            Some(WeatherCondition::Snow) => self.snow,
            Some(WeatherCondition::Storm) => self.storm,
            None => self.unknown,
        }
    }
}

/// Scores for each [`RoadType`], plus a value for unknown roads.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoadTypeScores {
    pub highway: f64,
    pub national_road: f64,
    pub urban: f64,
    pub rural: f64,
    pub unknown: f64,
}

impl RoadTypeScores {
    /// Looks up the score for `road_type`, `None` meaning unknown.
    #[must_use]
    pub const fn get(&self, road_type: Option<RoadType>) -> f64 {
        match road_type {
            Some(RoadType::Highway) => self.highway,
            Some(RoadType::NationalRoad) => self.national_road,
            Some(RoadType::Urban) => self.urban,
            Some(RoadType::Rural) => self.rural,
            None => self.unknown,
        }
    }
}

/// Per-[`Severity`] scores on a `0..=1` scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeverityScores {
    pub minor: f64,
    pub moderate: f64,
    pub severe: f64,
    pub fatal: f64,
}

impl SeverityScores {
    #[must_use]
    pub const fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Minor => self.minor,
            Severity::Moderate => self.moderate,
            Severity::Severe => self.severe,
            Severity::Fatal => self.fatal,
        }
    }
}

/// The complete set of categorical lookup tables and time-of-week rules.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringTables {
    /// Weather feature score for trained estimators.
    pub weather_feature: WeatherScores,
    /// Weather bonus for the heuristic model.
    pub weather_bonus: WeatherScores,
    /// Road-type feature score for trained estimators.
    pub road_feature: RoadTypeScores,
    /// Road-type bonus for the heuristic model.
    pub road_bonus: RoadTypeScores,
    /// Severity score used when averaging segment severity.
    pub severity: SeverityScores,
    /// Hours counted as rush hour.
    pub rush_hours: [u8; 6],
    /// First hour (inclusive) of the late-night window.
    pub late_night_from: u8,
    /// Last hour (inclusive) of the early-morning part of the late-night window.
    pub late_night_until: u8,
    /// First weekend day, Monday being `0`.
    pub weekend_from: u8,
}

/// The tables every production component uses.
pub const SCORING_TABLES: ScoringTables = ScoringTables {
    weather_feature: WeatherScores {
        clear: 0.0,
        rain: 0.5,
        fog: 0.7,
        snow: 0.8,
        storm: 1.0,
        unknown: 0.0,
    },
    weather_bonus: WeatherScores {
        clear: 0.0,
        rain: 0.15,
        fog: 0.2,
        snow: 0.25,
        storm: 0.3,
        unknown: 0.0,
    },
    road_feature: RoadTypeScores {
        highway: 0.3,
        national_road: 0.5,
        urban: 0.4,
        rural: 0.6,
        unknown: 0.4,
    },
    road_bonus: RoadTypeScores {
        highway: 0.05,
        national_road: 0.1,
        urban: 0.05,
        rural: 0.15,
        unknown: 0.0,
    },
    severity: SeverityScores {
        minor: 0.25,
        moderate: 0.5,
        severe: 0.75,
        fatal: 1.0,
    },
    rush_hours: [7, 8, 9, 17, 18, 19],
    late_night_from: 22,
    late_night_until: 5,
    weekend_from: 5,
};

impl ScoringTables {
    #[must_use]
    pub fn is_rush_hour(&self, hour: u8) -> bool {
        self.rush_hours.contains(&hour)
    }

    #[must_use]
    pub const fn is_late_night(&self, hour: u8) -> bool {
        hour >= self.late_night_from || hour <= self.late_night_until
    }

    #[must_use]
    pub const fn is_weekend(&self, day_of_week: u8) -> bool {
        day_of_week >= self.weekend_from
    }
}

impl Default for ScoringTables {
    fn default() -> Self {
        SCORING_TABLES
    }
}
