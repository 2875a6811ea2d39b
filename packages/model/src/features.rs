//! Feature vector construction for trained estimators.

use accident_risk_accident_models::scoring::ScoringTables;
use accident_risk_accident_models::time_of_week;

use crate::ModelInput;

/// Number of features an estimator receives.
pub const FEATURE_COUNT: usize = 9;

/// Feature names in vector order. Artifacts are trained against exactly
/// this order.
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "latitude",
    "longitude",
    "hour",
    "day_of_week",
    "is_weekend",
    "is_rush_hour",
    "weather_score",
    "road_type_score",
    "historical_accidents_nearby",
];

/// A feature vector in [`FEATURE_NAMES`] order.
pub type Features = [f64; FEATURE_COUNT];

/// Builds the feature vector for `input`.
///
/// An input without a timestamp is scored as of [`ModelInput::now`].
#[must_use]
pub fn build_features(input: &ModelInput, tables: &ScoringTables) -> Features {
    let (hour, day_of_week) = time_of_week(input.timestamp.unwrap_or(input.now));

    [
        input.location.latitude,
        input.location.longitude,
        f64::from(hour),
        f64::from(day_of_week),
        flag(tables.is_weekend(day_of_week)),
        flag(tables.is_rush_hour(hour)),
        tables.weather_feature.get(input.weather),
        tables.road_feature.get(input.road_type),
        f64::from(input.historical_accidents),
    ]
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
