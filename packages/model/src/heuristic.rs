//! Closed-form fallback model.

use accident_risk_accident_models::scoring::{SCORING_TABLES, ScoringTables};
use accident_risk_accident_models::time_of_week;

use crate::ModelInput;

const BASE_RISK: f64 = 0.2;

/// Weighted-sum risk model used when no trained estimator is available.
///
/// The result is a pure function of its input: the same input always
/// yields the same bits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicModel {
    tables: ScoringTables,
}

impl Default for HeuristicModel {
    fn default() -> Self {
        Self::new(SCORING_TABLES)
    }
}

impl HeuristicModel {
    #[must_use]
    pub const fn new(tables: ScoringTables) -> Self {
        Self { tables }
    }

    /// Risk probability for `input`, clamped to `[0, 1]`.
    #[must_use]
    pub fn predict(&self, input: &ModelInput) -> f64 {
        let mut risk = BASE_RISK;

        risk += history_bonus(input.historical_accidents);
        risk += self.tables.weather_bonus.get(input.weather);
        risk += self.tables.road_bonus.get(input.road_type);

        if let Some(timestamp) = input.timestamp {
            let (hour, _) = time_of_week(timestamp);
            if self.tables.is_rush_hour(hour) {
                risk += 0.1;
            } else if self.tables.is_late_night(hour) {
                risk += 0.15;
            }
        }

        risk.clamp(0.0, 1.0)
    }
}

/// Historical accident count is the strongest signal.
const fn history_bonus(count: u32) -> f64 {
    match count {
        11.. => 0.4,
        6..=10 => 0.25,
        3..=5 => 0.15,
        _ => 0.0,
    }
}
