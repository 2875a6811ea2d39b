//! Accident statistics over a trailing window.

use accident_risk_accident_models::{DAY_NAMES, RiskLevel};
use accident_risk_database::{AccidentStore, StoreError};
use accident_risk_database_models::{AccidentQuery, CellPredicate};
use accident_risk_engine_models::AccidentStatistics;
use chrono::{DateTime, TimeDelta, Utc};

/// Counts accidents from the `days` before `now` by severity, road type,
/// hour and weekday, plus the number of high-risk cells.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read.
pub fn accident_statistics(
    store: &dyn AccidentStore,
    days: u32,
    now: DateTime<Utc>,
) -> Result<AccidentStatistics, StoreError> {
    let accidents = store.list_accidents(&AccidentQuery {
        from: Some(now - TimeDelta::days(i64::from(days))),
        ..AccidentQuery::default()
    })?;

    let mut stats = AccidentStatistics {
        period_days: days,
        total_accidents: accidents.len() as u64,
        generated_at: Some(now),
        ..AccidentStatistics::default()
    };

    for accident in &accidents {
        *stats
            .by_severity
            .entry(accident.severity.to_string())
            .or_default() += 1;
        *stats
            .by_road_type
            .entry(
                accident
                    .road_type
                    .map_or_else(|| "unknown".to_string(), |t| t.to_string()),
            )
            .or_default() += 1;
        *stats.by_hour.entry(accident.hour_of_day).or_default() += 1;
        let day = DAY_NAMES
            .get(usize::from(accident.day_of_week))
            .copied()
            .unwrap_or("Unknown");
        *stats.by_day.entry(day.to_string()).or_default() += 1;
    }

    stats.high_risk_segments = store.count_cells(CellPredicate::RiskLevel(RiskLevel::High))?;

    Ok(stats)
}
