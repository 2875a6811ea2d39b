//! Segment (cell) statistics and tiered risk scoring.

use accident_risk_accident_models::AccidentRecord;
use accident_risk_accident_models::scoring::ScoringTables;
use accident_risk_database::{AccidentStore, StoreError};
use accident_risk_database_models::{CellStatistics, SpatialCell};
use chrono::{DateTime, TimeDelta, Utc};

use crate::classify::RiskThresholds;

/// Days counted as "last year".
const YEAR_DAYS: i64 = 365;
/// Days counted as "last month".
const MONTH_DAYS: i64 = 30;

/// Tiered cell score on the `0..=100` scale.
///
/// The base tier comes from the past year's count, recent accidents add
/// up to 15 points, and a known average severity scales the result by up
/// to 20%.
#[must_use]
pub fn tiered_score(
    accidents_last_year: u32,
    accidents_last_month: u32,
    avg_severity: Option<f64>,
) -> f64 {
    let mut score = match accidents_last_year {
        0 => 0.0,
        1..=2 => 15.0,
        3..=5 => 35.0,
        6..=10 => 60.0,
        n => 2.0_f64.mul_add(f64::from(n - 10), 85.0).min(100.0),
    };

    score += (f64::from(accidents_last_month) * 5.0).min(15.0);

    if let Some(avg) = avg_severity {
        score *= avg.mul_add(0.2, 1.0);
    }

    score.min(100.0)
}

/// Computes statistics over the accidents inside a cell's padded bounds.
///
/// `records` should be in a stable order (the store returns them by id);
/// the peak hour tie-break depends on it.
#[must_use]
pub fn compute_statistics(
    records: &[AccidentRecord],
    now: DateTime<Utc>,
    tables: &ScoringTables,
    thresholds: &RiskThresholds,
) -> CellStatistics {
    let year_ago = now - TimeDelta::days(YEAR_DAYS);
    let month_ago = now - TimeDelta::days(MONTH_DAYS);

    let total_accidents = saturating_u32(records.len());
    let accidents_last_year =
        saturating_u32(records.iter().filter(|r| r.occurred_at >= year_ago).count());
    let accidents_last_month =
        saturating_u32(records.iter().filter(|r| r.occurred_at >= month_ago).count());

    let avg_severity = if records.is_empty() {
        None
    } else {
        let sum: f64 = records.iter().map(|r| tables.severity.get(r.severity)).sum();
        Some(sum / f64::from(total_accidents))
    };

    let score = tiered_score(accidents_last_year, accidents_last_month, avg_severity) / 100.0;

    CellStatistics {
        total_accidents,
        accidents_last_year,
        accidents_last_month,
        avg_severity,
        peak_accident_hour: peak_hour(records),
        risk_score: score,
        risk_level: thresholds.classify(score),
    }
}

/// The hour with the most accidents. Among tied hours, the one that
/// appears first in `records` wins.
#[must_use]
pub fn peak_hour(records: &[AccidentRecord]) -> Option<u8> {
    let mut tallies: Vec<(u8, u32)> = Vec::new();
    for record in records {
        match tallies.iter_mut().find(|(hour, _)| *hour == record.hour_of_day) {
            Some((_, count)) => *count += 1,
            None => tallies.push((record.hour_of_day, 1)),
        }
    }

    let mut best: Option<(u8, u32)> = None;
    for (hour, count) in tallies {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((hour, count));
        }
    }
    best.map(|(hour, _)| hour)
}

/// Recomputes and stores the statistics of cell `key` as of `now`.
///
/// Returns the updated cell, or `None` if no such cell exists. Running it
/// twice with the same `now` over unchanged data stores identical
/// statistics.
///
/// The read and the write are separate store calls. Callers must not let
/// accidents be added or removed between them; [`crate::RiskEngine`]
/// holds its membership lock across both.
///
/// # Errors
///
/// Returns [`StoreError`] if the store cannot be read or written.
pub fn recompute(
    store: &dyn AccidentStore,
    key: &str,
    padding_deg: f64,
    tables: &ScoringTables,
    thresholds: &RiskThresholds,
    now: DateTime<Utc>,
) -> Result<Option<SpatialCell>, StoreError> {
    let (Some(records), Some(mut cell)) = (
        store.query_by_cell_bounds(key, padding_deg)?,
        store.get_cell(key)?,
    ) else {
        log::debug!("recompute({key}): no such cell");
        return Ok(None);
    };

    cell.stats = compute_statistics(&records, now, tables, thresholds);
    cell.last_updated = Some(now);

    log::debug!(
        "recompute({key}): {} accidents, {} last year, score {:.3} ({})",
        cell.stats.total_accidents,
        cell.stats.accidents_last_year,
        cell.stats.risk_score,
        cell.stats.risk_level
    );

    store.upsert_cell(cell.clone())?;
    Ok(Some(cell))
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use accident_risk_accident_models::scoring::SCORING_TABLES;
    use accident_risk_accident_models::{Coordinate, NewAccident, RiskLevel, Severity};
    use accident_risk_database::memory::MemoryStore;
    use chrono::TimeZone as _;

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn record(id: i64, days_ago: i64, hour: u32, severity: Severity) -> AccidentRecord {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, hour, 0, 0).unwrap() - TimeDelta::days(days_ago);
        AccidentRecord::from_new(
            id,
            NewAccident::new(Coordinate::new(21.028, 105.854), at, severity),
        )
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn tiers() {
        assert!(approx(tiered_score(0, 0, None), 0.0));
        assert!(approx(tiered_score(1, 0, None), 15.0));
        assert!(approx(tiered_score(2, 0, None), 15.0));
        assert!(approx(tiered_score(3, 0, None), 35.0));
        assert!(approx(tiered_score(5, 0, None), 35.0));
        assert!(approx(tiered_score(6, 0, None), 60.0));
        assert!(approx(tiered_score(10, 0, None), 60.0));
        assert!(approx(tiered_score(11, 0, None), 87.0));
        assert!(approx(tiered_score(20, 0, None), 100.0));
    }

    #[test]
    fn recent_accidents_and_severity_adjust_score() {
        // 15 + min(2 * 5, 15) = 25
        assert!(approx(tiered_score(2, 2, None), 25.0));
        // 35 + 15 (capped)
        assert!(approx(tiered_score(5, 4, None), 50.0));
        // (35 + 5) * (1 + 0.5 * 0.2) = 44
        assert!(approx(tiered_score(3, 1, Some(0.5)), 44.0));
        // capped at 100
        assert!(approx(tiered_score(12, 3, Some(1.0)), 100.0));
    }

    #[test]
    fn empty_cell_is_zero_risk() {
        let stats = compute_statistics(&[], now(), &SCORING_TABLES, &RiskThresholds::POINT);
        assert_eq!(stats, CellStatistics::default());
        assert_eq!(stats.risk_level, RiskLevel::Low);
    }

    #[test]
    fn statistics_over_windows() {
        let records = vec![
            record(1, 3, 8, Severity::Minor),
            record(2, 40, 8, Severity::Fatal),
            record(3, 200, 17, Severity::Moderate),
            record(4, 400, 17, Severity::Severe),
        ];
        let stats = compute_statistics(&records, now(), &SCORING_TABLES, &RiskThresholds::POINT);
        assert_eq!(stats.total_accidents, 4);
        assert_eq!(stats.accidents_last_year, 3);
        assert_eq!(stats.accidents_last_month, 1);
        // (0.25 + 1.0 + 0.5 + 0.75) / 4
        assert!(approx(stats.avg_severity.unwrap(), 0.625));
        // 35 + 5 = 40, * 1.125 = 45
        assert!(approx(stats.risk_score, 0.45));
        assert_eq!(stats.risk_level, RiskLevel::Medium);
        assert_eq!(stats.peak_accident_hour, Some(8));
    }

    #[test]
    fn peak_hour_ties_go_to_first_seen() {
        let records = vec![
            record(1, 1, 17, Severity::Minor),
            record(2, 1, 8, Severity::Minor),
            record(3, 1, 8, Severity::Minor),
            record(4, 1, 17, Severity::Minor),
        ];
        assert_eq!(peak_hour(&records), Some(17));
        assert_eq!(peak_hour(&records[1..]), Some(8));
        assert_eq!(peak_hour(&[]), None);
    }

    #[test]
    fn recompute_is_idempotent() {
        let store = MemoryStore::with_accidents((0..7).map(|i| {
            NewAccident::new(
                Coordinate::new(21.028 + f64::from(i) * 0.001, 105.854),
                now() - TimeDelta::days(i64::from(i) * 20),
                Severity::all()[usize::try_from(i).unwrap() % 4],
            )
        }));
        let origin = Coordinate::new(21.028, 105.854);
        store
            .upsert_cell(SpatialCell::new("SEG_21.028_105.854", origin, origin))
            .unwrap();

        let first = recompute(
            &store,
            "SEG_21.028_105.854",
            0.01,
            &SCORING_TABLES,
            &RiskThresholds::POINT,
            now(),
        )
        .unwrap()
        .unwrap();
        let second = recompute(
            &store,
            "SEG_21.028_105.854",
            0.01,
            &SCORING_TABLES,
            &RiskThresholds::POINT,
            now(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(first, second);
        assert_eq!(format!("{first:?}"), format!("{second:?}"));
        assert_eq!(first.stats.total_accidents, 7);
        assert_eq!(store.get_cell("SEG_21.028_105.854").unwrap(), Some(second));
    }

    #[test]
    fn recompute_missing_cell_is_none() {
        let store = MemoryStore::new();
        let result = recompute(
            &store,
            "SEG_0.000_0.000",
            0.01,
            &SCORING_TABLES,
            &RiskThresholds::POINT,
            now(),
        )
        .unwrap();
        assert!(result.is_none());
    }
}
