//! CSV import of historical accident records.
//!
//! Expects a header row with at least `latitude`, `longitude`,
//! `accident_date` and `severity` columns. Optional columns are
//! `road_type`, `weather_condition`, `road_name`, `description`,
//! `num_casualties` and `num_vehicles`. Rows that fail to parse are
//! logged and skipped rather than aborting the whole import.

use std::io::Read;
use std::path::Path;

use accident_risk_accident_models::timestamp::parse_timestamp;
use accident_risk_accident_models::{Coordinate, NewAccident, RoadType, Severity, WeatherCondition};
use serde::Deserialize;

use crate::StoreError;

#[derive(Debug, Deserialize)]
struct CsvAccidentRow {
    latitude: f64,
    longitude: f64,
    accident_date: String,
    severity: String,
    #[serde(default)]
    road_type: Option<String>,
    #[serde(default)]
    weather_condition: Option<String>,
    #[serde(default)]
    road_name: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    num_casualties: Option<u32>,
    #[serde(default)]
    num_vehicles: Option<u32>,
}

/// Result of reading an accident CSV.
#[derive(Debug, Default)]
pub struct CsvImport {
    /// Successfully parsed accidents, in file order.
    pub accidents: Vec<NewAccident>,
    /// Number of rows that were skipped.
    pub skipped: usize,
}

/// Reads accidents from a CSV file on disk.
///
/// # Errors
///
/// Returns [`StoreError`] if the file cannot be opened or the header row
/// cannot be read.
pub fn read_accidents_csv_file(path: &Path) -> Result<CsvImport, StoreError> {
    let file = std::fs::File::open(path)?;
    let import = read_accidents_csv(file)?;
    log::info!(
        "Read {} accidents from {} ({} rows skipped)",
        import.accidents.len(),
        path.display(),
        import.skipped
    );
    Ok(import)
}

/// Reads accidents from CSV data.
///
/// # Errors
///
/// Returns [`StoreError::Csv`] if the header row cannot be read.
pub fn read_accidents_csv(reader: impl Read) -> Result<CsvImport, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    reader.headers()?;

    let mut import = CsvImport::default();

    for (i, result) in reader.deserialize::<CsvAccidentRow>().enumerate() {
        // +2: one for the header row, one for 1-based numbering
        let line = i + 2;
        match result.map_err(StoreError::from).and_then(row_to_accident) {
            Ok(accident) => import.accidents.push(accident),
            Err(e) => {
                log::warn!("Skipping CSV row {line}: {e}");
                import.skipped += 1;
            }
        }
    }

    Ok(import)
}

fn row_to_accident(row: CsvAccidentRow) -> Result<NewAccident, StoreError> {
    let location =
        Coordinate::validated(row.latitude, row.longitude).map_err(|e| StoreError::Conversion {
            message: e.to_string(),
        })?;
    let occurred_at =
        parse_timestamp(&row.accident_date).ok_or_else(|| StoreError::Conversion {
            message: format!("invalid accident_date '{}'", row.accident_date),
        })?;
    let severity: Severity = row.severity.parse().map_err(|_| StoreError::Conversion {
        message: format!("unknown severity '{}'", row.severity),
    })?;

    Ok(NewAccident {
        location,
        occurred_at,
        severity,
        road_type: parse_optional::<RoadType>(row.road_type.as_deref()),
        weather: parse_optional::<WeatherCondition>(row.weather_condition.as_deref()),
        road_name: row.road_name.filter(|s| !s.is_empty()),
        description: row.description.filter(|s| !s.is_empty()),
        num_casualties: row.num_casualties.unwrap_or(0),
        num_vehicles: row.num_vehicles.unwrap_or(1),
    })
}

/// Unknown categorical values are kept as "unknown" rather than rejecting
/// the row.
fn parse_optional<T: std::str::FromStr>(value: Option<&str>) -> Option<T> {
    value.filter(|s| !s.is_empty()).and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, Timelike as _};

    use super::*;

    #[test]
    fn reads_rows_and_skips_bad_ones() {
        let data = "\
latitude,longitude,accident_date,severity,road_type,weather_condition,road_name
21.0285,105.8542,2024-01-15T14:30:00,severe,urban,rain,Hang Bai
21.0300,105.8500,2024-02-01,minor,,,
95.0,105.85,2024-02-01,minor,,,
21.0300,105.8500,not-a-date,minor,,,
21.0300,105.8500,2024-02-01 07:15:00,catastrophic,,,
21.0310,105.8510,2024-02-02 07:15:00,Fatal,dirt_track,hail,
";
        let import = read_accidents_csv(data.as_bytes()).unwrap();
        assert_eq!(import.accidents.len(), 3);
        assert_eq!(import.skipped, 3);

        let first = &import.accidents[0];
        assert_eq!(first.severity, Severity::Severe);
        assert_eq!(first.road_type, Some(RoadType::Urban));
        assert_eq!(first.weather, Some(WeatherCondition::Rain));
        assert_eq!(first.road_name.as_deref(), Some("Hang Bai"));
        assert_eq!(first.occurred_at.hour(), 14);

        let second = &import.accidents[1];
        assert_eq!(second.road_type, None);
        assert_eq!(second.occurred_at.day(), 1);
        assert_eq!(second.num_vehicles, 1);

        let third = &import.accidents[2];
        assert_eq!(third.severity, Severity::Fatal);
        assert_eq!(third.road_type, None);
        assert_eq!(third.weather, None);
    }

    #[test]
    fn offset_dates_keep_their_local_hour() {
        let data = "\
latitude,longitude,accident_date,severity
21.0285,105.8542,2024-01-15T21:30:00+07:00,minor
";
        let import = read_accidents_csv(data.as_bytes()).unwrap();
        let accident = &import.accidents[0];
        assert_eq!(accident.occurred_at.hour(), 21);
        assert_eq!(accident.occurred_at.naive_utc().hour(), 14);
    }
}
