#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the accident risk server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the engine's result types so the API contract can evolve
//! independently; display rounding (leg distances and times) happens only
//! here.

use std::collections::BTreeMap;

use accident_risk_accident_models::{
    AccidentRecord, Coordinate, InvalidCoordinateError, NewAccident, RiskLevel, RoadType,
    Severity, WeatherCondition, timestamp,
};
use accident_risk_database_models::{AccidentQuery, CellQuery, SpatialCell};
use accident_risk_engine_models::{
    AccidentStatistics, LegAssessment, PointQuery, RiskAssessment, RouteAssessment, RoutePoint,
};
use accident_risk_model::PredictionSource;
use accident_risk_spatial::{Neighbor, round_to};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A request that failed validation before reaching the engine.
#[derive(Debug, Error)]
pub enum RequestError {
    /// Latitude or longitude out of range.
    #[error(transparent)]
    Coordinate(#[from] InvalidCoordinateError),

    /// A numeric parameter outside its accepted range.
    #[error("{field} must be between {min} and {max}, got {value}")]
    OutOfRange {
        /// Parameter name as it appears in the request.
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
}

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), RequestError> {
    if value.is_finite() && (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(RequestError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Whether a trained model is active (otherwise the heuristic is used).
    pub model_loaded: bool,
    pub timestamp: DateTime<Utc>,
}

/// Response from the model reload endpoint.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiModelReload {
    /// Whether a trained model is active after the reload.
    pub model_loaded: bool,
}

/// Request body for a single-location risk prediction.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// Defaults to the current time. RFC 3339, or without an offset for
    /// wall-clock time at UTC; time-of-day rules use the given offset.
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub timestamp: Option<DateTime<FixedOffset>>,
    /// Defaults to clear weather.
    pub weather_condition: Option<WeatherCondition>,
    /// Defaults to an urban road.
    pub road_type: Option<RoadType>,
}

impl PredictionRequest {
    /// Converts the request into an engine query.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Coordinate`] for an out-of-range coordinate.
    pub fn to_query(&self) -> Result<PointQuery, RequestError> {
        Ok(PointQuery {
            location: Coordinate::validated(self.latitude, self.longitude)?,
            timestamp: self.timestamp,
            weather: self.weather_condition,
            road_type: self.road_type,
        })
    }
}

/// Response for a single-location risk prediction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResponse {
    pub latitude: f64,
    pub longitude: f64,
    pub risk_level: RiskLevel,
    /// Accident probability, `0..=1`.
    pub risk_probability: f64,
    /// Probability on a `0..=100` scale.
    pub risk_score: f64,
    pub message: String,
    pub warning_message: String,
    pub nearby_accidents_count: u32,
    /// Key of the road segment containing the location.
    pub road_segment_id: Option<String>,
    /// Which model produced the probability.
    pub source: PredictionSource,
    pub timestamp: DateTime<FixedOffset>,
}

impl From<RiskAssessment> for PredictionResponse {
    fn from(a: RiskAssessment) -> Self {
        Self {
            latitude: a.location.latitude,
            longitude: a.location.longitude,
            risk_level: a.risk_level,
            risk_probability: a.risk_probability,
            risk_score: a.risk_score,
            message: a.message.message,
            warning_message: a.message.warning,
            nearby_accidents_count: a.nearby_accidents,
            road_segment_id: a.cell_key,
            source: a.source,
            timestamp: a.assessed_at,
        }
    }
}

/// A point on a submitted route.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoutePoint {
    pub latitude: f64,
    pub longitude: f64,
    /// Position along the route; points are processed in ascending order.
    pub order: i64,
}

impl From<ApiRoutePoint> for RoutePoint {
    fn from(p: ApiRoutePoint) -> Self {
        Self {
            location: Coordinate::new(p.latitude, p.longitude),
            order: p.order,
        }
    }
}

impl From<RoutePoint> for ApiRoutePoint {
    fn from(p: RoutePoint) -> Self {
        Self {
            latitude: p.location.latitude,
            longitude: p.location.longitude,
            order: p.order,
        }
    }
}

/// Request body for route analysis.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysisRequest {
    pub route_points: Vec<ApiRoutePoint>,
}

impl RouteAnalysisRequest {
    /// The route points as engine values. Range checks happen in the
    /// engine.
    #[must_use]
    pub fn points(&self) -> Vec<RoutePoint> {
        self.route_points.iter().copied().map(RoutePoint::from).collect()
    }
}

/// Risk of one leg of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRouteLeg {
    pub start_point: ApiRoutePoint,
    pub end_point: ApiRoutePoint,
    pub risk_level: RiskLevel,
    /// `0..=100`.
    pub risk_score: f64,
    /// Rounded to 2 decimals.
    pub distance_km: f64,
    /// Rounded to 1 decimal.
    pub estimated_time_minutes: f64,
    /// Historical accidents near the leg midpoint.
    pub accidents_count: u32,
}

impl From<LegAssessment> for ApiRouteLeg {
    fn from(leg: LegAssessment) -> Self {
        Self {
            start_point: leg.start.into(),
            end_point: leg.end.into(),
            risk_level: leg.risk_level,
            risk_score: leg.risk_score,
            distance_km: round_to(leg.distance_km, 2),
            estimated_time_minutes: round_to(leg.estimated_time_min, 1),
            accidents_count: leg.nearby_accidents,
        }
    }
}

/// Response for route analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteAnalysisResponse {
    /// Rounded to 2 decimals.
    pub total_distance_km: f64,
    /// Rounded to 1 decimal.
    pub estimated_time_minutes: f64,
    pub overall_risk_level: RiskLevel,
    /// Rounded to 2 decimals.
    pub overall_risk_score: f64,
    pub segment_risks: Vec<ApiRouteLeg>,
    pub high_risk_segments_count: u32,
    pub recommendations: Vec<String>,
}

impl From<RouteAssessment> for RouteAnalysisResponse {
    fn from(route: RouteAssessment) -> Self {
        Self {
            total_distance_km: round_to(route.total_distance_km, 2),
            estimated_time_minutes: round_to(route.total_time_min, 1),
            overall_risk_level: route.overall_risk_level,
            overall_risk_score: round_to(route.overall_risk_score, 2),
            segment_risks: route.legs.into_iter().map(ApiRouteLeg::from).collect(),
            high_risk_segments_count: route.high_risk_legs,
            recommendations: route.recommendations,
        }
    }
}

const fn default_weather() -> Option<WeatherCondition> {
    Some(WeatherCondition::Clear)
}

const fn default_num_vehicles() -> u32 {
    1
}

/// Request body for reporting an accident.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentCreate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub accident_date: DateTime<FixedOffset>,
    pub severity: Severity,
    pub road_name: Option<String>,
    pub road_type: Option<RoadType>,
    #[serde(default = "default_weather")]
    pub weather_condition: Option<WeatherCondition>,
    pub description: Option<String>,
    #[serde(default)]
    pub num_casualties: u32,
    #[serde(default = "default_num_vehicles")]
    pub num_vehicles: u32,
}

impl TryFrom<AccidentCreate> for NewAccident {
    type Error = RequestError;

    fn try_from(a: AccidentCreate) -> Result<Self, Self::Error> {
        Ok(Self {
            location: Coordinate::validated(a.latitude, a.longitude)?,
            occurred_at: a.accident_date,
            severity: a.severity,
            road_type: a.road_type,
            weather: a.weather_condition,
            road_name: a.road_name,
            description: a.description,
            num_casualties: a.num_casualties,
            num_vehicles: a.num_vehicles,
        })
    }
}

/// An accident as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAccident {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accident_date: DateTime<FixedOffset>,
    pub severity: Severity,
    pub road_name: Option<String>,
    pub road_type: Option<RoadType>,
    pub weather_condition: Option<WeatherCondition>,
    pub description: Option<String>,
    pub num_casualties: u32,
    pub num_vehicles: u32,
    /// Distance from the query center, rounded to 2 decimals. Only set by
    /// the nearby endpoint.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<AccidentRecord> for ApiAccident {
    fn from(r: AccidentRecord) -> Self {
        Self {
            id: r.id,
            latitude: r.location.latitude,
            longitude: r.location.longitude,
            accident_date: r.occurred_at,
            severity: r.severity,
            road_name: r.road_name,
            road_type: r.road_type,
            weather_condition: r.weather,
            description: r.description,
            num_casualties: r.num_casualties,
            num_vehicles: r.num_vehicles,
            distance_km: None,
        }
    }
}

impl From<Neighbor> for ApiAccident {
    fn from(n: Neighbor) -> Self {
        Self {
            distance_km: Some(round_to(n.distance_km, 2)),
            ..Self::from(n.accident)
        }
    }
}

const fn default_radius_km() -> f64 {
    5.0
}

const fn default_nearby_limit() -> u32 {
    50
}

/// Request body for the nearby accidents endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NearbyRequest {
    pub latitude: f64,
    pub longitude: f64,
    /// `0.1..=50`, default 5.
    #[serde(default = "default_radius_km")]
    pub radius_km: f64,
    /// `1..=500`, default 50.
    #[serde(default = "default_nearby_limit")]
    pub limit: u32,
}

impl NearbyRequest {
    /// Validates the request and returns the search center.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError`] for an out-of-range coordinate, radius or
    /// limit.
    pub fn center(&self) -> Result<Coordinate, RequestError> {
        let center = Coordinate::validated(self.latitude, self.longitude)?;
        check_range("radiusKm", self.radius_km, 0.1, 50.0)?;
        check_range("limit", f64::from(self.limit), 1.0, 500.0)?;
        Ok(center)
    }
}

const fn default_page_limit() -> u32 {
    100
}

const MAX_PAGE_LIMIT: f64 = 1000.0;

/// Query parameters for listing accidents.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccidentListParams {
    /// Number of results to skip.
    #[serde(default)]
    pub skip: u32,
    /// `1..=1000`, default 100.
    #[serde(default = "default_page_limit")]
    pub limit: u32,
    pub severity: Option<Severity>,
    /// Minimum accident date (inclusive).
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub start_date: Option<DateTime<FixedOffset>>,
    /// Maximum accident date (inclusive).
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub end_date: Option<DateTime<FixedOffset>>,
}

impl AccidentListParams {
    /// Converts the parameters into a store query.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::OutOfRange`] if `limit` is outside
    /// `1..=1000`.
    pub fn to_query(&self) -> Result<AccidentQuery, RequestError> {
        check_range("limit", f64::from(self.limit), 1.0, MAX_PAGE_LIMIT)?;
        Ok(AccidentQuery {
            severity: self.severity,
            from: self.start_date.map(|d| d.with_timezone(&Utc)),
            to: self.end_date.map(|d| d.with_timezone(&Utc)),
            limit: self.limit,
            offset: self.skip,
        })
    }
}

/// Query parameters for listing road segments.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentListParams {
    pub risk_level: Option<RiskLevel>,
    #[serde(default)]
    pub skip: u32,
    /// `1..=1000`, default 100.
    #[serde(default = "default_page_limit")]
    pub limit: u32,
}

impl SegmentListParams {
    /// Converts the parameters into a store query.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::OutOfRange`] if `limit` is outside
    /// `1..=1000`.
    pub fn to_query(&self) -> Result<CellQuery, RequestError> {
        check_range("limit", f64::from(self.limit), 1.0, MAX_PAGE_LIMIT)?;
        Ok(CellQuery {
            risk_level: self.risk_level,
            limit: self.limit,
            offset: self.skip,
        })
    }
}

/// Query parameters for the statistics endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsParams {
    /// Window length, `1..=3650`, default 365.
    pub days: Option<u32>,
}

impl StatisticsParams {
    /// The validated window length.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::OutOfRange`] if `days` is outside
    /// `1..=3650`.
    pub fn days(&self) -> Result<u32, RequestError> {
        let days = self.days.unwrap_or(365);
        check_range("days", f64::from(days), 1.0, 3650.0)?;
        Ok(days)
    }
}

/// Accident statistics as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiStatistics {
    pub period_days: u32,
    pub total_accidents: u64,
    pub accidents_by_severity: BTreeMap<String, u64>,
    pub accidents_by_road_type: BTreeMap<String, u64>,
    pub accidents_by_hour: BTreeMap<u8, u64>,
    pub accidents_by_day: BTreeMap<String, u64>,
    pub high_risk_segments_count: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<AccidentStatistics> for ApiStatistics {
    fn from(s: AccidentStatistics) -> Self {
        Self {
            period_days: s.period_days,
            total_accidents: s.total_accidents,
            accidents_by_severity: s.by_severity,
            accidents_by_road_type: s.by_road_type,
            accidents_by_hour: s.by_hour,
            accidents_by_day: s.by_day,
            high_risk_segments_count: s.high_risk_segments,
            last_updated: s.generated_at,
        }
    }
}

/// A road segment (spatial cell) as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSegment {
    pub segment_id: String,
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
    pub road_name: Option<String>,
    pub road_type: Option<RoadType>,
    pub total_accidents: u32,
    pub accidents_last_year: u32,
    pub accidents_last_month: u32,
    pub avg_severity: Option<f64>,
    pub peak_accident_hour: Option<u8>,
    /// `0..=1`.
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub last_updated: Option<DateTime<Utc>>,
}

impl From<SpatialCell> for ApiSegment {
    fn from(cell: SpatialCell) -> Self {
        Self {
            segment_id: cell.key,
            start_lat: cell.start.latitude,
            start_lon: cell.start.longitude,
            end_lat: cell.end.latitude,
            end_lon: cell.end.longitude,
            road_name: cell.road_name,
            road_type: cell.road_type,
            total_accidents: cell.stats.total_accidents,
            accidents_last_year: cell.stats.accidents_last_year,
            accidents_last_month: cell.stats.accidents_last_month,
            avg_severity: cell.stats.avg_severity,
            peak_accident_hour: cell.stats.peak_accident_hour,
            risk_score: cell.stats.risk_score,
            risk_level: cell.stats.risk_level,
            last_updated: cell.last_updated,
        }
    }
}

/// Response from the delete endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDeleted {
    pub message: String,
    pub id: i64,
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike as _, TimeZone as _, Timelike as _};

    use super::*;

    #[test]
    fn prediction_request_is_camel_case_and_validated() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{"latitude":21.0285,"longitude":105.8542,"weatherCondition":"rain","roadType":"national_road"}"#,
        )
        .unwrap();
        let query = request.to_query().unwrap();
        assert_eq!(query.weather, Some(WeatherCondition::Rain));
        assert_eq!(query.road_type, Some(RoadType::NationalRoad));
        assert_eq!(query.timestamp, None);

        let request: PredictionRequest =
            serde_json::from_str(r#"{"latitude":91.0,"longitude":0.0}"#).unwrap();
        assert!(matches!(
            request.to_query(),
            Err(RequestError::Coordinate(InvalidCoordinateError::Latitude(_)))
        ));
    }

    #[test]
    fn prediction_timestamps_keep_the_callers_wall_clock() {
        let request: PredictionRequest = serde_json::from_str(
            r#"{"latitude":21.0285,"longitude":105.8542,"timestamp":"2024-01-15T14:30:00","weatherCondition":"rain","roadType":"urban"}"#,
        )
        .unwrap();
        let at = request.to_query().unwrap().timestamp.unwrap();
        assert_eq!((at.hour(), at.minute()), (14, 30));
        assert_eq!(at.offset().local_minus_utc(), 0);

        let request: PredictionRequest = serde_json::from_str(
            r#"{"latitude":21.0285,"longitude":105.8542,"timestamp":"2024-01-15T08:00:00+07:00"}"#,
        )
        .unwrap();
        let at = request.to_query().unwrap().timestamp.unwrap();
        assert_eq!(at.hour(), 8);
        assert_eq!(at.with_timezone(&Utc).hour(), 1);

        let bad = serde_json::from_str::<PredictionRequest>(
            r#"{"latitude":21.0,"longitude":105.0,"timestamp":"soon"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn list_date_filters_accept_naive_dates() {
        let params = AccidentListParams {
            skip: 0,
            limit: 10,
            severity: None,
            start_date: timestamp::parse_timestamp("2024-03-01"),
            end_date: timestamp::parse_timestamp("2024-03-31T23:59:59+07:00"),
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.from, Some(Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap()));
        assert_eq!(query.to, Some(Utc.with_ymd_and_hms(2024, 3, 31, 16, 59, 59).unwrap()));
    }

    #[test]
    fn route_legs_are_rounded_for_display() {
        let a = RoutePoint {
            location: Coordinate::new(21.0, 105.0),
            order: 0,
        };
        let b = RoutePoint {
            location: Coordinate::new(21.01, 105.01),
            order: 1,
        };
        let route = RouteAssessment {
            legs: vec![LegAssessment {
                start: a,
                end: b,
                midpoint: Coordinate::new(21.005, 105.005),
                distance_km: 1.521_37,
                estimated_time_min: 1.825_64,
                risk_level: RiskLevel::Medium,
                risk_score: 35.0,
                nearby_accidents: 3,
            }],
            total_distance_km: 1.521_37,
            total_time_min: 1.825_64,
            overall_risk_score: 35.004,
            overall_risk_level: RiskLevel::Medium,
            high_risk_legs: 0,
            recommendations: vec!["ok".to_string()],
        };

        let response = RouteAnalysisResponse::from(route);
        assert!((response.total_distance_km - 1.52).abs() < 1e-12);
        assert!((response.estimated_time_minutes - 1.8).abs() < 1e-12);
        assert!((response.overall_risk_score - 35.0).abs() < 1e-12);
        let leg = &response.segment_risks[0];
        assert!((leg.distance_km - 1.52).abs() < 1e-12);
        assert!((leg.estimated_time_minutes - 1.8).abs() < 1e-12);
        assert_eq!(leg.start_point.order, 0);
        assert_eq!(leg.accidents_count, 3);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("segmentRisks").is_some());
        assert!(json.get("highRiskSegmentsCount").is_some());
    }

    #[test]
    fn accident_create_defaults_and_validation() {
        let create: AccidentCreate = serde_json::from_str(
            r#"{"latitude":21.0,"longitude":105.0,"accidentDate":"2024-05-01T08:00:00Z","severity":"severe"}"#,
        )
        .unwrap();
        let new = NewAccident::try_from(create.clone()).unwrap();
        assert_eq!(new.weather, Some(WeatherCondition::Clear));
        assert_eq!(new.num_vehicles, 1);
        assert_eq!(new.num_casualties, 0);
        assert_eq!(
            new.occurred_at,
            Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap()
        );

        let local: AccidentCreate = serde_json::from_str(
            r#"{"latitude":21.0,"longitude":105.0,"accidentDate":"2024-05-04 23:15:00","severity":"minor"}"#,
        )
        .unwrap();
        let record = AccidentRecord::from_new(1, NewAccident::try_from(local).unwrap());
        assert_eq!(record.hour_of_day, 23);
        assert_eq!(record.occurred_at.day(), 4);

        let bad = AccidentCreate {
            longitude: 181.0,
            ..create
        };
        assert!(NewAccident::try_from(bad).is_err());
    }

    #[test]
    fn nearby_accidents_carry_rounded_distance() {
        let record = AccidentRecord::from_new(
            7,
            NewAccident::new(
                Coordinate::new(21.0, 105.0),
                Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap(),
                Severity::Minor,
            ),
        );
        let plain = serde_json::to_value(ApiAccident::from(record.clone())).unwrap();
        assert!(plain.get("distanceKm").is_none());

        let near = ApiAccident::from(Neighbor {
            accident: record,
            distance_km: 0.123_9,
        });
        assert_eq!(near.id, 7);
        assert_eq!(near.distance_km, Some(0.12));
    }

    #[test]
    fn nearby_request_defaults_and_ranges() {
        let request: NearbyRequest =
            serde_json::from_str(r#"{"latitude":21.0,"longitude":105.0}"#).unwrap();
        assert!((request.radius_km - 5.0).abs() < f64::EPSILON);
        assert_eq!(request.limit, 50);
        assert!(request.center().is_ok());

        let too_wide = NearbyRequest {
            radius_km: 60.0,
            ..request.clone()
        };
        assert!(matches!(
            too_wide.center(),
            Err(RequestError::OutOfRange {
                field: "radiusKm",
                ..
            })
        ));
        let no_results = NearbyRequest {
            limit: 0,
            ..request
        };
        assert!(no_results.center().is_err());
    }

    #[test]
    fn list_params_map_to_queries() {
        let params = AccidentListParams {
            skip: 10,
            limit: 20,
            severity: Some(Severity::Fatal),
            start_date: None,
            end_date: None,
        };
        let query = params.to_query().unwrap();
        assert_eq!(query.offset, 10);
        assert_eq!(query.limit, 20);
        assert_eq!(query.severity, Some(Severity::Fatal));

        let too_many = AccidentListParams {
            limit: 5000,
            ..params
        };
        assert!(too_many.to_query().is_err());

        let segments = SegmentListParams {
            risk_level: Some(RiskLevel::High),
            skip: 0,
            limit: 100,
        };
        assert_eq!(
            segments.to_query().unwrap().risk_level,
            Some(RiskLevel::High)
        );
    }

    #[test]
    fn statistics_window_defaults_to_a_year() {
        assert_eq!(StatisticsParams::default().days().unwrap(), 365);
        assert_eq!(StatisticsParams { days: Some(30) }.days().unwrap(), 30);
        assert!(StatisticsParams { days: Some(0) }.days().is_err());
        assert!(StatisticsParams { days: Some(4000) }.days().is_err());
    }
}
