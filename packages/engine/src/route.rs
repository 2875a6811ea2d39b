//! Multi-leg route analysis.

use accident_risk_accident_models::{RiskLevel, RoadType, WeatherCondition};
use accident_risk_database::AccidentStore;
use accident_risk_engine_models::{Language, LegAssessment, RouteAssessment, RoutePoint};
use accident_risk_model::{ModelHandle, ModelInput};
use accident_risk_spatial::{distance_km, find_nearby, midpoint};
use chrono::{DateTime, Utc};

use crate::classify::RiskThresholds;
use crate::messages::{
    dangerous_legs_advice, high_overall_advice, safe_route_advice, timing_advice,
};
use crate::{EngineError, check_coordinate};

/// Mean route scores above this trigger the timing advisory.
const TIMING_ADVICE_SCORE: f64 = 30.0;

/// Parameters of a route analysis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteParams {
    /// Historical context radius around each leg midpoint.
    pub leg_radius_km: f64,
    /// Maximum neighbors counted per leg.
    pub nearby_limit: usize,
    /// Speed used for leg time estimates.
    pub average_speed_kmh: f64,
    /// Thresholds for leg probabilities (`0..=1`).
    pub leg_thresholds: RiskThresholds,
    /// Thresholds for the averaged route score (`0..=100`).
    pub route_thresholds: RiskThresholds,
    pub language: Language,
}

impl Default for RouteParams {
    fn default() -> Self {
        Self {
            leg_radius_km: 1.0,
            nearby_limit: 100,
            average_speed_kmh: 50.0,
            leg_thresholds: RiskThresholds::POINT,
            route_thresholds: RiskThresholds::ROUTE,
            language: Language::Vi,
        }
    }
}

/// Assesses a route leg by leg.
///
/// Points are stably sorted by `order` first, so submission order does not
/// matter. Each leg is scored at its midpoint with clear weather, an urban
/// road and no time of day; trained models read the hour and weekday from
/// `now`. The route score is the mean leg score.
///
/// # Errors
///
/// Returns [`EngineError::InvalidInput`] for fewer than two points or an
/// out-of-range coordinate, before any model call, or
/// [`EngineError::Store`] if a neighbor lookup fails.
pub fn analyze_route(
    store: &dyn AccidentStore,
    model: &ModelHandle,
    params: &RouteParams,
    points: &[RoutePoint],
    now: DateTime<Utc>,
) -> Result<RouteAssessment, EngineError> {
    if points.len() < 2 {
        return Err(EngineError::InvalidInput {
            message: format!("Route must have at least 2 points, got {}", points.len()),
        });
    }
    for point in points {
        check_coordinate(point.location)?;
    }

    let mut ordered = points.to_vec();
    ordered.sort_by_key(|p| p.order);

    let legs = ordered
        .windows(2)
        .map(|pair| assess_leg(store, model, params, pair[0], pair[1], now))
        .collect::<Result<Vec<_>, _>>()?;

    let total_distance_km = legs.iter().map(|l| l.distance_km).sum();
    let total_time_min = legs.iter().map(|l| l.estimated_time_min).sum();
    #[allow(clippy::cast_precision_loss)]
    let overall_risk_score = legs.iter().map(|l| l.risk_score).sum::<f64>() / legs.len() as f64;
    let overall_risk_level = params.route_thresholds.classify(overall_risk_score);
    let high_risk_legs = u32::try_from(
        legs.iter()
            .filter(|l| l.risk_level == RiskLevel::High)
            .count(),
    )
    .unwrap_or(u32::MAX);

    log::debug!(
        "analyze_route: {} legs, {total_distance_km:.2} km, score {overall_risk_score:.2} ({overall_risk_level}), {high_risk_legs} high-risk legs",
        legs.len()
    );

    Ok(RouteAssessment {
        legs,
        total_distance_km,
        total_time_min,
        overall_risk_score,
        overall_risk_level,
        high_risk_legs,
        recommendations: recommendations(
            high_risk_legs,
            overall_risk_level,
            overall_risk_score,
            params.language,
        ),
    })
}

fn assess_leg(
    store: &dyn AccidentStore,
    model: &ModelHandle,
    params: &RouteParams,
    start: RoutePoint,
    end: RoutePoint,
    now: DateTime<Utc>,
) -> Result<LegAssessment, EngineError> {
    let distance_km = distance_km(start.location, end.location);
    let midpoint = midpoint(start.location, end.location);
    let nearby = find_nearby(store, midpoint, params.leg_radius_km, params.nearby_limit)?;
    let nearby_accidents = u32::try_from(nearby.len()).unwrap_or(u32::MAX);

    let prediction = model.predict(&ModelInput {
        location: midpoint,
        timestamp: None,
        now: now.naive_utc(),
        weather: Some(WeatherCondition::Clear),
        road_type: Some(RoadType::Urban),
        historical_accidents: nearby_accidents,
    });

    let leg = LegAssessment {
        start,
        end,
        midpoint,
        distance_km,
        estimated_time_min: distance_km / params.average_speed_kmh * 60.0,
        risk_level: params.leg_thresholds.classify(prediction.probability),
        risk_score: prediction.probability * 100.0,
        nearby_accidents,
    };

    log::debug!(
        "leg {} -> {}: {:.3} km, {} nearby, score {:.1} ({})",
        start.order,
        end.order,
        leg.distance_km,
        leg.nearby_accidents,
        leg.risk_score,
        leg.risk_level
    );

    Ok(leg)
}

/// Route advisories in priority order. Never empty.
#[must_use]
pub fn recommendations(
    high_risk_legs: u32,
    overall_level: RiskLevel,
    overall_score: f64,
    language: Language,
) -> Vec<String> {
    let mut advice = Vec::new();

    if high_risk_legs > 0 {
        advice.push(dangerous_legs_advice(high_risk_legs, language));
    }
    if overall_level == RiskLevel::High {
        advice.push(high_overall_advice(language).to_string());
    }
    if overall_score > TIMING_ADVICE_SCORE {
        advice.push(timing_advice(language).to_string());
    }
    if advice.is_empty() {
        advice.push(safe_route_advice(language).to_string());
    }

    advice
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    use accident_risk_accident_models::{Coordinate, NewAccident, Severity};
    use accident_risk_database::memory::MemoryStore;
    use accident_risk_model::features::Features;
    use accident_risk_model::{Estimator, ModelError, RiskModel, TrainedModel};
    use chrono::{TimeZone as _, Utc};

    use super::*;

    #[derive(Debug)]
    struct Counting(Arc<AtomicUsize>);

    impl Estimator for Counting {
        fn predict(&self, _features: &Features) -> Result<f64, ModelError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(0.1)
        }
    }

    #[derive(Debug)]
    struct Recording(Arc<Mutex<Vec<Features>>>);

    impl Estimator for Recording {
        fn predict(&self, features: &Features) -> Result<f64, ModelError> {
            self.0.lock().unwrap().push(*features);
            Ok(0.1)
        }
    }

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2024, 5, 8, 17, 30, 0).unwrap()
    }

    fn point(lat: f64, lon: f64, order: i64) -> RoutePoint {
        RoutePoint {
            location: Coordinate::new(lat, lon),
            order,
        }
    }

    fn cluster_store(center: Coordinate, count: usize) -> MemoryStore {
        let at = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        MemoryStore::with_accidents(
            std::iter::repeat_n(NewAccident::new(center, at, Severity::Moderate), count),
        )
    }

    #[test]
    fn fewer_than_two_points_is_invalid_and_calls_no_model() {
        let calls = Arc::new(AtomicUsize::new(0));
        let model = ModelHandle::new(RiskModel::Trained(TrainedModel::new(
            Box::new(Counting(Arc::clone(&calls))),
            None,
        )));
        let store = MemoryStore::new();

        for points in [vec![], vec![point(21.0, 105.0, 0)]] {
            let result = analyze_route(&store, &model, &RouteParams::default(), &points, now());
            assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let result = analyze_route(
            &store,
            &model,
            &RouteParams::default(),
            &[point(21.0, 105.0, 0), point(21.01, 105.0, 1)],
            now(),
        );
        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn trained_legs_read_time_features_from_now() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let model = ModelHandle::new(RiskModel::Trained(TrainedModel::new(
            Box::new(Recording(Arc::clone(&seen))),
            None,
        )));
        let points = [point(21.0, 105.0, 0), point(21.01, 105.0, 1)];

        let store = MemoryStore::new();
        let params = RouteParams::default();
        let first = analyze_route(&store, &model, &params, &points, now()).unwrap();
        let second = analyze_route(&store, &model, &params, &points, now()).unwrap();
        assert_eq!(first, second);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        // hour 17, Wednesday, weekday, rush hour
        assert_eq!(&seen[0][2..6], &[17.0, 2.0, 0.0, 1.0]);
        assert_eq!(seen[0], seen[1]);
    }

    #[test]
    fn out_of_range_point_is_invalid() {
        let result = analyze_route(
            &MemoryStore::new(),
            &ModelHandle::heuristic(),
            &RouteParams::default(),
            &[point(91.0, 105.0, 0), point(21.0, 105.0, 1)],
            now(),
        );
        assert!(matches!(result, Err(EngineError::InvalidInput { .. })));
    }

    #[test]
    fn n_points_give_n_minus_one_legs() {
        let store = MemoryStore::new();
        let model = ModelHandle::heuristic();
        let points = [
            point(21.0285, 105.8542, 0),
            point(21.0385, 105.8642, 1),
            point(21.0485, 105.8742, 2),
            point(21.0585, 105.8842, 3),
        ];

        for n in 2..=points.len() {
            let route =
                analyze_route(&store, &model, &RouteParams::default(), &points[..n], now())
                    .unwrap();
            assert_eq!(route.legs.len(), n - 1);
            let sum: f64 = route.legs.iter().map(|l| l.distance_km).sum();
            assert!((route.total_distance_km - sum).abs() < 1e-9);
            let time: f64 = route.legs.iter().map(|l| l.estimated_time_min).sum();
            assert!((route.total_time_min - time).abs() < 1e-9);
        }
    }

    #[test]
    fn points_are_processed_by_order_field() {
        let store = MemoryStore::new();
        let model = ModelHandle::heuristic();
        let sorted = [
            point(21.0, 105.0, 0),
            point(21.1, 105.0, 5),
            point(21.1, 105.1, 9),
        ];
        let shuffled = [sorted[2], sorted[0], sorted[1]];

        let a = analyze_route(&store, &model, &RouteParams::default(), &sorted, now()).unwrap();
        let b = analyze_route(&store, &model, &RouteParams::default(), &shuffled, now()).unwrap();
        assert_eq!(a, b);
        assert_eq!(b.legs[0].start.order, 0);
        assert_eq!(b.legs[1].end.order, 9);
    }

    #[test]
    fn quiet_route_is_relatively_safe() {
        // Heuristic: 0.2 base + 0.05 urban = 0.25 per leg
        let route = analyze_route(
            &MemoryStore::new(),
            &ModelHandle::heuristic(),
            &RouteParams::default(),
            &[point(21.0, 105.0, 0), point(21.01, 105.0, 1)],
            now(),
        )
        .unwrap();
        assert!((route.overall_risk_score - 25.0).abs() < 1e-9);
        assert_eq!(route.overall_risk_level, RiskLevel::Medium);
        assert_eq!(route.legs[0].risk_level, RiskLevel::Medium);
        assert_eq!(route.high_risk_legs, 0);
        assert_eq!(
            route.recommendations,
            vec![safe_route_advice(Language::Vi).to_string()]
        );
        // 50 km/h
        let leg = &route.legs[0];
        assert!((leg.estimated_time_min - leg.distance_km / 50.0 * 60.0).abs() < 1e-12);
    }

    #[test]
    fn accident_cluster_raises_leg_and_route_risk() {
        let store = cluster_store(Coordinate::new(21.005, 105.0), 12);
        let model = ModelHandle::heuristic();
        let params = RouteParams {
            language: Language::En,
            ..RouteParams::default()
        };

        // Single dangerous leg: 0.2 + 0.4 + 0.05 = 0.65
        let route = analyze_route(
            &store,
            &model,
            &params,
            &[point(21.0, 105.0, 0), point(21.01, 105.0, 1)],
            now(),
        )
        .unwrap();
        assert_eq!(route.legs[0].nearby_accidents, 12);
        assert_eq!(route.legs[0].risk_level, RiskLevel::High);
        assert!((route.overall_risk_score - 65.0).abs() < 1e-9);
        assert_eq!(route.overall_risk_level, RiskLevel::High);
        assert_eq!(
            route.recommendations,
            vec![
                dangerous_legs_advice(1, Language::En),
                high_overall_advice(Language::En).to_string(),
                timing_advice(Language::En).to_string(),
            ]
        );

        // Adding a quiet leg averages to (65 + 25) / 2 = 45
        let route = analyze_route(
            &store,
            &model,
            &params,
            &[
                point(21.0, 105.0, 0),
                point(21.01, 105.0, 1),
                point(21.5, 105.0, 2),
            ],
            now(),
        )
        .unwrap();
        assert_eq!(route.legs[1].nearby_accidents, 0);
        assert!((route.overall_risk_score - 45.0).abs() < 1e-9);
        assert_eq!(route.overall_risk_level, RiskLevel::Medium);
        assert_eq!(route.high_risk_legs, 1);
        assert_eq!(
            route.recommendations,
            vec![
                dangerous_legs_advice(1, Language::En),
                timing_advice(Language::En).to_string(),
            ]
        );
    }

    #[test]
    fn recommendations_are_never_empty() {
        for high in [0, 1, 4] {
            for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
                for score in [0.0, 30.0, 30.1, 90.0] {
                    assert!(!recommendations(high, level, score, Language::Vi).is_empty());
                }
            }
        }
    }
}
