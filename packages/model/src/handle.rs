//! Shared, hot-swappable model ownership.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use crate::artifact::load_risk_model;
use crate::{ModelInput, Prediction, RiskModel};

/// Owns the current [`RiskModel`] for concurrent readers.
///
/// Each prediction clones the current `Arc` and runs against that snapshot,
/// so a [`ModelHandle::swap`] never tears a prediction in flight: callers
/// see either the whole old model or the whole new one.
#[derive(Debug)]
pub struct ModelHandle {
    current: RwLock<Arc<RiskModel>>,
}

impl Default for ModelHandle {
    fn default() -> Self {
        Self::heuristic()
    }
}

impl ModelHandle {
    #[must_use]
    pub fn new(model: RiskModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(model)),
        }
    }

    /// A handle holding only the heuristic model.
    #[must_use]
    pub fn heuristic() -> Self {
        Self::new(RiskModel::default())
    }

    /// A handle holding the best model loadable from the given artifacts.
    #[must_use]
    pub fn load(model_path: &Path, scaler_path: &Path) -> Self {
        Self::new(load_risk_model(model_path, scaler_path))
    }

    /// The model predictions currently run against.
    #[must_use]
    pub fn current(&self) -> Arc<RiskModel> {
        // The guarded value is a plain Arc, so a poisoned lock still holds a
        // consistent model.
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replaces the model, returning the previous one.
    pub fn swap(&self, model: RiskModel) -> Arc<RiskModel> {
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, Arc::new(model))
    }

    /// Reloads from artifacts and swaps the result in. Returns whether a
    /// trained model is now active.
    pub fn reload(&self, model_path: &Path, scaler_path: &Path) -> bool {
        let model = load_risk_model(model_path, scaler_path);
        let trained = model.is_trained();
        self.swap(model);
        log::info!(
            "Model reloaded ({})",
            if trained { "trained" } else { "heuristic" }
        );
        trained
    }

    #[must_use]
    pub fn is_trained(&self) -> bool {
        self.current().is_trained()
    }

    /// Predicts with the current model.
    #[must_use]
    pub fn predict(&self, input: &ModelInput) -> Prediction {
        self.current().predict(input)
    }
}

#[cfg(test)]
mod tests {
    use accident_risk_accident_models::{Coordinate, RoadType, WeatherCondition};
    use chrono::{TimeZone as _, Utc};

    use super::*;
    use crate::features::Features;
    use crate::{Estimator, HeuristicModel, ModelError, PredictionSource, TrainedModel};

    #[derive(Debug)]
    struct Constant(f64);

    impl Estimator for Constant {
        fn predict_proba(&self, _features: &Features) -> Result<f64, ModelError> {
            Ok(self.0)
        }

        fn predict(&self, _features: &Features) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn trained(p: f64) -> RiskModel {
        RiskModel::Trained(TrainedModel::new(Box::new(Constant(p)), None))
    }

    fn input() -> ModelInput {
        ModelInput {
            location: Coordinate::new(21.0285, 105.8542),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 3, 2, 23, 0, 0).unwrap().naive_utc()),
            now: Utc.with_ymd_and_hms(2024, 3, 3, 9, 0, 0).unwrap().naive_utc(),
            weather: Some(WeatherCondition::Clear),
            road_type: Some(RoadType::Urban),
            historical_accidents: 1,
        }
    }

    #[test]
    fn swap_changes_predictions() {
        let handle = ModelHandle::heuristic();
        assert!(!handle.is_trained());
        assert_eq!(handle.predict(&input()).source, PredictionSource::Heuristic);

        let previous = handle.swap(trained(0.9));
        assert!(!previous.is_trained());
        assert!(handle.is_trained());
        let prediction = handle.predict(&input());
        assert_eq!(prediction.source, PredictionSource::Trained);
        assert!((prediction.probability - 0.9).abs() < f64::EPSILON);
    }

    #[test]
    fn reload_without_artifacts_reverts_to_heuristic() {
        let handle = ModelHandle::new(trained(0.9));
        let dir = std::env::temp_dir().join("accident_risk_handle_no_artifacts");
        assert!(!handle.reload(&dir.join("model.json"), &dir.join("scaler.json")));
        assert!(!handle.is_trained());
    }

    #[test]
    fn concurrent_predictions_see_whole_models() {
        let handle = ModelHandle::heuristic();
        let heuristic = HeuristicModel::default().predict(&input());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                scope.spawn(|| {
                    for _ in 0..500 {
                        let p = handle.predict(&input());
                        match p.source {
                            PredictionSource::Trained => {
                                assert!((p.probability - 0.9).abs() < f64::EPSILON);
                            }
                            PredictionSource::Heuristic => {
                                assert!((p.probability - heuristic).abs() < f64::EPSILON);
                            }
                            PredictionSource::Fallback => panic!("unexpected fallback"),
                        }
                    }
                });
            }
            scope.spawn(|| {
                for i in 0..200 {
                    if i % 2 == 0 {
                        handle.swap(trained(0.9));
                    } else {
                        handle.swap(RiskModel::default());
                    }
                }
            });
        });
    }
}
