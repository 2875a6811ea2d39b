//! Trained estimator inference.

use std::fmt::Debug;

use accident_risk_accident_models::scoring::{SCORING_TABLES, ScoringTables};
use serde::{Deserialize, Serialize};

use crate::features::{FEATURE_COUNT, Features, build_features};
use crate::heuristic::HeuristicModel;
use crate::{ModelError, ModelInput};

/// A fitted statistical estimator over [`Features`].
///
/// Classifiers answer [`Estimator::predict_proba`] with the positive-class
/// probability. Regressors leave it unsupported and answer
/// [`Estimator::predict`] with a raw value.
pub trait Estimator: Send + Sync + Debug {
    /// Probability of the positive (accident) class.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Unsupported`] if the estimator cannot produce
    /// probabilities, or any other [`ModelError`] on failure.
    fn predict_proba(&self, _features: &Features) -> Result<f64, ModelError> {
        Err(ModelError::Unsupported("predict_proba"))
    }

    /// Raw prediction: a class label for classifiers, a value for
    /// regressors.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] on failure.
    fn predict(&self, features: &Features) -> Result<f64, ModelError>;
}

/// The family of a [`LinearEstimator`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearKind {
    /// Logistic regression classifier.
    Logistic,
    /// Linear regression.
    Linear,
}

/// A linear estimator as stored in a model artifact.
///
/// ```json
/// {"kind": "logistic", "weights": [..9 values..], "intercept": -1.2}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    pub kind: LinearKind,
    pub weights: Vec<f64>,
    pub intercept: f64,
}

impl LinearEstimator {
    /// Checks the weight vector has one finite value per feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] for the wrong number of
    /// weights, or [`ModelError::NonFinite`] for a NaN or infinite
    /// coefficient.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_len("weights", self.weights.len())?;
        if self.weights.iter().chain([&self.intercept]).all(|w| w.is_finite()) {
            Ok(())
        } else {
            Err(ModelError::NonFinite)
        }
    }

    fn decision(&self, features: &Features) -> Result<f64, ModelError> {
        check_len("weights", self.weights.len())?;
        Ok(self
            .weights
            .iter()
            .zip(features)
            .fold(self.intercept, |acc, (w, x)| w.mul_add(*x, acc)))
    }
}

impl Estimator for LinearEstimator {
    fn predict_proba(&self, features: &Features) -> Result<f64, ModelError> {
        match self.kind {
            LinearKind::Logistic => {
                let z = self.decision(features)?;
                Ok(1.0 / (1.0 + (-z).exp()))
            }
            LinearKind::Linear => Err(ModelError::Unsupported("predict_proba")),
        }
    }

    fn predict(&self, features: &Features) -> Result<f64, ModelError> {
        match self.kind {
            LinearKind::Logistic => Ok(if self.predict_proba(features)? >= 0.5 {
                1.0
            } else {
                0.0
            }),
            LinearKind::Linear => self.decision(features),
        }
    }
}

/// Per-feature standardisation applied before the estimator.
///
/// ```json
/// {"mean": [..9 values..], "scale": [..9 values..]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    /// Checks both vectors have one value per feature.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if either vector has the wrong
    /// length.
    pub fn validate(&self) -> Result<(), ModelError> {
        check_len("mean", self.mean.len())?;
        check_len("scale", self.scale.len())
    }

    /// Standardises `features` in place. A zero scale leaves the centred
    /// value unscaled.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::ShapeMismatch`] if the scaler does not match
    /// the feature vector length.
    pub fn transform(&self, features: &mut Features) -> Result<(), ModelError> {
        self.validate()?;
        for ((x, mean), scale) in features.iter_mut().zip(&self.mean).zip(&self.scale) {
            let scale = if scale.abs() > 0.0 { *scale } else { 1.0 };
            *x = (*x - mean) / scale;
        }
        Ok(())
    }
}

fn check_len(what: &'static str, found: usize) -> Result<(), ModelError> {
    if found == FEATURE_COUNT {
        Ok(())
    } else {
        Err(ModelError::ShapeMismatch {
            what,
            expected: FEATURE_COUNT,
            found,
        })
    }
}

/// A loaded estimator with its optional scaler.
#[derive(Debug)]
pub struct TrainedModel {
    estimator: Box<dyn Estimator>,
    scaler: Option<StandardScaler>,
    tables: ScoringTables,
}

impl TrainedModel {
    #[must_use]
    pub fn new(estimator: Box<dyn Estimator>, scaler: Option<StandardScaler>) -> Self {
        Self {
            estimator,
            scaler,
            tables: SCORING_TABLES,
        }
    }

    /// The heuristic that answers when this estimator fails.
    #[must_use]
    pub const fn fallback(&self) -> HeuristicModel {
        HeuristicModel::new(self.tables)
    }

    /// Probability for `input`, clamped to `[0, 1]`.
    ///
    /// Prefers the estimator's probability output and falls back to its raw
    /// prediction when probabilities are unsupported.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError`] if scaling or inference fails, or
    /// [`ModelError::NonFinite`] if the estimator output is NaN or infinite.
    pub fn predict(&self, input: &ModelInput) -> Result<f64, ModelError> {
        let mut features = build_features(input, &self.tables);
        if let Some(scaler) = &self.scaler {
            scaler.transform(&mut features)?;
        }

        let raw = match self.estimator.predict_proba(&features) {
            Err(ModelError::Unsupported(_)) => self.estimator.predict(&features)?,
            other => other?,
        };

        if raw.is_finite() {
            Ok(raw.clamp(0.0, 1.0))
        } else {
            Err(ModelError::NonFinite)
        }
    }
}

#[cfg(test)]
mod tests {
    use accident_risk_accident_models::{Coordinate, RoadType, WeatherCondition};
    use chrono::{TimeZone as _, Utc};

    use super::*;

    #[derive(Debug)]
    struct Constant(f64);

    impl Estimator for Constant {
        fn predict(&self, _features: &Features) -> Result<f64, ModelError> {
            Ok(self.0)
        }
    }

    fn input() -> ModelInput {
        ModelInput {
            location: Coordinate::new(21.0285, 105.8542),
            timestamp: Some(Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap().naive_utc()),
            now: Utc.with_ymd_and_hms(2024, 1, 16, 9, 0, 0).unwrap().naive_utc(),
            weather: Some(WeatherCondition::Rain),
            road_type: Some(RoadType::Highway),
            historical_accidents: 7,
        }
    }

    fn logistic(weights: Vec<f64>, intercept: f64) -> LinearEstimator {
        LinearEstimator {
            kind: LinearKind::Logistic,
            weights,
            intercept,
        }
    }

    #[test]
    fn regressor_output_is_clamped() {
        let high = TrainedModel::new(Box::new(Constant(3.5)), None);
        assert!((high.predict(&input()).unwrap() - 1.0).abs() < f64::EPSILON);

        let low = TrainedModel::new(Box::new(Constant(-0.2)), None);
        assert!(low.predict(&input()).unwrap().abs() < f64::EPSILON);

        let mid = TrainedModel::new(Box::new(Constant(0.42)), None);
        assert!((mid.predict(&input()).unwrap() - 0.42).abs() < f64::EPSILON);
    }

    #[test]
    fn non_finite_output_is_an_error() {
        let model = TrainedModel::new(Box::new(Constant(f64::NAN)), None);
        assert!(matches!(model.predict(&input()), Err(ModelError::NonFinite)));
    }

    #[test]
    fn logistic_uses_probability_output() {
        // Only the historical count contributes: sigmoid(0.1 * 7 - 0.7) = 0.5
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[8] = 0.1;
        let model = TrainedModel::new(Box::new(logistic(weights, -0.7)), None);
        let p = model.predict(&input()).unwrap();
        assert!((p - 0.5).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn linear_falls_back_to_raw_prediction() {
        let mut weights = vec![0.0; FEATURE_COUNT];
        weights[6] = 0.5;
        let estimator = LinearEstimator {
            kind: LinearKind::Linear,
            weights,
            intercept: 0.1,
        };
        assert!(matches!(
            estimator.predict_proba(&[0.0; FEATURE_COUNT]),
            Err(ModelError::Unsupported(_))
        ));
        // rain feature score 0.5 -> 0.1 + 0.25
        let model = TrainedModel::new(Box::new(estimator), None);
        assert!((model.predict(&input()).unwrap() - 0.35).abs() < 1e-12);
    }

    #[test]
    fn scaler_standardises_and_ignores_zero_scale() {
        let scaler = StandardScaler {
            mean: vec![1.0; FEATURE_COUNT],
            scale: vec![2.0, 0.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0, 2.0],
        };
        let mut features = [5.0; FEATURE_COUNT];
        scaler.transform(&mut features).unwrap();
        assert!((features[0] - 2.0).abs() < f64::EPSILON);
        assert!((features[1] - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let estimator = logistic(vec![0.0; 3], 0.0);
        assert!(matches!(
            estimator.validate(),
            Err(ModelError::ShapeMismatch {
                what: "weights",
                expected: FEATURE_COUNT,
                found: 3
            })
        ));
        let model = TrainedModel::new(Box::new(estimator), None);
        assert!(model.predict(&input()).is_err());

        let scaler = StandardScaler {
            mean: vec![0.0; FEATURE_COUNT],
            scale: vec![1.0; 2],
        };
        assert!(scaler.validate().is_err());
    }

    #[test]
    fn non_finite_weights_are_rejected() {
        let estimator = logistic(vec![f64::INFINITY; FEATURE_COUNT], 0.0);
        assert!(matches!(estimator.validate(), Err(ModelError::NonFinite)));
    }
}
