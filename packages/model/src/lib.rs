#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Accident risk models.
//!
//! A [`RiskModel`] is either [`RiskModel::Trained`], which runs a
//! statistical [`trained::Estimator`] over a fixed nine-value feature
//! vector, or [`RiskModel::Heuristic`], a closed-form weighted sum. Both
//! answer the same question: the probability, in `[0, 1]`, of an accident
//! at a place and time under given conditions.
//!
//! A missing model artifact is not an error. Loading falls back to the
//! heuristic, and a trained estimator that fails at inference time falls
//! through to the heuristic for that call; the [`PredictionSource`] of
//! each [`Prediction`] records which path produced it.
//!
//! [`handle::ModelHandle`] owns the current model and lets it be swapped
//! atomically while inference continues on other threads.

pub mod artifact;
pub mod features;
pub mod handle;
pub mod heuristic;
pub mod trained;

use accident_risk_accident_models::{Coordinate, RoadType, WeatherCondition};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use handle::ModelHandle;
pub use heuristic::HeuristicModel;
pub use trained::{Estimator, LinearEstimator, StandardScaler, TrainedModel};

/// Errors from loading or running a trained model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Reading an artifact failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// An artifact was not valid JSON for its type.
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// An artifact's vectors do not match the feature vector length.
    #[error("{what}: expected {expected} values, found {found}")]
    ShapeMismatch {
        /// Which vector was wrong.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        found: usize,
    },

    /// The estimator has no such output (e.g. no probabilities).
    #[error("Estimator does not support {0}")]
    Unsupported(&'static str),

    /// The estimator produced NaN or an infinity.
    #[error("Estimator produced a non-finite value")]
    NonFinite,

    /// Any other estimator failure.
    #[error("Estimator error: {message}")]
    Estimator {
        /// Description of what went wrong.
        message: String,
    },
}

/// Everything a model needs to score one location.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelInput {
    /// Where to score.
    pub location: Coordinate,
    /// Local wall-clock time to score for. The heuristic adds no
    /// time-of-day bonus without one.
    pub timestamp: Option<NaiveDateTime>,
    /// Wall-clock time of the call. Trained features use it when
    /// `timestamp` is unset.
    pub now: NaiveDateTime,
    /// Weather, `None` when unknown.
    pub weather: Option<WeatherCondition>,
    /// Road category, `None` when unknown.
    pub road_type: Option<RoadType>,
    /// Accidents recorded near `location`.
    pub historical_accidents: u32,
}

/// Which path produced a [`Prediction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredictionSource {
    /// The trained estimator.
    Trained,
    /// The heuristic model, because no trained model is loaded.
    Heuristic,
    /// The heuristic model, because the trained estimator failed.
    Fallback,
}

/// A risk probability and where it came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    /// Probability of an accident, always within `[0, 1]`.
    pub probability: f64,
    /// Which path produced the probability.
    pub source: PredictionSource,
}

/// A risk predictor.
#[derive(Debug)]
pub enum RiskModel {
    /// A loaded statistical estimator.
    Trained(TrainedModel),
    /// The closed-form fallback.
    Heuristic(HeuristicModel),
}

impl Default for RiskModel {
    fn default() -> Self {
        Self::Heuristic(HeuristicModel::default())
    }
}

impl RiskModel {
    /// Whether a trained estimator is loaded.
    #[must_use]
    pub const fn is_trained(&self) -> bool {
        matches!(self, Self::Trained(_))
    }

    /// Predicts the accident probability for `input`.
    ///
    /// Never fails: a trained estimator error is logged and answered by
    /// the heuristic instead.
    #[must_use]
    pub fn predict(&self, input: &ModelInput) -> Prediction {
        match self {
            Self::Heuristic(heuristic) => Prediction {
                probability: heuristic.predict(input),
                source: PredictionSource::Heuristic,
            },
            Self::Trained(trained) => match trained.predict(input) {
                Ok(probability) => Prediction {
                    probability,
                    source: PredictionSource::Trained,
                },
                Err(e) => {
                    log::warn!("Trained model failed, using heuristic fallback: {e}");
                    Prediction {
                        probability: trained.fallback().predict(input),
                        source: PredictionSource::Fallback,
                    }
                }
            },
        }
    }
}
