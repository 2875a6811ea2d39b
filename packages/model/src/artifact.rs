//! Model and scaler artifacts on disk.
//!
//! Both artifacts are JSON. A missing file is reported as `Ok(None)`
//! rather than an error so callers can fall back to the heuristic.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use crate::trained::{LinearEstimator, StandardScaler, TrainedModel};
use crate::{HeuristicModel, ModelError, RiskModel};

/// Loads a model artifact, or `None` if `path` does not exist.
///
/// # Errors
///
/// Returns [`ModelError`] if the file exists but cannot be read, parsed or
/// validated.
pub fn load_model(path: &Path) -> Result<Option<LinearEstimator>, ModelError> {
    let Some(contents) = read_optional(path)? else {
        return Ok(None);
    };
    let estimator: LinearEstimator = serde_json::from_str(&contents)?;
    estimator.validate()?;
    Ok(Some(estimator))
}

/// Loads a scaler artifact, or `None` if `path` does not exist.
///
/// # Errors
///
/// Returns [`ModelError`] if the file exists but cannot be read, parsed or
/// validated.
pub fn load_scaler(path: &Path) -> Result<Option<StandardScaler>, ModelError> {
    let Some(contents) = read_optional(path)? else {
        return Ok(None);
    };
    let scaler: StandardScaler = serde_json::from_str(&contents)?;
    scaler.validate()?;
    Ok(Some(scaler))
}

/// Writes a model artifact.
///
/// # Errors
///
/// Returns [`ModelError`] if the file cannot be written.
pub fn save_model(path: &Path, estimator: &LinearEstimator) -> Result<(), ModelError> {
    write_json(path, &serde_json::to_string_pretty(estimator)?)
}

/// Writes a scaler artifact.
///
/// # Errors
///
/// Returns [`ModelError`] if the file cannot be written.
pub fn save_scaler(path: &Path, scaler: &StandardScaler) -> Result<(), ModelError> {
    write_json(path, &serde_json::to_string_pretty(scaler)?)
}

/// Builds the best model available from the artifacts at the given paths.
///
/// Returns [`RiskModel::Trained`] when the model artifact loads, with the
/// scaler when that loads too. Any missing or broken model artifact yields
/// [`RiskModel::Heuristic`]; a broken scaler is logged and skipped.
#[must_use]
pub fn load_risk_model(model_path: &Path, scaler_path: &Path) -> RiskModel {
    let estimator = match load_model(model_path) {
        Ok(Some(estimator)) => estimator,
        Ok(None) => {
            log::warn!(
                "No model artifact at {}, using heuristic model",
                model_path.display()
            );
            return RiskModel::Heuristic(HeuristicModel::default());
        }
        Err(e) => {
            log::warn!(
                "Failed to load model from {}: {e}; using heuristic model",
                model_path.display()
            );
            return RiskModel::Heuristic(HeuristicModel::default());
        }
    };

    let scaler = match load_scaler(scaler_path) {
        Ok(scaler) => scaler,
        Err(e) => {
            log::warn!(
                "Failed to load scaler from {}: {e}; continuing unscaled",
                scaler_path.display()
            );
            None
        }
    };

    log::info!(
        "Loaded {:?} model from {} ({})",
        estimator.kind,
        model_path.display(),
        if scaler.is_some() {
            "scaled"
        } else {
            "unscaled"
        }
    );

    RiskModel::Trained(TrainedModel::new(Box::new(estimator), scaler))
}

fn read_optional(path: &Path) -> Result<Option<String>, ModelError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

fn write_json(path: &Path, json: &str) -> Result<(), ModelError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, json)?;
    Ok(())
}
