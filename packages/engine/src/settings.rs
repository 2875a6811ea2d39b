//! Engine configuration.
//!
//! Settings are layered: the embedded `config/default.toml`, then an
//! optional TOML file, then environment variable overrides. Fields missing
//! from a file keep their defaults.

use std::path::{Path, PathBuf};

use accident_risk_engine_models::Language;
use accident_risk_spatial::DEFAULT_CELL_PRECISION;
use serde::{Deserialize, Serialize};

use crate::EngineError;
use crate::classify::RiskThresholds;

/// Defaults baked into the binary.
const DEFAULT_SETTINGS_TOML: &str = include_str!("../config/default.toml");

/// Beyond this many decimals a cell is smaller than GPS noise.
const MAX_CELL_PRECISION: u32 = 9;

/// Tunable parameters of the risk engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskSettings {
    /// Point probabilities below this are low risk.
    pub low_risk_threshold: f64,
    /// Point probabilities at or above this are high risk.
    pub high_risk_threshold: f64,
    /// Route scores (`0..=100`) below this are low risk.
    pub route_low_threshold: f64,
    /// Route scores (`0..=100`) at or above this are high risk.
    pub route_high_threshold: f64,
    /// Historical context radius for point assessments.
    pub nearby_radius_km: f64,
    /// Historical context radius around each route leg midpoint.
    pub route_leg_radius_km: f64,
    /// Maximum neighbors considered for historical context.
    pub nearby_limit: usize,
    /// Speed used to estimate leg traversal times.
    pub average_speed_kmh: f64,
    /// Decimal digits kept in cell keys.
    pub cell_precision: u32,
    /// Padding around a cell's corners when gathering its accidents.
    pub cell_padding_deg: f64,
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
    /// Language of messages and route recommendations.
    pub language: Language,
}

impl Default for RiskSettings {
    fn default() -> Self {
        Self {
            low_risk_threshold: 0.2,
            high_risk_threshold: 0.5,
            route_low_threshold: 20.0,
            route_high_threshold: 50.0,
            nearby_radius_km: 5.0,
            route_leg_radius_km: 1.0,
            nearby_limit: 100,
            average_speed_kmh: 50.0,
            cell_precision: DEFAULT_CELL_PRECISION,
            cell_padding_deg: 0.01,
            model_path: PathBuf::from("./data/models/accident_risk_model.json"),
            scaler_path: PathBuf::from("./data/models/scaler.json"),
            language: Language::Vi,
        }
    }
}

impl RiskSettings {
    /// Parses settings from a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the document is not valid TOML
    /// for these settings.
    pub fn from_toml(contents: &str) -> Result<Self, EngineError> {
        toml::de::from_str(contents).map_err(|e| EngineError::Config {
            message: e.to_string(),
        })
    }

    /// The embedded default settings.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the embedded TOML is invalid.
    pub fn embedded() -> Result<Self, EngineError> {
        Self::from_toml(DEFAULT_SETTINGS_TOML)
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, EngineError> {
        let contents = std::fs::read_to_string(path).map_err(|e| EngineError::Config {
            message: format!("Failed to read {}: {e}", path.display()),
        })?;
        Self::from_toml(&contents)
    }

    /// Loads settings from `config_path` (or the embedded defaults),
    /// applies environment overrides and validates the result.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if a file or override is malformed,
    /// or [`EngineError::InvalidThresholds`] if the thresholds are out of
    /// order.
    pub fn load(config_path: Option<&Path>) -> Result<Self, EngineError> {
        let settings = match config_path {
            Some(path) => {
                log::info!("Loading settings from {}", path.display());
                Self::from_file(path)?
            }
            None => Self::embedded()?,
        };
        let settings = settings.with_overrides(|name| std::env::var(name).ok())?;
        settings.validate()?;
        Ok(settings)
    }

    /// Applies overrides from `lookup`, which maps an environment variable
    /// name to its value.
    ///
    /// Recognised variables: `MODEL_PATH`, `SCALER_PATH`,
    /// `LOW_RISK_THRESHOLD`, `HIGH_RISK_THRESHOLD`, `NEARBY_RADIUS_KM`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Config`] if a numeric override does not parse.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, EngineError> {
        if let Some(path) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(path);
        }
        if let Some(path) = lookup("SCALER_PATH") {
            self.scaler_path = PathBuf::from(path);
        }
        if let Some(value) = parse_override(&lookup, "LOW_RISK_THRESHOLD")? {
            self.low_risk_threshold = value;
        }
        if let Some(value) = parse_override(&lookup, "HIGH_RISK_THRESHOLD")? {
            self.high_risk_threshold = value;
        }
        if let Some(value) = parse_override(&lookup, "NEARBY_RADIUS_KM")? {
            self.nearby_radius_km = value;
        }
        Ok(self)
    }

    /// Checks thresholds and numeric parameters.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] for out-of-order
    /// thresholds, or [`EngineError::Config`] for non-positive radii or
    /// speed, negative padding or an oversized cell precision.
    pub fn validate(&self) -> Result<(), EngineError> {
        self.point_thresholds()?;
        self.route_thresholds()?;

        for (name, value) in [
            ("nearby_radius_km", self.nearby_radius_km),
            ("route_leg_radius_km", self.route_leg_radius_km),
            ("average_speed_kmh", self.average_speed_kmh),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(EngineError::Config {
                    message: format!("{name} must be a positive number, got {value}"),
                });
            }
        }
        if !(self.cell_padding_deg.is_finite() && self.cell_padding_deg >= 0.0) {
            return Err(EngineError::Config {
                message: format!(
                    "cell_padding_deg must be non-negative, got {}",
                    self.cell_padding_deg
                ),
            });
        }
        if self.cell_precision > MAX_CELL_PRECISION {
            return Err(EngineError::Config {
                message: format!(
                    "cell_precision must be at most {MAX_CELL_PRECISION}, got {}",
                    self.cell_precision
                ),
            });
        }
        Ok(())
    }

    /// Thresholds for point probabilities.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] unless
    /// `0 <= low < high <= 1`.
    pub fn point_thresholds(&self) -> Result<RiskThresholds, EngineError> {
        RiskThresholds::point(self.low_risk_threshold, self.high_risk_threshold)
    }

    /// Thresholds for averaged route scores.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] unless
    /// `0 <= low < high <= 100`.
    pub fn route_thresholds(&self) -> Result<RiskThresholds, EngineError> {
        RiskThresholds::route(self.route_low_threshold, self.route_high_threshold)
    }
}

fn parse_override(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<f64>, EngineError> {
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<f64>().map_err(|e| EngineError::Config {
                message: format!("{name}={raw:?} is not a number: {e}"),
            })
        })
        .transpose()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn embedded_defaults_match_default_impl() {
        assert_eq!(RiskSettings::embedded().unwrap(), RiskSettings::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let settings = RiskSettings::from_toml(
            r#"
            high_risk_threshold = 0.6
            language = "en"
            "#,
        )
        .unwrap();
        assert!((settings.high_risk_threshold - 0.6).abs() < f64::EPSILON);
        assert_eq!(settings.language, Language::En);
        assert!((settings.low_risk_threshold - 0.2).abs() < f64::EPSILON);
        assert_eq!(settings.cell_precision, 3);
    }

    #[test]
    fn environment_overrides_apply() {
        let env: BTreeMap<&str, &str> = [
            ("MODEL_PATH", "/tmp/model.json"),
            ("LOW_RISK_THRESHOLD", "0.1"),
            ("NEARBY_RADIUS_KM", " 2.5 "),
        ]
        .into_iter()
        .collect();
        let settings = RiskSettings::default()
            .with_overrides(|name| env.get(name).map(ToString::to_string))
            .unwrap();
        assert_eq!(settings.model_path, PathBuf::from("/tmp/model.json"));
        assert!((settings.low_risk_threshold - 0.1).abs() < f64::EPSILON);
        assert!((settings.nearby_radius_km - 2.5).abs() < f64::EPSILON);
        assert!((settings.high_risk_threshold - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn malformed_override_is_a_config_error() {
        let result = RiskSettings::default().with_overrides(|name| {
            (name == "HIGH_RISK_THRESHOLD").then(|| "lots".to_string())
        });
        assert!(matches!(result, Err(EngineError::Config { .. })));
    }

    #[test]
    fn validate_rejects_bad_values() {
        let settings = RiskSettings {
            low_risk_threshold: 0.6,
            ..RiskSettings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(EngineError::InvalidThresholds { .. })
        ));

        let settings = RiskSettings {
            route_high_threshold: 120.0,
            ..RiskSettings::default()
        };
        assert!(settings.validate().is_err());

        let settings = RiskSettings {
            average_speed_kmh: 0.0,
            ..RiskSettings::default()
        };
        assert!(matches!(settings.validate(), Err(EngineError::Config { .. })));

        let settings = RiskSettings {
            cell_precision: 12,
            ..RiskSettings::default()
        };
        assert!(settings.validate().is_err());

        assert!(RiskSettings::default().validate().is_ok());
    }
}
