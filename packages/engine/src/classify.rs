//! Three-level risk classification.

use accident_risk_accident_models::RiskLevel;

use crate::EngineError;

/// A validated pair of classification thresholds.
///
/// Buckets are closed-open: a value equal to a threshold belongs to the
/// higher bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskThresholds {
    low: f64,
    high: f64,
}

impl RiskThresholds {
    /// Default point thresholds on the `0..=1` probability scale.
    pub const POINT: Self = Self {
        low: 0.2,
        high: 0.5,
    };

    /// Default route thresholds on the `0..=100` score scale.
    pub const ROUTE: Self = Self {
        low: 20.0,
        high: 50.0,
    };

    /// Thresholds satisfying `0 <= low < high <= max`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] otherwise, including for
    /// NaN.
    pub fn new(low: f64, high: f64, max: f64) -> Result<Self, EngineError> {
        if 0.0 <= low && low < high && high <= max {
            Ok(Self { low, high })
        } else {
            Err(EngineError::InvalidThresholds { low, high, max })
        }
    }

    /// Thresholds for probabilities in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] unless
    /// `0 <= low < high <= 1`.
    pub fn point(low: f64, high: f64) -> Result<Self, EngineError> {
        Self::new(low, high, 1.0)
    }

    /// Thresholds for scores in `[0, 100]`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidThresholds`] unless
    /// `0 <= low < high <= 100`.
    pub fn route(low: f64, high: f64) -> Result<Self, EngineError> {
        Self::new(low, high, 100.0)
    }

    #[must_use]
    pub const fn low(&self) -> f64 {
        self.low
    }

    #[must_use]
    pub const fn high(&self) -> f64 {
        self.high
    }

    /// Classifies `value`.
    #[must_use]
    pub fn classify(&self, value: f64) -> RiskLevel {
        if value < self.low {
            RiskLevel::Low
        } else if value < self.high {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}

/// Classifies `probability` against `low` and `high`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidThresholds`] unless
/// `0 <= low < high <= 1`.
pub fn classify(probability: f64, low: f64, high: f64) -> Result<RiskLevel, EngineError> {
    Ok(RiskThresholds::point(low, high)?.classify(probability))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_belong_to_the_higher_bucket() {
        let t = RiskThresholds::POINT;
        assert_eq!(t.classify(0.0), RiskLevel::Low);
        assert_eq!(t.classify(0.199_999), RiskLevel::Low);
        assert_eq!(t.classify(0.2), RiskLevel::Medium);
        assert_eq!(t.classify(0.499_999), RiskLevel::Medium);
        assert_eq!(t.classify(0.5), RiskLevel::High);
        assert_eq!(t.classify(1.0), RiskLevel::High);
    }

    #[test]
    fn route_thresholds_use_score_scale() {
        let t = RiskThresholds::ROUTE;
        assert_eq!(t.classify(19.9), RiskLevel::Low);
        assert_eq!(t.classify(20.0), RiskLevel::Medium);
        assert_eq!(t.classify(50.0), RiskLevel::High);
        assert_eq!(RiskThresholds::route(20.0, 50.0).unwrap(), t);
    }

    #[test]
    fn classification_is_monotone() {
        let t = RiskThresholds::POINT;
        let mut previous = RiskLevel::Low;
        for i in 0..=1000 {
            let level = t.classify(f64::from(i) / 1000.0);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn rejects_invalid_thresholds() {
        assert!(RiskThresholds::point(0.5, 0.5).is_err());
        assert!(RiskThresholds::point(0.6, 0.5).is_err());
        assert!(RiskThresholds::point(-0.1, 0.5).is_err());
        assert!(RiskThresholds::point(0.2, 1.5).is_err());
        assert!(RiskThresholds::point(f64::NAN, 0.5).is_err());
        assert!(RiskThresholds::point(0.0, 1.0).is_ok());
        assert!(classify(0.3, 0.2, 0.5).is_ok_and(|l| l == RiskLevel::Medium));
        assert!(matches!(
            classify(0.3, 0.7, 0.5),
            Err(EngineError::InvalidThresholds { .. })
        ));
    }
}
