use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::indicators::ConflictStatus;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

/// Component weights of the need index. Must sum to 1.0.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WeightConfig {
    #[serde(default = "default_baseline")]
    pub baseline: f64,
    #[serde(default = "default_gender")]
    pub gender: f64,
    #[serde(default = "default_rural_urban")]
    pub rural_urban: f64,
    #[serde(default = "default_economic")]
    pub economic: f64,
    #[serde(default = "default_quality")]
    pub quality: f64,
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            baseline: default_baseline(),
            gender: default_gender(),
            rural_urban: default_rural_urban(),
            economic: default_economic(),
            quality: default_quality(),
        }
    }
}

impl WeightConfig {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.baseline,
            self.gender,
            self.rural_urban,
            self.economic,
            self.quality,
        ]
    }

    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::config(
                "index weights must be finite and non-negative",
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::config(format!(
                "index weights must sum to 1.0, got {sum:.6}"
            )));
        }
        Ok(())
    }
}

/// Conflict multiplier lookup table.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ConflictMultipliers {
    #[serde(default = "default_stable")]
    pub stable: f64,
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_severe")]
    pub severe: f64,
}

impl Default for ConflictMultipliers {
    fn default() -> Self {
        Self {
            stable: default_stable(),
            moderate: default_moderate(),
            severe: default_severe(),
        }
    }
}

impl ConflictMultipliers {
    pub fn lookup(&self, status: ConflictStatus) -> f64 {
        match status {
            ConflictStatus::Stable => self.stable,
            ConflictStatus::ModerateConflict => self.moderate,
            ConflictStatus::SevereConflict => self.severe,
        }
    }

    /// Multipliers below 1.0 would let the final score drop under the base score.
    pub fn validate(&self) -> EngineResult<()> {
        for status in ConflictStatus::ALL {
            let value = self.lookup(status);
            if !value.is_finite() || value < 1.0 {
                return Err(EngineError::config(format!(
                    "conflict multiplier for {} must be >= 1.0, got {value}",
                    status.as_slug()
                )));
            }
        }
        Ok(())
    }
}

fn default_baseline() -> f64 {
    0.30
}

fn default_gender() -> f64 {
    0.25
}

fn default_rural_urban() -> f64 {
    0.20
}

fn default_economic() -> f64 {
    0.15
}

fn default_quality() -> f64 {
    0.10
}

fn default_stable() -> f64 {
    1.0
}

fn default_moderate() -> f64 {
    1.5
}

fn default_severe() -> f64 {
    3.0
}

#[cfg(test)]
mod tests {
    use super::{ConflictMultipliers, WeightConfig};
    use crate::error::EngineError;
    use crate::indicators::ConflictStatus;

    #[test]
    fn default_weights_sum_to_one() {
        WeightConfig::default()
            .validate()
            .expect("default weights must validate");
    }

    #[test]
    fn rejects_weights_off_by_more_than_tolerance() {
        let weights = WeightConfig {
            quality: 0.11,
            ..WeightConfig::default()
        };
        assert!(matches!(weights.validate(), Err(EngineError::Config(_))));
    }

    #[test]
    fn rejects_negative_weight_even_when_sum_is_one() {
        let weights = WeightConfig {
            baseline: 0.50,
            quality: -0.10,
            ..WeightConfig::default()
        };
        assert!(weights.validate().is_err());
    }

    #[test]
    fn multiplier_lookup_and_validation() {
        let table = ConflictMultipliers::default();
        assert_eq!(table.lookup(ConflictStatus::SevereConflict), 3.0);
        assert_eq!(table.lookup(ConflictStatus::Stable), 1.0);
        table.validate().expect("default table validates");

        let broken = ConflictMultipliers {
            moderate: 0.8,
            ..table
        };
        assert!(matches!(broken.validate(), Err(EngineError::Config(_))));
    }
}
