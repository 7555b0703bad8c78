pub mod calculator;
pub mod weights;

use serde::{Deserialize, Serialize};

use crate::indicators::ConflictStatus;

pub use calculator::{compute_score, relative_need, score_all};
pub use weights::{ConflictMultipliers, WeightConfig};

/// Clamped component values that entered the weighted sum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScoreComponents {
    pub baseline_gap: f64,
    pub gender_parity_gap: f64,
    pub rural_urban_gap: f64,
    pub poverty_rate: f64,
    pub quality_deficit: f64,
}

impl ScoreComponents {
    pub fn as_array(&self) -> [f64; 5] {
        [
            self.baseline_gap,
            self.gender_parity_gap,
            self.rural_urban_gap,
            self.poverty_rate,
            self.quality_deficit,
        ]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompositeScore {
    pub country: String,
    pub conflict_status: ConflictStatus,
    pub components: ScoreComponents,
    pub base_score: f64,
    pub multiplier: f64,
    pub final_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelativeNeed {
    pub country: String,
    pub final_score: f64,
    /// Final score divided by the smallest positive final score in the set.
    pub ratio_to_lowest: Option<f64>,
}
