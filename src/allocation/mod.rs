pub mod needs;
pub mod phases;
pub mod proportional;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub use needs::{NeedEntry, NeedTable};
pub use phases::{
    split_phases, ConflictSeverityTrigger, PhaseSummary, PhaseTrigger, PhasedAllocation,
    PhasedPlan,
};
pub use proportional::{allocate, allocate_fixed_need, build_plan};

const MAX_PRECISION: u32 = 6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum AllocationMode {
    /// Budget shares follow the need index.
    #[default]
    Proportional,
    /// Budget follows a documented per-country need table.
    FixedNeed,
}

impl Display for AllocationMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Proportional => write!(f, "proportional"),
            Self::FixedNeed => write!(f, "fixed_need"),
        }
    }
}

impl FromStr for AllocationMode {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        match normalized.as_str() {
            "proportional" | "score" => Ok(Self::Proportional),
            "fixed_need" | "need" | "needs" => Ok(Self::FixedNeed),
            _ => Err(EngineError::config(format!("unknown allocation mode: {s}"))),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllocationBasis {
    Proportional,
    EqualSplit,
    FixedNeed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationConfig {
    #[serde(default = "default_total_budget")]
    pub total_budget: f64,
    /// Decimal places kept in allocated amounts.
    #[serde(default = "default_precision")]
    pub precision: u32,
    #[serde(default)]
    pub mode: AllocationMode,
    /// Phase 2 is released only where the conflict multiplier is at or below this.
    #[serde(default = "default_phase_2_max_conflict_multiplier")]
    pub phase_2_max_conflict_multiplier: f64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            total_budget: default_total_budget(),
            precision: default_precision(),
            mode: AllocationMode::default(),
            phase_2_max_conflict_multiplier: default_phase_2_max_conflict_multiplier(),
        }
    }
}

impl AllocationConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if self.precision > MAX_PRECISION {
            return Err(EngineError::config(format!(
                "allocation precision must be at most {MAX_PRECISION} decimals"
            )));
        }
        if !self.phase_2_max_conflict_multiplier.is_finite() {
            return Err(EngineError::config(
                "phase 2 conflict threshold must be finite",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryAllocation {
    pub country: String,
    pub final_score: f64,
    pub share: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationPlan {
    pub basis: AllocationBasis,
    pub total_budget: f64,
    pub precision: u32,
    pub allocations: Vec<CountryAllocation>,
    pub allocated_total: f64,
    pub unallocated: f64,
}

impl AllocationPlan {
    pub fn amount_for(&self, country: &str) -> Option<f64> {
        self.allocations
            .iter()
            .find(|a| a.country.eq_ignore_ascii_case(country))
            .map(|a| a.amount)
    }

    pub fn largest(&self) -> Option<&CountryAllocation> {
        self.allocations
            .iter()
            .max_by(|a, b| a.share.total_cmp(&b.share))
    }
}

pub(crate) fn round_to(value: f64, precision: u32) -> f64 {
    let scale = 10f64.powi(precision as i32);
    (value * scale).round() / scale
}

fn default_total_budget() -> f64 {
    950.0
}

fn default_precision() -> u32 {
    1
}

fn default_phase_2_max_conflict_multiplier() -> f64 {
    2.0
}
