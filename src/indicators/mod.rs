pub mod normalize;
pub mod store;

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

pub use store::IndicatorStore;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ConflictStatus {
    Stable,
    ModerateConflict,
    SevereConflict,
}

impl ConflictStatus {
    pub const ALL: [ConflictStatus; 3] = [
        ConflictStatus::Stable,
        ConflictStatus::ModerateConflict,
        ConflictStatus::SevereConflict,
    ];

    pub fn as_slug(&self) -> &'static str {
        match self {
            Self::Stable => "stable",
            Self::ModerateConflict => "moderate_conflict",
            Self::SevereConflict => "severe_conflict",
        }
    }
}

impl Display for ConflictStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let display = match self {
            Self::Stable => "Stable",
            Self::ModerateConflict => "Moderate conflict",
            Self::SevereConflict => "Severe conflict",
        };
        write!(f, "{display}")
    }
}

impl FromStr for ConflictStatus {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        match normalized.as_str() {
            "stable" => Ok(Self::Stable),
            "moderate" | "moderate_conflict" => Ok(Self::ModerateConflict),
            "severe" | "severe_conflict" => Ok(Self::SevereConflict),
            _ => Err(EngineError::config(format!("unknown conflict status: {s}"))),
        }
    }
}

/// Raw per-country inputs to the need index. All gaps are in percentage points.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryIndicators {
    pub country: String,
    /// Points below the literacy target; negative for countries already above it.
    pub baseline_gap: f64,
    pub gender_parity_gap: f64,
    pub rural_urban_gap: f64,
    pub poverty_rate: f64,
    pub quality_deficit: f64,
    pub conflict_status: ConflictStatus,
}

impl CountryIndicators {
    pub fn normalized(&self) -> Self {
        let mut out = self.clone();
        normalize::normalize_indicators(&mut out);
        out
    }

    pub fn has_finite_components(&self) -> bool {
        [
            self.baseline_gap,
            self.gender_parity_gap,
            self.rural_urban_gap,
            self.poverty_rate,
            self.quality_deficit,
        ]
        .iter()
        .all(|v| v.is_finite())
    }
}
