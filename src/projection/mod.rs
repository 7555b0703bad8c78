pub mod outlook;
pub mod trend;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

pub use outlook::{build_outlook, CountryOutlook, Outlook};
pub use trend::project;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SeriesPoint {
    pub year: i32,
    pub value: f64,
}

/// Yearly observations for one country, strictly ascending by year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoricalSeries {
    country: String,
    points: Vec<SeriesPoint>,
}

impl HistoricalSeries {
    pub fn new(country: impl Into<String>, points: Vec<SeriesPoint>) -> EngineResult<Self> {
        let country = country.into();
        if let Some(bad) = points.iter().find(|p| !p.value.is_finite()) {
            return Err(EngineError::invalid(format!(
                "non-finite value for {country} in {}",
                bad.year
            )));
        }
        for pair in points.windows(2) {
            if pair[1].year <= pair[0].year {
                return Err(EngineError::invalid(format!(
                    "series for {country} must be strictly ascending by year ({} then {})",
                    pair[0].year, pair[1].year
                )));
            }
        }
        Ok(Self { country, points })
    }

    pub fn country(&self) -> &str {
        &self.country
    }

    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    pub fn first_year(&self) -> Option<i32> {
        self.points.first().map(|p| p.year)
    }

    pub fn last_year(&self) -> Option<i32> {
        self.points.last().map(|p| p.year)
    }

    pub fn value_at(&self, year: i32) -> Option<f64> {
        self.points
            .binary_search_by_key(&year, |p| p.year)
            .ok()
            .map(|idx| self.points[idx].value)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectionConfig {
    #[serde(default = "default_intervention_year")]
    pub intervention_year: i32,
    #[serde(default = "default_target_year")]
    pub target_year: i32,
    /// Upper bound for any extrapolated value (literacy cannot exceed it).
    #[serde(default = "default_ceiling")]
    pub ceiling: f64,
    #[serde(default = "default_sdg_target")]
    pub sdg_target: f64,
    /// Longest span from intervention to target year that will be projected.
    #[serde(default = "default_max_horizon_years")]
    pub max_horizon_years: u32,
}

impl Default for ProjectionConfig {
    fn default() -> Self {
        Self {
            intervention_year: default_intervention_year(),
            target_year: default_target_year(),
            ceiling: default_ceiling(),
            sdg_target: default_sdg_target(),
            max_horizon_years: default_max_horizon_years(),
        }
    }
}

impl ProjectionConfig {
    pub fn validate(&self) -> EngineResult<()> {
        if !self.ceiling.is_finite() || self.ceiling <= 0.0 {
            return Err(EngineError::config("projection ceiling must be positive"));
        }
        if !self.sdg_target.is_finite() || self.sdg_target < 0.0 {
            return Err(EngineError::config("sdg target must be non-negative"));
        }
        if self.max_horizon_years == 0 {
            return Err(EngineError::config("max_horizon_years must be at least 1"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProjectionPoint {
    pub year: i32,
    pub actual: Option<f64>,
    pub projected: f64,
    pub counterfactual: f64,
    pub gain: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProjectionResult {
    pub country: String,
    pub intervention_year: i32,
    pub target_year: i32,
    pub pre_rate: f64,
    pub post_rate: f64,
    pub treatment_effect: f64,
    pub value_at_intervention: f64,
    pub last_observed_year: i32,
    pub last_observed_value: f64,
    pub points: Vec<ProjectionPoint>,
    pub projected_target: f64,
    pub counterfactual_target: f64,
    pub gain_target: f64,
    pub is_extrapolated: bool,
    /// True when the target-year projection was clipped to the ceiling.
    pub capped: bool,
}

fn default_intervention_year() -> i32 {
    2014
}

fn default_target_year() -> i32 {
    2030
}

fn default_ceiling() -> f64 {
    100.0
}

fn default_sdg_target() -> f64 {
    95.0
}

fn default_max_horizon_years() -> u32 {
    200
}
