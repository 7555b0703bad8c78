pub mod ranker;

use serde::{Deserialize, Serialize};

pub use ranker::rank;

/// An intervention program. Cost and beneficiaries must use consistent units
/// across a roster (the built-in data uses USD millions and millions of people).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Program {
    pub name: String,
    pub country: String,
    pub total_cost: f64,
    pub outcome_improvement_points: f64,
    pub duration_years: f64,
    pub beneficiaries: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CostEffectivenessRank {
    pub rank: usize,
    pub name: String,
    pub country: String,
    pub total_cost: f64,
    pub outcome_improvement_points: f64,
    pub duration_years: f64,
    pub beneficiaries: f64,
    pub cost_per_point: f64,
    pub cost_per_person_point: Option<f64>,
    pub points_per_year: Option<f64>,
}
