use std::cmp::Ordering;

use crate::effectiveness::{CostEffectivenessRank, Program};
use crate::error::{EngineError, EngineResult};

/// Ranks programs by cost per outcome point, cheapest first. Ties fall back to
/// shorter duration, then name, so the order is total.
pub fn rank(programs: &[Program]) -> EngineResult<Vec<CostEffectivenessRank>> {
    let mut ranked = programs
        .iter()
        .map(evaluate_program)
        .collect::<EngineResult<Vec<_>>>()?;

    ranked.sort_by(compare_ranks);
    for (idx, item) in ranked.iter_mut().enumerate() {
        item.rank = idx + 1;
    }
    Ok(ranked)
}

fn evaluate_program(program: &Program) -> EngineResult<CostEffectivenessRank> {
    let points = program.outcome_improvement_points;
    if !points.is_finite() || points <= 0.0 {
        return Err(EngineError::invalid(format!(
            "program '{}' must report a positive outcome improvement, got {points}",
            program.name
        )));
    }
    if !program.total_cost.is_finite() || program.total_cost < 0.0 {
        return Err(EngineError::invalid(format!(
            "program '{}' has an invalid total cost",
            program.name
        )));
    }
    if !program.beneficiaries.is_finite() || program.beneficiaries < 0.0 {
        return Err(EngineError::invalid(format!(
            "program '{}' has an invalid beneficiary count",
            program.name
        )));
    }
    if !program.duration_years.is_finite() || program.duration_years < 0.0 {
        return Err(EngineError::invalid(format!(
            "program '{}' has an invalid duration",
            program.name
        )));
    }

    let cost_per_person_point = if program.beneficiaries > 0.0 {
        Some(program.total_cost / (program.beneficiaries * points))
    } else {
        None
    };
    let points_per_year = if program.duration_years > 0.0 {
        Some(points / program.duration_years)
    } else {
        None
    };

    Ok(CostEffectivenessRank {
        rank: 0,
        name: program.name.clone(),
        country: program.country.clone(),
        total_cost: program.total_cost,
        outcome_improvement_points: points,
        duration_years: program.duration_years,
        beneficiaries: program.beneficiaries,
        cost_per_point: program.total_cost / points,
        cost_per_person_point,
        points_per_year,
    })
}

fn compare_ranks(a: &CostEffectivenessRank, b: &CostEffectivenessRank) -> Ordering {
    a.cost_per_point
        .total_cmp(&b.cost_per_point)
        .then_with(|| a.duration_years.total_cmp(&b.duration_years))
        .then_with(|| a.name.cmp(&b.name))
}
