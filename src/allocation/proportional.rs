use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::allocation::{
    round_to, AllocationBasis, AllocationConfig, AllocationMode, AllocationPlan,
    CountryAllocation, NeedTable,
};
use crate::error::{EngineError, EngineResult};
use crate::index::CompositeScore;

const BUDGET_TOLERANCE: f64 = 1e-9;

/// Allocates according to the configured mode.
pub fn build_plan(
    scores: &[CompositeScore],
    total_budget: f64,
    config: &AllocationConfig,
    needs: &NeedTable,
) -> EngineResult<AllocationPlan> {
    config.validate()?;
    match config.mode {
        AllocationMode::Proportional => allocate(scores, total_budget, config.precision),
        AllocationMode::FixedNeed => {
            allocate_fixed_need(scores, total_budget, config.precision, needs)
        }
    }
}

/// Splits `total_budget` in proportion to each country's final score.
///
/// Amounts are rounded to `precision` decimals with the largest-remainder
/// method, so the plan sums to the budget. When every score is zero the
/// budget is split equally.
pub fn allocate(
    scores: &[CompositeScore],
    total_budget: f64,
    precision: u32,
) -> EngineResult<AllocationPlan> {
    validate_inputs(scores, total_budget)?;

    let total_score = scores.iter().map(|s| s.final_score).sum::<f64>();
    let (basis, shares) = if total_score > 0.0 {
        (
            AllocationBasis::Proportional,
            scores
                .iter()
                .map(|s| s.final_score / total_score)
                .collect::<Vec<_>>(),
        )
    } else {
        warn!(
            countries = scores.len(),
            "all need scores are zero, falling back to equal split"
        );
        let equal = 1.0 / scores.len() as f64;
        (AllocationBasis::EqualSplit, vec![equal; scores.len()])
    };

    let amounts = apportion(&shares, total_budget, precision);
    let allocations = scores
        .iter()
        .zip(shares.iter().zip(amounts))
        .map(|(score, (share, amount))| CountryAllocation {
            country: score.country.clone(),
            final_score: score.final_score,
            share: *share,
            amount,
        })
        .collect::<Vec<_>>();
    let allocated_total = allocations.iter().map(|a| a.amount).sum::<f64>();

    Ok(AllocationPlan {
        basis,
        total_budget,
        precision,
        allocations,
        allocated_total,
        unallocated: 0.0,
    })
}

/// Funds each country's documented phase-1 need. If the table asks for more
/// than the budget, every request is scaled down by the same factor; any
/// budget left over is reported as unallocated.
pub fn allocate_fixed_need(
    scores: &[CompositeScore],
    total_budget: f64,
    precision: u32,
    needs: &NeedTable,
) -> EngineResult<AllocationPlan> {
    validate_inputs(scores, total_budget)?;

    let mut requested = Vec::with_capacity(scores.len());
    for score in scores {
        let entry = needs.get(&score.country).ok_or_else(|| {
            EngineError::invalid(format!("no documented need for {}", score.country))
        })?;
        requested.push(entry.phase_1_need);
    }

    let requested_total = requested.iter().sum::<f64>();
    let tolerance = BUDGET_TOLERANCE * total_budget.max(1.0);
    let amounts = if requested_total - total_budget > tolerance {
        warn!(
            requested_total,
            total_budget, "documented need exceeds budget, scaling requests down"
        );
        let shares = requested
            .iter()
            .map(|r| r / requested_total)
            .collect::<Vec<_>>();
        apportion(&shares, total_budget, precision)
    } else {
        let rounded = requested
            .iter()
            .map(|r| round_to(*r, precision))
            .collect::<Vec<_>>();
        if rounded.iter().sum::<f64>() - total_budget > tolerance {
            debug!(total_budget, "rounded needs overshoot budget, rounding within budget");
            round_within_budget(&requested, total_budget, precision)
        } else {
            rounded
        }
    };

    let allocated_total = amounts.iter().sum::<f64>();
    let unallocated = (total_budget - allocated_total).max(0.0);
    if unallocated > 0.0 {
        info!(unallocated, "budget exceeds documented phase-1 need");
    }

    let allocations = scores
        .iter()
        .zip(amounts)
        .map(|(score, amount)| CountryAllocation {
            country: score.country.clone(),
            final_score: score.final_score,
            share: if total_budget > 0.0 {
                amount / total_budget
            } else {
                0.0
            },
            amount,
        })
        .collect::<Vec<_>>();

    Ok(AllocationPlan {
        basis: AllocationBasis::FixedNeed,
        total_budget,
        precision,
        allocations,
        allocated_total,
        unallocated,
    })
}

fn validate_inputs(scores: &[CompositeScore], total_budget: f64) -> EngineResult<()> {
    if !total_budget.is_finite() || total_budget < 0.0 {
        return Err(EngineError::invalid(format!(
            "total budget must be a non-negative number, got {total_budget}"
        )));
    }
    if scores.is_empty() {
        return Err(EngineError::division(
            "cannot allocate a budget across zero countries",
        ));
    }
    let mut seen = BTreeSet::new();
    for score in scores {
        if !score.final_score.is_finite() || score.final_score < 0.0 {
            return Err(EngineError::invalid(format!(
                "score for {} must be finite and non-negative",
                score.country
            )));
        }
        if !seen.insert(score.country.to_ascii_lowercase()) {
            return Err(EngineError::invalid(format!(
                "duplicate country in score set: {}",
                score.country
            )));
        }
    }
    Ok(())
}

/// Budget in whole units of `10^-precision`, rounded down. A product within a
/// few ulps of an integer counts as that integer.
fn budget_units(total_budget: f64, scale: f64) -> f64 {
    let exact = total_budget * scale;
    let nearest = exact.round();
    if (exact - nearest).abs() <= f64::EPSILON * 4.0 * exact.abs().max(1.0) {
        nearest
    } else {
        exact.floor()
    }
}

/// Floors every raw unit count, then hands out up to `spare` extra units by
/// largest remainder. Ties go to the larger weight, then the earlier entry.
fn largest_remainder(raw: &[f64], weights: &[f64], spare: usize) -> Vec<f64> {
    let mut units = raw.iter().map(|r| r.floor()).collect::<Vec<_>>();
    let mut order = (0..raw.len())
        .filter(|&idx| raw[idx] > units[idx])
        .collect::<Vec<_>>();
    order.sort_by(|&a, &b| {
        let rem_a = raw[a] - units[a];
        let rem_b = raw[b] - units[b];
        rem_b
            .total_cmp(&rem_a)
            .then_with(|| weights[b].total_cmp(&weights[a]))
            .then_with(|| a.cmp(&b))
    });
    for idx in order.into_iter().take(spare) {
        units[idx] += 1.0;
    }
    units
}

/// Largest-remainder rounding in integer units of `10^-precision`. The
/// sub-unit residual left when the budget has more decimals than `precision`
/// goes to the largest share.
fn apportion(shares: &[f64], total_budget: f64, precision: u32) -> Vec<f64> {
    let scale = 10f64.powi(precision as i32);
    let total_units = budget_units(total_budget, scale);

    let raw = shares.iter().map(|s| s * total_units).collect::<Vec<_>>();
    let floored = raw.iter().map(|r| r.floor()).sum::<f64>();
    let spare = (total_units - floored).round().max(0.0) as usize;
    let units = largest_remainder(&raw, shares, spare);

    let mut amounts = units.iter().map(|u| u / scale).collect::<Vec<_>>();
    let residual = total_budget - amounts.iter().sum::<f64>();
    if residual.abs() > f64::EPSILON * total_budget.max(1.0) {
        if let Some(largest) = largest_share_index(shares) {
            amounts[largest] = (amounts[largest] + residual).max(0.0);
        }
    }
    amounts
}

/// Rounds each request to `precision` without the total passing the budget.
/// No amount exceeds its request rounded up to the next unit.
fn round_within_budget(requests: &[f64], total_budget: f64, precision: u32) -> Vec<f64> {
    let scale = 10f64.powi(precision as i32);
    let available = budget_units(total_budget, scale);

    let raw = requests.iter().map(|r| r * scale).collect::<Vec<_>>();
    let floored = raw.iter().map(|r| r.floor()).sum::<f64>();
    let spare = (available - floored).max(0.0) as usize;
    largest_remainder(&raw, requests, spare)
        .iter()
        .map(|u| u / scale)
        .collect()
}

fn largest_share_index(shares: &[f64]) -> Option<usize> {
    shares
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.total_cmp(b).then_with(|| ib.cmp(ia)))
        .map(|(idx, _)| idx)
}
