use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::allocation::{
    build_plan, split_phases, AllocationPlan, ConflictSeverityTrigger, PhaseSummary, PhasedPlan,
};
use crate::config::Config;
use crate::dataset::Dataset;
use crate::effectiveness::{rank, CostEffectivenessRank};
use crate::error::EngineError;
use crate::index::{relative_need, score_all, CompositeScore};
use crate::projection::{build_outlook, project, Outlook, ProjectionResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutiveSummary {
    pub generated_at: DateTime<Utc>,
    pub countries: usize,
    pub highest_need: Option<String>,
    pub highest_need_score: Option<f64>,
    /// Highest final score divided by the lowest positive one.
    pub need_spread: Option<f64>,
    pub total_budget: f64,
    pub largest_allocation: Option<(String, f64)>,
    pub phases: PhaseSummary,
    pub sdg_target: f64,
    pub on_track_count: usize,
    pub projected_countries: usize,
    pub most_cost_effective: Option<CostEffectivenessRank>,
    pub uses_fallback_data: bool,
}

pub fn scores(dataset: &Dataset, config: &Config) -> Result<Vec<CompositeScore>> {
    Ok(score_all(
        &dataset.indicators.data,
        &config.index.weights,
        &config.index.conflict_multipliers,
    )?)
}

pub fn allocation_plan(dataset: &Dataset, config: &Config) -> Result<AllocationPlan> {
    let scores = scores(dataset, config)?;
    Ok(build_plan(
        &scores,
        config.allocation.total_budget,
        &config.allocation,
        &dataset.needs.data,
    )?)
}

pub fn phase_trigger(config: &Config) -> ConflictSeverityTrigger {
    ConflictSeverityTrigger::new(
        config.allocation.phase_2_max_conflict_multiplier,
        config.index.conflict_multipliers,
    )
}

pub fn phased_plan(dataset: &Dataset, config: &Config) -> Result<PhasedPlan> {
    let plan = allocation_plan(dataset, config)?;
    Ok(split_phases(
        &plan,
        &dataset.indicators.data,
        &dataset.needs.data,
        &phase_trigger(config),
    )?)
}

/// Projects every series with the configured years. Series without enough
/// history are skipped rather than failing the whole batch.
pub fn projections(dataset: &Dataset, config: &Config) -> Result<Vec<ProjectionResult>> {
    let projection = &config.projection;
    let mut out = Vec::with_capacity(dataset.series.data.len());
    for series in &dataset.series.data {
        match project(
            series,
            projection.intervention_year,
            projection.target_year,
            projection,
        ) {
            Ok(result) => out.push(result),
            Err(EngineError::InsufficientData(reason)) => {
                warn!(country = series.country(), %reason, "skipping projection");
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(out)
}

pub fn outlook(dataset: &Dataset, config: &Config) -> Result<Outlook> {
    let results = projections(dataset, config)?;
    Ok(build_outlook(&results, config.projection.sdg_target))
}

pub fn build_summary(dataset: &Dataset, config: &Config) -> Result<ExecutiveSummary> {
    let scores = scores(dataset, config)?;
    let plan = build_plan(
        &scores,
        config.allocation.total_budget,
        &config.allocation,
        &dataset.needs.data,
    )?;
    let phased = split_phases(
        &plan,
        &dataset.indicators.data,
        &dataset.needs.data,
        &phase_trigger(config),
    )?;
    let outlook = outlook(dataset, config)?;
    let ranked = rank(&dataset.programs.data)?;

    let highest = scores.first();
    let need_spread = relative_need(&scores)
        .into_iter()
        .filter_map(|r| r.ratio_to_lowest)
        .max_by(|a, b| a.total_cmp(b));

    Ok(ExecutiveSummary {
        generated_at: Utc::now(),
        countries: scores.len(),
        highest_need: highest.map(|s| s.country.clone()),
        highest_need_score: highest.map(|s| s.final_score),
        need_spread,
        total_budget: plan.total_budget,
        largest_allocation: plan.largest().map(|a| (a.country.clone(), a.amount)),
        phases: phased.summary,
        sdg_target: outlook.sdg_target,
        on_track_count: outlook.on_track_count,
        projected_countries: outlook.countries.len(),
        most_cost_effective: ranked.into_iter().next(),
        uses_fallback_data: dataset.uses_fallback(),
    })
}

#[cfg(test)]
mod tests {
    use super::{build_summary, projections};
    use crate::config::Config;
    use crate::dataset::Dataset;
    use crate::projection::{HistoricalSeries, SeriesPoint};

    #[test]
    fn builtin_summary_headlines() {
        let dataset = Dataset::builtin().expect("dataset");
        let summary = build_summary(&dataset, &Config::default()).expect("summary");
        assert_eq!(summary.countries, 5);
        assert_eq!(summary.highest_need.as_deref(), Some("Sudan"));
        assert_eq!(summary.on_track_count, 3);
        assert!(summary.uses_fallback_data);
        let (country, amount) = summary.largest_allocation.expect("allocation");
        assert_eq!(country, "Sudan");
        assert!((amount - 755.4).abs() < 1e-9);
        let cheapest = summary.most_cost_effective.expect("program");
        assert_eq!(cheapest.country, "Bahrain");
    }

    #[test]
    fn short_series_are_skipped() {
        let mut dataset = Dataset::builtin().expect("dataset");
        dataset.series.data.push(
            HistoricalSeries::new(
                "Chad",
                vec![SeriesPoint {
                    year: 2020,
                    value: 27.0,
                }],
            )
            .expect("series"),
        );
        let results = projections(&dataset, &Config::default()).expect("projections");
        assert_eq!(results.len(), 5);
    }
}
