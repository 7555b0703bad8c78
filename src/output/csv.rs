use anyhow::Result;

use crate::allocation::{AllocationPlan, PhasedPlan};
use crate::effectiveness::CostEffectivenessRank;
use crate::index::CompositeScore;
use crate::projection::{Outlook, ProjectionResult};

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<String> {
    let data = writer.into_inner()?;
    Ok(String::from_utf8_lossy(&data).to_string())
}

pub fn scores_to_csv(scores: &[CompositeScore]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "country",
        "conflict_status",
        "baseline_gap",
        "gender_parity_gap",
        "rural_urban_gap",
        "poverty_rate",
        "quality_deficit",
        "base_score",
        "multiplier",
        "final_score",
    ])?;
    for s in scores {
        let c = &s.components;
        writer.write_record([
            s.country.clone(),
            s.conflict_status.as_slug().to_string(),
            format!("{:.4}", c.baseline_gap),
            format!("{:.4}", c.gender_parity_gap),
            format!("{:.4}", c.rural_urban_gap),
            format!("{:.4}", c.poverty_rate),
            format!("{:.4}", c.quality_deficit),
            format!("{:.4}", s.base_score),
            format!("{:.2}", s.multiplier),
            format!("{:.4}", s.final_score),
        ])?;
    }
    finish(writer)
}

pub fn allocation_to_csv(plan: &AllocationPlan) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["country", "final_score", "share", "amount"])?;
    for a in &plan.allocations {
        writer.write_record([
            a.country.clone(),
            format!("{:.4}", a.final_score),
            format!("{:.6}", a.share),
            format!("{:.*}", plan.precision as usize, a.amount),
        ])?;
    }
    finish(writer)
}

pub fn phases_to_csv(phased: &PhasedPlan) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "country",
        "allocated_amount",
        "total_need",
        "phase_1_amount",
        "phase_2_amount",
        "deferred_amount",
        "excess_amount",
        "phase_2_released",
        "phase_1_coverage_pct",
    ])?;
    for a in &phased.allocations {
        writer.write_record([
            a.country.clone(),
            format!("{:.2}", a.allocated_amount),
            format!("{:.2}", a.total_need),
            format!("{:.2}", a.phase_1_amount),
            format!("{:.2}", a.phase_2_amount),
            format!("{:.2}", a.deferred_amount),
            format!("{:.2}", a.excess_amount),
            a.phase_2_released.to_string(),
            format!("{:.2}", a.phase_1_coverage_pct),
        ])?;
    }
    finish(writer)
}

pub fn projection_to_csv(result: &ProjectionResult) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record(["country", "year", "actual", "projected", "counterfactual", "gain"])?;
    for p in &result.points {
        writer.write_record([
            result.country.clone(),
            p.year.to_string(),
            p.actual.map(|v| format!("{v:.2}")).unwrap_or_default(),
            format!("{:.4}", p.projected),
            format!("{:.4}", p.counterfactual),
            format!("{:.4}", p.gain),
        ])?;
    }
    finish(writer)
}

pub fn outlook_to_csv(outlook: &Outlook) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "country",
        "current_year",
        "current",
        "target_year",
        "projected",
        "gap_to_target",
        "on_track",
    ])?;
    for c in &outlook.countries {
        writer.write_record([
            c.country.clone(),
            c.current_year.to_string(),
            format!("{:.2}", c.current),
            c.target_year.to_string(),
            format!("{:.2}", c.projected),
            format!("{:.2}", c.gap_to_target),
            c.on_track.to_string(),
        ])?;
    }
    finish(writer)
}

pub fn rankings_to_csv(ranked: &[CostEffectivenessRank]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(vec![]);
    writer.write_record([
        "rank",
        "name",
        "country",
        "total_cost",
        "outcome_improvement_points",
        "duration_years",
        "beneficiaries",
        "cost_per_point",
        "cost_per_person_point",
        "points_per_year",
    ])?;
    for r in ranked {
        writer.write_record([
            r.rank.to_string(),
            r.name.clone(),
            r.country.clone(),
            format!("{:.2}", r.total_cost),
            format!("{:.2}", r.outcome_improvement_points),
            format!("{:.1}", r.duration_years),
            format!("{:.2}", r.beneficiaries),
            format!("{:.4}", r.cost_per_point),
            r.cost_per_person_point
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
            r.points_per_year
                .map(|v| format!("{v:.4}"))
                .unwrap_or_default(),
        ])?;
    }
    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::{allocation_to_csv, rankings_to_csv};
    use crate::config::Config;
    use crate::dataset::Dataset;
    use crate::effectiveness::rank;
    use crate::report;

    #[test]
    fn allocation_csv_has_header_and_one_row_per_country() {
        let dataset = Dataset::builtin().expect("dataset");
        let plan = report::allocation_plan(&dataset, &Config::default()).expect("plan");
        let csv = allocation_to_csv(&plan).expect("csv");
        let lines = csv.lines().collect::<Vec<_>>();
        assert_eq!(lines[0], "country,final_score,share,amount");
        assert_eq!(lines.len(), 6);
        assert!(lines[1].starts_with("Sudan,"));
        assert!(lines[1].ends_with(",755.4"));
    }

    #[test]
    fn rankings_csv_leaves_missing_values_blank() {
        let dataset = Dataset::builtin().expect("dataset");
        let mut programs = dataset.programs.data.clone();
        programs[0].beneficiaries = 0.0;
        let csv = rankings_to_csv(&rank(&programs).expect("ranked")).expect("csv");
        assert!(csv.lines().any(|l| l.contains(",,")));
    }
}
