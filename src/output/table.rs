use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color, ContentArrangement, Row, Table};

use crate::allocation::{AllocationPlan, PhasedPlan};
use crate::dataset::{DataSource, SourceInfo};
use crate::effectiveness::CostEffectivenessRank;
use crate::index::{CompositeScore, RelativeNeed};
use crate::projection::{Outlook, ProjectionResult};
use crate::report::ExecutiveSummary;

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn opt(value: Option<f64>, decimals: usize) -> String {
    value
        .map(|v| format!("{v:.decimals$}"))
        .unwrap_or_else(|| "-".to_string())
}

pub fn render_scores_table(scores: &[CompositeScore], relative: &[RelativeNeed]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Country",
        "Conflict",
        "Baseline",
        "Gender",
        "Rural/Urban",
        "Poverty",
        "Quality",
        "Base",
        "Multiplier",
        "Final",
        "x Lowest",
    ]);
    for score in scores {
        let ratio = relative
            .iter()
            .find(|r| r.country == score.country)
            .and_then(|r| r.ratio_to_lowest);
        let c = &score.components;
        table.add_row(vec![
            score.country.clone(),
            score.conflict_status.to_string(),
            format!("{:.1}", c.baseline_gap),
            format!("{:.1}", c.gender_parity_gap),
            format!("{:.1}", c.rural_urban_gap),
            format!("{:.1}", c.poverty_rate),
            format!("{:.1}", c.quality_deficit),
            format!("{:.2}", score.base_score),
            format!("{:.1}", score.multiplier),
            format!("{:.2}", score.final_score),
            opt(ratio, 1),
        ]);
    }
    table.to_string()
}

pub fn render_allocation_table(plan: &AllocationPlan) -> String {
    let mut table = new_table();
    table.set_header(vec!["Country", "Final Score", "Share", "Amount"]);
    for a in &plan.allocations {
        table.add_row(vec![
            a.country.clone(),
            format!("{:.2}", a.final_score),
            format!("{:.1}%", a.share * 100.0),
            format!("{:.*}", plan.precision as usize, a.amount),
        ]);
    }
    table.add_row(vec![
        "Total".to_string(),
        String::new(),
        String::new(),
        format!("{:.*}", plan.precision as usize, plan.allocated_total),
    ]);
    if plan.unallocated > 0.0 {
        table.add_row(vec![
            "Unallocated".to_string(),
            String::new(),
            String::new(),
            format!("{:.*}", plan.precision as usize, plan.unallocated),
        ]);
    }
    table.to_string()
}

pub fn render_phases_table(phased: &PhasedPlan) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Country",
        "Need",
        "Phase 1",
        "Coverage",
        "Phase 2",
        "Deferred",
        "Excess",
    ]);
    for a in &phased.allocations {
        let phase_2 = if a.phase_2_released {
            Cell::new(format!("{:.1}", a.phase_2_amount)).fg(Color::Green)
        } else {
            Cell::new("held").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&a.country),
            Cell::new(format!("{:.1}", a.total_need)),
            Cell::new(format!("{:.1}", a.phase_1_amount)),
            Cell::new(format!("{:.0}%", a.phase_1_coverage_pct)),
            phase_2,
            Cell::new(format!("{:.1}", a.deferred_amount)),
            Cell::new(format!("{:.1}", a.excess_amount)),
        ]));
    }
    let s = &phased.summary;
    table.add_row(vec![
        "Total".to_string(),
        format!("{:.1}", s.total_need),
        format!("{:.1}", s.phase_1_total),
        String::new(),
        format!("{:.1}", s.phase_2_released_total),
        format!("{:.1}", s.deferred_total),
        format!("{:.1}", s.surplus),
    ]);
    table.to_string()
}

pub fn render_projection_table(result: &ProjectionResult) -> String {
    let mut table = new_table();
    table.set_header(vec!["Year", "Actual", "Projected", "Counterfactual", "Gain"]);
    for p in &result.points {
        table.add_row(vec![
            p.year.to_string(),
            opt(p.actual, 1),
            format!("{:.2}", p.projected),
            format!("{:.2}", p.counterfactual),
            format!("{:+.2}", p.gain),
        ]);
    }
    format!(
        "{} (pre {:+.2}/yr, post {:+.2}/yr, effect {:+.2}/yr)\n{}",
        result.country,
        result.pre_rate,
        result.post_rate,
        result.treatment_effect,
        table
    )
}

pub fn render_outlook_table(outlook: &Outlook) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Country",
        "Current",
        "Projected",
        "Gap to Target",
        "On Track",
    ]);
    for c in &outlook.countries {
        let status = if c.on_track {
            Cell::new("YES").fg(Color::Green)
        } else {
            Cell::new("NO").fg(Color::Red)
        };
        table.add_row(Row::from(vec![
            Cell::new(&c.country),
            Cell::new(format!("{:.1} ({})", c.current, c.current_year)),
            Cell::new(format!("{:.1} ({})", c.projected, c.target_year)),
            Cell::new(format!("{:.1}", c.gap_to_target.max(0.0))),
            status,
        ]));
    }
    table.to_string()
}

pub fn render_rankings_table(ranked: &[CostEffectivenessRank]) -> String {
    let mut table = new_table();
    table.set_header(vec![
        "Rank",
        "Program",
        "Country",
        "Cost",
        "Points",
        "Cost/Point",
        "Cost/Person/Point",
        "Points/Year",
    ]);
    for r in ranked {
        table.add_row(vec![
            r.rank.to_string(),
            r.name.clone(),
            r.country.clone(),
            format!("{:.1}", r.total_cost),
            format!("{:.1}", r.outcome_improvement_points),
            format!("{:.2}", r.cost_per_point),
            opt(r.cost_per_person_point, 2),
            opt(r.points_per_year, 2),
        ]);
    }
    table.to_string()
}

pub fn render_sources_table(sources: &[SourceInfo]) -> String {
    let mut table = new_table();
    table.set_header(vec!["Table", "Rows", "Source", "Loaded"]);
    for s in sources {
        let source = match &s.source {
            DataSource::File { path } => Cell::new(path.display().to_string()),
            DataSource::Builtin => Cell::new("built-in").fg(Color::Yellow),
        };
        table.add_row(Row::from(vec![
            Cell::new(&s.table),
            Cell::new(s.rows),
            source,
            Cell::new(s.loaded_at.to_rfc3339()),
        ]));
    }
    table.to_string()
}

pub fn render_summary_table(summary: &ExecutiveSummary) -> String {
    let mut table = new_table();
    table.set_header(vec!["Metric", "Value"]);
    let mut rows = vec![
        ("Countries".to_string(), summary.countries.to_string()),
        (
            "Highest need".to_string(),
            match (&summary.highest_need, summary.highest_need_score) {
                (Some(country), Some(score)) => format!("{country} ({score:.2})"),
                _ => "-".to_string(),
            },
        ),
        (
            "Need spread".to_string(),
            summary
                .need_spread
                .map(|v| format!("{v:.1}x"))
                .unwrap_or_else(|| "-".to_string()),
        ),
        ("Budget".to_string(), format!("{:.1}", summary.total_budget)),
    ];
    if let Some((country, amount)) = &summary.largest_allocation {
        rows.push(("Largest allocation".to_string(), format!("{country} ({amount:.1})")));
    }
    rows.extend([
        ("Total need".to_string(), format!("{:.1}", summary.phases.total_need)),
        ("Phase 1".to_string(), format!("{:.1}", summary.phases.phase_1_total)),
        (
            "Phase 2 released".to_string(),
            format!("{:.1}", summary.phases.phase_2_released_total),
        ),
        ("Deferred".to_string(), format!("{:.1}", summary.phases.deferred_total)),
        ("Surplus".to_string(), format!("{:.1}", summary.phases.surplus)),
        (
            format!("On track for {:.0}%", summary.sdg_target),
            format!("{}/{}", summary.on_track_count, summary.projected_countries),
        ),
    ]);
    if let Some(best) = &summary.most_cost_effective {
        rows.push((
            "Most cost-effective".to_string(),
            format!("{} ({:.2}/point)", best.name, best.cost_per_point),
        ));
    }
    rows.push((
        "Fallback data".to_string(),
        if summary.uses_fallback_data { "yes" } else { "no" }.to_string(),
    ));
    for (metric, value) in rows {
        table.add_row(vec![metric, value]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::{render_allocation_table, render_outlook_table, render_rankings_table};
    use crate::config::Config;
    use crate::dataset::Dataset;
    use crate::effectiveness::rank;
    use crate::report;

    #[test]
    fn allocation_table_lists_countries_and_total() {
        let dataset = Dataset::builtin().expect("dataset");
        let plan = report::allocation_plan(&dataset, &Config::default()).expect("plan");
        let rendered = render_allocation_table(&plan);
        assert!(rendered.contains("Sudan"));
        assert!(rendered.contains("755.4"));
        assert!(rendered.contains("Total"));
    }

    #[test]
    fn outlook_and_rankings_render() {
        let dataset = Dataset::builtin().expect("dataset");
        let outlook = report::outlook(&dataset, &Config::default()).expect("outlook");
        assert!(render_outlook_table(&outlook).contains("Morocco"));
        let ranked = rank(&dataset.programs.data).expect("ranked");
        assert!(render_rankings_table(&ranked).contains("Literacy Drive"));
    }
}
