use std::path::PathBuf;

use literacy_allocator::allocation::AllocationMode;
use literacy_allocator::config::Config;
use literacy_allocator::dataset::{DataSource, Dataset};
use literacy_allocator::report;

fn data_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "literacy-allocator-it-{name}-{}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create data dir");
    dir
}

#[test]
fn csv_tables_drive_the_whole_pipeline() {
    let dir = data_dir("full");
    std::fs::write(
        dir.join("indicators.csv"),
        "country,baseline_gap,gender_parity_gap,rural_urban_gap,poverty_rate,quality_deficit,conflict_status\n\
         Chad,40,35,30,42,60,moderate_conflict\n\
         Niger,45,30,25,50,55,stable\n",
    )
    .expect("indicators");
    std::fs::write(
        dir.join("series.csv"),
        "country,year,value\nChad,2008,22.0\nChad,2014,24.4\nChad,2022,27.0\n\
         Niger,2008,28.0\nNiger,2014,31.0\nNiger,2022,37.8\n",
    )
    .expect("series");
    std::fs::write(
        dir.join("programs.csv"),
        "name,country,total_cost,outcome_improvement_points,duration_years,beneficiaries\n\
         Radio Schools,Chad,60,2.6,8,1.2\n\
         Community Classes,Niger,90,6.8,8,2.0\n",
    )
    .expect("programs");
    std::fs::write(
        dir.join("needs.csv"),
        "country,total_need,phase_1_need\nChad,150,90\nNiger,120,80\n",
    )
    .expect("needs");

    let dataset = Dataset::load(&dir).expect("dataset");
    assert!(!dataset.uses_fallback());
    assert!(dataset
        .sources()
        .iter()
        .all(|s| matches!(s.source, DataSource::File { .. })));

    let mut config = Config::default();
    config.allocation.total_budget = 200.0;
    let scores = report::scores(&dataset, &config).expect("scores");
    assert_eq!(scores[0].country, "Chad");

    let plan = report::allocation_plan(&dataset, &config).expect("plan");
    let sum = plan.allocations.iter().map(|a| a.amount).sum::<f64>();
    assert!((sum - 200.0).abs() < 1e-9);

    config.allocation.mode = AllocationMode::FixedNeed;
    let phased = report::phased_plan(&dataset, &config).expect("phased");
    let chad = phased.get("Chad").expect("chad");
    assert!(chad.phase_2_released);
    assert!((chad.phase_2_amount - 60.0).abs() < 1e-9);
    assert!((phased.summary.surplus - 30.0).abs() < 1e-9);

    let summary = report::build_summary(&dataset, &config).expect("summary");
    assert_eq!(summary.countries, 2);
    assert_eq!(summary.on_track_count, 0);
    assert_eq!(
        summary.most_cost_effective.map(|r| r.name),
        Some("Community Classes".to_string())
    );
}

#[test]
fn empty_data_dir_reproduces_builtin_results() {
    let dataset = Dataset::load(&data_dir("empty")).expect("dataset");
    let builtin = Dataset::builtin().expect("builtin");
    let config = Config::default();

    let loaded = report::allocation_plan(&dataset, &config).expect("loaded plan");
    let reference = report::allocation_plan(&builtin, &config).expect("builtin plan");
    assert_eq!(loaded, reference);
    assert!(dataset.uses_fallback());
}
