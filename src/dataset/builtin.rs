//! Built-in fallback tables for the five reference countries.
//!
//! Indicator gaps are percentage points, literacy series are adult literacy
//! rates, program costs and needs are USD millions and beneficiaries are
//! millions of people.

use crate::allocation::NeedEntry;
use crate::effectiveness::Program;
use crate::error::EngineResult;
use crate::indicators::{ConflictStatus, CountryIndicators};
use crate::projection::{HistoricalSeries, SeriesPoint};

pub fn indicators() -> Vec<CountryIndicators> {
    vec![
        row("Sudan", 38.0, 31.0, 30.0, 46.0, 65.0, ConflictStatus::SevereConflict),
        row("Morocco", 22.9, 19.0, 25.8, 4.8, 70.0, ConflictStatus::Stable),
        row("Israel", -2.8, 0.5, 1.0, 7.0, 6.25, ConflictStatus::Stable),
        row("UAE", -1.3, 1.0, 0.5, 2.0, 11.5, ConflictStatus::Stable),
        row("Bahrain", -2.5, 1.2, 0.5, 2.0, 8.0, ConflictStatus::Stable),
    ]
}

fn row(
    country: &str,
    baseline_gap: f64,
    gender_parity_gap: f64,
    rural_urban_gap: f64,
    poverty_rate: f64,
    quality_deficit: f64,
    conflict_status: ConflictStatus,
) -> CountryIndicators {
    CountryIndicators {
        country: country.to_string(),
        baseline_gap,
        gender_parity_gap,
        rural_urban_gap,
        poverty_rate,
        quality_deficit,
        conflict_status,
    }
}

const SERIES: &[(&str, &[(i32, f64)])] = &[
    (
        "Sudan",
        &[
            (2008, 58.9),
            (2011, 59.8),
            (2014, 60.7),
            (2016, 60.1),
            (2018, 59.5),
            (2020, 58.6),
            (2022, 57.8),
            (2024, 57.0),
        ],
    ),
    (
        "Morocco",
        &[
            (2008, 44.2),
            (2010, 46.9),
            (2012, 49.6),
            (2014, 52.3),
            (2016, 56.0),
            (2018, 60.1),
            (2020, 63.8),
            (2022, 68.0),
            (2024, 72.1),
        ],
    ),
    (
        "Israel",
        &[(2008, 96.8), (2014, 97.1), (2019, 97.5), (2024, 97.8)],
    ),
    (
        "UAE",
        &[(2008, 90.0), (2014, 93.0), (2019, 94.8), (2024, 96.3)],
    ),
    (
        "Bahrain",
        &[(2008, 93.5), (2014, 94.6), (2018, 95.7), (2024, 97.5)],
    ),
];

pub fn series() -> EngineResult<Vec<HistoricalSeries>> {
    SERIES
        .iter()
        .map(|(country, points)| {
            let points = points
                .iter()
                .map(|(year, value)| SeriesPoint {
                    year: *year,
                    value: *value,
                })
                .collect();
            HistoricalSeries::new(*country, points)
        })
        .collect()
}

pub fn programs() -> Vec<Program> {
    vec![
        program("National Literacy Program", "Morocco", 310.9, 19.8, 10.0, 8.46),
        program("Compulsory Education", "UAE", 1_450.0, 28.5, 49.0, 96.0),
        program("Adult Education Initiative", "Israel", 420.0, 3.2, 15.0, 1.1),
        program("Literacy Drive", "Bahrain", 85.0, 6.5, 12.0, 0.35),
        program("Emergency Education", "Sudan", 240.0, 2.1, 6.0, 1.9),
    ]
}

fn program(
    name: &str,
    country: &str,
    total_cost: f64,
    outcome_improvement_points: f64,
    duration_years: f64,
    beneficiaries: f64,
) -> Program {
    Program {
        name: name.to_string(),
        country: country.to_string(),
        total_cost,
        outcome_improvement_points,
        duration_years,
        beneficiaries,
    }
}

/// Documented need per country; phase 1 is the portion fundable now.
pub fn needs() -> Vec<NeedEntry> {
    [
        ("Sudan", 967.0, 700.0),
        ("Morocco", 135.3, 135.3),
        ("Israel", 72.4, 40.2),
        ("UAE", 70.4, 39.5),
        ("Bahrain", 62.4, 35.0),
    ]
    .into_iter()
    .map(|(country, total_need, phase_1_need)| NeedEntry {
        country: country.to_string(),
        total_need,
        phase_1_need,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::{indicators, needs, programs, series};

    #[test]
    fn every_table_covers_the_same_countries() {
        let mut expected = indicators()
            .into_iter()
            .map(|i| i.country)
            .collect::<Vec<_>>();
        expected.sort();

        let mut from_series = series()
            .expect("builtin series")
            .iter()
            .map(|s| s.country().to_string())
            .collect::<Vec<_>>();
        from_series.sort();
        let mut from_needs = needs().into_iter().map(|n| n.country).collect::<Vec<_>>();
        from_needs.sort();
        let mut from_programs = programs().into_iter().map(|p| p.country).collect::<Vec<_>>();
        from_programs.sort();

        assert_eq!(from_series, expected);
        assert_eq!(from_needs, expected);
        assert_eq!(from_programs, expected);
    }

    #[test]
    fn every_series_is_valid() {
        let loaded = series().expect("builtin series");
        assert_eq!(loaded.len(), 5);
        assert!(loaded.iter().all(|s| s.points().len() >= 2));
    }

    #[test]
    fn phase_one_needs_fit_the_default_budget() {
        let total = needs().iter().map(|n| n.phase_1_need).sum::<f64>();
        assert!((total - 950.0).abs() < 1e-6);
    }
}
