use serde::{Deserialize, Serialize};

use crate::projection::ProjectionResult;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CountryOutlook {
    pub country: String,
    pub current_year: i32,
    pub current: f64,
    pub target_year: i32,
    pub projected: f64,
    /// Points still missing at the target year; negative once the target is exceeded.
    pub gap_to_target: f64,
    pub on_track: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Outlook {
    pub sdg_target: f64,
    pub countries: Vec<CountryOutlook>,
    pub on_track_count: usize,
}

pub fn build_outlook(results: &[ProjectionResult], sdg_target: f64) -> Outlook {
    let countries = results
        .iter()
        .map(|result| {
            let gap_to_target = sdg_target - result.projected_target;
            CountryOutlook {
                country: result.country.clone(),
                current_year: result.last_observed_year,
                current: result.last_observed_value,
                target_year: result.target_year,
                projected: result.projected_target,
                gap_to_target,
                on_track: gap_to_target <= 0.0,
            }
        })
        .collect::<Vec<_>>();
    let on_track_count = countries.iter().filter(|c| c.on_track).count();

    Outlook {
        sdg_target,
        countries,
        on_track_count,
    }
}

#[cfg(test)]
mod tests {
    use super::build_outlook;
    use crate::dataset::builtin;
    use crate::projection::{project, ProjectionConfig};

    #[test]
    fn builtin_outlook_marks_high_performers_on_track() {
        let config = ProjectionConfig::default();
        let results = builtin::series()
            .expect("builtin series")
            .iter()
            .map(|s| project(s, config.intervention_year, config.target_year, &config))
            .collect::<Result<Vec<_>, _>>()
            .expect("projections");
        let outlook = build_outlook(&results, config.sdg_target);

        assert_eq!(outlook.countries.len(), 5);
        assert_eq!(outlook.on_track_count, 3);
        let sudan = outlook
            .countries
            .iter()
            .find(|c| c.country == "Sudan")
            .expect("sudan");
        assert!(!sudan.on_track);
        assert!(sudan.gap_to_target > 35.0);
        let morocco = outlook
            .countries
            .iter()
            .find(|c| c.country == "Morocco")
            .expect("morocco");
        assert!(!morocco.on_track);
        assert_eq!(morocco.current, 72.1);
    }
}
