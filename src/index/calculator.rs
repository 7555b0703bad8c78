use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::index::{
    CompositeScore, ConflictMultipliers, RelativeNeed, ScoreComponents, WeightConfig,
};
use crate::indicators::{CountryIndicators, IndicatorStore};

pub fn compute_score(
    indicators: &CountryIndicators,
    weights: &WeightConfig,
    multipliers: &ConflictMultipliers,
) -> EngineResult<CompositeScore> {
    weights.validate()?;
    multipliers.validate()?;
    if !indicators.has_finite_components() {
        return Err(EngineError::invalid(format!(
            "non-finite indicator value for {}",
            indicators.country
        )));
    }

    let clamped = indicators.normalized();
    let components = ScoreComponents {
        baseline_gap: clamped.baseline_gap,
        gender_parity_gap: clamped.gender_parity_gap,
        rural_urban_gap: clamped.rural_urban_gap,
        poverty_rate: clamped.poverty_rate,
        quality_deficit: clamped.quality_deficit,
    };

    let base_score = weights
        .as_array()
        .iter()
        .zip(components.as_array())
        .map(|(w, c)| w * c)
        .sum::<f64>();
    let multiplier = multipliers.lookup(indicators.conflict_status);
    let final_score = base_score * multiplier;
    debug!(
        country = %indicators.country,
        base_score, multiplier, final_score, "computed need index"
    );

    Ok(CompositeScore {
        country: indicators.country.clone(),
        conflict_status: indicators.conflict_status,
        components,
        base_score,
        multiplier,
        final_score,
    })
}

/// Scores every country, highest need first.
pub fn score_all(
    store: &IndicatorStore,
    weights: &WeightConfig,
    multipliers: &ConflictMultipliers,
) -> EngineResult<Vec<CompositeScore>> {
    let mut scores = store
        .iter()
        .map(|indicators| compute_score(indicators, weights, multipliers))
        .collect::<EngineResult<Vec<_>>>()?;
    scores.sort_by(|a, b| {
        b.final_score
            .total_cmp(&a.final_score)
            .then_with(|| a.country.cmp(&b.country))
    });
    Ok(scores)
}

pub fn relative_need(scores: &[CompositeScore]) -> Vec<RelativeNeed> {
    let lowest = scores
        .iter()
        .map(|s| s.final_score)
        .filter(|v| *v > 0.0)
        .min_by(|a, b| a.total_cmp(b));

    scores
        .iter()
        .map(|score| RelativeNeed {
            country: score.country.clone(),
            final_score: score.final_score,
            ratio_to_lowest: lowest.map(|low| score.final_score / low),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{compute_score, relative_need, score_all};
    use crate::dataset::builtin;
    use crate::error::EngineError;
    use crate::index::{ConflictMultipliers, WeightConfig};
    use crate::indicators::{ConflictStatus, CountryIndicators, IndicatorStore};

    fn sudan() -> CountryIndicators {
        CountryIndicators {
            country: "Sudan".to_string(),
            baseline_gap: 38.0,
            gender_parity_gap: 31.0,
            rural_urban_gap: 30.0,
            poverty_rate: 46.0,
            quality_deficit: 65.0,
            conflict_status: ConflictStatus::SevereConflict,
        }
    }

    #[test]
    fn reference_score_for_severe_conflict_country() {
        let score = compute_score(
            &sudan(),
            &WeightConfig::default(),
            &ConflictMultipliers::default(),
        )
        .expect("score");
        assert!((score.base_score - 38.55).abs() < 1e-9);
        assert!((score.final_score - 115.65).abs() < 1e-9);
        assert!((score.final_score - 115.7).abs() <= 0.05 + 1e-9);
        assert_eq!(score.multiplier, 3.0);
    }

    #[test]
    fn over_achiever_contributes_no_negative_baseline() {
        let mut row = sudan();
        row.baseline_gap = -5.0;
        row.conflict_status = ConflictStatus::Stable;
        let score = compute_score(&row, &WeightConfig::default(), &ConflictMultipliers::default())
            .expect("score");
        assert_eq!(score.components.baseline_gap, 0.0);
        assert!((score.base_score - (38.55 - 0.30 * 38.0)).abs() < 1e-9);
        assert!(score.final_score >= score.base_score);
    }

    #[test]
    fn base_score_is_convex_combination_of_clamped_inputs() {
        let weight_sets = [
            WeightConfig::default(),
            WeightConfig {
                baseline: 1.0,
                gender: 0.0,
                rural_urban: 0.0,
                economic: 0.0,
                quality: 0.0,
            },
            WeightConfig {
                baseline: 0.2,
                gender: 0.2,
                rural_urban: 0.2,
                economic: 0.2,
                quality: 0.2,
            },
        ];
        let multipliers = ConflictMultipliers::default();
        for weights in weight_sets {
            let score = compute_score(&sudan(), &weights, &multipliers).expect("score");
            let max_component = score
                .components
                .as_array()
                .into_iter()
                .fold(0.0_f64, f64::max);
            assert!(score.base_score >= 0.0);
            assert!(score.base_score <= max_component + 1e-9);
            assert!(score.final_score >= score.base_score);
        }
    }

    #[test]
    fn invalid_weights_fail_with_config_error() {
        let weights = WeightConfig {
            baseline: 0.9,
            ..WeightConfig::default()
        };
        let err = compute_score(&sudan(), &weights, &ConflictMultipliers::default()).unwrap_err();
        assert!(matches!(err, EngineError::Config(_)));
    }

    #[test]
    fn builtin_countries_rank_by_need() {
        let store = IndicatorStore::new(builtin::indicators()).expect("store");
        let scores = score_all(
            &store,
            &WeightConfig::default(),
            &ConflictMultipliers::default(),
        )
        .expect("scores");
        let order = scores.iter().map(|s| s.country.as_str()).collect::<Vec<_>>();
        assert_eq!(order, vec!["Sudan", "Morocco", "Israel", "UAE", "Bahrain"]);
        let expected = [115.65, 24.5, 2.0, 1.8, 1.5];
        for (score, want) in scores.iter().zip(expected) {
            assert!(
                (score.final_score - want).abs() < 1e-9,
                "{} scored {}",
                score.country,
                score.final_score
            );
        }
    }

    #[test]
    fn relative_need_uses_smallest_positive_score() {
        let store = IndicatorStore::new(builtin::indicators()).expect("store");
        let scores = score_all(
            &store,
            &WeightConfig::default(),
            &ConflictMultipliers::default(),
        )
        .expect("scores");
        let ratios = relative_need(&scores);
        let sudan = ratios.iter().find(|r| r.country == "Sudan").expect("sudan");
        let ratio = sudan.ratio_to_lowest.expect("ratio");
        assert!(ratio > 76.0 && ratio < 78.0);
    }
}
