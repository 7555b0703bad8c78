//! Before/after trend projection with a counterfactual baseline.
//!
//! Rates are secants through the first and last point of each window rather
//! than a fitted regression, so an outlier at either end of a window moves the
//! whole rate.

use tracing::debug;

use crate::error::{EngineError, EngineResult};
use crate::projection::{
    HistoricalSeries, ProjectionConfig, ProjectionPoint, ProjectionResult, SeriesPoint,
};

pub fn project(
    series: &HistoricalSeries,
    intervention_year: i32,
    target_year: i32,
    config: &ProjectionConfig,
) -> EngineResult<ProjectionResult> {
    config.validate()?;
    if target_year < intervention_year {
        return Err(EngineError::invalid(format!(
            "target year {target_year} precedes intervention year {intervention_year}"
        )));
    }
    let span = i64::from(target_year) - i64::from(intervention_year);
    if span > i64::from(config.max_horizon_years) {
        return Err(EngineError::invalid(format!(
            "projection spans {span} years, more than the {} year limit",
            config.max_horizon_years
        )));
    }

    let points = series.points();
    let pre = points
        .iter()
        .filter(|p| p.year <= intervention_year)
        .copied()
        .collect::<Vec<_>>();
    let Some(last_pre) = pre.last().copied() else {
        return Err(EngineError::insufficient(format!(
            "{} has no observations at or before {intervention_year}",
            series.country()
        )));
    };
    let post = points
        .iter()
        .filter(|p| p.year >= intervention_year)
        .copied()
        .collect::<Vec<_>>();

    let pre_rate = secant_rate(&pre);
    let post_rate = secant_rate(&post);
    let treatment_effect = post_rate - pre_rate;
    let value_at_intervention = series
        .value_at(intervention_year)
        .unwrap_or_else(|| last_pre.value + f64::from(intervention_year - last_pre.year) * pre_rate);

    // `pre` is non-empty, so the series is too.
    let last_observed = points[points.len() - 1];
    let trend_rate = if post.len() >= 2 { post_rate } else { pre_rate };

    let mut out = Vec::with_capacity(span as usize + 1);
    let mut capped = false;
    for year in intervention_year..=target_year {
        let actual = series.value_at(year);
        let projected = match actual {
            Some(value) => value,
            None if year > last_observed.year => {
                let raw =
                    last_observed.value + f64::from(year - last_observed.year) * trend_rate;
                let clipped = clip(raw, config.ceiling);
                if year == target_year {
                    capped = clipped < raw;
                }
                clipped
            }
            None => interpolate(points, year),
        };

        let counterfactual = clip(
            value_at_intervention + f64::from(year - intervention_year) * pre_rate,
            config.ceiling,
        );

        out.push(ProjectionPoint {
            year,
            actual,
            projected,
            counterfactual,
            gain: projected - counterfactual,
        });
    }

    let target = out[out.len() - 1];
    debug!(
        country = series.country(),
        pre_rate, post_rate, projected = target.projected, "projected series"
    );

    Ok(ProjectionResult {
        country: series.country().to_string(),
        intervention_year,
        target_year,
        pre_rate,
        post_rate,
        treatment_effect,
        value_at_intervention,
        last_observed_year: last_observed.year,
        last_observed_value: last_observed.value,
        projected_target: target.projected,
        counterfactual_target: target.counterfactual,
        gain_target: target.gain,
        is_extrapolated: target_year > last_observed.year,
        capped,
        points: out,
    })
}

fn secant_rate(window: &[SeriesPoint]) -> f64 {
    let (Some(first), Some(last)) = (window.first(), window.last()) else {
        return 0.0;
    };
    let span = last.year - first.year;
    if span <= 0 {
        return 0.0;
    }
    (last.value - first.value) / f64::from(span)
}

/// Linear interpolation between the observations bracketing `year`.
fn interpolate(points: &[SeriesPoint], year: i32) -> f64 {
    let upper_idx = points.partition_point(|p| p.year < year);
    if upper_idx == 0 {
        return points[0].value;
    }
    if upper_idx >= points.len() {
        return points[points.len() - 1].value;
    }
    let lower = points[upper_idx - 1];
    let upper = points[upper_idx];
    let fraction = f64::from(year - lower.year) / f64::from(upper.year - lower.year);
    lower.value + (upper.value - lower.value) * fraction
}

fn clip(value: f64, ceiling: f64) -> f64 {
    value.clamp(0.0, ceiling)
}
