use crate::indicators::CountryIndicators;

pub fn normalize_percent(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

pub fn non_negative(value: f64) -> f64 {
    value.max(0.0)
}

/// Clamps every scoring component so an over-achieving country cannot
/// contribute a negative term.
pub fn normalize_indicators(indicators: &mut CountryIndicators) {
    indicators.baseline_gap = non_negative(indicators.baseline_gap);
    indicators.gender_parity_gap = non_negative(indicators.gender_parity_gap);
    indicators.rural_urban_gap = non_negative(indicators.rural_urban_gap);
    indicators.poverty_rate = normalize_percent(indicators.poverty_rate);
    indicators.quality_deficit = non_negative(indicators.quality_deficit);
}
