use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::allocation::NeedEntry;
use crate::dataset::{DataSource, Loaded};
use crate::effectiveness::Program;
use crate::indicators::{ConflictStatus, CountryIndicators};
use crate::projection::{HistoricalSeries, SeriesPoint};

#[derive(Debug, Deserialize)]
struct IndicatorRow {
    country: String,
    baseline_gap: f64,
    gender_parity_gap: f64,
    rural_urban_gap: f64,
    poverty_rate: f64,
    quality_deficit: f64,
    conflict_status: String,
}

#[derive(Debug, Deserialize)]
struct SeriesRow {
    country: String,
    year: i32,
    value: f64,
}

fn csv_reader<R: Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader)
}

pub fn read_indicators<R: Read>(reader: R) -> Result<Vec<CountryIndicators>> {
    let mut out = Vec::new();
    for (line, record) in csv_reader(reader).deserialize::<IndicatorRow>().enumerate() {
        let row = record.with_context(|| format!("indicator row {}", line + 1))?;
        let conflict_status = row
            .conflict_status
            .parse::<ConflictStatus>()
            .with_context(|| format!("indicator row for {}", row.country))?;
        out.push(CountryIndicators {
            country: row.country,
            baseline_gap: row.baseline_gap,
            gender_parity_gap: row.gender_parity_gap,
            rural_urban_gap: row.rural_urban_gap,
            poverty_rate: row.poverty_rate,
            quality_deficit: row.quality_deficit,
            conflict_status,
        });
    }
    Ok(out)
}

/// Reads long-format `country,year,value` rows. Rows may arrive in any order;
/// they are grouped per country and sorted by year. Countries keep the order
/// of their first appearance.
pub fn read_series<R: Read>(reader: R) -> Result<Vec<HistoricalSeries>> {
    let mut order = Vec::new();
    let mut grouped: BTreeMap<String, Vec<SeriesPoint>> = BTreeMap::new();
    for (line, record) in csv_reader(reader).deserialize::<SeriesRow>().enumerate() {
        let row = record.with_context(|| format!("series row {}", line + 1))?;
        let points = grouped.entry(row.country.clone()).or_insert_with(|| {
            order.push(row.country.clone());
            Vec::new()
        });
        points.push(SeriesPoint {
            year: row.year,
            value: row.value,
        });
    }

    let mut out = Vec::with_capacity(order.len());
    for country in order {
        let mut points = grouped.remove(&country).unwrap_or_default();
        points.sort_by_key(|p| p.year);
        out.push(HistoricalSeries::new(country, points)?);
    }
    Ok(out)
}

pub fn read_programs<R: Read>(reader: R) -> Result<Vec<Program>> {
    csv_reader(reader)
        .deserialize::<Program>()
        .enumerate()
        .map(|(line, record)| record.with_context(|| format!("program row {}", line + 1)))
        .collect()
}

pub fn read_needs<R: Read>(reader: R) -> Result<Vec<NeedEntry>> {
    csv_reader(reader)
        .deserialize::<NeedEntry>()
        .enumerate()
        .map(|(line, record)| record.with_context(|| format!("need row {}", line + 1)))
        .collect()
}

/// Loads `dir/file_name` with `parse`, or substitutes `fallback` when the
/// file does not exist. A file that exists but fails to parse is an error.
pub fn load_table<T>(
    dir: &Path,
    file_name: &str,
    parse: impl FnOnce(std::fs::File) -> Result<T>,
    fallback: impl FnOnce() -> Result<T>,
) -> Result<Loaded<T>> {
    let path = dir.join(file_name);
    if !path.exists() {
        warn!(path = %path.display(), "data file missing, using built-in table");
        return Ok(Loaded {
            data: fallback()?,
            source: DataSource::Builtin,
            loaded_at: Utc::now(),
        });
    }

    let file = std::fs::File::open(&path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let data = parse(file).with_context(|| format!("failed to parse {}", path.display()))?;
    info!(path = %path.display(), "loaded data file");
    Ok(Loaded {
        data,
        source: DataSource::File { path },
        loaded_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::{read_indicators, read_needs, read_programs, read_series};
    use crate::indicators::ConflictStatus;

    #[test]
    fn parses_indicator_rows_with_status_aliases() {
        let raw = "country,baseline_gap,gender_parity_gap,rural_urban_gap,poverty_rate,quality_deficit,conflict_status\n\
                   Sudan, 38, 31, 30, 46, 65, severe\n\
                   Chad,40,35,30,42,60,Moderate conflict\n";
        let rows = read_indicators(raw.as_bytes()).expect("rows");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].conflict_status, ConflictStatus::SevereConflict);
        assert_eq!(rows[1].conflict_status, ConflictStatus::ModerateConflict);
    }

    #[test]
    fn unknown_conflict_status_is_an_error() {
        let raw = "country,baseline_gap,gender_parity_gap,rural_urban_gap,poverty_rate,quality_deficit,conflict_status\n\
                   Sudan,38,31,30,46,65,apocalyptic\n";
        assert!(read_indicators(raw.as_bytes()).is_err());
    }

    #[test]
    fn groups_and_sorts_series_rows() {
        let raw = "country,year,value\nMorocco,2014,52.3\nSudan,2008,58.9\nMorocco,2008,44.2\n";
        let series = read_series(raw.as_bytes()).expect("series");
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].country(), "Morocco");
        assert_eq!(series[0].first_year(), Some(2008));
        assert_eq!(series[0].value_at(2014), Some(52.3));
    }

    #[test]
    fn duplicate_series_year_is_rejected() {
        let raw = "country,year,value\nMorocco,2014,52.3\nMorocco,2014,52.4\n";
        assert!(read_series(raw.as_bytes()).is_err());
    }

    #[test]
    fn parses_programs_and_needs() {
        let programs = read_programs(
            "name,country,total_cost,outcome_improvement_points,duration_years,beneficiaries\n\
             Drive,Bahrain,85,6.5,12,0.35\n"
                .as_bytes(),
        )
        .expect("programs");
        assert_eq!(programs[0].name, "Drive");

        let needs = read_needs("country,total_need,phase_1_need\nSudan,967,700\n".as_bytes())
            .expect("needs");
        assert_eq!(needs[0].phase_1_need, 700.0);
    }

    #[test]
    fn malformed_number_is_an_error() {
        let raw = "country,total_need,phase_1_need\nSudan,lots,700\n";
        assert!(read_needs(raw.as_bytes()).is_err());
    }
}
