pub mod builtin;
pub mod loader;

use std::path::{Path, PathBuf};

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::allocation::NeedTable;
use crate::effectiveness::Program;
use crate::indicators::IndicatorStore;
use crate::projection::HistoricalSeries;

pub const INDICATORS_FILE: &str = "indicators.csv";
pub const SERIES_FILE: &str = "series.csv";
pub const PROGRAMS_FILE: &str = "programs.csv";
pub const NEEDS_FILE: &str = "needs.csv";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    File { path: PathBuf },
    Builtin,
}

impl DataSource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Builtin)
    }
}

/// A table together with where it came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loaded<T> {
    pub data: T,
    pub source: DataSource,
    pub loaded_at: DateTime<Utc>,
}

impl<T> Loaded<T> {
    pub fn builtin(data: T) -> Self {
        Self {
            data,
            source: DataSource::Builtin,
            loaded_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceInfo {
    pub table: String,
    pub rows: usize,
    pub source: DataSource,
    pub loaded_at: DateTime<Utc>,
}

/// Every input table, loaded once and owned by the caller.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub indicators: Loaded<IndicatorStore>,
    pub series: Loaded<Vec<HistoricalSeries>>,
    pub programs: Loaded<Vec<Program>>,
    pub needs: Loaded<NeedTable>,
}

impl Dataset {
    pub fn builtin() -> Result<Self> {
        Ok(Self {
            indicators: Loaded::builtin(IndicatorStore::new(builtin::indicators())?),
            series: Loaded::builtin(builtin::series()?),
            programs: Loaded::builtin(builtin::programs()),
            needs: Loaded::builtin(NeedTable::new(builtin::needs())?),
        })
    }

    /// Loads each table from `dir`, falling back to the built-in table for
    /// any file that is absent.
    pub fn load(dir: &Path) -> Result<Self> {
        Ok(Self {
            indicators: loader::load_table(
                dir,
                INDICATORS_FILE,
                |file| Ok(IndicatorStore::new(loader::read_indicators(file)?)?),
                || Ok(IndicatorStore::new(builtin::indicators())?),
            )?,
            series: loader::load_table(dir, SERIES_FILE, loader::read_series, || {
                Ok(builtin::series()?)
            })?,
            programs: loader::load_table(dir, PROGRAMS_FILE, loader::read_programs, || {
                Ok(builtin::programs())
            })?,
            needs: loader::load_table(
                dir,
                NEEDS_FILE,
                |file| Ok(NeedTable::new(loader::read_needs(file)?)?),
                || Ok(NeedTable::new(builtin::needs())?),
            )?,
        })
    }

    pub fn series_for(&self, country: &str) -> Option<&HistoricalSeries> {
        self.series
            .data
            .iter()
            .find(|s| s.country().eq_ignore_ascii_case(country.trim()))
    }

    pub fn uses_fallback(&self) -> bool {
        self.sources().iter().any(|s| s.source.is_fallback())
    }

    pub fn sources(&self) -> Vec<SourceInfo> {
        vec![
            source_info("indicators", self.indicators.data.len(), &self.indicators),
            source_info("series", self.series.data.len(), &self.series),
            source_info("programs", self.programs.data.len(), &self.programs),
            source_info("needs", self.needs.data.entries().len(), &self.needs),
        ]
    }
}

fn source_info<T>(table: &str, rows: usize, loaded: &Loaded<T>) -> SourceInfo {
    SourceInfo {
        table: table.to_string(),
        rows,
        source: loaded.source.clone(),
        loaded_at: loaded.loaded_at,
    }
}
