use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationConfig, AllocationMode};
use crate::index::{ConflictMultipliers, WeightConfig};
use crate::projection::ProjectionConfig;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub projection: ProjectionConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IndexConfig {
    #[serde(default)]
    pub weights: WeightConfig,
    #[serde(default)]
    pub conflict_multipliers: ConflictMultipliers,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataConfig {
    /// Directory holding the CSV tables; missing files fall back to built-in data.
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub data_dir: Option<String>,
    pub total_budget: Option<f64>,
    pub allocation_mode: Option<AllocationMode>,
    pub precision: Option<u32>,
    pub intervention_year: Option<i32>,
    pub target_year: Option<i32>,
}

impl Config {
    pub fn default_path() -> PathBuf {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".config/literacy-allocator/config.toml")
    }

    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path
            .map(|p| p.to_path_buf())
            .unwrap_or_else(Self::default_path);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = fs::read_to_string(&path)
            .with_context(|| format!("failed reading config: {}", path.display()))?;
        let parsed: Self = toml::from_str(&data)
            .with_context(|| format!("failed parsing TOML config: {}", path.display()))?;
        parsed
            .validate()
            .with_context(|| format!("invalid config: {}", path.display()))?;
        Ok(parsed)
    }

    pub fn validate(&self) -> Result<()> {
        self.index.weights.validate()?;
        self.index.conflict_multipliers.validate()?;
        self.allocation.validate()?;
        self.projection.validate()?;
        Ok(())
    }

    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(dir) = overrides.data_dir {
            self.data.dir = dir;
        }
        if let Some(budget) = overrides.total_budget {
            self.allocation.total_budget = budget;
        }
        if let Some(mode) = overrides.allocation_mode {
            self.allocation.mode = mode;
        }
        if let Some(precision) = overrides.precision {
            self.allocation.precision = precision;
        }
        if let Some(year) = overrides.intervention_year {
            self.projection.intervention_year = year;
        }
        if let Some(year) = overrides.target_year {
            self.projection.target_year = year;
        }
    }

    pub fn write_template(path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed creating config directory: {}", parent.display())
            })?;
        }
        fs::write(path, Self::default_template())
            .with_context(|| format!("failed writing config template: {}", path.display()))
    }

    pub fn resolved_data_dir(&self) -> PathBuf {
        expand_tilde(&self.data.dir)
    }

    pub fn default_template() -> String {
        let template = r#"[index.weights]
baseline = 0.30
gender = 0.25
rural_urban = 0.20
economic = 0.15
quality = 0.10

[index.conflict_multipliers]
stable = 1.0
moderate = 1.5
severe = 3.0

[allocation]
# USD millions
total_budget = 950.0
precision = 1
# "proportional" or "fixed_need"
mode = "proportional"
phase_2_max_conflict_multiplier = 2.0

[projection]
intervention_year = 2014
target_year = 2030
ceiling = 100.0
sdg_target = 95.0
max_horizon_years = 200

[data]
dir = "~/.local/share/literacy-allocator"

[server]
host = "127.0.0.1"
port = 8080
"#;
        template.to_string()
    }
}

pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_data_dir() -> String {
    "~/.local/share/literacy-allocator".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}
