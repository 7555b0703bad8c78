use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::indicators::CountryIndicators;

/// Immutable per-country indicator table. Insertion order is preserved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndicatorStore {
    entries: Vec<CountryIndicators>,
}

impl IndicatorStore {
    pub fn new(entries: Vec<CountryIndicators>) -> EngineResult<Self> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            let key = entry.country.trim();
            if key.is_empty() {
                return Err(EngineError::invalid("country identifier cannot be empty"));
            }
            if !seen.insert(key.to_ascii_lowercase()) {
                return Err(EngineError::invalid(format!(
                    "duplicate country in indicator table: {key}"
                )));
            }
            if !entry.has_finite_components() {
                return Err(EngineError::invalid(format!(
                    "non-finite indicator value for {key}"
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, country: &str) -> Option<&CountryIndicators> {
        let needle = country.trim();
        self.entries
            .iter()
            .find(|entry| entry.country.eq_ignore_ascii_case(needle))
    }

    pub fn iter(&self) -> impl Iterator<Item = &CountryIndicators> {
        self.entries.iter()
    }

    pub fn countries(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.country.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
