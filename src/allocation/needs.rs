use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Documented funding need for one country, in budget units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NeedEntry {
    pub country: String,
    pub total_need: f64,
    /// Portion of the need fundable before any phase-2 trigger.
    pub phase_1_need: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct NeedTable {
    entries: Vec<NeedEntry>,
}

impl NeedTable {
    pub fn new(entries: Vec<NeedEntry>) -> EngineResult<Self> {
        let mut seen = BTreeSet::new();
        for entry in &entries {
            if !seen.insert(entry.country.trim().to_ascii_lowercase()) {
                return Err(EngineError::invalid(format!(
                    "duplicate country in need table: {}",
                    entry.country
                )));
            }
            let valid = entry.total_need.is_finite()
                && entry.phase_1_need.is_finite()
                && entry.phase_1_need >= 0.0
                && entry.phase_1_need <= entry.total_need;
            if !valid {
                return Err(EngineError::invalid(format!(
                    "need for {} must satisfy 0 <= phase_1_need <= total_need",
                    entry.country
                )));
            }
        }
        Ok(Self { entries })
    }

    pub fn get(&self, country: &str) -> Option<&NeedEntry> {
        self.entries
            .iter()
            .find(|e| e.country.eq_ignore_ascii_case(country.trim()))
    }

    pub fn entries(&self) -> &[NeedEntry] {
        &self.entries
    }

    pub fn total_need(&self) -> f64 {
        self.entries.iter().map(|e| e.total_need).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{NeedEntry, NeedTable};

    fn entry(country: &str, total: f64, phase_1: f64) -> NeedEntry {
        NeedEntry {
            country: country.to_string(),
            total_need: total,
            phase_1_need: phase_1,
        }
    }

    #[test]
    fn phase_one_cannot_exceed_total() {
        assert!(NeedTable::new(vec![entry("Sudan", 700.0, 967.0)]).is_err());
        assert!(NeedTable::new(vec![entry("Sudan", 967.0, -1.0)]).is_err());
    }

    #[test]
    fn sums_documented_need() {
        let table = NeedTable::new(vec![entry("Sudan", 967.0, 700.0), entry("Morocco", 135.3, 135.3)])
            .expect("table");
        assert!((table.total_need() - 1102.3).abs() < 1e-9);
        assert!(table.get("sudan").is_some());
    }
}
