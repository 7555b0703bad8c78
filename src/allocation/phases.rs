use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::allocation::{round_to, AllocationPlan, NeedTable};
use crate::error::{EngineError, EngineResult};
use crate::index::ConflictMultipliers;
use crate::indicators::{CountryIndicators, IndicatorStore};

/// Decides whether a country's phase-2 tranche is released.
pub trait PhaseTrigger {
    fn releases_phase_2(&self, indicators: &CountryIndicators) -> bool;

    fn describe(&self) -> String {
        "custom trigger".to_string()
    }
}

impl<F> PhaseTrigger for F
where
    F: Fn(&CountryIndicators) -> bool,
{
    fn releases_phase_2(&self, indicators: &CountryIndicators) -> bool {
        self(indicators)
    }
}

/// Releases phase 2 once the country's conflict multiplier is at or below
/// `max_multiplier`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConflictSeverityTrigger {
    pub max_multiplier: f64,
    pub multipliers: ConflictMultipliers,
}

impl ConflictSeverityTrigger {
    pub fn new(max_multiplier: f64, multipliers: ConflictMultipliers) -> Self {
        Self {
            max_multiplier,
            multipliers,
        }
    }
}

impl PhaseTrigger for ConflictSeverityTrigger {
    fn releases_phase_2(&self, indicators: &CountryIndicators) -> bool {
        self.multipliers.lookup(indicators.conflict_status) <= self.max_multiplier
    }

    fn describe(&self) -> String {
        format!("conflict multiplier <= {:.1}", self.max_multiplier)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhasedAllocation {
    pub country: String,
    pub allocated_amount: f64,
    pub total_need: f64,
    pub phase_1_amount: f64,
    pub phase_2_amount: f64,
    /// Need held back because the trigger did not fire.
    pub deferred_amount: f64,
    /// Allocation beyond documented need.
    pub excess_amount: f64,
    pub phase_2_released: bool,
    pub phase_1_coverage_pct: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhaseSummary {
    pub trigger: String,
    pub total_budget: f64,
    pub total_need: f64,
    pub phase_1_total: f64,
    pub phase_2_released_total: f64,
    pub deferred_total: f64,
    pub surplus: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PhasedPlan {
    pub allocations: Vec<PhasedAllocation>,
    pub summary: PhaseSummary,
}

impl PhasedPlan {
    pub fn get(&self, country: &str) -> Option<&PhasedAllocation> {
        self.allocations
            .iter()
            .find(|a| a.country.eq_ignore_ascii_case(country))
    }
}

/// Splits each allocation into a phase-1 tranche funded now and a phase-2
/// tranche gated by `trigger`. Countries missing from `needs` are treated as
/// needing exactly what they were allocated.
pub fn split_phases(
    plan: &AllocationPlan,
    store: &IndicatorStore,
    needs: &NeedTable,
    trigger: &dyn PhaseTrigger,
) -> EngineResult<PhasedPlan> {
    let precision = plan.precision;
    let mut allocations = Vec::with_capacity(plan.allocations.len());

    for allocation in &plan.allocations {
        let indicators = store.get(&allocation.country).ok_or_else(|| {
            EngineError::invalid(format!("no indicators for {}", allocation.country))
        })?;
        let total_need = needs
            .get(&allocation.country)
            .map(|n| n.total_need)
            .unwrap_or(allocation.amount);

        let phase_1_amount = allocation.amount.min(total_need);
        let excess_amount = round_to((allocation.amount - total_need).max(0.0), precision);
        let remaining = round_to((total_need - phase_1_amount).max(0.0), precision);
        let released = trigger.releases_phase_2(indicators);
        let (phase_2_amount, deferred_amount) = if released {
            (remaining, 0.0)
        } else {
            (0.0, remaining)
        };
        let phase_1_coverage_pct = if total_need > 0.0 {
            phase_1_amount / total_need * 100.0
        } else {
            100.0
        };

        debug!(
            country = %allocation.country,
            phase_1_amount,
            phase_2_amount,
            deferred_amount,
            released,
            "split allocation into phases"
        );

        allocations.push(PhasedAllocation {
            country: allocation.country.clone(),
            allocated_amount: allocation.amount,
            total_need,
            phase_1_amount,
            phase_2_amount,
            deferred_amount,
            excess_amount,
            phase_2_released: released,
            phase_1_coverage_pct,
        });
    }

    let sum = |f: fn(&PhasedAllocation) -> f64| allocations.iter().map(f).sum::<f64>();
    let summary = PhaseSummary {
        trigger: trigger.describe(),
        total_budget: plan.total_budget,
        total_need: sum(|a| a.total_need),
        phase_1_total: sum(|a| a.phase_1_amount),
        phase_2_released_total: sum(|a| a.phase_2_amount),
        deferred_total: sum(|a| a.deferred_amount),
        surplus: sum(|a| a.excess_amount) + plan.unallocated,
    };

    Ok(PhasedPlan {
        allocations,
        summary,
    })
}

#[cfg(test)]
mod tests {
    use super::{split_phases, ConflictSeverityTrigger};
    use crate::allocation::{allocate, allocate_fixed_need, NeedTable};
    use crate::dataset::builtin;
    use crate::index::{score_all, ConflictMultipliers, WeightConfig};
    use crate::indicators::{ConflictStatus, CountryIndicators, IndicatorStore};

    fn fixtures() -> (IndicatorStore, NeedTable) {
        let store = IndicatorStore::new(builtin::indicators()).expect("store");
        let needs = NeedTable::new(builtin::needs()).expect("needs");
        (store, needs)
    }

    fn default_trigger() -> ConflictSeverityTrigger {
        ConflictSeverityTrigger::new(2.0, ConflictMultipliers::default())
    }

    #[test]
    fn severe_conflict_defers_phase_two() {
        let (store, needs) = fixtures();
        let scores =
            score_all(&store, &WeightConfig::default(), &ConflictMultipliers::default())
                .expect("scores");
        let plan = allocate_fixed_need(&scores, 950.0, 1, &needs).expect("plan");
        let phased = split_phases(&plan, &store, &needs, &default_trigger()).expect("phased");

        let sudan = phased.get("Sudan").expect("sudan");
        assert!(!sudan.phase_2_released);
        assert!((sudan.phase_1_amount - 700.0).abs() < 1e-9);
        assert!((sudan.deferred_amount - 267.0).abs() < 1e-9);
        assert_eq!(sudan.phase_2_amount, 0.0);

        let israel = phased.get("Israel").expect("israel");
        assert!(israel.phase_2_released);
        assert!((israel.phase_2_amount - 32.2).abs() < 1e-9);

        assert!((phased.summary.total_need - 1307.5).abs() < 1e-6);
        assert!((phased.summary.phase_2_released_total - 90.5).abs() < 1e-6);
        assert!((phased.summary.deferred_total - 267.0).abs() < 1e-6);
    }

    #[test]
    fn allocation_beyond_need_is_surplus() {
        let (store, needs) = fixtures();
        let scores =
            score_all(&store, &WeightConfig::default(), &ConflictMultipliers::default())
                .expect("scores");
        let plan = allocate(&scores, 950.0, 1).expect("plan");
        let phased = split_phases(&plan, &store, &needs, &default_trigger()).expect("phased");

        let morocco = phased.get("Morocco").expect("morocco");
        assert!((morocco.phase_1_amount - 135.3).abs() < 1e-9);
        assert!(morocco.excess_amount > 0.0);
        assert!((morocco.phase_1_coverage_pct - 100.0).abs() < 1e-9);
        assert!(phased.summary.surplus >= morocco.excess_amount);
    }

    #[test]
    fn closures_act_as_triggers() {
        let (store, needs) = fixtures();
        let scores =
            score_all(&store, &WeightConfig::default(), &ConflictMultipliers::default())
                .expect("scores");
        let plan = allocate_fixed_need(&scores, 950.0, 1, &needs).expect("plan");
        let release_all = |_: &CountryIndicators| true;
        let phased = split_phases(&plan, &store, &needs, &release_all).expect("phased");
        assert!(phased.allocations.iter().all(|a| a.phase_2_released));
        assert_eq!(phased.summary.deferred_total, 0.0);
    }

    #[test]
    fn trigger_threshold_follows_multiplier_table() {
        let trigger = ConflictSeverityTrigger::new(1.5, ConflictMultipliers::default());
        let mut indicators = builtin::indicators()[0].clone();
        indicators.conflict_status = ConflictStatus::ModerateConflict;
        assert!(super::PhaseTrigger::releases_phase_2(&trigger, &indicators));
        indicators.conflict_status = ConflictStatus::SevereConflict;
        assert!(!super::PhaseTrigger::releases_phase_2(&trigger, &indicators));
    }

    #[test]
    fn unknown_country_is_rejected() {
        let (_, needs) = fixtures();
        let store = IndicatorStore::new(Vec::new()).expect("empty store");
        let scores = score_all(
            &IndicatorStore::new(builtin::indicators()).expect("store"),
            &WeightConfig::default(),
            &ConflictMultipliers::default(),
        )
        .expect("scores");
        let plan = allocate(&scores, 950.0, 1).expect("plan");
        assert!(split_phases(&plan, &store, &needs, &default_trigger()).is_err());
    }
}
