//! Power-budget evaluator

use crate::models::{AleRequirement, Admission, ClusterSignal};

use super::{blend, ClusterEvaluator, Objective};
use crate::weights::AleWeights;

/// Physical power envelope of a cluster, in watts
pub const DEFAULT_POWER_CEILING_WATT: i64 = 350;

/// Rejects clusters whose estimated draw plus the workload's budget would
/// exceed the power envelope; ranks by estimated free capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerBudget {
    pub ceiling_watt: i64,
}

impl Default for PowerBudget {
    fn default() -> Self {
        Self {
            ceiling_watt: DEFAULT_POWER_CEILING_WATT,
        }
    }
}

impl PowerBudget {
    /// Free capacity, with the worse of CPU and memory utilisation binding
    pub fn capacity_score(cluster: &ClusterSignal) -> i64 {
        let used = cluster.cpu_usage_estimate.max(cluster.mem_usage_estimate);
        let free = (1.0 - used).max(0.0);
        (free * 1000.0).round() as i64
    }
}

impl ClusterEvaluator for PowerBudget {
    fn name(&self) -> &'static str {
        "power-budget"
    }

    fn objective(&self) -> Objective {
        Objective::Energy
    }

    fn filter(&self, req: &AleRequirement, cluster: &ClusterSignal) -> Admission {
        let budget = req.power_budget_watt;
        if budget > 0 && cluster.power_estimate_watt.saturating_add(budget) > self.ceiling_watt {
            Admission::Reject
        } else {
            Admission::Admit
        }
    }

    fn score(
        &self,
        _req: &AleRequirement,
        cluster: &ClusterSignal,
        weights: Option<&AleWeights>,
    ) -> i64 {
        blend(
            Self::capacity_score(cluster),
            weights.map(|w| self.objective().pick(w)),
        )
    }
}
