//! Collaborative locality evaluator

use crate::models::{clamp_rank, AleRequirement, Admission, ClusterSignal, EnergyClass, ResourceSummary};
use crate::weights::AleWeights;

use super::{blend, ClusterEvaluator, Objective};

const REGION_BONUS: i64 = 400;
const LOW_ENERGY_BONUS: i64 = 300;
const FREE_CAPACITY_FACTOR: f64 = 150.0;

/// Always admits; rewards region locality, low-energy pairing and free room.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Collaborative;

impl Collaborative {
    pub fn capacity_score(req: &AleRequirement, cluster: &ClusterSignal) -> i64 {
        let mut score = 0;

        if let Some(region) = req.region.as_deref().filter(|r| !r.is_empty()) {
            if cluster.region.as_deref() == Some(region) {
                score += REGION_BONUS;
            }
        }

        if req.energy_class == Some(EnergyClass::Low) && cluster.energy_label.as_deref() == Some("low") {
            score += LOW_ENERGY_BONUS;
        }

        if let Some(resources) = &cluster.resources {
            score += free_capacity_bonus(resources);
        }

        clamp_rank(score)
    }
}

fn free_capacity_bonus(r: &ResourceSummary) -> i64 {
    if r.allocatable_cpu_millis <= 0 || r.allocatable_memory_bytes <= 0 {
        return 0;
    }
    // each fraction lies in [0, 1] whatever the reported allocation
    let free = |total: i64, used: i64| ((total as f64 - used as f64) / total as f64).clamp(0.0, 1.0);
    let cpu = free(r.allocatable_cpu_millis, r.allocated_cpu_millis);
    let mem = free(r.allocatable_memory_bytes, r.allocated_memory_bytes);
    ((cpu + mem) * FREE_CAPACITY_FACTOR).round() as i64
}

impl ClusterEvaluator for Collaborative {
    fn name(&self) -> &'static str {
        "collaborative"
    }

    fn objective(&self) -> Objective {
        Objective::Accuracy
    }

    fn filter(&self, _req: &AleRequirement, _cluster: &ClusterSignal) -> Admission {
        Admission::Admit
    }

    fn score(
        &self,
        req: &AleRequirement,
        cluster: &ClusterSignal,
        weights: Option<&AleWeights>,
    ) -> i64 {
        blend(
            Self::capacity_score(req, cluster),
            weights.map(|w| self.objective().pick(w)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resources(cpu: (i64, i64), mem: (i64, i64)) -> ResourceSummary {
        ResourceSummary {
            allocatable_cpu_millis: cpu.0,
            allocated_cpu_millis: cpu.1,
            allocatable_memory_bytes: mem.0,
            allocated_memory_bytes: mem.1,
        }
    }

    #[test]
    fn test_region_and_energy_bonuses() {
        let req = AleRequirement {
            region: Some("kr-central".into()),
            energy_class: Some(EnergyClass::Low),
            ..Default::default()
        };
        let c = ClusterSignal {
            region: Some("kr-central".into()),
            energy_label: Some("low".into()),
            ..Default::default()
        };
        assert_eq!(Collaborative::capacity_score(&req, &c), 700);

        let medium = AleRequirement {
            energy_class: Some(EnergyClass::Medium),
            ..req
        };
        assert_eq!(Collaborative::capacity_score(&medium, &c), 400);
    }

    #[test]
    fn test_empty_region_never_matches() {
        let req = AleRequirement {
            region: Some(String::new()),
            ..Default::default()
        };
        let c = ClusterSignal {
            region: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(Collaborative::capacity_score(&req, &c), 0);
    }

    #[test]
    fn test_free_capacity_bonus() {
        // half cpu free, a quarter of memory free: (0.5 + 0.25) * 150
        assert_eq!(free_capacity_bonus(&resources((4000, 2000), (100, 75))), 113);
        // overcommitted cpu floors at zero
        assert_eq!(free_capacity_bonus(&resources((1000, 3000), (100, 0))), 150);
        assert_eq!(free_capacity_bonus(&resources((0, 0), (100, 0))), 0);
    }

    #[test]
    fn test_negative_allocation_caps_free_fraction() {
        assert_eq!(free_capacity_bonus(&resources((1000, -4000), (100, 0))), 300);
        assert_eq!(free_capacity_bonus(&resources((1000, i64::MIN), (100, i64::MAX))), 150);

        let c = ClusterSignal {
            resources: Some(resources((1000, -4000), (100, 0))),
            ..Default::default()
        };
        assert_eq!(Collaborative.score(&AleRequirement::default(), &c, None), 300);
    }

    #[test]
    fn test_capped_at_max_rank() {
        let req = AleRequirement {
            region: Some("r".into()),
            energy_class: Some(EnergyClass::Low),
            ..Default::default()
        };
        let c = ClusterSignal {
            region: Some("r".into()),
            energy_label: Some("low".into()),
            resources: Some(resources((1000, 0), (1000, 0))),
            ..Default::default()
        };
        assert_eq!(Collaborative.score(&req, &c, None), 1000);
        assert_eq!(Collaborative.filter(&req, &c), Admission::Admit);
    }
}
