//! Intent-driven latency evaluator

use crate::models::{AleRequirement, Admission, ClusterSignal};
use crate::weights::AleWeights;

use super::{blend, ClusterEvaluator, Objective};

/// Compute intensity at and above which a GPU accelerator is mandatory
pub const DEFAULT_GPU_TFLOPS_THRESHOLD: f64 = 150.0;

/// Rank returned when the workload states no latency budget
pub const NEUTRAL_RANK: i64 = 500;

const GPU_MARKER: &str = "gpu";

/// Keeps heavy compute off clusters without a GPU; ranks by latency headroom.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentLatency {
    pub gpu_tflops_threshold: f64,
}

impl Default for IntentLatency {
    fn default() -> Self {
        Self {
            gpu_tflops_threshold: DEFAULT_GPU_TFLOPS_THRESHOLD,
        }
    }
}

impl IntentLatency {
    pub fn capacity_score(req: &AleRequirement, cluster: &ClusterSignal) -> i64 {
        let budget = req.latency_budget.p95_ms;
        if budget <= 0 {
            return NEUTRAL_RANK;
        }
        let headroom = budget.saturating_sub(cluster.observed_rtt_ms) as f64 / budget as f64;
        (headroom.clamp(0.0, 1.0) * 1000.0).round() as i64
    }
}

impl ClusterEvaluator for IntentLatency {
    fn name(&self) -> &'static str {
        "intent-latency"
    }

    fn objective(&self) -> Objective {
        Objective::Latency
    }

    fn filter(&self, req: &AleRequirement, cluster: &ClusterSignal) -> Admission {
        let has_gpu = cluster.accelerator.as_deref() == Some(GPU_MARKER);
        if req.compute_intensity_tflops >= self.gpu_tflops_threshold && !has_gpu {
            Admission::Reject
        } else {
            Admission::Admit
        }
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
    use crate::models::LatencyBudget;

    fn cluster(accelerator: Option<&str>, rtt: i64) -> ClusterSignal {
        ClusterSignal {
            accelerator: accelerator.map(str::to_string),
            observed_rtt_ms: rtt,
            ..Default::default()
        }
    }

    fn req(tflops: f64, p95: i64) -> AleRequirement {
        AleRequirement {
            compute_intensity_tflops: tflops,
            latency_budget: LatencyBudget { p95_ms: p95 },
            ..Default::default()
        }
    }

    #[test]
    fn test_heavy_compute_needs_gpu() {
        let e = IntentLatency::default();
        assert_eq!(e.filter(&req(150.0, 0), &cluster(None, 0)), Admission::Reject);
        assert_eq!(e.filter(&req(150.0, 0), &cluster(Some("tpu"), 0)), Admission::Reject);
        assert_eq!(e.filter(&req(150.0, 0), &cluster(Some("gpu"), 0)), Admission::Admit);
        assert_eq!(e.filter(&req(149.9, 0), &cluster(None, 0)), Admission::Admit);
    }

    #[test]
    fn test_neutral_without_budget() {
        let e = IntentLatency::default();
        assert_eq!(e.score(&req(0.0, 0), &cluster(None, 80), None), NEUTRAL_RANK);
    }

    #[test]
    fn test_headroom_score() {
        let e = IntentLatency::default();
        assert_eq!(e.score(&req(0.0, 100), &cluster(None, 25), None), 750);
        assert_eq!(e.score(&req(0.0, 100), &cluster(None, 250), None), 0);
        assert_eq!(e.score(&req(0.0, 3), &cluster(None, 1), None), 667);
    }

    #[test]
    fn test_extreme_rtt_stays_in_range() {
        let e = IntentLatency::default();
        assert_eq!(e.score(&req(0.0, 100), &cluster(None, i64::MIN), None), 1000);
        assert_eq!(e.score(&req(0.0, 100), &cluster(None, -50), None), 1000);
        assert_eq!(e.score(&req(0.0, i64::MAX), &cluster(None, i64::MAX), None), 0);
        assert_eq!(e.score(&req(0.0, 100), &cluster(None, i64::MAX), None), 0);
    }
}
