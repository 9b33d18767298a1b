//! Cluster-type specific value adjustment

use serde::{Deserialize, Serialize};

use crate::models::{AdjustedValues, ClusterType, MaleValues};

/// Additive offsets applied to a policy's base values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueDelta {
    pub accuracy: i64,
    pub latency: i64,
    pub energy: i64,
}

impl ValueDelta {
    const fn new(accuracy: i64, latency: i64, energy: i64) -> Self {
        Self {
            accuracy,
            latency,
            energy,
        }
    }

    /// Offsets for a cluster type; no profile means no offset
    pub fn for_cluster(cluster_type: Option<ClusterType>) -> Self {
        match cluster_type {
            Some(ClusterType::Gpu) => Self::new(100, -50, -100),
            Some(ClusterType::Edge) => Self::new(-100, 100, 200),
            Some(ClusterType::HighPerformance) => Self::new(50, -30, -50),
            Some(ClusterType::Cpu) => Self::new(0, 0, 50),
            None => Self::default(),
        }
    }
}

/// Maps base values onto the destination cluster's type
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueAdjuster;

impl ValueAdjuster {
    pub fn adjust(&self, base: MaleValues, cluster_type: Option<ClusterType>) -> AdjustedValues {
        let d = ValueDelta::for_cluster(cluster_type);
        AdjustedValues::clamped(
            base.accuracy as i64 + d.accuracy,
            base.latency as i64 + d.latency,
            base.energy as i64 + d.energy,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn triple(v: AdjustedValues) -> (i32, i32, i32) {
        (v.accuracy(), v.latency(), v.energy())
    }

    #[test]
    fn test_gpu_adjustment_clamps_accuracy() {
        let v = ValueAdjuster.adjust(MaleValues::new(950, 950, 950), Some(ClusterType::Gpu));
        assert_eq!(triple(v), (1000, 900, 850));
    }

    #[test]
    fn test_each_cluster_type() {
        let base = MaleValues::new(500, 500, 500);
        let cases = [
            (Some(ClusterType::Edge), (400, 600, 700)),
            (Some(ClusterType::HighPerformance), (550, 470, 450)),
            (Some(ClusterType::Cpu), (500, 500, 550)),
            (None, (500, 500, 500)),
        ];
        for (kind, expected) in cases {
            assert_eq!(triple(ValueAdjuster.adjust(base, kind)), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_edge_floor() {
        let v = ValueAdjuster.adjust(MaleValues::new(40, 950, 900), Some(ClusterType::Edge));
        assert_eq!(triple(v), (0, 1000, 1000));
    }

    fn any_type() -> impl Strategy<Value = Option<ClusterType>> {
        prop::option::of(prop_oneof![
            Just(ClusterType::Gpu),
            Just(ClusterType::Edge),
            Just(ClusterType::HighPerformance),
            Just(ClusterType::Cpu),
        ])
    }

    proptest! {
        #[test]
        fn prop_adjusted_values_in_range(
            a in any::<i32>(),
            l in any::<i32>(),
            e in any::<i32>(),
            kind in any_type(),
        ) {
            let v = ValueAdjuster.adjust(MaleValues::new(a, l, e), kind);
            for x in [v.accuracy(), v.latency(), v.energy()] {
                prop_assert!((0..=1000).contains(&x));
            }
        }
    }
}
