//! Cluster classification
//!
//! Turns a [`ClusterSignal`] into a [`ClusterProfile`]. Classification is a
//! total, deterministic function of the hardware facts; rules are checked
//! in priority order and the first match wins.

pub mod labels;

pub use labels::{LabeledCluster, NodeSummary};

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{ClusterProfile, ClusterSignal, ClusterType};
use crate::observability::{noop_sink, ObservabilitySink};

const BYTES_PER_GB: i64 = 1024 * 1024 * 1024;

/// Classifies clusters and reports each profile to the sink
#[derive(Clone)]
pub struct ClusterProfiler {
    sink: Arc<dyn ObservabilitySink>,
}

impl Default for ClusterProfiler {
    fn default() -> Self {
        Self::new(noop_sink())
    }
}

impl ClusterProfiler {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self { sink }
    }

    pub fn classify(&self, signal: &ClusterSignal) -> ClusterProfile {
        let profile = profile_of(signal);
        self.sink.cluster_classified(&profile);
        profile
    }

    /// Classify a snapshot of clusters, keyed by cluster name
    pub fn classify_all<'a, I>(&self, signals: I) -> HashMap<String, ClusterProfile>
    where
        I: IntoIterator<Item = &'a ClusterSignal>,
    {
        signals
            .into_iter()
            .map(|s| {
                let p = self.classify(s);
                (p.name.clone(), p)
            })
            .collect()
    }
}

/// Pure profile derivation, no side effects
pub fn profile_of(signal: &ClusterSignal) -> ClusterProfile {
    let owned = |v: &Option<String>| v.clone().unwrap_or_default();

    let mut profile = ClusterProfile {
        name: signal.name.clone(),
        cluster_type: ClusterType::Edge,
        cpu_cores: signal.total_cpu_cores,
        memory_gb: signal.total_memory_bytes / BYTES_PER_GB,
        gpu_count: signal.gpu_count,
        gpu_type: owned(&signal.gpu_type),
        power_profile: owned(&signal.power_profile),
        network_type: owned(&signal.network_type),
        location: owned(&signal.location),
    };
    profile.cluster_type = classify_type(&profile);
    profile
}

/// Classification rules over the profile's hardware fields
pub fn classify_type(p: &ClusterProfile) -> ClusterType {
    if p.gpu_count > 0 {
        return ClusterType::Gpu;
    }
    if p.power_profile == "low-power" || p.location == "edge" {
        return ClusterType::Edge;
    }
    if p.network_type == "5g" && p.cpu_cores < 8 {
        return ClusterType::Edge;
    }
    if p.cpu_cores >= 32 && p.memory_gb >= 64 {
        return ClusterType::HighPerformance;
    }
    if p.cpu_cores >= 8 && p.memory_gb >= 16 {
        return ClusterType::Cpu;
    }
    // small or unknown clusters
    ClusterType::Edge
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn signal(cpu: i64, mem_gb: i64) -> ClusterSignal {
        ClusterSignal {
            name: "c".into(),
            total_cpu_cores: cpu,
            total_memory_bytes: mem_gb * BYTES_PER_GB,
            ..Default::default()
        }
    }

    fn kind(s: &ClusterSignal) -> ClusterType {
        ClusterProfiler::default().classify(s).cluster_type
    }

    #[test]
    fn test_gpu_wins_over_everything() {
        let s = ClusterSignal {
            gpu_count: 2,
            power_profile: Some("low-power".into()),
            location: Some("edge".into()),
            ..Default::default()
        };
        assert_eq!(kind(&s), ClusterType::Gpu);
    }

    #[test]
    fn test_low_power_is_edge() {
        let s = ClusterSignal {
            power_profile: Some("low-power".into()),
            ..signal(64, 512)
        };
        assert_eq!(kind(&s), ClusterType::Edge);
    }

    #[test]
    fn test_edge_location_is_edge() {
        let s = ClusterSignal {
            location: Some("edge".into()),
            ..signal(40, 128)
        };
        assert_eq!(kind(&s), ClusterType::Edge);
    }

    #[test]
    fn test_small_5g_cluster_is_edge() {
        let s = ClusterSignal {
            network_type: Some("5g".into()),
            ..signal(4, 64)
        };
        assert_eq!(kind(&s), ClusterType::Edge);

        let big = ClusterSignal {
            network_type: Some("5g".into()),
            ..signal(8, 16)
        };
        assert_eq!(kind(&big), ClusterType::Cpu);
    }

    #[test]
    fn test_high_performance_thresholds() {
        assert_eq!(kind(&signal(40, 128)), ClusterType::HighPerformance);
        assert_eq!(kind(&signal(32, 64)), ClusterType::HighPerformance);
        assert_eq!(kind(&signal(32, 63)), ClusterType::Cpu);
    }

    #[test]
    fn test_cpu_and_default_edge() {
        assert_eq!(kind(&signal(8, 16)), ClusterType::Cpu);
        assert_eq!(kind(&signal(7, 16)), ClusterType::Edge);
        assert_eq!(kind(&ClusterSignal::default()), ClusterType::Edge);
    }

    #[test]
    fn test_memory_rounds_down_to_whole_gb() {
        let s = ClusterSignal {
            total_cpu_cores: 8,
            total_memory_bytes: 16 * BYTES_PER_GB - 1,
            ..Default::default()
        };
        let p = profile_of(&s);
        assert_eq!(p.memory_gb, 15);
        assert_eq!(p.cluster_type, ClusterType::Edge);
    }

    #[test]
    fn test_classify_all_keys_by_name() {
        let a = ClusterSignal {
            name: "a".into(),
            gpu_count: 1,
            ..Default::default()
        };
        let b = ClusterSignal {
            name: "b".into(),
            ..signal(16, 32)
        };
        let profiles = ClusterProfiler::default().classify_all([&a, &b]);
        assert_eq!(profiles["a"].cluster_type, ClusterType::Gpu);
        assert_eq!(profiles["b"].cluster_type, ClusterType::Cpu);
    }

    proptest! {
        #[test]
        fn prop_classify_is_deterministic(
            cpu in -4i64..256,
            mem_gb in -4i64..1024,
            gpus in -2i64..8,
            profile in prop::option::of(prop_oneof![Just("low-power"), Just("balanced")]),
            network in prop::option::of(prop_oneof![Just("5g"), Just("ethernet")]),
            location in prop::option::of(prop_oneof![Just("edge"), Just("cloud")]),
        ) {
            let s = ClusterSignal {
                gpu_count: gpus,
                power_profile: profile.map(str::to_string),
                network_type: network.map(str::to_string),
                location: location.map(str::to_string),
                ..signal(cpu, mem_gb)
            };
            let first = profile_of(&s);
            let second = profile_of(&s);
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.cluster_type, classify_type(&first));
        }
    }
}
