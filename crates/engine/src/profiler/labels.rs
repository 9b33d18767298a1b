//! Boundary adapter from cluster labels to a typed [`ClusterSignal`]
//!
//! Label values are parsed exactly once here. Anything missing or
//! unparseable becomes zero/empty so downstream code never fails.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{ClusterSignal, ResourceSummary};

pub const POWER_ESTIMATE: &str = "est.power.watt";
pub const CPU_USAGE_ESTIMATE: &str = "est.cpu.usage";
pub const MEM_USAGE_ESTIMATE: &str = "est.mem.usage";
pub const REGION: &str = "topology.kubernetes.io/region";
pub const ENERGY: &str = "energy";
pub const GPU_COUNT: &str = "hardware.karmada.io/gpu-count";
pub const GPU_TYPE: &str = "hardware.karmada.io/gpu-type";
pub const POWER_PROFILE: &str = "hardware.karmada.io/power-profile";
pub const NETWORK_TYPE: &str = "network.karmada.io/type";
pub const LOCATION: &str = "topology.karmada.io/location";
pub const ACCELERATOR: &str = "accelerator";
pub const RTT_MS: &str = "rtt-ms";

/// Hardware totals reported in a cluster's node summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSummary {
    pub total_cpu_cores: i64,
    pub total_memory_bytes: i64,
}

/// A member cluster as the control plane describes it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabeledCluster {
    pub name: String,
    pub labels: HashMap<String, String>,
    pub nodes: Option<NodeSummary>,
    pub resources: Option<ResourceSummary>,
}

impl LabeledCluster {
    pub fn to_signal(&self) -> ClusterSignal {
        ClusterSignal::from_labels(self.name.clone(), &self.labels, self.nodes, self.resources)
    }
}

impl ClusterSignal {
    /// Decode the well-known label keys and resource summaries of a cluster
    pub fn from_labels(
        name: impl Into<String>,
        labels: &HashMap<String, String>,
        nodes: Option<NodeSummary>,
        resources: Option<ResourceSummary>,
    ) -> Self {
        let text = |key: &str| {
            labels
                .get(key)
                .filter(|v| !v.is_empty())
                .cloned()
        };
        let int = |key: &str| {
            labels
                .get(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .unwrap_or(0)
        };
        let float = |key: &str| {
            labels
                .get(key)
                .and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|f| f.is_finite())
                .unwrap_or(0.0)
        };

        let gpu_count = int(GPU_COUNT);
        let nodes = nodes.unwrap_or_default();

        Self {
            name: name.into(),
            power_estimate_watt: int(POWER_ESTIMATE),
            cpu_usage_estimate: float(CPU_USAGE_ESTIMATE),
            mem_usage_estimate: float(MEM_USAGE_ESTIMATE),
            region: text(REGION),
            energy_label: text(ENERGY),
            gpu_count,
            gpu_type: if gpu_count > 0 { text(GPU_TYPE) } else { None },
            power_profile: text(POWER_PROFILE),
            network_type: text(NETWORK_TYPE),
            location: text(LOCATION),
            accelerator: text(ACCELERATOR),
            observed_rtt_ms: int(RTT_MS),
            total_cpu_cores: nodes.total_cpu_cores,
            total_memory_bytes: nodes.total_memory_bytes,
            resources,
        }
    }
}
