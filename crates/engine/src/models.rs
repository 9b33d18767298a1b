//! Core data models for the decision engine

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Lower bound of every MALE value and every evaluator rank
pub const VALUE_MIN: i32 = 0;
/// Upper bound of every MALE value and every evaluator rank
pub const VALUE_MAX: i32 = 1000;

/// Energy class requested by a workload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnergyClass {
    Low,
    Medium,
    High,
}

/// Latency budget of a workload
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LatencyBudget {
    /// 95th percentile budget in milliseconds, 0 means unspecified
    #[serde(default)]
    pub p95_ms: i64,
}

/// Multi-objective requirement of a workload, produced upstream
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AleRequirement {
    pub accuracy_weight: f64,
    pub latency_budget: LatencyBudget,
    pub energy_class: Option<EnergyClass>,
    /// Power the workload adds to a cluster, 0 means unspecified
    pub power_budget_watt: i64,
    pub compute_intensity_tflops: f64,
    pub region: Option<String>,
}

/// Allocatable vs. allocated resources of a member cluster
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceSummary {
    pub allocatable_cpu_millis: i64,
    pub allocated_cpu_millis: i64,
    pub allocatable_memory_bytes: i64,
    pub allocated_memory_bytes: i64,
}

/// Raw observed facts about a cluster, decoded once at the boundary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterSignal {
    pub name: String,
    pub power_estimate_watt: i64,
    /// Estimated CPU utilisation as a fraction of capacity
    pub cpu_usage_estimate: f64,
    /// Estimated memory utilisation as a fraction of capacity
    pub mem_usage_estimate: f64,
    pub region: Option<String>,
    pub energy_label: Option<String>,
    pub gpu_count: i64,
    pub gpu_type: Option<String>,
    pub power_profile: Option<String>,
    pub network_type: Option<String>,
    pub location: Option<String>,
    pub accelerator: Option<String>,
    pub observed_rtt_ms: i64,
    pub total_cpu_cores: i64,
    pub total_memory_bytes: i64,
    pub resources: Option<ResourceSummary>,
}

/// Operational class of a cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterType {
    #[serde(rename = "gpu")]
    Gpu,
    #[serde(rename = "edge")]
    Edge,
    #[serde(rename = "high-performance")]
    HighPerformance,
    #[serde(rename = "cpu")]
    Cpu,
}

impl ClusterType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClusterType::Gpu => "gpu",
            ClusterType::Edge => "edge",
            ClusterType::HighPerformance => "high-performance",
            ClusterType::Cpu => "cpu",
        }
    }
}

impl fmt::Display for ClusterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Derived classification of a cluster, recomputed every pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    pub name: String,
    pub cluster_type: ClusterType,
    pub cpu_cores: i64,
    pub memory_gb: i64,
    pub gpu_count: i64,
    pub gpu_type: String,
    pub power_profile: String,
    pub network_type: String,
    pub location: String,
}

/// Outcome of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Admission {
    Admit,
    Reject,
}

impl Admission {
    pub fn is_admit(&self) -> bool {
        matches!(self, Admission::Admit)
    }
}

/// Admission and bounded rank of one evaluator for one cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreDecision {
    pub admit: bool,
    pub rank: i64,
}

impl ScoreDecision {
    /// Build a decision, clamping the rank into `[0, 1000]`
    pub fn new(admission: Admission, rank: i64) -> Self {
        Self {
            admit: admission.is_admit(),
            rank: clamp_rank(rank),
        }
    }
}

/// Clamp a rank into `[0, 1000]`
pub fn clamp_rank(rank: i64) -> i64 {
    rank.clamp(VALUE_MIN as i64, VALUE_MAX as i64)
}

/// Clamp a MALE value into `[0, 1000]`
pub fn clamp_value(value: i64) -> i32 {
    value.clamp(VALUE_MIN as i64, VALUE_MAX as i64) as i32
}

/// Accuracy/latency/energy triple as written by an operator
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaleValues {
    pub accuracy: i32,
    pub latency: i32,
    pub energy: i32,
}

impl MaleValues {
    pub fn new(accuracy: i32, latency: i32, energy: i32) -> Self {
        Self {
            accuracy,
            latency,
            energy,
        }
    }
}

/// MALE values that are guaranteed to lie in `[0, 1000]`
///
/// The only way to build one is through clamping, so an out-of-range
/// adjusted value cannot exist. Deserialisation clamps as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "MaleValues")]
pub struct AdjustedValues {
    accuracy: i32,
    latency: i32,
    energy: i32,
}

impl AdjustedValues {
    pub fn clamped(accuracy: i64, latency: i64, energy: i64) -> Self {
        Self {
            accuracy: clamp_value(accuracy),
            latency: clamp_value(latency),
            energy: clamp_value(energy),
        }
    }

    pub fn accuracy(&self) -> i32 {
        self.accuracy
    }

    pub fn latency(&self) -> i32 {
        self.latency
    }

    pub fn energy(&self) -> i32 {
        self.energy
    }
}

impl From<MaleValues> for AdjustedValues {
    fn from(v: MaleValues) -> Self {
        Self::clamped(v.accuracy as i64, v.latency as i64, v.energy as i64)
    }
}

/// Workload kinds a policy may target explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
}

impl WorkloadKind {
    pub const ALL: [WorkloadKind; 3] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkloadKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WorkloadKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unsupported workload kind: {s}"))
    }
}

/// Identity of a candidate workload from the external inventory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadRef {
    pub name: String,
    pub namespace: String,
    pub kind: WorkloadKind,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Member cluster the workload currently runs on, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster: Option<String>,
}

impl WorkloadRef {
    /// Key used to recognise the same workload across match reasons
    pub fn identity(&self) -> (&str, &str, WorkloadKind) {
        (&self.namespace, &self.name, self.kind)
    }
}

/// Explicit target entry of a policy; kind is kept as written so it can be validated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRef {
    pub name: String,
    pub namespace: String,
    pub kind: String,
}

impl TargetRef {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            kind: kind.into(),
        }
    }

    /// Whether this entry designates the given workload
    pub fn matches(&self, workload: &WorkloadRef) -> bool {
        self.name == workload.name
            && self.namespace == workload.namespace
            && self.kind == workload.kind.as_str()
    }
}

/// Why a workload was resolved for a policy; declaration order is priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MatchReason {
    Explicit,
    Selector,
    GlobalDefault,
}

/// A workload in scope for a policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub workload: WorkloadRef,
    pub reason: MatchReason,
}

/// MALE policy as owned by the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Policy {
    pub name: String,
    #[serde(default)]
    pub namespace: String,
    #[serde(flatten)]
    pub base: MaleValues,
    #[serde(default)]
    pub selector: BTreeMap<String, String>,
    #[serde(default, rename = "targetWorkloads")]
    pub explicit_targets: Vec<TargetRef>,
    #[serde(default)]
    pub target_namespaces: Vec<String>,
    #[serde(default)]
    pub global_default: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Policy {
    pub fn new(name: impl Into<String>, base: MaleValues) -> Self {
        Self {
            name: name.into(),
            namespace: String::new(),
            base,
            selector: BTreeMap::new(),
            explicit_targets: Vec::new(),
            target_namespaces: Vec::new(),
            global_default: false,
            description: None,
        }
    }

    /// At least one targeting mechanism is configured
    pub fn has_targeting(&self) -> bool {
        !self.explicit_targets.is_empty() || !self.selector.is_empty() || self.global_default
    }
}
