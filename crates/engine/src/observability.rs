//! Observability for the decision engine
//!
//! Components never reach for process-wide metric singletons. Instead an
//! [`ObservabilitySink`] is handed to each component when it is built:
//! - [`NoopSink`] for tests and embedders that do not care
//! - [`EngineMetrics`] for Prometheus exposition (owns its registry)
//! - [`StructuredLogger`] for JSON event logs via tracing
//! - [`FanoutSink`] to feed several sinks at once

use prometheus::{
    Encoder, GaugeVec, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{TargetNotFound, ValidationError, WeightSourceError};
use crate::models::{AdjustedValues, ClusterProfile, Policy, ScoreDecision, WorkloadRef};

/// Default histogram buckets for resolution latency (in seconds)
const LATENCY_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
];

/// Receiver of engine events; every method defaults to doing nothing
pub trait ObservabilitySink: Send + Sync {
    fn cluster_classified(&self, _profile: &ClusterProfile) {}

    fn cluster_evaluated(&self, _cluster: &str, _evaluator: &str, _decision: &ScoreDecision) {}

    fn weight_source_failed(&self, _error: &WeightSourceError) {}

    fn policy_rejected(&self, _policy: &Policy, _error: &ValidationError) {}

    fn policy_resolved(&self, _policy: &Policy, _resolved: usize, _missing: usize, _elapsed: Duration) {}

    fn target_missing(&self, _policy: &Policy, _missing: &TargetNotFound) {}

    fn values_adjusted(&self, _cluster: &str, _workload: &WorkloadRef, _values: &AdjustedValues) {}
}

/// Sink that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl ObservabilitySink for NoopSink {}

/// Shared no-op sink, the default for every component
pub fn noop_sink() -> Arc<dyn ObservabilitySink> {
    Arc::new(NoopSink)
}

/// Forwards every event to each inner sink in order
#[derive(Clone, Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn ObservabilitySink>>,
}

impl FanoutSink {
    pub fn new(sinks: Vec<Arc<dyn ObservabilitySink>>) -> Self {
        Self { sinks }
    }
}

impl ObservabilitySink for FanoutSink {
    fn cluster_classified(&self, profile: &ClusterProfile) {
        self.sinks.iter().for_each(|s| s.cluster_classified(profile));
    }

    fn cluster_evaluated(&self, cluster: &str, evaluator: &str, decision: &ScoreDecision) {
        self.sinks
            .iter()
            .for_each(|s| s.cluster_evaluated(cluster, evaluator, decision));
    }

    fn weight_source_failed(&self, error: &WeightSourceError) {
        self.sinks.iter().for_each(|s| s.weight_source_failed(error));
    }

    fn policy_rejected(&self, policy: &Policy, error: &ValidationError) {
        self.sinks.iter().for_each(|s| s.policy_rejected(policy, error));
    }

    fn policy_resolved(&self, policy: &Policy, resolved: usize, missing: usize, elapsed: Duration) {
        self.sinks
            .iter()
            .for_each(|s| s.policy_resolved(policy, resolved, missing, elapsed));
    }

    fn target_missing(&self, policy: &Policy, missing: &TargetNotFound) {
        self.sinks.iter().for_each(|s| s.target_missing(policy, missing));
    }

    fn values_adjusted(&self, cluster: &str, workload: &WorkloadRef, values: &AdjustedValues) {
        self.sinks
            .iter()
            .for_each(|s| s.values_adjusted(cluster, workload, values));
    }
}

/// Prometheus metrics for the engine, registered on a private registry
#[derive(Clone)]
pub struct EngineMetrics {
    registry: Registry,
    policy_applications: IntCounterVec,
    male_values: GaugeVec,
    resolution_duration: HistogramVec,
    resolved_targets: IntGaugeVec,
    cluster_profile_info: IntGaugeVec,
    cluster_evaluations: IntCounterVec,
    weight_source_failures: IntCounter,
}

impl EngineMetrics {
    /// Create the metric families on a fresh registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let policy_applications = IntCounterVec::new(
            Opts::new(
                "male_policy_applications_total",
                "Total number of MALE policy evaluations by outcome",
            ),
            &["policy", "namespace", "status"],
        )?;
        let male_values = GaugeVec::new(
            Opts::new("male_values_current", "Adjusted MALE values per workload"),
            &["cluster", "workload", "namespace", "metric_type"],
        )?;
        let resolution_duration = HistogramVec::new(
            HistogramOpts::new(
                "male_policy_resolution_duration_seconds",
                "Time spent resolving policy targets",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["policy"],
        )?;
        let resolved_targets = IntGaugeVec::new(
            Opts::new("male_resolved_targets", "Workloads resolved for a policy"),
            &["policy"],
        )?;
        let cluster_profile_info = IntGaugeVec::new(
            Opts::new("male_cluster_profile_info", "Classified type of each cluster"),
            &["cluster", "type"],
        )?;
        let cluster_evaluations = IntCounterVec::new(
            Opts::new(
                "male_cluster_evaluations_total",
                "Evaluator decisions by evaluator and outcome",
            ),
            &["evaluator", "decision"],
        )?;
        let weight_source_failures = IntCounter::new(
            "male_weight_source_failures_total",
            "Weight source queries that fell back to capacity-only scoring",
        )?;

        registry.register(Box::new(policy_applications.clone()))?;
        registry.register(Box::new(male_values.clone()))?;
        registry.register(Box::new(resolution_duration.clone()))?;
        registry.register(Box::new(resolved_targets.clone()))?;
        registry.register(Box::new(cluster_profile_info.clone()))?;
        registry.register(Box::new(cluster_evaluations.clone()))?;
        registry.register(Box::new(weight_source_failures.clone()))?;

        Ok(Self {
            registry,
            policy_applications,
            male_values,
            resolution_duration,
            resolved_targets,
            cluster_profile_info,
            cluster_evaluations,
            weight_source_failures,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render all metrics in the Prometheus text format
    pub fn encode(&self) -> prometheus::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(buffer)
    }
}

impl ObservabilitySink for EngineMetrics {
    fn cluster_classified(&self, profile: &ClusterProfile) {
        self.cluster_profile_info
            .with_label_values(&[&profile.name, profile.cluster_type.as_str()])
            .set(1);
    }

    fn cluster_evaluated(&self, _cluster: &str, evaluator: &str, decision: &ScoreDecision) {
        let outcome = if decision.admit { "admit" } else { "reject" };
        self.cluster_evaluations
            .with_label_values(&[evaluator, outcome])
            .inc();
    }

    fn weight_source_failed(&self, _error: &WeightSourceError) {
        self.weight_source_failures.inc();
    }

    fn policy_rejected(&self, policy: &Policy, _error: &ValidationError) {
        self.policy_applications
            .with_label_values(&[&policy.name, &policy.namespace, "validation_failed"])
            .inc();
    }

    fn policy_resolved(&self, policy: &Policy, resolved: usize, missing: usize, elapsed: Duration) {
        let status = if missing == 0 { "success" } else { "partial" };
        self.policy_applications
            .with_label_values(&[&policy.name, &policy.namespace, status])
            .inc();
        self.resolution_duration
            .with_label_values(&[&policy.name])
            .observe(elapsed.as_secs_f64());
        self.resolved_targets
            .with_label_values(&[&policy.name])
            .set(resolved as i64);
    }

    fn values_adjusted(&self, cluster: &str, workload: &WorkloadRef, values: &AdjustedValues) {
        for (metric, value) in [
            ("accuracy", values.accuracy()),
            ("latency", values.latency()),
            ("energy", values.energy()),
        ] {
            self.male_values
                .with_label_values(&[cluster, &workload.name, &workload.namespace, metric])
                .set(value as f64);
        }
    }
}

/// Structured logger for engine events
///
/// Provides consistent JSON-formatted logging for classification,
/// scoring fallbacks and policy decisions.
#[derive(Clone)]
pub struct StructuredLogger {
    instance: String,
}

impl StructuredLogger {
    pub fn new(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
        }
    }

    /// Log agent startup
    pub fn log_startup(&self, version: &str, weight_endpoints: usize) {
        info!(
            event = "agent_started",
            instance = %self.instance,
            agent_version = %version,
            weight_endpoints = weight_endpoints,
            "Decision agent started"
        );
    }

    /// Log agent shutdown
    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "agent_shutdown",
            instance = %self.instance,
            reason = %reason,
            "Decision agent shutting down"
        );
    }
}

impl ObservabilitySink for StructuredLogger {
    fn cluster_classified(&self, profile: &ClusterProfile) {
        debug!(
            event = "cluster_classified",
            instance = %self.instance,
            cluster = %profile.name,
            cluster_type = %profile.cluster_type,
            cpu_cores = profile.cpu_cores,
            memory_gb = profile.memory_gb,
            gpu_count = profile.gpu_count,
            "Classified cluster profile"
        );
    }

    fn weight_source_failed(&self, error: &WeightSourceError) {
        warn!(
            event = "weight_source_fallback",
            instance = %self.instance,
            cause = %error.cause(),
            error = %error,
            "ALE weights unavailable, falling back to capacity-only scoring"
        );
    }

    fn policy_rejected(&self, policy: &Policy, error: &ValidationError) {
        warn!(
            event = "policy_rejected",
            instance = %self.instance,
            policy = %policy.name,
            namespace = %policy.namespace,
            issues = error.issues.len(),
            error = %error,
            "Policy validation failed"
        );
    }

    fn policy_resolved(&self, policy: &Policy, resolved: usize, missing: usize, elapsed: Duration) {
        info!(
            event = "policy_resolved",
            instance = %self.instance,
            policy = %policy.name,
            namespace = %policy.namespace,
            resolved = resolved,
            missing = missing,
            duration_ms = elapsed.as_secs_f64() * 1000.0,
            "Resolved policy targets"
        );
    }

    fn target_missing(&self, policy: &Policy, missing: &TargetNotFound) {
        warn!(
            event = "target_missing",
            instance = %self.instance,
            policy = %policy.name,
            workload = %missing.name,
            namespace = %missing.namespace,
            kind = %missing.kind,
            "Explicit policy target not found"
        );
    }

    fn values_adjusted(&self, cluster: &str, workload: &WorkloadRef, values: &AdjustedValues) {
        info!(
            event = "values_adjusted",
            instance = %self.instance,
            cluster = %cluster,
            workload = %workload.name,
            namespace = %workload.namespace,
            accuracy = values.accuracy(),
            latency = values.latency(),
            energy = values.energy(),
            "Computed cluster-specific MALE values"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClusterType, WorkloadKind};

    fn profile() -> ClusterProfile {
        ClusterProfile {
            name: "edge-a".into(),
            cluster_type: ClusterType::Edge,
            cpu_cores: 4,
            memory_gb: 8,
            gpu_count: 0,
            gpu_type: String::new(),
            power_profile: "low-power".into(),
            network_type: "5g".into(),
            location: "edge".into(),
        }
    }

    #[test]
    fn test_metrics_instances_do_not_collide() {
        // Each instance owns its registry, so two can coexist in one process
        let a = EngineMetrics::new().unwrap();
        let b = EngineMetrics::new().unwrap();
        a.cluster_classified(&profile());
        b.cluster_classified(&profile());
    }

    #[test]
    fn test_metrics_encode_contains_families() {
        let metrics = EngineMetrics::new().unwrap();
        metrics.cluster_classified(&profile());
        metrics.cluster_evaluated("edge-a", "power-budget", &ScoreDecision { admit: true, rank: 10 });
        metrics.weight_source_failed(&WeightSourceError::no_endpoint(2));

        let workload = WorkloadRef {
            name: "cam".into(),
            namespace: "edge".into(),
            kind: WorkloadKind::Deployment,
            labels: Default::default(),
            cluster: Some("edge-a".into()),
        };
        metrics.values_adjusted("edge-a", &workload, &AdjustedValues::clamped(1, 2, 3));

        let text = String::from_utf8(metrics.encode().unwrap()).unwrap();
        assert!(text.contains("male_cluster_profile_info"));
        assert!(text.contains("male_cluster_evaluations_total"));
        assert!(text.contains("male_weight_source_failures_total 1"));
        assert!(text.contains("male_values_current"));
    }

    #[test]
    fn test_structured_logger_creation() {
        let logger = StructuredLogger::new("test-instance");
        assert_eq!(logger.instance, "test-instance");
    }

    #[test]
    fn test_fanout_forwards_to_all() {
        let metrics = EngineMetrics::new().unwrap();
        let fanout = FanoutSink::new(vec![
            Arc::new(metrics.clone()),
            Arc::new(StructuredLogger::new("t")),
            noop_sink(),
        ]);
        fanout.weight_source_failed(&WeightSourceError::rejected("down"));
        let text = String::from_utf8(metrics.encode().unwrap()).unwrap();
        assert!(text.contains("male_weight_source_failures_total 1"));
    }
}
