//! End-to-end policy planning: validate, resolve, adjust per cluster

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{TargetNotFound, ValidationError};
use crate::models::{AdjustedValues, ClusterProfile, ClusterType, Policy, ResolvedTarget, WorkloadRef};
use crate::observability::{noop_sink, ObservabilitySink};

use super::{FieldIssue, PolicyResolver, PolicyValidator, ValueAdjuster};

/// Namespace prefix of Karmada execution spaces, one per member cluster
pub const EXECUTION_NAMESPACE_PREFIX: &str = "karmada-es-";

/// Member cluster owning a Karmada execution namespace
pub fn cluster_from_execution_namespace(namespace: &str) -> Option<&str> {
    namespace
        .strip_prefix(EXECUTION_NAMESPACE_PREFIX)
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetStatus {
    Applied,
    Failed,
}

/// Adjusted values for one resolved workload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedTarget {
    pub target: ResolvedTarget,
    pub cluster: Option<String>,
    pub cluster_type: Option<ClusterType>,
    pub values: AdjustedValues,
    pub status: TargetStatus,
}

/// Per-workload status line, as reported on the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadStatus {
    pub name: String,
    pub namespace: String,
    pub kind: String,
    pub status: TargetStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyPlan {
    pub policy: String,
    pub targets: Vec<PlannedTarget>,
    pub missing: Vec<TargetNotFound>,
    /// Non-blocking validation findings
    pub warnings: Vec<FieldIssue>,
}

impl PolicyPlan {
    /// Planned targets as Applied followed by missing explicit targets as Failed
    pub fn workload_statuses(&self) -> Vec<WorkloadStatus> {
        let planned = self.targets.iter().map(|t| WorkloadStatus {
            name: t.target.workload.name.clone(),
            namespace: t.target.workload.namespace.clone(),
            kind: t.target.workload.kind.to_string(),
            status: t.status,
        });
        let failed = self.missing.iter().map(|m| WorkloadStatus {
            name: m.name.clone(),
            namespace: m.namespace.clone(),
            kind: m.kind.clone(),
            status: TargetStatus::Failed,
        });
        planned.chain(failed).collect()
    }
}

/// Runs validation, resolution and adjustment for one policy
#[derive(Clone)]
pub struct PolicyPlanner {
    validator: PolicyValidator,
    resolver: PolicyResolver,
    adjuster: ValueAdjuster,
    sink: Arc<dyn ObservabilitySink>,
}

impl Default for PolicyPlanner {
    fn default() -> Self {
        Self::new(noop_sink())
    }
}

impl PolicyPlanner {
    pub fn new(sink: Arc<dyn ObservabilitySink>) -> Self {
        Self {
            validator: PolicyValidator,
            resolver: PolicyResolver::new(sink.clone()),
            adjuster: ValueAdjuster,
            sink,
        }
    }

    pub fn validator(&self) -> &PolicyValidator {
        &self.validator
    }

    pub fn resolver(&self) -> &PolicyResolver {
        &self.resolver
    }

    /// Plan `policy`; a policy with any error-severity issue is rejected whole
    pub fn plan(
        &self,
        policy: &Policy,
        universe: &[WorkloadRef],
        known_namespaces: &[String],
        profiles: &HashMap<String, ClusterProfile>,
    ) -> Result<PolicyPlan, ValidationError> {
        let warnings = match self.validator.validate(policy).into_result() {
            Ok(warnings) => warnings,
            Err(err) => {
                self.sink.policy_rejected(policy, &err);
                return Err(err);
            }
        };

        let resolution = self.resolver.resolve(policy, universe, known_namespaces);

        let targets = resolution
            .targets
            .into_iter()
            .map(|target| {
                let cluster = target.workload.cluster.clone().or_else(|| {
                    cluster_from_execution_namespace(&target.workload.namespace).map(str::to_string)
                });
                let cluster_type = cluster
                    .as_deref()
                    .and_then(|c| profiles.get(c))
                    .map(|p| p.cluster_type);
                let values = self.adjuster.adjust(policy.base, cluster_type);
                self.sink
                    .values_adjusted(cluster.as_deref().unwrap_or_default(), &target.workload, &values);

                PlannedTarget {
                    target,
                    cluster,
                    cluster_type,
                    values,
                    status: TargetStatus::Applied,
                }
            })
            .collect();

        Ok(PolicyPlan {
            policy: policy.name.clone(),
            targets,
            missing: resolution.missing,
            warnings,
        })
    }
}
