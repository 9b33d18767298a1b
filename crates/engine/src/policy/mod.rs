//! MALE policies: validation, target resolution, value adjustment and
//! propagation onto workloads.

pub mod adjuster;
pub mod planner;
pub mod propagation;
pub mod resolver;
pub mod validator;

pub use adjuster::{ValueAdjuster, ValueDelta};
pub use planner::{
    cluster_from_execution_namespace, PlannedTarget, PolicyPlan, PolicyPlanner, TargetStatus,
    WorkloadStatus,
};
pub use propagation::{apply_adjusted_values, ContainerSpec, EnvVar, WorkloadTemplate};
pub use resolver::{PolicyResolver, Resolution};
pub use validator::{FieldIssue, IssueKind, PolicyValidator, Severity, ValidationReport};
