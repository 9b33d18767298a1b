//! Policy validation
//!
//! Every check runs and every issue is collected; nothing short-circuits.
//! Issues carry a severity so informational findings (a large value jump on
//! update) can travel alongside blocking errors.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::ValidationError;
use crate::models::{Policy, WorkloadKind, VALUE_MAX, VALUE_MIN};

/// Maximum length of a selector key or value
pub const MAX_SELECTOR_LEN: usize = 63;

/// Absolute change of a base value that counts as significant on update
pub const SIGNIFICANT_CHANGE: i32 = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IssueKind {
    Invalid,
    Required,
    NotSupported,
    Duplicate,
    TooLong,
    Forbidden,
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::Invalid => "Invalid value",
            IssueKind::Required => "Required value",
            IssueKind::NotSupported => "Unsupported value",
            IssueKind::Duplicate => "Duplicate value",
            IssueKind::TooLong => "Too long",
            IssueKind::Forbidden => "Forbidden",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// One finding against a field of the policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldIssue {
    /// e.g. `spec.targetWorkloads[2].kind`
    pub path: String,
    pub kind: IssueKind,
    pub severity: Severity,
    pub message: String,
}

impl FieldIssue {
    fn error(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind,
            severity: Severity::Error,
            message: message.into(),
        }
    }

    fn warning(path: impl Into<String>, kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(path, kind, message)
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}: {}", self.path, self.kind, self.message)
    }
}

/// All issues found for one policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub issues: Vec<FieldIssue>,
}

impl ValidationReport {
    /// No error-severity issue present
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(FieldIssue::is_error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &FieldIssue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FieldIssue> {
        self.issues.iter().filter(|i| !i.is_error())
    }

    /// Warnings on success, the full issue list on failure
    pub fn into_result(self) -> Result<Vec<FieldIssue>, ValidationError> {
        if self.is_valid() {
            Ok(self.issues)
        } else {
            Err(ValidationError { issues: self.issues })
        }
    }
}

/// Checks structural completeness and plausibility of a policy
#[derive(Debug, Clone, Copy, Default)]
pub struct PolicyValidator;

impl PolicyValidator {
    pub fn validate(&self, policy: &Policy) -> ValidationReport {
        let mut issues = Vec::new();
        check_ranges(policy, &mut issues);
        check_combination(policy, &mut issues);
        check_targets(policy, &mut issues);
        check_selector(policy, &mut issues);
        check_targeting(policy, &mut issues);
        ValidationReport { issues }
    }

    /// Validate `new` as a replacement for `old`
    pub fn validate_update(&self, old: &Policy, new: &Policy) -> ValidationReport {
        let mut report = self.validate(new);

        if let Some((field, delta)) = significant_change(old, new) {
            report.issues.push(FieldIssue::warning(
                "spec",
                IssueKind::Invalid,
                format!(
                    "significant MALE value change detected ({field} moved by {delta}); \
                     consider gradual changes to avoid workload disruption"
                ),
            ));
        }

        if old.global_default != new.global_default {
            report.issues.push(FieldIssue::error(
                "spec.globalDefault",
                IssueKind::Forbidden,
                "changing globalDefault flag is not allowed, create a new policy instead",
            ));
        }

        report
    }
}

fn check_ranges(policy: &Policy, issues: &mut Vec<FieldIssue>) {
    let v = &policy.base;
    for (field, value) in [("accuracy", v.accuracy), ("latency", v.latency), ("energy", v.energy)] {
        if !(VALUE_MIN..=VALUE_MAX).contains(&value) {
            issues.push(FieldIssue::error(
                format!("spec.{field}"),
                IssueKind::Invalid,
                format!("{value}: must be between {VALUE_MIN} and {VALUE_MAX}"),
            ));
        }
    }
}

fn check_combination(policy: &Policy, issues: &mut Vec<FieldIssue>) {
    let (a, l, e) = (policy.base.accuracy, policy.base.latency, policy.base.energy);

    if a > 900 && l < 100 && e > 900 {
        issues.push(FieldIssue::error(
            "spec",
            IssueKind::Invalid,
            format!(
                "accuracy={a}, latency={l}, energy={e}: combination of very high accuracy, \
                 very low latency, and very high energy efficiency is unrealistic"
            ),
        ));
    }
    if a < 100 && l > 900 {
        issues.push(FieldIssue::error(
            "spec",
            IssueKind::Invalid,
            format!(
                "accuracy={a}, latency={l}: very low accuracy with very high latency \
                 tolerance may indicate misconfiguration"
            ),
        ));
    }
    if a < 100 && l < 100 && e < 100 {
        issues.push(FieldIssue::error(
            "spec",
            IssueKind::Invalid,
            "all MALE values are extremely low: this configuration may result in poor workload performance",
        ));
    }
}

fn check_targets(policy: &Policy, issues: &mut Vec<FieldIssue>) {
    let targets = &policy.explicit_targets;

    for (i, target) in targets.iter().enumerate() {
        let path = format!("spec.targetWorkloads[{i}]");

        if target.name.is_empty() {
            issues.push(FieldIssue::error(
                format!("{path}.name"),
                IssueKind::Required,
                "workload name is required",
            ));
        }
        if target.namespace.is_empty() {
            issues.push(FieldIssue::error(
                format!("{path}.namespace"),
                IssueKind::Required,
                "workload namespace is required",
            ));
        }
        if target.kind.parse::<WorkloadKind>().is_err() {
            let supported = WorkloadKind::ALL.map(|k| format!("\"{k}\"")).join(", ");
            issues.push(FieldIssue::error(
                format!("{path}.kind"),
                IssueKind::NotSupported,
                format!("{:?}: supported values: {supported}", target.kind),
            ));
        }

        for (offset, other) in targets[i + 1..].iter().enumerate() {
            if target == other {
                issues.push(FieldIssue::error(
                    path.clone(),
                    IssueKind::Duplicate,
                    format!("duplicate target workload at index {}", i + offset + 1),
                ));
            }
        }
    }
}

fn check_selector(policy: &Policy, issues: &mut Vec<FieldIssue>) {
    for (key, value) in &policy.selector {
        let path = format!("spec.selector[{key}]");

        if key.trim().is_empty() {
            issues.push(FieldIssue::error(&path, IssueKind::Invalid, "selector key cannot be empty"));
        }
        if value.trim().is_empty() {
            issues.push(FieldIssue::error(&path, IssueKind::Invalid, "selector value cannot be empty"));
        }
        if key.chars().count() > MAX_SELECTOR_LEN {
            issues.push(FieldIssue::error(
                &path,
                IssueKind::TooLong,
                format!("key must have at most {MAX_SELECTOR_LEN} characters"),
            ));
        }
        if value.chars().count() > MAX_SELECTOR_LEN {
            issues.push(FieldIssue::error(
                &path,
                IssueKind::TooLong,
                format!("value must have at most {MAX_SELECTOR_LEN} characters"),
            ));
        }
    }
}

fn check_targeting(policy: &Policy, issues: &mut Vec<FieldIssue>) {
    if !policy.has_targeting() {
        issues.push(FieldIssue::error(
            "spec",
            IssueKind::Invalid,
            "no targeting configuration: policy must specify either targetWorkloads, selector, \
             or set globalDefault to true",
        ));
    }
}

fn significant_change(old: &Policy, new: &Policy) -> Option<(&'static str, i32)> {
    [
        ("accuracy", old.base.accuracy, new.base.accuracy),
        ("latency", old.base.latency, new.base.latency),
        ("energy", old.base.energy, new.base.energy),
    ]
    .into_iter()
    .map(|(field, before, after)| (field, after.saturating_sub(before).saturating_abs()))
    .find(|(_, delta)| *delta >= SIGNIFICANT_CHANGE)
}
