//! Writing adjusted values onto a workload's pod template
//!
//! Annotations are replaced by exact key; the three value variables are
//! removed from each container before fresh ones are appended, so applying
//! the same values twice leaves the template unchanged.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::AdjustedValues;

pub const ANNOTATION_ACCURACY: &str = "male-policy.opensdi.io/accuracy";
pub const ANNOTATION_LATENCY: &str = "male-policy.opensdi.io/latency";
pub const ANNOTATION_ENERGY: &str = "male-policy.opensdi.io/energy";
pub const ANNOTATION_POLICY_NAME: &str = "male-policy.opensdi.io/policy-name";
pub const ANNOTATION_APPLIED_AT: &str = "male-policy.opensdi.io/applied-at";

pub const ENV_ACCURACY: &str = "MALE_ACCURACY";
pub const ENV_LATENCY: &str = "MALE_LATENCY";
pub const ENV_ENERGY: &str = "MALE_ENERGY";

const VALUE_ENV: [&str; 3] = [ENV_ACCURACY, ENV_LATENCY, ENV_ENERGY];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerSpec {
    pub name: String,
    #[serde(default)]
    pub env: Vec<EnvVar>,
}

/// The mutable part of a workload's pod template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkloadTemplate {
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
    #[serde(default)]
    pub containers: Vec<ContainerSpec>,
}

/// Stamp `values` onto `template`
pub fn apply_adjusted_values(
    template: &mut WorkloadTemplate,
    values: &AdjustedValues,
    policy_name: &str,
    applied_at: DateTime<Utc>,
) {
    let annotations = [
        (ANNOTATION_ACCURACY, values.accuracy().to_string()),
        (ANNOTATION_LATENCY, values.latency().to_string()),
        (ANNOTATION_ENERGY, values.energy().to_string()),
        (ANNOTATION_POLICY_NAME, policy_name.to_string()),
        (
            ANNOTATION_APPLIED_AT,
            applied_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ),
    ];
    for (key, value) in annotations {
        template.annotations.insert(key.to_string(), value);
    }

    for container in &mut template.containers {
        container
            .env
            .retain(|var| !VALUE_ENV.contains(&var.name.as_str()));
        container.env.extend([
            EnvVar::new(ENV_ACCURACY, values.accuracy()),
            EnvVar::new(ENV_LATENCY, values.latency()),
            EnvVar::new(ENV_ENERGY, values.energy()),
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn template() -> WorkloadTemplate {
        WorkloadTemplate {
            annotations: BTreeMap::from([("team".to_string(), "vision".to_string())]),
            containers: vec![
                ContainerSpec {
                    name: "infer".into(),
                    env: vec![
                        EnvVar::new("MODEL", "yolo"),
                        EnvVar::new(ENV_LATENCY, 1),
                    ],
                },
                ContainerSpec {
                    name: "sidecar".into(),
                    env: vec![],
                },
            ],
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_writes_annotations_and_env() {
        let mut t = template();
        apply_adjusted_values(&mut t, &AdjustedValues::clamped(1000, 900, 850), "gpu-heavy", at());

        assert_eq!(t.annotations[ANNOTATION_ACCURACY], "1000");
        assert_eq!(t.annotations[ANNOTATION_POLICY_NAME], "gpu-heavy");
        assert_eq!(t.annotations[ANNOTATION_APPLIED_AT], "2025-03-01T12:00:00Z");
        assert_eq!(t.annotations["team"], "vision");

        let env: Vec<_> = t.containers[0]
            .env
            .iter()
            .map(|v| (v.name.as_str(), v.value.as_str()))
            .collect();
        assert_eq!(
            env,
            vec![
                ("MODEL", "yolo"),
                (ENV_ACCURACY, "1000"),
                (ENV_LATENCY, "900"),
                (ENV_ENERGY, "850"),
            ]
        );
        assert_eq!(t.containers[1].env.len(), 3);
    }

    #[test]
    fn test_reapplication_is_idempotent() {
        let values = AdjustedValues::clamped(400, 600, 700);
        let mut once = template();
        apply_adjusted_values(&mut once, &values, "p", at());
        let mut twice = once.clone();
        apply_adjusted_values(&mut twice, &values, "p", at());

        assert_eq!(once, twice);
    }

    #[test]
    fn test_new_values_replace_old() {
        let mut t = template();
        apply_adjusted_values(&mut t, &AdjustedValues::clamped(1, 2, 3), "p", at());
        apply_adjusted_values(&mut t, &AdjustedValues::clamped(4, 5, 6), "q", at());

        let male: Vec<_> = t.containers[0]
            .env
            .iter()
            .filter(|v| v.name.starts_with("MALE_"))
            .map(|v| v.value.as_str())
            .collect();
        assert_eq!(male, vec!["4", "5", "6"]);
        assert_eq!(t.annotations[ANNOTATION_POLICY_NAME], "q");
    }
}
