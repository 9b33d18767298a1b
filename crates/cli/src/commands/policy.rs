//! Policy validation, resolution and planning commands

use anyhow::Result;
use colored::Colorize;
use male_engine::models::{ClusterSignal, Policy, WorkloadRef};
use male_engine::policy::{PolicyPlan, Resolution};
use male_engine::TargetNotFound;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use super::read_json;
use crate::client::{ApiClient, Checked, ValidateResponse};
use crate::output::{
    color_rank, color_status, print_error, print_issues, print_json, print_success, print_warning,
    OutputFormat,
};

/// Workload inventory file: candidate workloads, known namespaces and clusters
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Inventory {
    pub workloads: Vec<WorkloadRef>,
    pub namespaces: Vec<String>,
    pub clusters: Vec<ClusterSignal>,
}

#[derive(Tabled)]
struct TargetRow {
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

#[derive(Tabled)]
struct PlanRow {
    #[tabled(rename = "Workload")]
    workload: String,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Type")]
    cluster_type: String,
    #[tabled(rename = "Accuracy")]
    accuracy: String,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Energy")]
    energy: String,
    #[tabled(rename = "Status")]
    status: String,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

fn print_missing(missing: &[TargetNotFound]) {
    for target in missing {
        print_warning(&target.to_string());
    }
}

fn rejected(response: &ValidateResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(response)?,
        OutputFormat::Table => print_issues(&response.issues),
    }
    let errors = response.issues.iter().filter(|i| i.is_error()).count();
    anyhow::bail!("policy rejected with {} error(s)", errors)
}

/// Validate a policy, optionally as an update of a stored version
pub async fn validate(
    client: &ApiClient,
    policy: &Path,
    previous: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let policy: Policy = read_json(policy)?;
    let previous: Option<Policy> = previous.map(read_json).transpose()?;

    let reply: Checked<ValidateResponse> = client
        .post_checked(
            "v1/policies/validate",
            &json!({"policy": policy, "previous": previous}),
        )
        .await?;

    let response = match reply {
        Checked::Accepted(response) => response,
        Checked::Rejected(response) => return rejected(&response, format),
    };

    match format {
        OutputFormat::Json => print_json(&response)?,
        OutputFormat::Table => {
            print_issues(&response.issues);
            print_success(&format!("Policy {} is valid", policy.name.cyan()));
        }
    }

    Ok(())
}

/// Show which workloads a policy applies to
pub async fn resolve(
    client: &ApiClient,
    policy: &Path,
    inventory: &Path,
    format: OutputFormat,
) -> Result<()> {
    let policy: Policy = read_json(policy)?;
    let inventory: Inventory = read_json(inventory)?;

    let resolution: Resolution = client
        .post(
            "v1/policies/resolve",
            &json!({
                "policy": policy,
                "workloads": inventory.workloads,
                "namespaces": inventory.namespaces,
            }),
        )
        .await?;

    match format {
        OutputFormat::Json => print_json(&resolution)?,
        OutputFormat::Table => {
            if resolution.targets.is_empty() {
                print_warning("Policy matches no workloads");
            } else {
                let rows: Vec<TargetRow> = resolution
                    .targets
                    .iter()
                    .map(|t| TargetRow {
                        workload: format!("{}/{}", t.workload.namespace, t.workload.name),
                        kind: t.workload.kind.to_string(),
                        reason: format!("{:?}", t.reason),
                    })
                    .collect();
                println!("{}", table(rows));
            }
            print_missing(&resolution.missing);
        }
    }

    Ok(())
}

/// Plan adjusted values for every workload a policy applies to
pub async fn plan(
    client: &ApiClient,
    policy: &Path,
    inventory: &Path,
    format: OutputFormat,
) -> Result<()> {
    let policy: Policy = read_json(policy)?;
    let inventory: Inventory = read_json(inventory)?;

    let reply: Checked<PolicyPlan> = client
        .post_checked(
            "v1/policies/plan",
            &json!({
                "policy": policy,
                "workloads": inventory.workloads,
                "namespaces": inventory.namespaces,
                "clusters": inventory.clusters,
            }),
        )
        .await?;

    let plan = match reply {
        Checked::Accepted(plan) => plan,
        Checked::Rejected(response) => return rejected(&response, format),
    };

    match format {
        OutputFormat::Json => print_json(&plan)?,
        OutputFormat::Table => {
            println!("{} {}", "Plan for policy".bold(), plan.policy.cyan());
            println!("{}", "=".repeat(60));
            print_issues(&plan.warnings);

            let rows: Vec<PlanRow> = plan
                .targets
                .iter()
                .map(|t| PlanRow {
                    workload: format!(
                        "{}/{}/{}",
                        t.target.workload.kind, t.target.workload.namespace, t.target.workload.name
                    ),
                    cluster: t.cluster.clone().unwrap_or_else(|| "-".to_string()),
                    cluster_type: t
                        .cluster_type
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    accuracy: color_rank(t.values.accuracy() as i64),
                    latency: color_rank(t.values.latency() as i64),
                    energy: color_rank(t.values.energy() as i64),
                    status: color_status(&format!("{:?}", t.status)),
                })
                .collect();

            if rows.is_empty() {
                print_warning("Policy matches no workloads");
            } else {
                println!("{}", table(rows));
            }

            for missing in &plan.missing {
                print_error(&format!("{} (Failed)", missing));
            }
        }
    }

    Ok(())
}
