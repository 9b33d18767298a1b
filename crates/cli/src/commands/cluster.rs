//! Cluster classification, scoring and agent status commands

use anyhow::Result;
use colored::Colorize;
use male_engine::health::HealthResponse;
use male_engine::models::{AleRequirement, ClusterProfile, ClusterSignal};
use male_engine::weights::AleWeights;
use serde_json::json;
use std::path::Path;
use tabled::Tabled;

use super::read_json;
use crate::client::{ApiClient, ScoreResponse};
use crate::output::{
    color_rank, color_status, format_score, format_unix, or_dash, print_info, print_json,
    print_warning, OutputFormat,
};

/// Row for cluster profiles table
#[derive(Tabled)]
struct ProfileRow {
    #[tabled(rename = "Cluster")]
    name: String,
    #[tabled(rename = "Type")]
    cluster_type: String,
    #[tabled(rename = "CPU")]
    cpu_cores: i64,
    #[tabled(rename = "Memory (GB)")]
    memory_gb: i64,
    #[tabled(rename = "GPUs")]
    gpus: String,
    #[tabled(rename = "Power")]
    power_profile: String,
    #[tabled(rename = "Network")]
    network_type: String,
    #[tabled(rename = "Location")]
    location: String,
}

/// Row for the score ranking table
#[derive(Tabled)]
struct RankingRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Cluster")]
    cluster: String,
    #[tabled(rename = "Admitted")]
    admitted: String,
    #[tabled(rename = "Rank")]
    rank: String,
    #[tabled(rename = "Decisions")]
    decisions: String,
}

#[derive(Tabled)]
struct ComponentRow {
    #[tabled(rename = "Component")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Message")]
    message: String,
    #[tabled(rename = "Last Check")]
    last_check: String,
}

fn table<T: Tabled>(rows: Vec<T>) -> String {
    tabled::Table::new(rows)
        .with(tabled::settings::Style::rounded())
        .to_string()
}

/// Classify the clusters described in a file
pub async fn classify(client: &ApiClient, clusters: &Path, format: OutputFormat) -> Result<()> {
    let signals: Vec<ClusterSignal> = read_json(clusters)?;
    let profiles: Vec<ClusterProfile> = client.post("v1/clusters/classify", &signals).await?;

    match format {
        OutputFormat::Json => print_json(&profiles)?,
        OutputFormat::Table => {
            if profiles.is_empty() {
                print_warning("No clusters in input");
                return Ok(());
            }

            let rows: Vec<ProfileRow> = profiles
                .iter()
                .map(|p| ProfileRow {
                    name: p.name.clone(),
                    cluster_type: p.cluster_type.to_string().cyan().to_string(),
                    cpu_cores: p.cpu_cores,
                    memory_gb: p.memory_gb,
                    gpus: if p.gpu_count > 0 {
                        format!("{} {}", p.gpu_count, p.gpu_type).trim().to_string()
                    } else {
                        "-".to_string()
                    },
                    power_profile: or_dash(&p.power_profile),
                    network_type: or_dash(&p.network_type),
                    location: or_dash(&p.location),
                })
                .collect();

            println!("{}", table(rows));
        }
    }

    Ok(())
}

/// Rank clusters for a workload requirement
pub async fn score(
    client: &ApiClient,
    requirement: Option<&Path>,
    clusters: &Path,
    format: OutputFormat,
) -> Result<()> {
    let requirement: AleRequirement = match requirement {
        Some(path) => read_json(path)?,
        None => AleRequirement::default(),
    };
    let signals: Vec<ClusterSignal> = read_json(clusters)?;

    let result: ScoreResponse = client
        .post(
            "v1/score",
            &json!({"requirement": requirement, "clusters": signals}),
        )
        .await?;

    match format {
        OutputFormat::Json => print_json(&result)?,
        OutputFormat::Table => {
            println!("{}", "Cluster Ranking".bold());
            println!("{}", "=".repeat(60));
            if !result.weights_available {
                print_warning("ALE weights unavailable, ranking uses capacity scores only");
            }

            let rows: Vec<RankingRow> = result
                .ranking
                .iter()
                .enumerate()
                .map(|(i, r)| RankingRow {
                    position: i + 1,
                    cluster: r.cluster.clone(),
                    admitted: if r.admitted {
                        color_status("admit")
                    } else {
                        color_status("reject")
                    },
                    rank: color_rank(r.rank),
                    decisions: r
                        .decisions
                        .iter()
                        .map(|d| {
                            if d.decision.admit {
                                format!("{}={}", d.evaluator, d.decision.rank)
                            } else {
                                format!("{}=rejected", d.evaluator)
                            }
                        })
                        .collect::<Vec<_>>()
                        .join(", "),
                })
                .collect();

            println!("{}", table(rows));
        }
    }

    Ok(())
}

/// Show the analysis engine's current global scores
pub async fn weights(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let scores: AleWeights = client.get("v1/weights").await?;

    match format {
        OutputFormat::Json => print_json(&scores)?,
        OutputFormat::Table => {
            println!("{}", "ALE Scores".bold());
            println!("{}", "=".repeat(40));
            println!("Accuracy:   {}", format_score(scores.accuracy_score));
            println!("Latency:    {}", format_score(scores.latency_score));
            println!("Energy:     {}", format_score(scores.energy_score));
            if !scores.timestamp.is_empty() {
                println!();
                print_info(&format!("Computed at {}", scores.timestamp));
            }
        }
    }

    Ok(())
}

/// Show agent component health
pub async fn health(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let health: HealthResponse = client.get("healthz").await?;

    match format {
        OutputFormat::Json => print_json(&health)?,
        OutputFormat::Table => {
            println!("{} {}", "Agent:".bold(), color_status(health.status.as_str()));

            let mut names: Vec<&String> = health.components.keys().collect();
            names.sort();

            let rows: Vec<ComponentRow> = names
                .into_iter()
                .filter_map(|name| health.components.get(name).map(|c| (name, c)))
                .map(|(name, c)| ComponentRow {
                    name: name.clone(),
                    status: color_status(c.status.as_str()),
                    message: c.message.clone().unwrap_or_else(|| "-".to_string()),
                    last_check: format_unix(c.last_check_timestamp),
                })
                .collect();

            println!("{}", table(rows));
        }
    }

    Ok(())
}
