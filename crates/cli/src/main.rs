//! MALE decision agent CLI
//!
//! Classifies clusters, ranks them for a workload and checks MALE policies
//! against a running agent.

mod client;
mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{cluster, policy};
use std::path::PathBuf;

/// MALE decision agent CLI
#[derive(Parser)]
#[command(name = "malectl")]
#[command(author, version, about = "CLI for the MALE decision agent", long_about = None)]
pub struct Cli {
    /// Agent URL (can also be set via MALECTL_API_URL env var)
    #[arg(long, env = "MALECTL_API_URL", default_value = "http://localhost:8080")]
    pub api_url: String,

    /// Output format
    #[arg(long, short, default_value = "table")]
    pub format: output::OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Classify clusters from a JSON file of cluster signals
    Classify {
        /// Path to a JSON array of cluster signals
        clusters: PathBuf,
    },

    /// Rank clusters for a workload requirement
    Score {
        /// Path to the workload requirement (defaults to an empty requirement)
        #[arg(long)]
        requirement: Option<PathBuf>,

        /// Path to a JSON array of cluster signals
        #[arg(long)]
        clusters: PathBuf,
    },

    /// MALE policy commands
    #[command(subcommand)]
    Policy(PolicyCommands),

    /// Show the current global ALE scores
    Weights,

    /// Show agent component health
    Health,
}

#[derive(Subcommand)]
pub enum PolicyCommands {
    /// Validate a policy
    Validate {
        /// Path to the policy
        policy: PathBuf,

        /// Stored version of the policy, to check the update as well
        #[arg(long)]
        previous: Option<PathBuf>,
    },

    /// List the workloads a policy applies to
    Resolve {
        /// Path to the policy
        policy: PathBuf,

        /// Path to the inventory ({workloads, namespaces, clusters})
        #[arg(long)]
        inventory: PathBuf,
    },

    /// Show per-workload adjusted values
    Plan {
        /// Path to the policy
        policy: PathBuf,

        /// Path to the inventory ({workloads, namespaces, clusters})
        #[arg(long)]
        inventory: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize client
    let client = client::ApiClient::new(&cli.api_url)?;

    // Execute command
    match cli.command {
        Commands::Classify { clusters } => {
            cluster::classify(&client, &clusters, cli.format).await?;
        }
        Commands::Score {
            requirement,
            clusters,
        } => {
            cluster::score(&client, requirement.as_deref(), &clusters, cli.format).await?;
        }
        Commands::Policy(policy_cmd) => match policy_cmd {
            PolicyCommands::Validate { policy, previous } => {
                policy::validate(&client, &policy, previous.as_deref(), cli.format).await?;
            }
            PolicyCommands::Resolve { policy, inventory } => {
                policy::resolve(&client, &policy, &inventory, cli.format).await?;
            }
            PolicyCommands::Plan { policy, inventory } => {
                policy::plan(&client, &policy, &inventory, cli.format).await?;
            }
        },
        Commands::Weights => {
            cluster::weights(&client, cli.format).await?;
        }
        Commands::Health => {
            cluster::health(&client, cli.format).await?;
        }
    }

    Ok(())
}
