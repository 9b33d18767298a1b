//! MALE agent - multi-criteria cluster decision service
//!
//! Runs next to the scheduler and the policy controller, answering
//! classification, scoring and policy planning requests.

use anyhow::{Context, Result};
use male_agent::{api, config::AgentConfig};
use male_engine::{
    health::{components, HealthRegistry},
    observability::{EngineMetrics, StructuredLogger},
    weights::{AnalysisEngineClient, WeightSource},
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const AGENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting male-agent");

    let config = AgentConfig::load()?;
    info!(
        instance = %config.instance_name,
        weight_endpoints = config.weight_endpoints.len(),
        "Agent configured"
    );

    let health_registry = HealthRegistry::new();
    api::register_components(&health_registry).await;

    let metrics = EngineMetrics::new().context("failed to register engine metrics")?;
    let logger = StructuredLogger::new(&config.instance_name);

    let client_config = config.client_config();
    let endpoint_count = client_config.endpoints.len();
    let weight_source: Option<Arc<dyn WeightSource>> = if endpoint_count == 0 {
        warn!("No analysis engine endpoints configured, scoring on capacity only");
        health_registry
            .set_degraded(components::WEIGHT_SOURCE, "no analysis engine endpoints configured")
            .await;
        None
    } else {
        let client = AnalysisEngineClient::new(client_config)
            .context("invalid analysis engine configuration")?;
        Some(Arc::new(client))
    };

    logger.log_startup(AGENT_VERSION, endpoint_count);

    let app_state = Arc::new(api::AppState::new(
        health_registry.clone(),
        metrics,
        logger.clone(),
        weight_source,
        config.weight_deadline(),
    ));

    // Mark agent as ready after initialization
    health_registry.set_ready(true).await;

    let shutdown = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    };
    api::serve(config.api_port, app_state, shutdown).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
