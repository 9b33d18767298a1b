//! Agent configuration

use anyhow::{Context, Result};
use male_engine::weights::ClientConfig;
use serde::Deserialize;
use std::time::Duration;

/// Agent configuration, read from `MALE_*` environment variables
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    /// Instance name used in structured logs
    #[serde(default = "default_instance_name")]
    pub instance_name: String,

    /// API server port
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Analysis engine base addresses, tried in order
    #[serde(default)]
    pub weight_endpoints: Vec<String>,

    /// Timeout of each endpoint health check
    #[serde(default = "default_health_check_timeout_ms")]
    pub health_check_timeout_ms: u64,

    /// Timeout of each analysis engine request
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Overall deadline for one weight query, discovery included
    #[serde(default = "default_weight_deadline_ms")]
    pub weight_deadline_ms: u64,
}

fn default_instance_name() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "male-agent".to_string())
}

fn default_api_port() -> u16 {
    8080
}

fn default_health_check_timeout_ms() -> u64 {
    5_000
}

fn default_request_timeout_ms() -> u64 {
    8_000
}

fn default_weight_deadline_ms() -> u64 {
    10_000
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            instance_name: default_instance_name(),
            api_port: default_api_port(),
            weight_endpoints: Vec::new(),
            health_check_timeout_ms: default_health_check_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            weight_deadline_ms: default_weight_deadline_ms(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("MALE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("weight_endpoints"),
            )
            .build()
            .context("failed to read MALE_* environment")?;

        config
            .try_deserialize()
            .context("invalid MALE_* configuration")
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoints: self
                .weight_endpoints
                .iter()
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            health_check_timeout: Duration::from_millis(self.health_check_timeout_ms),
            request_timeout: Duration::from_millis(self.request_timeout_ms),
        }
    }

    pub fn weight_deadline(&self) -> Duration {
        Duration::from_millis(self.weight_deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_drops_blank_endpoints() {
        let config = AgentConfig {
            weight_endpoints: vec![" http://a:5000 ".into(), "".into(), "http://b:5000".into()],
            health_check_timeout_ms: 250,
            ..Default::default()
        };

        let client = config.client_config();

        assert_eq!(client.endpoints, vec!["http://a:5000", "http://b:5000"]);
        assert_eq!(client.health_check_timeout, Duration::from_millis(250));
        assert_eq!(config.weight_deadline(), Duration::from_secs(10));
    }
}
