//! HTTP client for the analysis engine
//!
//! Endpoint discovery health-checks an ordered, caller-supplied list of base
//! addresses with `GET /health` and uses the first that answers 200.
//! Discovery runs on every call; nothing is remembered between calls.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::wire::{AleWeightsResponse, ScoresResponse};
use super::{AleWeights, WeightSnapshot, WeightSource};
use crate::error::{ClientBuildError, WeightResult, WeightSourceError};

/// Configuration for the analysis engine client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Candidate base addresses, tried in order
    pub endpoints: Vec<String>,
    /// Timeout of each `/health` check
    pub health_check_timeout: Duration,
    /// Timeout of each data request
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: Vec::new(),
            health_check_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(8),
        }
    }
}

/// REST client implementing [`WeightSource`]
#[derive(Debug, Clone)]
pub struct AnalysisEngineClient {
    client: Client,
    endpoints: Vec<Url>,
    health_check_timeout: Duration,
    request_timeout: Duration,
}

impl AnalysisEngineClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientBuildError> {
        let endpoints = config
            .endpoints
            .iter()
            .map(|raw| {
                Url::parse(raw).map_err(|source| ClientBuildError::InvalidEndpoint {
                    endpoint: raw.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let client = Client::builder().build()?;

        Ok(Self {
            client,
            endpoints,
            health_check_timeout: config.health_check_timeout,
            request_timeout: config.request_timeout,
        })
    }

    pub fn endpoints(&self) -> &[Url] {
        &self.endpoints
    }

    /// First endpoint whose health check succeeds
    pub async fn discover(&self) -> WeightResult<Url> {
        for base in &self.endpoints {
            match self.check_health(base).await {
                Ok(()) => {
                    debug!(endpoint = %base, "Analysis engine endpoint reachable");
                    return Ok(base.clone());
                }
                Err(reason) => {
                    warn!(endpoint = %base, reason = %reason, "Analysis engine health check failed");
                }
            }
        }
        Err(WeightSourceError::no_endpoint(self.endpoints.len()))
    }

    async fn check_health(&self, base: &Url) -> Result<(), String> {
        let url = join(base, "health").map_err(|e| e.to_string())?;
        let response = self
            .client
            .get(url)
            .timeout(self.health_check_timeout)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status() == reqwest::StatusCode::OK {
            Ok(())
        } else {
            Err(format!("HTTP {}", response.status().as_u16()))
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> WeightResult<T> {
        let base = self.discover().await?;
        let url = join(&base, path).map_err(WeightSourceError::malformed)?;

        let response = self
            .client
            .get(url)
            .query(query)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(send_failure)?;

        decode(response).await
    }
}

/// The endpoint answered discovery but dropped the request
fn send_failure(err: reqwest::Error) -> WeightSourceError {
    WeightSourceError::unreachable(err.to_string())
}

fn join(base: &Url, path: &str) -> Result<Url, url::ParseError> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let with_slash = format!("{}/", base.path());
        base.set_path(&with_slash);
    }
    base.join(path)
}

async fn decode<T: DeserializeOwned>(response: Response) -> WeightResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(WeightSourceError::status(status.as_u16(), body));
    }
    response.json().await.map_err(WeightSourceError::malformed)
}

#[async_trait]
impl WeightSource for AnalysisEngineClient {
    async fn fetch_weights(
        &self,
        device_id: &str,
        device_ids: &[String],
    ) -> WeightResult<WeightSnapshot> {
        let mut query: Vec<(&str, &str)> = Vec::with_capacity(device_ids.len() + 1);
        if !device_id.is_empty() {
            query.push(("device_id", device_id));
        }
        query.extend(device_ids.iter().map(|id| ("device_ids", id.as_str())));

        let response: AleWeightsResponse = self.get_json("api/ale-weights", &query).await?;
        if !response.success {
            return Err(WeightSourceError::rejected(response.message));
        }
        Ok(response.into())
    }

    async fn fetch_scores(&self) -> WeightResult<AleWeights> {
        let response: ScoresResponse = self.get_json("api/scores", &[]).await?;
        if !response.success {
            return Err(WeightSourceError::rejected(
                response.message.unwrap_or_default(),
            ));
        }
        Ok(response.into())
    }
}
