//! API client for the MALE agent

use anyhow::{Context, Result};
use male_engine::policy::FieldIssue;
use male_engine::scoring::EvaluatorDecision;
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

/// API client for the agent's decision endpoints
pub struct ApiClient {
    client: Client,
    base_url: Url,
}

/// Answer of an endpoint that validates a policy before doing anything else
#[derive(Debug)]
pub enum Checked<T> {
    Accepted(T),
    Rejected(ValidateResponse),
}

impl ApiClient {
    /// Create a new API client
    pub fn new(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = Url::parse(base_url).context("Invalid API URL")?;

        Ok(Self { client, base_url })
    }

    /// Make a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.base_url.join(path).context("Invalid path")?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        parse(response).await
    }

    /// Make a POST request with JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.send_post(path, body).await?;
        parse(response).await
    }

    /// POST to an endpoint that answers 422 with validation issues
    pub async fn post_checked<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Checked<T>> {
        let response = self.send_post(path, body).await?;

        if response.status() == StatusCode::UNPROCESSABLE_ENTITY {
            let rejected = response
                .json()
                .await
                .context("Failed to parse validation response")?;
            return Ok(Checked::Rejected(rejected));
        }

        parse(response).await.map(Checked::Accepted)
    }

    async fn send_post<B: Serialize>(&self, path: &str, body: &B) -> Result<reqwest::Response> {
        let url = self.base_url.join(path).context("Invalid path")?;

        self.client
            .post(url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")
    }
}

async fn parse<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&body)
            .map(|e| match e.cause {
                Some(cause) => format!("{} ({})", e.error, cause),
                None => e.error,
            })
            .unwrap_or(body);
        anyhow::bail!("API error ({}): {}", status, message);
    }

    response.json().await.context("Failed to parse response")
}

// API response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedCluster {
    pub cluster: String,
    pub admitted: bool,
    pub rank: i64,
    pub decisions: Vec<EvaluatorDecision>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub weights_available: bool,
    pub ranking: Vec<RankedCluster>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub issues: Vec<FieldIssue>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}
