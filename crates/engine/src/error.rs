//! Error taxonomy of the decision engine

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

use crate::policy::FieldIssue;

/// Why the weight source could not deliver data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableCause {
    NoReachableEndpoint,
    HttpStatus,
    MalformedPayload,
    ApplicationFailure,
    DeadlineExceeded,
}

impl fmt::Display for UnavailableCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnavailableCause::NoReachableEndpoint => "no reachable endpoint",
            UnavailableCause::HttpStatus => "unexpected status",
            UnavailableCause::MalformedPayload => "malformed payload",
            UnavailableCause::ApplicationFailure => "analysis engine reported failure",
            UnavailableCause::DeadlineExceeded => "deadline exceeded",
        };
        f.write_str(s)
    }
}

/// Every weight-source failure collapses into this single category.
/// Callers treat it as "no weight data", never as a scheduling failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeightSourceError {
    #[error("weight source unavailable ({cause}): {detail}")]
    Unavailable {
        cause: UnavailableCause,
        detail: String,
    },
}

impl WeightSourceError {
    fn new(cause: UnavailableCause, detail: impl Into<String>) -> Self {
        WeightSourceError::Unavailable {
            cause,
            detail: detail.into(),
        }
    }

    pub fn no_endpoint(tried: usize) -> Self {
        Self::new(
            UnavailableCause::NoReachableEndpoint,
            format!("all {tried} candidate endpoint(s) failed the health check"),
        )
    }

    /// Connection failure after discovery succeeded
    pub fn unreachable(detail: impl Into<String>) -> Self {
        Self::new(UnavailableCause::NoReachableEndpoint, detail)
    }

    pub fn status(code: u16, body: impl Into<String>) -> Self {
        Self::new(UnavailableCause::HttpStatus, format!("HTTP {code}: {}", body.into()))
    }

    pub fn malformed(detail: impl fmt::Display) -> Self {
        Self::new(UnavailableCause::MalformedPayload, detail.to_string())
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(UnavailableCause::ApplicationFailure, message)
    }

    pub fn deadline(deadline: Duration) -> Self {
        Self::new(
            UnavailableCause::DeadlineExceeded,
            format!("no answer within {}ms", deadline.as_millis()),
        )
    }

    pub fn cause(&self) -> UnavailableCause {
        match self {
            WeightSourceError::Unavailable { cause, .. } => *cause,
        }
    }
}

pub type WeightResult<T> = Result<T, WeightSourceError>;

/// Structural or semantic policy defects, always reported in full
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("policy validation failed with {} issue(s): {}", .issues.len(), summarize(.issues))]
pub struct ValidationError {
    pub issues: Vec<FieldIssue>,
}

fn summarize(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// An explicit policy target that is absent from the workload inventory
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("explicit target {kind} {namespace}/{name} not found")]
pub struct TargetNotFound {
    pub name: String,
    pub namespace: String,
    pub kind: String,
}

/// Failures raised while building the analysis engine client
#[derive(Debug, Error)]
pub enum ClientBuildError {
    #[error("invalid analysis engine endpoint {endpoint:?}: {source}")]
    InvalidEndpoint {
        endpoint: String,
        #[source]
        source: url::ParseError,
    },

    #[error("failed to build HTTP client: {0}")]
    Http(#[from] reqwest::Error),
}
