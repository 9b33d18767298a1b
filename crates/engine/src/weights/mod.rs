//! External ALE weight scores
//!
//! Weights come from the analysis engine over HTTP. Every failure mode
//! collapses into [`WeightSourceError`], and scoring treats that as "no
//! weight data" rather than a fatal error.

mod client;
mod wire;

pub use client::{AnalysisEngineClient, ClientConfig};
pub use wire::{AleScoreData, AleWeightsResponse, ScoresResponse};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

use crate::error::{WeightResult, WeightSourceError};

/// Externally computed objective scores for one device, on the 0..1000 scale
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AleWeights {
    pub accuracy_score: f64,
    pub latency_score: f64,
    pub energy_score: f64,
    pub timestamp: String,
}

/// Per-device weights returned by one query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightSnapshot {
    pub devices: HashMap<String, AleWeights>,
    pub failed_devices: Vec<String>,
}

impl WeightSnapshot {
    pub fn get(&self, device_id: &str) -> Option<&AleWeights> {
        self.devices.get(device_id)
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

/// Source of ALE weights
///
/// Implementations must not keep state between calls; callers bound every
/// call with a deadline via [`fetch_with_deadline`].
#[async_trait]
pub trait WeightSource: Send + Sync {
    /// Per-device weights for `device_id` and/or `device_ids`
    async fn fetch_weights(&self, device_id: &str, device_ids: &[String])
        -> WeightResult<WeightSnapshot>;

    /// Current global scores of the analysis engine
    async fn fetch_scores(&self) -> WeightResult<AleWeights>;
}

/// Run a weight query under a caller-supplied deadline
pub async fn fetch_with_deadline(
    source: &dyn WeightSource,
    device_id: &str,
    device_ids: &[String],
    deadline: Duration,
) -> WeightResult<WeightSnapshot> {
    tokio::time::timeout(deadline, source.fetch_weights(device_id, device_ids))
        .await
        .unwrap_or_else(|_| Err(WeightSourceError::deadline(deadline)))
}

/// Global scores under a caller-supplied deadline
pub async fn scores_with_deadline(
    source: &dyn WeightSource,
    deadline: Duration,
) -> WeightResult<AleWeights> {
    tokio::time::timeout(deadline, source.fetch_scores())
        .await
        .unwrap_or_else(|_| Err(WeightSourceError::deadline(deadline)))
}

/// Fixed weights, for offline operation and tests
#[derive(Debug, Clone, Default)]
pub struct StaticWeightSource {
    devices: HashMap<String, AleWeights>,
    global: Option<AleWeights>,
}

impl StaticWeightSource {
    pub fn new(devices: HashMap<String, AleWeights>) -> Self {
        Self {
            devices,
            global: None,
        }
    }

    pub fn with_global(mut self, global: AleWeights) -> Self {
        self.global = Some(global);
        self
    }
}

#[async_trait]
impl WeightSource for StaticWeightSource {
    async fn fetch_weights(
        &self,
        device_id: &str,
        device_ids: &[String],
    ) -> WeightResult<WeightSnapshot> {
        let mut snapshot = WeightSnapshot::default();
        let requested = std::iter::once(device_id)
            .filter(|id| !id.is_empty())
            .chain(device_ids.iter().map(String::as_str));

        for id in requested {
            match self.devices.get(id) {
                Some(w) => {
                    snapshot.devices.insert(id.to_string(), w.clone());
                }
                None if !snapshot.failed_devices.iter().any(|f| f == id) => {
                    snapshot.failed_devices.push(id.to_string());
                }
                None => {}
            }
        }
        Ok(snapshot)
    }

    async fn fetch_scores(&self) -> WeightResult<AleWeights> {
        self.global
            .clone()
            .ok_or_else(|| WeightSourceError::rejected("no global scores configured"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::UnavailableCause;

    struct SlowSource;

    #[async_trait]
    impl WeightSource for SlowSource {
        async fn fetch_weights(&self, _: &str, _: &[String]) -> WeightResult<WeightSnapshot> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(WeightSnapshot::default())
        }

        async fn fetch_scores(&self) -> WeightResult<AleWeights> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(AleWeights::default())
        }
    }

    fn weights(a: f64) -> AleWeights {
        AleWeights {
            accuracy_score: a,
            latency_score: 500.0,
            energy_score: 500.0,
            timestamp: "2025-01-01T00:00:00Z".into(),
        }
    }

    #[tokio::test]
    async fn test_deadline_expiry_is_unavailable() {
        let err = fetch_with_deadline(&SlowSource, "", &[], Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), UnavailableCause::DeadlineExceeded);

        let err = scores_with_deadline(&SlowSource, Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.cause(), UnavailableCause::DeadlineExceeded);
    }

    #[tokio::test]
    async fn test_static_source_reports_unknown_devices() {
        let source = StaticWeightSource::new(HashMap::from([("gpu-1".to_string(), weights(900.0))]));
        let ids = vec!["gpu-1".to_string(), "edge-9".to_string(), "edge-9".to_string()];

        let snapshot = fetch_with_deadline(&source, "", &ids, Duration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(snapshot.get("gpu-1").unwrap().accuracy_score, 900.0);
        assert_eq!(snapshot.failed_devices, vec!["edge-9".to_string()]);
    }

    #[test]
    fn test_static_source_global_scores() {
        let source = StaticWeightSource::default();
        assert!(tokio_test::block_on(source.fetch_scores()).is_err());

        let source = source.with_global(weights(100.0));
        let scores = tokio_test::block_on(source.fetch_scores()).unwrap();
        assert_eq!(scores.accuracy_score, 100.0);
    }
}
