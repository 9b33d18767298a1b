//! JSON payloads of the analysis engine REST API

use serde::{Deserialize, Serialize};

use super::{AleWeights, WeightSnapshot};

/// `GET /api/scores`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoresResponse {
    pub success: bool,
    #[serde(default)]
    pub accuracy_score: f64,
    #[serde(default)]
    pub latency_score: f64,
    #[serde(default)]
    pub energy_score: f64,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ScoresResponse> for AleWeights {
    fn from(r: ScoresResponse) -> Self {
        Self {
            accuracy_score: r.accuracy_score,
            latency_score: r.latency_score,
            energy_score: r.energy_score,
            timestamp: r.timestamp,
        }
    }
}

/// One device entry of `GET /api/ale-weights`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AleScoreData {
    pub device_id: String,
    pub accuracy_score: f64,
    pub latency_score: f64,
    pub energy_score: f64,
    #[serde(default)]
    pub calculation_timestamp: String,
}

/// `GET /api/ale-weights`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AleWeightsResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_devices: i32,
    #[serde(default)]
    pub ale_scores: Vec<AleScoreData>,
    #[serde(default)]
    pub failed_devices: Vec<String>,
}

impl From<AleWeightsResponse> for WeightSnapshot {
    fn from(r: AleWeightsResponse) -> Self {
        let devices = r
            .ale_scores
            .into_iter()
            .map(|s| {
                (
                    s.device_id,
                    AleWeights {
                        accuracy_score: s.accuracy_score,
                        latency_score: s.latency_score,
                        energy_score: s.energy_score,
                        timestamp: s.calculation_timestamp,
                    },
                )
            })
            .collect();
        Self {
            devices,
            failed_devices: r.failed_devices,
        }
    }
}
