//! Filter and score pipeline over candidate clusters
//!
//! Each evaluator is a pure filter plus a bounded score. The set of
//! evaluators is closed: new ones are added as [`Evaluator`] variants.
//! The engine reports per-evaluator decisions; combining ranks across
//! evaluators is left to the caller.

pub mod collaborative;
pub mod intent;
pub mod power;

pub use collaborative::Collaborative;
pub use intent::IntentLatency;
pub use power::PowerBudget;

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{clamp_rank, Admission, AleRequirement, ClusterSignal, ScoreDecision, VALUE_MAX, VALUE_MIN};
use crate::observability::{noop_sink, ObservabilitySink};
use crate::weights::{AleWeights, WeightSnapshot};

/// ALE objective an evaluator's score is weighted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Accuracy,
    Latency,
    Energy,
}

impl Objective {
    /// The external score for this objective
    pub fn pick(&self, w: &AleWeights) -> f64 {
        match self {
            Objective::Accuracy => w.accuracy_score,
            Objective::Latency => w.latency_score,
            Objective::Energy => w.energy_score,
        }
    }
}

/// Average a capacity score with an external objective score.
///
/// Without a usable weight the capacity score is returned as is.
pub fn blend(capacity: i64, weight: Option<f64>) -> i64 {
    match weight.filter(|w| w.is_finite()) {
        Some(w) => {
            let w = w.clamp(VALUE_MIN as f64, VALUE_MAX as f64);
            clamp_rank(((capacity as f64 + w) / 2.0).round() as i64)
        }
        None => clamp_rank(capacity),
    }
}

/// Shared contract of every evaluator
pub trait ClusterEvaluator {
    fn name(&self) -> &'static str;

    fn objective(&self) -> Objective;

    /// Hard admission check; never consults weights
    fn filter(&self, req: &AleRequirement, cluster: &ClusterSignal) -> Admission;

    /// Rank in `[0, 1000]`
    fn score(&self, req: &AleRequirement, cluster: &ClusterSignal, weights: Option<&AleWeights>)
        -> i64;

    fn decide(
        &self,
        req: &AleRequirement,
        cluster: &ClusterSignal,
        weights: Option<&AleWeights>,
    ) -> ScoreDecision {
        let admission = self.filter(req, cluster);
        let rank = if admission.is_admit() {
            self.score(req, cluster, weights)
        } else {
            0
        };
        ScoreDecision::new(admission, rank)
    }
}

/// The closed set of evaluators
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluator {
    PowerBudget(PowerBudget),
    IntentLatency(IntentLatency),
    Collaborative(Collaborative),
}

impl Evaluator {
    /// All evaluators with their default thresholds
    pub fn default_set() -> Vec<Evaluator> {
        vec![
            Evaluator::PowerBudget(PowerBudget::default()),
            Evaluator::IntentLatency(IntentLatency::default()),
            Evaluator::Collaborative(Collaborative),
        ]
    }

    fn inner(&self) -> &dyn ClusterEvaluator {
        match self {
            Evaluator::PowerBudget(e) => e,
            Evaluator::IntentLatency(e) => e,
            Evaluator::Collaborative(e) => e,
        }
    }
}

impl ClusterEvaluator for Evaluator {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn objective(&self) -> Objective {
        self.inner().objective()
    }

    fn filter(&self, req: &AleRequirement, cluster: &ClusterSignal) -> Admission {
        self.inner().filter(req, cluster)
    }

    fn score(
        &self,
        req: &AleRequirement,
        cluster: &ClusterSignal,
        weights: Option<&AleWeights>,
    ) -> i64 {
        self.inner().score(req, cluster, weights)
    }
}

/// One evaluator's decision for one cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluatorDecision {
    pub evaluator: String,
    #[serde(flatten)]
    pub decision: ScoreDecision,
}

/// All decisions for one cluster, in evaluator order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterVerdict {
    pub cluster: String,
    pub decisions: Vec<EvaluatorDecision>,
}

impl ClusterVerdict {
    /// A cluster is admitted only when every evaluator admits it
    pub fn admitted(&self) -> bool {
        self.decisions.iter().all(|d| d.decision.admit)
    }
}

/// Runs the configured evaluators over candidate clusters
#[derive(Clone)]
pub struct ScoreEngine {
    evaluators: Vec<Evaluator>,
    sink: Arc<dyn ObservabilitySink>,
}

impl Default for ScoreEngine {
    fn default() -> Self {
        Self::new(Evaluator::default_set(), noop_sink())
    }
}

impl ScoreEngine {
    pub fn new(evaluators: Vec<Evaluator>, sink: Arc<dyn ObservabilitySink>) -> Self {
        Self { evaluators, sink }
    }

    pub fn evaluators(&self) -> &[Evaluator] {
        &self.evaluators
    }

    /// Evaluate one cluster. Weights are looked up by cluster name.
    pub fn evaluate_cluster(
        &self,
        req: &AleRequirement,
        cluster: &ClusterSignal,
        weights: Option<&WeightSnapshot>,
    ) -> ClusterVerdict {
        let device = weights.and_then(|w| w.get(&cluster.name));
        let decisions = self
            .evaluators
            .iter()
            .map(|e| {
                let decision = e.decide(req, cluster, device);
                self.sink.cluster_evaluated(&cluster.name, e.name(), &decision);
                EvaluatorDecision {
                    evaluator: e.name().to_string(),
                    decision,
                }
            })
            .collect();

        ClusterVerdict {
            cluster: cluster.name.clone(),
            decisions,
        }
    }

    /// Evaluate every candidate, preserving input order
    pub fn evaluate(
        &self,
        req: &AleRequirement,
        clusters: &[ClusterSignal],
        weights: Option<&WeightSnapshot>,
    ) -> Vec<ClusterVerdict> {
        clusters
            .iter()
            .map(|c| self.evaluate_cluster(req, c, weights))
            .collect()
    }
}
