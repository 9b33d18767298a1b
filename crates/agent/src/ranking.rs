//! Combining per-evaluator verdicts into a cluster ranking

use male_engine::models::clamp_rank;
use male_engine::scoring::{ClusterVerdict, EvaluatorDecision};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankedCluster {
    pub cluster: String,
    pub admitted: bool,
    /// Sum of evaluator ranks, clamped to `[0, 1000]`; 0 when rejected
    pub rank: i64,
    pub decisions: Vec<EvaluatorDecision>,
}

/// Admitted clusters first, best rank first; ties keep input order
pub fn rank_clusters(verdicts: Vec<ClusterVerdict>) -> Vec<RankedCluster> {
    let mut ranked: Vec<RankedCluster> = verdicts
        .into_iter()
        .map(|v| {
            let admitted = v.admitted();
            let rank = if admitted {
                clamp_rank(v.decisions.iter().map(|d| d.decision.rank).sum())
            } else {
                0
            };
            RankedCluster {
                cluster: v.cluster,
                admitted,
                rank,
                decisions: v.decisions,
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.admitted.cmp(&a.admitted).then(b.rank.cmp(&a.rank)));
    ranked
}
