//! HTTP API: health checks, Prometheus metrics and decision endpoints

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use male_engine::{
    health::{components, ComponentStatus, HealthRegistry},
    models::{AdjustedValues, AleRequirement, ClusterProfile, ClusterSignal, Policy, WorkloadRef},
    observability::{EngineMetrics, FanoutSink, ObservabilitySink, StructuredLogger},
    policy::{apply_adjusted_values, FieldIssue, PolicyPlanner, WorkloadTemplate},
    profiler::{ClusterProfiler, LabeledCluster},
    scoring::{Evaluator, ScoreEngine},
    weights::{fetch_with_deadline, scores_with_deadline, WeightSnapshot, WeightSource},
    WeightSourceError,
};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::ranking::{rank_clusters, RankedCluster};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub health_registry: HealthRegistry,
    pub metrics: EngineMetrics,
    pub profiler: ClusterProfiler,
    pub engine: ScoreEngine,
    pub planner: PolicyPlanner,
    sink: Arc<dyn ObservabilitySink>,
    weight_source: Option<Arc<dyn WeightSource>>,
    weight_deadline: Duration,
}

impl AppState {
    /// Wire every component to the metrics and the structured logger
    pub fn new(
        health_registry: HealthRegistry,
        metrics: EngineMetrics,
        logger: StructuredLogger,
        weight_source: Option<Arc<dyn WeightSource>>,
        weight_deadline: Duration,
    ) -> Self {
        let sink: Arc<dyn ObservabilitySink> = Arc::new(FanoutSink::new(vec![
            Arc::new(metrics.clone()),
            Arc::new(logger),
        ]));

        Self {
            health_registry,
            metrics,
            profiler: ClusterProfiler::new(sink.clone()),
            engine: ScoreEngine::new(Evaluator::default_set(), sink.clone()),
            planner: PolicyPlanner::new(sink.clone()),
            sink,
            weight_source,
            weight_deadline,
        }
    }

    /// Per-cluster weights, or `None` when the source cannot answer in time
    async fn cluster_weights(&self, clusters: &[ClusterSignal]) -> Option<WeightSnapshot> {
        let source = self.weight_source.as_deref()?;
        let ids: Vec<String> = clusters.iter().map(|c| c.name.clone()).collect();

        let result = fetch_with_deadline(source, "", &ids, self.weight_deadline).await;
        self.health_registry.record_weight_fetch(&result).await;

        match result {
            Ok(snapshot) => Some(snapshot),
            Err(err) => {
                self.sink.weight_source_failed(&err);
                None
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    cause: Option<String>,
}

fn error_response(status: StatusCode, error: impl Into<String>, cause: Option<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
            cause,
        }),
    )
        .into_response()
}

fn unavailable(err: &WeightSourceError) -> Response {
    error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        err.to_string(),
        Some(err.cause().to_string()),
    )
}

/// Health check response - returns 200 if healthy, 503 if unhealthy
async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let health = state.health_registry.health().await;

    let status_code = match health.status {
        ComponentStatus::Healthy => StatusCode::OK,
        // still serving on capacity-only scores
        ComponentStatus::Degraded => StatusCode::OK,
        ComponentStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(health))
}

/// Readiness check response - returns 200 if ready, 503 if not ready
async fn readyz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let readiness = state.health_registry.readiness().await;

    let status_code = if readiness.ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(readiness))
}

/// Prometheus metrics endpoint
async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; charset=utf-8")],
            buffer,
        )
            .into_response(),
        Err(err) => error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string(), None),
    }
}

async fn decode(Json(clusters): Json<Vec<LabeledCluster>>) -> Json<Vec<ClusterSignal>> {
    Json(clusters.iter().map(LabeledCluster::to_signal).collect())
}

async fn classify(
    State(state): State<Arc<AppState>>,
    Json(signals): Json<Vec<ClusterSignal>>,
) -> Json<Vec<ClusterProfile>> {
    Json(signals.iter().map(|s| state.profiler.classify(s)).collect())
}

#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    #[serde(default)]
    pub requirement: AleRequirement,
    pub clusters: Vec<ClusterSignal>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub weights_available: bool,
    pub ranking: Vec<RankedCluster>,
}

async fn score(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScoreRequest>,
) -> Json<ScoreResponse> {
    let weights = state.cluster_weights(&request.clusters).await;
    let verdicts = state
        .engine
        .evaluate(&request.requirement, &request.clusters, weights.as_ref());

    Json(ScoreResponse {
        weights_available: weights.is_some(),
        ranking: rank_clusters(verdicts),
    })
}

async fn global_weights(State(state): State<Arc<AppState>>) -> Response {
    let Some(source) = state.weight_source.as_deref() else {
        return error_response(
            StatusCode::SERVICE_UNAVAILABLE,
            "no analysis engine endpoints configured",
            None,
        );
    };

    let result = scores_with_deadline(source, state.weight_deadline).await;
    state.health_registry.record_weight_fetch(&result).await;

    match result {
        Ok(scores) => Json(scores).into_response(),
        Err(err) => {
            state.sink.weight_source_failed(&err);
            unavailable(&err)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateRequest {
    pub policy: Policy,
    /// Currently stored version, for update checks
    #[serde(default)]
    pub previous: Option<Policy>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub issues: Vec<FieldIssue>,
}

fn validation_response(valid: bool, issues: Vec<FieldIssue>) -> Response {
    let status = if valid {
        StatusCode::OK
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    };
    (status, Json(ValidateResponse { valid, issues })).into_response()
}

async fn validate(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ValidateRequest>,
) -> Response {
    let validator = state.planner.validator();
    let report = match &request.previous {
        Some(previous) => validator.validate_update(previous, &request.policy),
        None => validator.validate(&request.policy),
    };
    validation_response(report.is_valid(), report.issues)
}

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub policy: Policy,
    #[serde(default)]
    pub workloads: Vec<WorkloadRef>,
    #[serde(default)]
    pub namespaces: Vec<String>,
}

async fn resolve(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ResolveRequest>,
) -> Response {
    let report = state.planner.validator().validate(&request.policy);
    if !report.is_valid() {
        return validation_response(false, report.issues);
    }

    Json(
        state
            .planner
            .resolver()
            .resolve(&request.policy, &request.workloads, &request.namespaces),
    )
    .into_response()
}

#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub policy: Policy,
    #[serde(default)]
    pub workloads: Vec<WorkloadRef>,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub clusters: Vec<ClusterSignal>,
}

async fn plan(State(state): State<Arc<AppState>>, Json(request): Json<PlanRequest>) -> Response {
    let profiles = state.profiler.classify_all(&request.clusters);

    match state
        .planner
        .plan(&request.policy, &request.workloads, &request.namespaces, &profiles)
    {
        Ok(plan) => Json(plan).into_response(),
        Err(err) => validation_response(false, err.issues),
    }
}

#[derive(Debug, Deserialize)]
pub struct StampRequest {
    pub template: WorkloadTemplate,
    pub values: AdjustedValues,
    pub policy_name: String,
}

async fn stamp(Json(request): Json<StampRequest>) -> Json<WorkloadTemplate> {
    let mut template = request.template;
    apply_adjusted_values(
        &mut template,
        &request.values,
        &request.policy_name,
        chrono::Utc::now(),
    );
    Json(template)
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/metrics", get(metrics))
        .route("/v1/clusters/decode", post(decode))
        .route("/v1/clusters/classify", post(classify))
        .route("/v1/score", post(score))
        .route("/v1/weights", get(global_weights))
        .route("/v1/policies/validate", post(validate))
        .route("/v1/policies/resolve", post(resolve))
        .route("/v1/policies/plan", post(plan))
        .route("/v1/workloads/stamp", post(stamp))
        .with_state(state)
}

/// Register the agent's health components
pub async fn register_components(registry: &HealthRegistry) {
    registry.register_all(&components::ALL).await;
}

/// Start the API server, returning once `shutdown` resolves
pub async fn serve(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}
