//! Multi-criteria cluster decision engine
//!
//! This crate provides:
//! - Cluster classification from hardware and label signals
//! - Filter and score evaluators weighted by accuracy/latency/energy scores
//! - A client for the external analysis engine that supplies those scores
//! - Policy validation, target resolution and per-cluster value adjustment
//! - Health tracking and an injectable observability sink

pub mod error;
pub mod health;
pub mod models;
pub mod observability;
pub mod policy;
pub mod profiler;
pub mod scoring;
pub mod weights;

pub use error::{ClientBuildError, TargetNotFound, ValidationError, WeightResult, WeightSourceError};
pub use health::{ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse};
pub use models::*;
pub use observability::{EngineMetrics, FanoutSink, NoopSink, ObservabilitySink, StructuredLogger};
pub use policy::{PolicyPlan, PolicyPlanner, PolicyResolver, PolicyValidator, ValueAdjuster};
pub use profiler::ClusterProfiler;
pub use scoring::{ClusterVerdict, Evaluator, ScoreEngine};
pub use weights::{AnalysisEngineClient, ClientConfig, StaticWeightSource, WeightSnapshot, WeightSource};
