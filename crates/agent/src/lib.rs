//! MALE decision agent
//!
//! Serves cluster classification, scoring and policy planning over HTTP,
//! alongside the usual health and metrics endpoints.

pub mod api;
pub mod config;
pub mod ranking;
