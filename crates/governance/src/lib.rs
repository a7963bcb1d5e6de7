#![deny(unused)]
//! Local rule engine for the LLM governor.
//!
//! This crate provides:
//! - Declarative category rules (built-in table plus YAML overlays)
//! - The violation detector
//! - The severity to status resolver
//! - Tracing and metrics setup shared by the pipeline

pub mod detector;
pub mod metrics;
pub mod resolver;
pub mod rules;
pub mod tracing_layer;

pub use detector::ViolationDetector;
pub use metrics::{
    setup_metrics_recorder, track_decision, track_fallback, track_persistence_failure, track_probe,
    PrometheusHandle,
};
pub use resolver::{resolve, Resolution, StatusResolver, StatusThresholds};
pub use rules::{CategoryRule, RuleSet, Trigger};
pub use tracing_layer::configure_tracing;
