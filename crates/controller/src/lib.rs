#![deny(unused)]
//! Governance orchestration for the LLM governor.
//!
//! This crate provides the per-interaction pipeline (backend selection,
//! remote fallback, resolution, persistence), feedback recording and the
//! operator backend switch.

pub mod backend;
pub mod builder;
pub mod feedback;
pub mod operator;
pub mod orchestrator;
pub mod state;

pub use backend::{AnalysisBackend, POLICY_ENFORCER};
pub use builder::OrchestratorBuilder;
pub use feedback::FeedbackRecorder;
pub use operator::{BackendSwitch, DEFAULT_PROBE_STALENESS};
pub use orchestrator::{
    Orchestrator, DEFAULT_REMOTE_TIMEOUT, FALLBACK_DETAILS, ORCHESTRATOR, VERIFIER,
};
pub use state::{BackendStatus, GovernanceConfig};
