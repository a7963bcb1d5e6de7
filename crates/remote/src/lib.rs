#![deny(unused)]
//! Remote analysis backend for the LLM governor.
//!
//! This crate provides:
//! - The HTTP client for the multi-agent analysis service
//! - The availability probe against its liveness endpoint
//! - Mapping of the service's wire payload into core types

pub mod client;
pub mod payload;
pub mod probe;

pub use client::{RemoteAgentClient, DEFAULT_ANALYSIS_TIMEOUT};
pub use probe::{HttpAvailabilityProbe, DEFAULT_PROBE_TIMEOUT};
