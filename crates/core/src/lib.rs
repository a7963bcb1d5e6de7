#![deny(unused)]
//! Core types, traits, and error definitions for the LLM governor.
//!
//! This crate provides the building blocks shared by the detector, the
//! remote client, the stores and the orchestrator.

pub mod config;
pub mod error;
pub mod mocks;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
