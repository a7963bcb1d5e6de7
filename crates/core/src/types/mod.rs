//! Core type definitions for the governor.
//!
//! Broken down into submodules:
//! - `interaction`: the governed exchange, its status and bucket
//! - `violation`: detected concerns and their open category set
//! - `action`: the per-interaction action log
//! - `feedback`: post-hoc user ratings

pub mod action;
pub mod feedback;
pub mod interaction;
pub mod violation;

pub use action::*;
pub use feedback::*;
pub use interaction::*;
pub use violation::*;
