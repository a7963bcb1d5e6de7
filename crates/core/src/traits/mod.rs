//! Core traits for the governor.
//!
//! Traits sit at the seams to external collaborators:
//! - `analysis`: remote analysis service and its liveness probe
//! - `store`: the persistence adapter used for audit and feedback

pub mod analysis;
pub mod store;

pub use analysis::*;
pub use store::*;
