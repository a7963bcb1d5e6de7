//! Severity to status resolution.

use serde::{Deserialize, Serialize};

use llm_governor_core::config::ThresholdSettings;
use llm_governor_core::{InteractionStatus, SeverityBucket, Violation};

/// Inclusive lower bounds, checked highest first.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatusThresholds {
    /// `max >= blocked` resolves to `(blocked, critical)`.
    pub blocked: f64,
    /// `max >= high` resolves to `(pending, high)`.
    pub high: f64,
    /// `max >= medium` resolves to `(pending, medium)`.
    pub medium: f64,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        Self {
            blocked: 8.0,
            high: 6.0,
            medium: 5.0,
        }
    }
}

impl From<ThresholdSettings> for StatusThresholds {
    fn from(s: ThresholdSettings) -> Self {
        Self {
            blocked: s.blocked,
            high: s.high,
            medium: s.medium,
        }
    }
}

/// Outcome of resolving a violation list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resolution {
    pub status: InteractionStatus,
    pub severity_bucket: SeverityBucket,
    /// `None` when there were no violations.
    pub max_severity: Option<f64>,
}

/// Maps the worst violation to a status and bucket.
///
/// Only the maximum severity matters: one violation at 9.0 and five at 9.0
/// resolve identically.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusResolver {
    thresholds: StatusThresholds,
}

impl StatusResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: StatusThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> StatusThresholds {
        self.thresholds
    }

    pub fn resolve(&self, violations: &[Violation]) -> Resolution {
        let Some(max) = Violation::max_severity(violations) else {
            return Resolution {
                status: InteractionStatus::Approved,
                severity_bucket: SeverityBucket::Low,
                max_severity: None,
            };
        };

        let t = &self.thresholds;
        let (status, severity_bucket) = if max >= t.blocked {
            (InteractionStatus::Blocked, SeverityBucket::Critical)
        } else if max >= t.high {
            (InteractionStatus::Pending, SeverityBucket::High)
        } else if max >= t.medium {
            (InteractionStatus::Pending, SeverityBucket::Medium)
        } else {
            (InteractionStatus::Approved, SeverityBucket::Low)
        };

        Resolution {
            status,
            severity_bucket,
            max_severity: Some(max),
        }
    }
}

/// Resolve with the canonical thresholds.
pub fn resolve(violations: &[Violation]) -> Resolution {
    StatusResolver::new().resolve(violations)
}
