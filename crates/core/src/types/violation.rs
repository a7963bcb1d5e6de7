use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Violation Types
// =============================================================================

/// Category of a detected policy concern.
///
/// The set is open: detectors and remote services may emit categories the
/// governor has no variant for, which round-trip through [`ViolationType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ViolationType {
    IllegalActivity,
    DataTheft,
    HarmfulContent,
    Pii,
    Bias,
    Misinformation,
    Compliance,
    Other(String),
}

impl ViolationType {
    /// Wire name of the category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::IllegalActivity => "illegal_activity",
            Self::DataTheft => "data_theft",
            Self::HarmfulContent => "harmful_content",
            Self::Pii => "pii",
            Self::Bias => "bias",
            Self::Misinformation => "misinformation",
            Self::Compliance => "compliance",
            Self::Other(name) => name,
        }
    }
}

impl From<String> for ViolationType {
    fn from(value: String) -> Self {
        match value.trim().to_lowercase().as_str() {
            "illegal_activity" => Self::IllegalActivity,
            "data_theft" => Self::DataTheft,
            "harmful_content" => Self::HarmfulContent,
            "pii" => Self::Pii,
            "bias" => Self::Bias,
            "misinformation" => Self::Misinformation,
            "compliance" => Self::Compliance,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ViolationType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ViolationType> for String {
    fn from(value: ViolationType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ViolationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single detected policy or compliance concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    /// Category of the concern.
    #[serde(rename = "type")]
    pub violation_type: ViolationType,
    /// Human-readable summary.
    pub description: String,
    /// Why this violation was raised (e.g. the matched trigger).
    pub reason: String,
    /// Category weight, 0.0 to 10.0.
    pub severity: f64,
    /// Detector's self-reported certainty, 0.0 to 1.0. Informational only.
    pub confidence: f64,
    /// Advisory regulatory label, not verified.
    pub regulatory_framework: String,
    /// Set by an operator through an explicit resolution.
    #[serde(default)]
    pub resolved: bool,
}

impl Violation {
    /// Largest severity in a list, or `None` when empty.
    pub fn max_severity(violations: &[Violation]) -> Option<f64> {
        violations
            .iter()
            .map(|v| v.severity)
            .fold(None, |acc, s| match acc {
                Some(m) if m >= s => Some(m),
                _ => Some(s),
            })
    }
}
