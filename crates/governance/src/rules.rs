//! Declarative detection rules.
//!
//! Each category rule carries its constants and an ordered trigger list. The
//! built-in table can be overlaid with a YAML rule file at startup.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use llm_governor_core::{Error, Result, ViolationType};

/// A versioned set of category rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RuleSet {
    pub version: String,
    pub name: String,
    pub rules: Vec<CategoryRule>,
}

/// Detection rule for one violation category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CategoryRule {
    pub category: ViolationType,
    pub description: String,
    pub severity: f64,
    pub confidence: f64,
    pub regulatory_framework: String,
    /// Evaluated in order; the first match wins.
    pub triggers: Vec<Trigger>,
}

/// A single trigger within a category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Trigger {
    /// Literal phrase, matched case-insensitively as a substring.
    Phrase { phrase: String },
    /// Regular expression for structured data, applied to lower-cased text.
    Pattern { pattern: String, label: String },
}

impl Trigger {
    pub fn phrase(phrase: &str) -> Self {
        Self::Phrase { phrase: phrase.to_string() }
    }

    pub fn pattern(label: &str, pattern: &str) -> Self {
        Self::Pattern {
            pattern: pattern.to_string(),
            label: label.to_string(),
        }
    }

    /// Name reported in a violation's reason.
    pub fn label(&self) -> &str {
        match self {
            Self::Phrase { phrase } => phrase,
            Self::Pattern { label, .. } => label,
        }
    }
}

impl CategoryRule {
    fn new(
        category: ViolationType,
        description: &str,
        severity: f64,
        confidence: f64,
        regulatory_framework: &str,
        triggers: Vec<Trigger>,
    ) -> Self {
        Self {
            category,
            description: description.to_string(),
            severity,
            confidence,
            regulatory_framework: regulatory_framework.to_string(),
            triggers,
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=10.0).contains(&self.severity) {
            return Err(Error::configuration(format!(
                "rule '{}': severity {} outside 0.0..=10.0",
                self.category, self.severity
            )));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(Error::configuration(format!(
                "rule '{}': confidence {} outside 0.0..=1.0",
                self.category, self.confidence
            )));
        }
        if self.triggers.is_empty() {
            return Err(Error::configuration(format!(
                "rule '{}': no triggers",
                self.category
            )));
        }
        Ok(())
    }
}

fn phrases(list: &[&str]) -> Vec<Trigger> {
    list.iter().map(|p| Trigger::phrase(p)).collect()
}

impl RuleSet {
    /// The canonical built-in table.
    pub fn builtin() -> Self {
        Self {
            version: "1.0".to_string(),
            name: "builtin".to_string(),
            rules: vec![
                CategoryRule::new(
                    ViolationType::IllegalActivity,
                    "Request or response facilitates illegal or hacking activity",
                    9.5,
                    0.9,
                    "Computer Fraud and Abuse Act",
                    phrases(&[
                        "hack into",
                        "how to hack",
                        "hacking",
                        "hacked",
                        "bypass security",
                        "bypass authentication",
                        "exploit vulnerability",
                        "sql injection",
                        "malware",
                        "ransomware",
                        "keylogger",
                        "ddos",
                        "phishing",
                        "crack password",
                        "steal credentials",
                        "launder money",
                        "counterfeit",
                    ]),
                ),
                CategoryRule::new(
                    ViolationType::DataTheft,
                    "Request for confidential or unauthorized data access",
                    9.0,
                    0.85,
                    "GDPR",
                    phrases(&[
                        "confidential data",
                        "confidential information",
                        "classified information",
                        "internal documents",
                        "trade secrets",
                        "customer database",
                        "employee records",
                        "steal data",
                        "exfiltrate",
                        "dump the database",
                        "access private",
                    ]),
                ),
                CategoryRule::new(
                    ViolationType::HarmfulContent,
                    "Harmful or violent content",
                    9.0,
                    0.95,
                    "Online Safety Act",
                    phrases(&[
                        "kill",
                        "murder",
                        "bomb",
                        "shoot",
                        "stab",
                        "torture",
                        "poison someone",
                        "hurt someone",
                        "build a weapon",
                        "make a weapon",
                        "self-harm",
                        "suicide",
                    ]),
                ),
                CategoryRule::new(
                    ViolationType::Pii,
                    "Personally identifiable information detected",
                    8.5,
                    0.9,
                    "GDPR",
                    vec![
                        Trigger::pattern("ssn", r"\b\d{3}-\d{2}-\d{4}\b"),
                        Trigger::pattern("credit_card", r"\b\d{4}[- ]?\d{4}[- ]?\d{4}[- ]?\d{4}\b"),
                        Trigger::pattern("email", r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"),
                        Trigger::pattern("phone_us", r"\b\d{3}[-.]\d{3}[-.]\d{4}\b"),
                    ],
                ),
                CategoryRule::new(
                    ViolationType::Misinformation,
                    "Unsupported or false factual claim",
                    7.0,
                    0.75,
                    "EU Digital Services Act",
                    phrases(&[
                        "vaccines cause autism",
                        "the earth is flat",
                        "miracle cure",
                        "cures cancer",
                        "guaranteed cure",
                        "5g causes",
                        "election was rigged",
                        "climate change is a hoax",
                        "moon landing was faked",
                    ]),
                ),
                CategoryRule::new(
                    ViolationType::Bias,
                    "Biased or discriminatory language",
                    6.5,
                    0.7,
                    "EU AI Act",
                    phrases(&[
                        "all women are",
                        "all men are",
                        "inferior race",
                        "naturally inferior",
                        "those people are",
                        "women can't",
                        "not suited for women",
                        "because of their race",
                        "because of their religion",
                    ]),
                ),
            ],
        }
    }

    /// Load a rule set from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {:?}", path))
            .map_err(|e| Error::configuration(format!("{:#}", e)))?;
        Self::from_yaml(&content)
    }

    /// Parse and validate a rule set from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        let set: RuleSet = serde_yaml::from_str(content)
            .map_err(|e| Error::configuration(format!("Failed to parse rule YAML: {}", e)))?;
        set.validate()?;
        Ok(set)
    }

    /// Check every rule's constants and trigger list.
    pub fn validate(&self) -> Result<()> {
        self.rules.iter().try_for_each(CategoryRule::validate)
    }

    /// Merge another rule set into this one (other wins on category conflict).
    pub fn merge(&mut self, other: RuleSet) {
        for rule in other.rules {
            if let Some(existing) = self.rules.iter_mut().find(|r| r.category == rule.category) {
                *existing = rule;
            } else {
                self.rules.push(rule);
            }
        }
        self.version = other.version;
        self.name = other.name;
    }

    /// Look up the rule for a category.
    pub fn get(&self, category: &ViolationType) -> Option<&CategoryRule> {
        self.rules.iter().find(|r| &r.category == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OVERLAY: &str = r#"
version: "1.1"
name: finance-overlay
rules:
  - category: pii
    description: Account data
    severity: 9.0
    confidence: 0.8
    regulatory_framework: PCI DSS
    triggers:
      - pattern: '\biban\s*[a-z]{2}\d{2}'
        label: iban
  - category: compliance
    description: Unlicensed financial advice
    severity: 5.5
    confidence: 0.6
    regulatory_framework: MiFID II
    triggers:
      - phrase: guaranteed returns
"#;

    #[test]
    fn test_builtin_table_is_valid() {
        let set = RuleSet::builtin();
        assert!(set.validate().is_ok());
        assert_eq!(set.rules.len(), 6);
        assert_eq!(set.get(&ViolationType::IllegalActivity).unwrap().severity, 9.5);
        assert_eq!(set.get(&ViolationType::Pii).unwrap().severity, 8.5);
        assert_eq!(set.get(&ViolationType::Bias).unwrap().severity, 6.5);
    }

    #[test]
    fn test_overlay_parses_both_trigger_kinds() {
        let overlay = RuleSet::from_yaml(OVERLAY).unwrap();
        assert_eq!(overlay.rules.len(), 2);
        assert_eq!(overlay.rules[0].triggers[0].label(), "iban");
        assert_eq!(overlay.rules[1].triggers[0], Trigger::phrase("guaranteed returns"));
    }

    #[test]
    fn test_merge_replaces_and_appends() {
        let mut set = RuleSet::builtin();
        set.merge(RuleSet::from_yaml(OVERLAY).unwrap());

        assert_eq!(set.rules.len(), 7);
        assert_eq!(set.version, "1.1");
        let pii = set.get(&ViolationType::Pii).unwrap();
        assert_eq!(pii.severity, 9.0);
        assert_eq!(pii.regulatory_framework, "PCI DSS");
        assert_eq!(set.rules.last().unwrap().category, ViolationType::Compliance);
    }

    #[test]
    fn test_out_of_range_severity_rejected() {
        let yaml = OVERLAY.replace("severity: 5.5", "severity: 12.0");
        assert!(matches!(RuleSet::from_yaml(&yaml), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_load_missing_file_is_configuration_error() {
        let err = RuleSet::load("/nonexistent/rules.yaml").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules.yaml");
        std::fs::write(&path, OVERLAY).unwrap();
        let set = RuleSet::load(&path).unwrap();
        assert_eq!(set.name, "finance-overlay");
    }
}
