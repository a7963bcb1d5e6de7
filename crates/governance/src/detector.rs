//! Violation detection over prompt/response pairs.
//!
//! The detector lower-cases the concatenated exchange and runs every category
//! rule independently:
//! - the first matching trigger within a category wins
//! - a category contributes at most one violation
//! - categories without a match contribute nothing

use regex::Regex;

use llm_governor_core::{Error, Result, Violation, ViolationType};

use crate::rules::{CategoryRule, RuleSet, Trigger};

/// A category rule with its triggers compiled.
struct CompiledRule {
    category: ViolationType,
    description: String,
    severity: f64,
    confidence: f64,
    regulatory_framework: String,
    triggers: Vec<(String, Regex)>,
}

impl CompiledRule {
    fn compile(rule: &CategoryRule) -> Result<Self> {
        let triggers = rule
            .triggers
            .iter()
            .map(|t| compile_trigger(t).map(|re| (t.label().to_string(), re)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            category: rule.category.clone(),
            description: rule.description.clone(),
            severity: rule.severity,
            confidence: rule.confidence,
            regulatory_framework: rule.regulatory_framework.clone(),
            triggers,
        })
    }

    fn scan(&self, text: &str) -> Option<Violation> {
        let (label, _) = self.triggers.iter().find(|(_, re)| re.is_match(text))?;
        Some(Violation {
            violation_type: self.category.clone(),
            description: self.description.clone(),
            reason: format!("Matched {} trigger '{}'", self.category, label),
            severity: self.severity,
            confidence: self.confidence,
            regulatory_framework: self.regulatory_framework.clone(),
            resolved: false,
        })
    }
}

fn compile_trigger(trigger: &Trigger) -> Result<Regex> {
    let source = match trigger {
        Trigger::Phrase { phrase } => phrase_pattern(phrase),
        Trigger::Pattern { pattern, .. } => pattern.clone(),
    };
    Regex::new(&source).map_err(|e| {
        Error::configuration(format!("invalid trigger '{}': {}", trigger.label(), e))
    })
}

/// Phrases match as plain substrings of the lower-cased text.
fn phrase_pattern(phrase: &str) -> String {
    regex::escape(&phrase.trim().to_lowercase())
}

/// Table-driven violation detector.
pub struct ViolationDetector {
    rules: Vec<CompiledRule>,
}

impl ViolationDetector {
    /// Create a detector from the built-in rule table.
    pub fn new() -> Self {
        Self::from_rules(&RuleSet::builtin()).expect("built-in rule table compiles")
    }

    /// Compile a detector from a rule set.
    pub fn from_rules(set: &RuleSet) -> Result<Self> {
        set.validate()?;
        let rules = set
            .rules
            .iter()
            .map(CompiledRule::compile)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Detect violations in a prompt/response pair. Never fails.
    pub fn detect(&self, prompt: &str, response: &str) -> Vec<Violation> {
        let text = format!("{}\n{}", prompt, response).to_lowercase();
        self.rules.iter().filter_map(|rule| rule.scan(&text)).collect()
    }

    /// Categories this detector evaluates, in evaluation order.
    pub fn categories(&self) -> Vec<ViolationType> {
        self.rules.iter().map(|r| r.category.clone()).collect()
    }
}

impl Default for ViolationDetector {
    fn default() -> Self {
        Self::new()
    }
}
