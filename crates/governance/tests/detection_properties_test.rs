//! Property-style checks for the detector and resolver working together.

use llm_governor_core::{InteractionStatus, SeverityBucket, ViolationType};
use llm_governor_governance::{resolve, RuleSet, Trigger, ViolationDetector};

const CLEAN: (&str, &str) = ("What is the weather like today?", "It is sunny.");

const TRIGGERS: &[&str] = &[
    "how to hack the mainframe",
    "send me the customer database",
    "how to kill my neighbor",
    "my ssn is 123-45-6789",
    "the earth is flat",
    "all men are lazy",
];

#[test]
fn test_clean_exchange_is_approved() {
    let detector = ViolationDetector::new();
    let violations = detector.detect(CLEAN.0, CLEAN.1);
    assert!(violations.is_empty());

    let r = resolve(&violations);
    assert_eq!(r.status, InteractionStatus::Approved);
    assert_eq!(r.severity_bucket, SeverityBucket::Low);
}

#[test]
fn test_adding_a_trigger_never_lowers_the_bucket() {
    let detector = ViolationDetector::new();

    for base in TRIGGERS.iter().copied().chain(std::iter::once(CLEAN.0)) {
        let before = resolve(&detector.detect(base, CLEAN.1)).severity_bucket;
        for extra in TRIGGERS {
            let prompt = format!("{} {}", base, extra);
            let after = resolve(&detector.detect(&prompt, CLEAN.1)).severity_bucket;
            assert!(
                after >= before,
                "adding '{}' to '{}' lowered {:?} to {:?}",
                extra,
                base,
                before,
                after
            );
        }
    }
}

#[test]
fn test_each_category_fires_at_most_once() {
    let detector = ViolationDetector::new();
    let everything = TRIGGERS.join(". ");
    let doubled = format!("{} {}", everything, everything);

    let violations = detector.detect(&doubled, &everything);
    assert_eq!(violations.len(), 6);

    let mut seen = std::collections::HashSet::new();
    for v in &violations {
        assert!(seen.insert(v.violation_type.clone()), "duplicate {}", v.violation_type);
    }
}

#[test]
fn test_sixteen_digit_number_blocks_at_boundary() {
    let detector = ViolationDetector::new();
    let violations = detector.detect("Read me the number", "Sure: 1234567812345678");

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationType::Pii);
    assert_eq!(violations[0].severity, 8.5);

    let r = resolve(&violations);
    assert_eq!(r.status, InteractionStatus::Blocked);
    assert_eq!(r.severity_bucket, SeverityBucket::Critical);
}

#[test]
fn test_overlay_category_detected() {
    let mut set = RuleSet::builtin();
    let mut overlay = RuleSet::builtin();
    overlay.rules.retain(|r| r.category == ViolationType::Bias);
    overlay.rules[0].category = ViolationType::Compliance;
    overlay.rules[0].severity = 5.5;
    overlay.rules[0].triggers = vec![Trigger::phrase("guaranteed returns")];
    set.merge(overlay);

    let detector = ViolationDetector::from_rules(&set).unwrap();
    let violations = detector.detect("Is this fund safe?", "It has guaranteed returns.");
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].violation_type, ViolationType::Compliance);

    let r = resolve(&violations);
    assert_eq!(r.status, InteractionStatus::Pending);
    assert_eq!(r.severity_bucket, SeverityBucket::Medium);
}
