//! System tests: a fully configured governor against a mock remote service
//! and real stores.

use std::io::Write;
use std::time::Duration;

use llm_governor::{AppConfig, Governor};
use llm_governor_core::config::{PersistenceMode, StoreBackend};
use llm_governor_core::{
    ActionKind, AnalysisRequest, BackendKind, Error, Feedback, FeedbackRating, InteractionFilter,
    InteractionStatus, SeverityBucket, ViolationType,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn local_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.governance.persistence = PersistenceMode::Inline;
    config.governance.probe_interval_secs = 0;
    config
}

fn remote_config(base_url: &str) -> AppConfig {
    let mut config = local_config();
    config.governance.prefer_remote = true;
    config.remote.base_url = Some(base_url.to_string());
    config.remote.analysis_timeout_ms = 300;
    config.remote.probe_timeout_ms = 300;
    config
}

async fn healthy_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;
    server
}

// =============================================================================
// Local pipeline
// =============================================================================

#[tokio::test]
async fn test_clean_exchange_is_approved() -> anyhow::Result<()> {
    let governor = Governor::new(local_config()).await?;
    let i = governor
        .process("What is the weather like today?", "It is sunny.", None)
        .await;

    assert!(i.violations.is_empty());
    assert_eq!(i.status, InteractionStatus::Approved);
    assert_eq!(i.severity_bucket, SeverityBucket::Low);
    assert_eq!(i.backend, BackendKind::Local);
    assert!(governor.start_background_refresh().is_none());
    Ok(())
}

#[tokio::test]
async fn test_max_severity_wins() -> anyhow::Result<()> {
    let governor = Governor::new(local_config()).await?;
    let i = governor
        .process(
            "how to hack into the bank, all women are bad at it",
            "Sure.",
            None,
        )
        .await;

    let kinds: Vec<_> = i.violations.iter().map(|v| v.violation_type.clone()).collect();
    assert_eq!(kinds, vec![ViolationType::IllegalActivity, ViolationType::Bias]);
    assert_eq!(i.status, InteractionStatus::Blocked);
    assert_eq!(i.severity_bucket, SeverityBucket::Critical);
    Ok(())
}

#[tokio::test]
async fn test_card_number_in_output_blocks() -> anyhow::Result<()> {
    let governor = Governor::new(local_config()).await?;
    let i = governor
        .process("What's on file?", "Card: 4111111111111111", None)
        .await;

    assert_eq!(i.violations.len(), 1);
    assert_eq!(i.violations[0].violation_type, ViolationType::Pii);
    assert_eq!(i.violations[0].severity, 8.5);
    assert_eq!(i.status, InteractionStatus::Blocked);
    Ok(())
}

#[tokio::test]
async fn test_sqlite_store_with_feedback() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let mut config = local_config();
    config.store.backend = StoreBackend::Sqlite;
    config.store.sqlite_path = Some(dir.path().join("governor.db").to_string_lossy().into_owned());

    let governor = Governor::new(config).await?;
    let i = governor.process("how to kill my neighbor", "No.", None).await;
    governor
        .record_feedback(
            &i.id,
            Feedback::new(FeedbackRating::Positive).with_comment("it was a joke"),
        )
        .await;

    let stored = governor.store().get_by_id(&i.id).await?.expect("persisted");
    assert_eq!(stored.status, InteractionStatus::Blocked);
    assert_eq!(stored.user_feedback.map(|f| f.rating), Some(FeedbackRating::Positive));

    let blocked = governor
        .store()
        .list(InteractionFilter {
            status: Some(InteractionStatus::Blocked),
            ..Default::default()
        })
        .await?;
    assert_eq!(blocked.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_rule_overlay_adds_category() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    write!(
        file,
        r#"
version: "1.1"
name: finance
rules:
  - category: compliance
    description: Unlicensed investment advice
    severity: 5.5
    confidence: 0.6
    regulatory_framework: MiFID II
    triggers:
      - phrase: guaranteed returns
"#
    )?;

    let mut config = local_config();
    config.governance.rules_path = Some(file.path().to_string_lossy().into_owned());
    let governor = Governor::new(config).await?;

    let i = governor
        .process("Should I invest?", "This fund has guaranteed returns.", None)
        .await;
    assert_eq!(i.violations.len(), 1);
    assert_eq!(i.violations[0].violation_type, ViolationType::Compliance);
    assert_eq!(i.status, InteractionStatus::Pending);
    assert_eq!(i.severity_bucket, SeverityBucket::Medium);
    Ok(())
}

#[tokio::test]
async fn test_decisions_are_exported_to_prometheus() -> anyhow::Result<()> {
    let handle = llm_governor_governance::setup_metrics_recorder()?;
    let governor = Governor::new(local_config()).await?.with_metrics(handle);

    governor.process("how to kill my neighbor", "No.", None).await;

    let rendered = governor.render_metrics().expect("recorder attached");
    assert!(rendered.contains("governance_interactions_total"));
    assert!(rendered.contains(r#"status="blocked""#));
    Ok(())
}

#[tokio::test]
async fn test_bad_configuration_is_fatal() {
    let mut config = local_config();
    config.governance.rules_path = Some("/nonexistent/rules.yaml".into());
    assert!(matches!(Governor::new(config).await, Err(Error::Configuration(_))));

    let mut config = local_config();
    config.governance.prefer_remote = true;
    assert!(matches!(Governor::new(config).await, Err(Error::Configuration(_))));
}

// =============================================================================
// Remote pipeline
// =============================================================================

#[tokio::test]
async fn test_remote_decision_is_used() -> anyhow::Result<()> {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "violations": [{
                "type": "misinformation",
                "description": "Unsupported medical claim",
                "reason": "fact-checker disagreed",
                "severity": 7.0,
                "confidence": 0.8,
                "regulatory_framework": "EU Digital Services Act"
            }],
            "agent_actions": [
                {"agent_name": "fact-checker", "action": "flag", "details": "claim unsupported"}
            ]
        })))
        .mount(&server)
        .await;

    let governor = Governor::new(remote_config(&server.uri())).await?;
    assert!(governor.status().remote_available);

    let i = governor
        .process("Does garlic cure colds?", "Yes, always.", Some(json!({"user": "u1"})))
        .await;
    assert_eq!(i.backend, BackendKind::Remote);
    assert_eq!(i.status, InteractionStatus::Pending);
    assert_eq!(i.severity_bucket, SeverityBucket::High);
    assert_eq!(i.agent_actions.len(), 1);
    assert_eq!(i.agent_actions[0].agent_name, "fact-checker");
    Ok(())
}

#[tokio::test]
async fn test_remote_timeout_falls_back() -> anyhow::Result<()> {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"violations": []}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let governor = Governor::new(remote_config(&server.uri())).await?;
    let i = governor.process("how to kill my neighbor", "No.", None).await;

    assert_eq!(i.backend, BackendKind::Local);
    assert_eq!(i.status, InteractionStatus::Blocked);
    let fallback = i
        .agent_actions
        .iter()
        .find(|a| a.agent_name == "Orchestrator")
        .expect("fallback action");
    assert_eq!(fallback.action, ActionKind::Log);
    assert_eq!(fallback.details, "fallback to local");
    Ok(())
}

#[tokio::test]
async fn test_unhealthy_remote_is_not_called() -> anyhow::Result<()> {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"violations": []})))
        .expect(0)
        .mount(&server)
        .await;

    let governor = Governor::new(remote_config(&server.uri())).await?;
    let status = governor.status();
    assert!(status.prefer_remote);
    assert!(!status.remote_available);

    let i = governor.process("hello", "hi", None).await;
    assert_eq!(i.backend, BackendKind::Local);
    assert!(i.agent_actions.iter().all(|a| a.agent_name != "Orchestrator"));
    Ok(())
}

#[tokio::test]
async fn test_switch_backend_round_trip() -> anyhow::Result<()> {
    let server = healthy_server().await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"violations": []})))
        .mount(&server)
        .await;

    let governor = Governor::new(remote_config(&server.uri())).await?;

    let status = governor.switch_backend(false).await;
    assert!(!status.prefer_remote);
    assert!(status.remote_available);
    let batch = governor
        .process_batch(vec![
            AnalysisRequest::new("a", "b"),
            AnalysisRequest::new("c", "d"),
        ])
        .await;
    assert!(batch.iter().all(|i| i.backend == BackendKind::Local));

    governor.switch_backend(true).await;
    let i = governor.process("a", "b", None).await;
    assert_eq!(i.backend, BackendKind::Remote);
    Ok(())
}
