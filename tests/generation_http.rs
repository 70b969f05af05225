// tests/generation_http.rs
// Chat-completions provider against a local mock server.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;
use trade_brief::config::GenerationConfig;
use trade_brief::generate::provider::ChatCompletionsProvider;
use trade_brief::generate::{Narrative, NarrativeGenerator};
use trade_brief::ingest::types::AggregatedContext;
use trade_brief::ingest::watchlist::WatchList;
use trade_brief::prompt::{self, Prompt};
use trade_brief::GenerationFailure;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config(server: &MockServer) -> GenerationConfig {
    GenerationConfig {
        base_url: Some(server.uri()),
        api_key: "sk-test".into(),
        timeout_secs: 5,
        ..Default::default()
    }
}

fn prompt() -> Prompt {
    prompt::compose(
        &AggregatedContext::default(),
        &WatchList::default(),
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
    )
}

async fn generate(cfg: &GenerationConfig) -> Narrative {
    NarrativeGenerator::new(Arc::new(ChatCompletionsProvider::new(cfg)), cfg)
        .generate(&prompt())
        .await
}

#[tokio::test]
async fn success_returns_generated_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "deepseek-chat",
            "max_tokens": 4000
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"role": "assistant", "content": "  ## Executive Summary\n\nCalm.  "}}]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let n = generate(&config(&server)).await;
    assert_eq!(
        n,
        Narrative::Generated {
            body: "## Executive Summary\n\nCalm.".into(),
            provider: "deepseek",
        }
    );
}

#[tokio::test]
async fn request_carries_system_and_user_messages() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "ok"}}]
        })))
        .mount(&server)
        .await;

    generate(&config(&server)).await;

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["role"], "user");
    assert!(body["messages"][1]["content"]
        .as_str()
        .unwrap()
        .contains("2026-01-02"));
}

#[tokio::test]
async fn server_error_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream exploded"))
        .mount(&server)
        .await;

    let n = generate(&config(&server)).await;
    match n {
        Narrative::Fallback { body, reason } => {
            assert_eq!(
                reason,
                GenerationFailure::Status {
                    code: 500,
                    body: "upstream exploded".into()
                }
            );
            assert!(body.contains("Collected data for 0 stocks."));
            assert!(body.contains("HTTP 500"));
        }
        other => panic!("expected fallback, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_and_malformed_completions_fall_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{"message": {"content": "   "}}]
        })))
        .mount(&server)
        .await;
    assert!(matches!(
        generate(&config(&server)).await,
        Narrative::Fallback { reason: GenerationFailure::Empty, .. }
    ));

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .mount(&server)
        .await;
    assert!(matches!(
        generate(&config(&server)).await,
        Narrative::Fallback { reason: GenerationFailure::Malformed(_), .. }
    ));
}

#[tokio::test]
async fn missing_key_never_hits_the_network() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cfg = GenerationConfig {
        api_key: String::new(),
        ..config(&server)
    };
    assert!(matches!(
        generate(&cfg).await,
        Narrative::Fallback { reason: GenerationFailure::MissingApiKey(_), .. }
    ));
}
