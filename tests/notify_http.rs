// tests/notify_http.rs
// Channel senders against a local mock server.

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use serde_json::json;
use trade_brief::config::{NotifyConfig, TelegramConfig, WebhookConfig};
use trade_brief::notify::discord::DiscordNotifier;
use trade_brief::notify::{BriefNotice, Channel, ChannelOutcome, Notifier, NotifierMux};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn notice() -> BriefNotice {
    BriefNotice {
        date: NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
        summary: "- Markets calm\n- **NVDA** in focus".into(),
        url: "https://example.test/brief/".into(),
        sent_at: Utc::now(),
    }
}

fn notify_config(server: &MockServer) -> NotifyConfig {
    NotifyConfig {
        timeout_secs: 5,
        telegram: Some(TelegramConfig {
            bot_token: "TOKEN".into(),
            chat_id: "42".into(),
            api_base: server.uri(),
        }),
        discord: Some(WebhookConfig {
            webhook_url: format!("{}/discord", server.uri()),
        }),
        slack: Some(WebhookConfig {
            webhook_url: format!("{}/slack", server.uri()),
        }),
        ..Default::default()
    }
}

#[tokio::test]
async fn every_configured_channel_receives_one_post() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/botTOKEN/sendMessage"))
        .and(body_partial_json(json!({"chat_id": "42", "parse_mode": "Markdown"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discord"))
        .and(body_partial_json(json!({"embeds": [{"color": 5814783}]})))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/slack"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let mux = NotifierMux::from_config(&notify_config(&server));
    assert_eq!(
        mux.channels(),
        vec![Channel::Telegram, Channel::Discord, Channel::Slack]
    );
    let report = mux.notify(&notice()).await;
    assert_eq!(report.delivered(), 3);
    assert_eq!(report.outcome(Channel::Email), &ChannelOutcome::NotConfigured);
}

#[tokio::test]
async fn one_failing_webhook_is_reported_not_raised() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/discord"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1) // single attempt, no retry
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let report = NotifierMux::from_config(&notify_config(&server))
        .notify(&notice())
        .await;
    assert!(matches!(
        report.outcome(Channel::Discord),
        ChannelOutcome::Failed(_)
    ));
    assert_eq!(report.outcome(Channel::Slack), &ChannelOutcome::Delivered);
    assert_eq!(report.outcome(Channel::Telegram), &ChannelOutcome::Delivered);
}

#[tokio::test]
async fn discord_payload_links_to_site() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    DiscordNotifier::new(&server.uri(), Duration::from_secs(5))
        .send(&notice())
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let embed = &body["embeds"][0];
    assert_eq!(embed["title"], "Daily Trading Brief - 2026-01-02");
    assert_eq!(embed["fields"][0]["value"], "[Open](https://example.test/brief/)");
}
