// src/generate/provider.rs
//! Text-generation providers: OpenAI-compatible chat completions (DeepSeek, OpenAI),
//! a disabled stand-in and a fixed mock.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::ai::{GenerationConfig, PROVIDER_DEEPSEEK, PROVIDER_MOCK, PROVIDER_OPENAI};
use crate::error::GenerationFailure;

/// What goes over the wire, independent of provider.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub system: &'a str,
    pub prompt: &'a str,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// One synchronous-from-the-caller's-view call; no retries.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, GenerationFailure>;

    /// Provider name for logs and metrics.
    fn name(&self) -> &'static str;
}

pub type DynGenerator = Arc<dyn TextGenerator>;

/// Build the provider named in config.
///
/// * `enabled == false` gives [`DisabledGenerator`].
/// * `"mock"` gives a [`MockGenerator`] with a canned brief.
/// * `"deepseek"` / `"openai"` give a [`ChatCompletionsProvider`].
pub fn build_generator(config: &GenerationConfig) -> DynGenerator {
    if !config.enabled {
        return Arc::new(DisabledGenerator);
    }
    match config.provider.as_str() {
        PROVIDER_MOCK => Arc::new(MockGenerator::canned()),
        PROVIDER_DEEPSEEK | PROVIDER_OPENAI => Arc::new(ChatCompletionsProvider::new(config)),
        other => {
            tracing::warn!(provider = other, "unknown generation provider, generation disabled");
            Arc::new(DisabledGenerator)
        }
    }
}

/// OpenAI-compatible `/chat/completions` client.
pub struct ChatCompletionsProvider {
    http: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    name: &'static str,
}

impl ChatCompletionsProvider {
    pub fn new(config: &GenerationConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trade-brief/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "reqwest builder failed, using default client");
                reqwest::Client::new()
            });
        let name = if config.provider == PROVIDER_OPENAI {
            PROVIDER_OPENAI
        } else {
            PROVIDER_DEEPSEEK
        };
        Self {
            http,
            endpoint: format!("{}/chat/completions", config.effective_base_url()),
            api_key: config.resolved_api_key().map(str::to_string),
            model: config.model.clone(),
            name,
        }
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMsg,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl TextGenerator for ChatCompletionsProvider {
    async fn complete(&self, request: &CompletionRequest<'_>) -> Result<String, GenerationFailure> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(GenerationFailure::MissingApiKey(self.name.to_string()));
        };

        let req = Req {
            model: &self.model,
            messages: vec![
                Msg {
                    role: "system",
                    content: request.system,
                },
                Msg {
                    role: "user",
                    content: request.prompt,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&req)
            .send()
            .await
            .map_err(|e| GenerationFailure::Transport(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GenerationFailure::Status {
                code: status.as_u16(),
                body: crate::prompt::truncate_chars(body.trim(), 300),
            });
        }

        let body: Resp = resp
            .json()
            .await
            .map_err(|e| GenerationFailure::Malformed(e.to_string()))?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        let content = content.trim();
        if content.is_empty() {
            Err(GenerationFailure::Empty)
        } else {
            Ok(content.to_string())
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

/// Always fails with [`GenerationFailure::Disabled`].
pub struct DisabledGenerator;

#[async_trait]
impl TextGenerator for DisabledGenerator {
    async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, GenerationFailure> {
        Err(GenerationFailure::Disabled)
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Returns a fixed outcome; for tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockGenerator {
    pub outcome: Result<String, GenerationFailure>,
}

impl MockGenerator {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            outcome: Ok(body.into()),
        }
    }

    pub fn failing(failure: GenerationFailure) -> Self {
        Self {
            outcome: Err(failure),
        }
    }

    pub fn canned() -> Self {
        Self::ok(
            "# Daily Trading Brief\n\n\
             ## Executive Summary\n\n\
             - Offline run: narrative produced by the mock provider.\n\n\
             ## Recommendations\n\n\
             - **WATCH** all symbols until live generation is configured.",
        )
    }
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<String, GenerationFailure> {
        self.outcome.clone()
    }

    fn name(&self) -> &'static str {
        PROVIDER_MOCK
    }
}
