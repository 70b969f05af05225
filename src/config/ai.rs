// src/config/ai.rs
use serde::{Deserialize, Serialize};
use std::env;

pub const PROVIDER_DEEPSEEK: &str = "deepseek";
pub const PROVIDER_OPENAI: &str = "openai";
pub const PROVIDER_MOCK: &str = "mock";

/// Marker meaning "read the key from the provider's env var".
pub const API_KEY_FROM_ENV: &str = "ENV";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    PROVIDER_DEEPSEEK.to_string()
}
fn default_model() -> String {
    "deepseek-chat".to_string()
}
fn default_api_key() -> String {
    API_KEY_FROM_ENV.to_string()
}
fn default_max_tokens() -> u32 {
    4000
}
fn default_temperature() -> f32 {
    0.7
}
fn default_timeout_secs() -> u64 {
    120
}

/// Text-generation service settings (`[generation]` table).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// "deepseek" | "openai" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Chat-completions base URL; provider default when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    /// Literal key, or "ENV" to read DEEPSEEK_API_KEY / OPENAI_API_KEY by provider.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            base_url: None,
            model: default_model(),
            api_key: default_api_key(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    /// Normalize provider casing and keep sampling parameters in range.
    pub fn sanitize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if !(0.0..=2.0).contains(&self.temperature) || self.temperature.is_nan() {
            self.temperature = default_temperature();
        }
        if self.max_tokens == 0 {
            self.max_tokens = default_max_tokens();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
    }

    /// Resolve an "ENV" key against the provider's env var. Missing is not an error
    /// here: generation falls back instead.
    pub fn apply_env(&mut self) {
        if !self.api_key.trim().eq_ignore_ascii_case(API_KEY_FROM_ENV) {
            return;
        }
        let var = match self.provider.as_str() {
            PROVIDER_DEEPSEEK => "DEEPSEEK_API_KEY",
            PROVIDER_OPENAI => "OPENAI_API_KEY",
            _ => return,
        };
        self.api_key = env::var(var).unwrap_or_default();
    }

    /// Key usable for a request, if any.
    pub fn resolved_api_key(&self) -> Option<&str> {
        let k = self.api_key.trim();
        if k.is_empty() || k.eq_ignore_ascii_case(API_KEY_FROM_ENV) {
            None
        } else {
            Some(k)
        }
    }

    pub fn effective_base_url(&self) -> String {
        if let Some(url) = self.base_url.as_deref().filter(|u| !u.trim().is_empty()) {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            PROVIDER_OPENAI => "https://api.openai.com/v1".to_string(),
            _ => "https://api.deepseek.com".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_clamps_and_normalizes() {
        let mut cfg = GenerationConfig {
            provider: " OpenAI ".into(),
            temperature: 7.5,
            max_tokens: 0,
            ..Default::default()
        };
        cfg.sanitize();
        assert_eq!(cfg.provider, "openai");
        assert_eq!(cfg.temperature, 0.7);
        assert_eq!(cfg.max_tokens, 4000);
        assert_eq!(cfg.effective_base_url(), "https://api.openai.com/v1");
    }

    #[test]
    fn env_marker_is_not_a_key() {
        let cfg = GenerationConfig::default();
        assert_eq!(cfg.resolved_api_key(), None);
        let cfg = GenerationConfig {
            api_key: "sk-test".into(),
            ..Default::default()
        };
        assert_eq!(cfg.resolved_api_key(), Some("sk-test"));
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let cfg = GenerationConfig {
            base_url: Some("http://127.0.0.1:9999/".into()),
            ..Default::default()
        };
        assert_eq!(cfg.effective_base_url(), "http://127.0.0.1:9999");
    }
}
