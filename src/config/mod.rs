// src/config/mod.rs
//! Explicit run configuration. Loaded once from TOML, then overlaid with secrets
//! from the environment; components receive their section at construction.

pub mod ai;

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::BriefError;
pub use ai::GenerationConfig;

pub const DEFAULT_CONFIG_PATH: &str = "config/brief.toml";
pub const ENV_CONFIG_PATH: &str = "BRIEF_CONFIG_PATH";

/// Shown in notifications when no public site URL is configured.
pub const PLACEHOLDER_PUBLIC_URL: &str = "https://YOUR_USERNAME.github.io/trades-agent/";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub generation: GenerationConfig,
    pub site: SiteConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the collectors' JSON snapshots.
    pub data_dir: PathBuf,
    pub watchlist: PathBuf,
    pub briefs_dir: PathBuf,
    pub site_dir: PathBuf,
    pub notification_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("trades/data"),
            watchlist: PathBuf::from("trades/config/watchlist.json"),
            briefs_dir: PathBuf::from("trades/output/briefs"),
            site_dir: PathBuf::from("docs"),
            notification_log: PathBuf::from("trades/data/notification_log.json"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiteConfig {
    pub title: String,
    /// Entries in the index page's archive list.
    pub archive_window: usize,
    pub public_url: Option<String>,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: "Trading Intelligence Dashboard".to_string(),
            archive_window: 10,
            public_url: None,
        }
    }
}

impl SiteConfig {
    pub fn public_url_or_placeholder(&self) -> &str {
        self.public_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .unwrap_or(PLACEHOLDER_PUBLIC_URL)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NotifyConfig {
    pub timeout_secs: u64,
    /// Max lines of the executive summary forwarded.
    pub summary_lines: usize,
    pub telegram: Option<TelegramConfig>,
    pub discord: Option<WebhookConfig>,
    pub slack: Option<WebhookConfig>,
    pub email: Option<EmailConfig>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            summary_lines: 10,
            telegram: None,
            discord: None,
            slack: None,
            email: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    #[serde(default = "default_telegram_api")]
    pub api_base: String,
}

fn default_telegram_api() -> String {
    "https://api.telegram.org".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WebhookConfig {
    pub webhook_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmailConfig {
    pub host: String,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: String,
}

impl AppConfig {
    /// Load using `$BRIEF_CONFIG_PATH`, else `config/brief.toml`, else defaults.
    pub fn load_default() -> Result<Self, BriefError> {
        let path = env::var(ENV_CONFIG_PATH)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));
        Self::load(&path)
    }

    /// A missing file means defaults; a present but invalid one is an error.
    pub fn load(path: &Path) -> Result<Self, BriefError> {
        let mut cfg = if path.exists() {
            let raw = fs::read_to_string(path)
                .map_err(|e| BriefError::Config(format!("reading {}: {e}", path.display())))?;
            Self::from_toml_str(&raw)
                .map_err(|e| BriefError::Config(format!("{}: {e}", path.display())))?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };
        cfg.apply_env();
        Ok(cfg)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, toml::de::Error> {
        let mut cfg: AppConfig = toml::from_str(raw)?;
        cfg.generation.sanitize();
        if cfg.site.archive_window == 0 {
            cfg.site.archive_window = SiteConfig::default().archive_window;
        }
        Ok(cfg)
    }

    /// Overlay secrets and deployment-specific values from the environment.
    /// This is the only place the crate reads process env for configuration.
    pub fn apply_env(&mut self) {
        self.generation.apply_env();

        if let Some(url) = env_nonempty("GITHUB_PAGES_URL") {
            self.site.public_url = Some(url);
        }

        if let (Some(bot_token), Some(chat_id)) =
            (env_nonempty("TELEGRAM_BOT_TOKEN"), env_nonempty("TELEGRAM_CHAT_ID"))
        {
            let api_base = self
                .notify
                .telegram
                .as_ref()
                .map(|t| t.api_base.clone())
                .unwrap_or_else(default_telegram_api);
            self.notify.telegram = Some(TelegramConfig {
                bot_token,
                chat_id,
                api_base,
            });
        }
        if let Some(webhook_url) = env_nonempty("DISCORD_WEBHOOK_URL") {
            self.notify.discord = Some(WebhookConfig { webhook_url });
        }
        if let Some(webhook_url) = env_nonempty("SLACK_WEBHOOK_URL") {
            self.notify.slack = Some(WebhookConfig { webhook_url });
        }
        if let (Some(host), Some(user), Some(pass), Some(from), Some(to)) = (
            env_nonempty("SMTP_HOST"),
            env_nonempty("SMTP_USER"),
            env_nonempty("SMTP_PASS"),
            env_nonempty("NOTIFY_EMAIL_FROM"),
            env_nonempty("NOTIFY_EMAIL_TO"),
        ) {
            self.notify.email = Some(EmailConfig {
                host,
                user,
                pass,
                from,
                to,
            });
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_is_all_defaults() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.site.archive_window, 10);
        assert_eq!(cfg.generation.max_tokens, 4000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let raw = r#"
[paths]
site_dir = "public"

[generation]
provider = "MOCK"
temperature = 0.3

[notify.discord]
webhook_url = "https://discord.example/hook"
"#;
        let cfg = AppConfig::from_toml_str(raw).unwrap();
        assert_eq!(cfg.paths.site_dir, PathBuf::from("public"));
        assert_eq!(cfg.paths.data_dir, PathBuf::from("trades/data"));
        assert_eq!(cfg.generation.provider, "mock");
        assert_eq!(cfg.generation.temperature, 0.3);
        assert!(cfg.notify.discord.is_some());
        assert!(cfg.notify.telegram.is_none());
    }

    #[test]
    fn invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("brief.toml");
        fs::write(&p, "[paths\nbroken").unwrap();
        assert!(matches!(AppConfig::load(&p), Err(BriefError::Config(_))));
    }

    #[test]
    fn placeholder_url_when_unset() {
        let site = SiteConfig::default();
        assert_eq!(site.public_url_or_placeholder(), PLACEHOLDER_PUBLIC_URL);
    }
}
