// src/generate/mod.rs
//! Narrative generator: one call to the text-generation service, and a deterministic
//! fallback body when that call fails.

pub mod provider;

use std::time::Instant;

use metrics::{counter, histogram};

use crate::config::GenerationConfig;
use crate::error::{BriefError, GenerationFailure};
use crate::ingest::types::{SourceCounts, SourceId};
use crate::prompt::Prompt;
use provider::{build_generator, CompletionRequest, DynGenerator};

/// Outcome of one generation attempt. Callers match on the variant rather than
/// inspecting the body for sentinel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Narrative {
    Generated {
        body: String,
        provider: &'static str,
    },
    Fallback {
        body: String,
        reason: GenerationFailure,
    },
}

impl Narrative {
    pub fn body(&self) -> &str {
        match self {
            Narrative::Generated { body, .. } | Narrative::Fallback { body, .. } => body,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Narrative::Fallback { .. })
    }

    /// The error the fallback stands in for; `None` for a generated body.
    pub fn error(&self) -> Option<BriefError> {
        match self {
            Narrative::Generated { .. } => None,
            Narrative::Fallback { reason, .. } => {
                Some(BriefError::from(reason.clone()))
            }
        }
    }

    /// `(body, is_fallback)`
    pub fn into_parts(self) -> (String, bool) {
        match self {
            Narrative::Generated { body, .. } => (body, false),
            Narrative::Fallback { body, .. } => (body, true),
        }
    }
}

pub struct NarrativeGenerator {
    generator: DynGenerator,
    max_tokens: u32,
    temperature: f32,
}

impl NarrativeGenerator {
    pub fn new(generator: DynGenerator, config: &GenerationConfig) -> Self {
        Self {
            generator,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        }
    }

    pub fn from_config(config: &GenerationConfig) -> Self {
        Self::new(build_generator(config), config)
    }

    pub fn provider_name(&self) -> &'static str {
        self.generator.name()
    }

    /// Never fails: a failed call becomes [`Narrative::Fallback`].
    pub async fn generate(&self, prompt: &Prompt) -> Narrative {
        let request = CompletionRequest {
            system: &prompt.system,
            prompt: &prompt.user,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        };
        let provider = self.generator.name();
        let t0 = Instant::now();
        let result = self.generator.complete(&request).await;
        histogram!("brief_generation_ms", "provider" => provider)
            .record(t0.elapsed().as_secs_f64() * 1000.0);

        match result {
            Ok(body) => {
                tracing::info!(provider, chars = body.chars().count(), "narrative generated");
                counter!("brief_generation_total", "outcome" => "generated").increment(1);
                Narrative::Generated { body, provider }
            }
            Err(reason) => {
                counter!("brief_generation_total", "outcome" => reason.kind()).increment(1);
                let body = fallback_body(&prompt.source_counts, &reason, prompt.as_of);
                let narrative = Narrative::Fallback { body, reason };
                if let Some(err) = narrative.error() {
                    tracing::warn!(provider, error = %err, "writing fallback brief");
                }
                narrative
            }
        }
    }
}

/// Fixed template reporting raw per-source counts and the failure reason.
pub fn fallback_body(
    counts: &SourceCounts,
    reason: &GenerationFailure,
    as_of: chrono::NaiveDate,
) -> String {
    let mut out = String::new();
    out.push_str("# Daily Trading Brief\n\n");
    out.push_str(&format!("**Date**: {}\n\n", as_of.format("%Y-%m-%d")));
    out.push_str("## Notice\n\n");
    out.push_str("Narrative generation failed, so this brief only summarizes the raw data.\n\n");
    out.push_str(&format!("**Error**: {reason}\n\n"));
    out.push_str("## Raw Data Summary\n\n");
    for id in SourceId::ALL {
        let n = counts.get(id);
        let line = match id {
            SourceId::MarketData => format!("Collected data for {n} stocks."),
            SourceId::CongressTrades => format!("Found {n} congressional trades."),
            SourceId::InsiderTrades => format!("Found {n} insider trades."),
            SourceId::SecFilings => format!("Found {n} SEC filings."),
            SourceId::Polymarket => format!("Tracking {n} prediction markets."),
        };
        out.push_str(&format!("### {}\n\n{line}\n\n", id.label()));
    }
    out.push_str("*Check the generation API key configuration and run again.*");
    out
}
