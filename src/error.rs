// src/error.rs
//! Error taxonomy shared by the pipeline stages.
//!
//! Only [`BriefError::StoreIo`] and [`BriefError::SiteIo`] are fatal for a run.
//! Everything else has a component-local recovery (empty snapshot, fallback
//! narrative, skipped file).

use std::fmt;
use std::path::PathBuf;

use crate::ingest::types::SourceId;

#[derive(Debug, thiserror::Error)]
pub enum BriefError {
    /// Feed file missing or not parseable. Recovered by the aggregator.
    #[error("source {feed} unavailable: {reason}")]
    SourceUnavailable { feed: SourceId, reason: String },

    /// Text-generation call failed. Recovered by the fallback narrative.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(#[from] GenerationFailure),

    #[error("store i/o failed at {path}: {source}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the generated site failed. Fatal for the publish step.
    #[error("site output failed at {path}: {source}")]
    SiteIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed document {path}: {reason}")]
    MalformedDocument { path: PathBuf, reason: String },

    #[error("config: {0}")]
    Config(String),
}

impl BriefError {
    pub(crate) fn store_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StoreIo {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn site_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::SiteIo {
            path: path.into(),
            source,
        }
    }
}

/// Tagged reason why the text-generation service produced nothing usable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationFailure {
    #[error("generation disabled in config")]
    Disabled,
    #[error("missing API key for provider {0}")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("provider returned HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("provider returned an empty completion")]
    Empty,
}

impl GenerationFailure {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::MissingApiKey(_) => "missing_api_key",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::Empty => "empty",
        }
    }
}

/// Construct the renderer passed through literally instead of converting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderWarningKind {
    /// `####` and deeper.
    DeepHeading,
    /// Opening ``` without a closing fence.
    UnclosedFence,
    /// `| a | b |` rows.
    Table,
    /// `1. item`
    OrderedList,
    /// `> quote`
    Blockquote,
}

/// Non-fatal note from the renderer. Never aborts rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderWarning {
    /// 1-based line number in the front-matter-stripped input.
    pub line: usize,
    pub kind: RenderWarningKind,
}

impl fmt::Display for RenderWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self.kind {
            RenderWarningKind::DeepHeading => "heading deeper than ###",
            RenderWarningKind::UnclosedFence => "unclosed code fence",
            RenderWarningKind::Table => "table row",
            RenderWarningKind::OrderedList => "ordered list item",
            RenderWarningKind::Blockquote => "blockquote",
        };
        write!(f, "line {}: {what} passed through as text", self.line)
    }
}
