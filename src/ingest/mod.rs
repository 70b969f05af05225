// src/ingest/mod.rs
//! Source aggregator: reads the collectors' JSON snapshots, fail-open.

pub mod market;
pub mod types;
pub mod watchlist;

use std::borrow::Cow;
use std::fs;
use std::path::Path;

use metrics::counter;

use crate::error::BriefError;
use crate::ingest::types::{AggregatedContext, SourceId, SourceSnapshot};

/// Strict single read of one feed. Used by [`load`]; exposed for diagnostics.
pub fn try_load(data_dir: &Path, id: SourceId) -> Result<SourceSnapshot, BriefError> {
    let path = data_dir.join(id.file_name());
    let raw = fs::read_to_string(&path).map_err(|e| BriefError::SourceUnavailable {
        feed: id,
        reason: format!("{}: {e}", path.display()),
    })?;
    let value: serde_json::Value = serde_json::from_str(&non_finite_to_null(&raw))
        .map_err(|e| BriefError::SourceUnavailable {
            feed: id,
            reason: format!("{}: {e}", path.display()),
        })?;
    SourceSnapshot::from_value(id, value)
        .map_err(|reason| BriefError::SourceUnavailable { feed: id, reason })
}

/// Collectors may emit bare `NaN` / `Infinity` / `-Infinity` for missing prices.
/// Those tokens are not JSON; read them as `null`. String contents are left alone.
fn non_finite_to_null(raw: &str) -> Cow<'_, str> {
    if !raw.contains("NaN") && !raw.contains("Infinity") {
        return Cow::Borrowed(raw);
    }
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut rest = raw;
    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

/// Best-effort read of one feed. Never fails: any read/parse error yields an empty snapshot.
pub fn load(data_dir: &Path, id: SourceId) -> SourceSnapshot {
    match try_load(data_dir, id) {
        Ok(snap) => {
            tracing::debug!(source = %id, records = snap.record_count(), "source loaded");
            snap
        }
        Err(e) => {
            tracing::warn!(source = %id, error = %e, "source unavailable, using empty snapshot");
            counter!("brief_source_unavailable_total", "source" => id.key()).increment(1);
            SourceSnapshot::empty(id)
        }
    }
}

/// Load every known feed into a fresh context.
pub fn load_all(data_dir: &Path) -> AggregatedContext {
    let mut ctx = AggregatedContext::default();
    for id in SourceId::ALL {
        ctx.insert(load(data_dir, id));
    }
    ctx
}
