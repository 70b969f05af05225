// src/ingest/types.rs
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One opaque record as produced by an upstream collector.
pub type Record = Map<String, Value>;

/// The upstream feeds, in the order the prompt and front-matter present them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceId {
    MarketData,
    CongressTrades,
    InsiderTrades,
    SecFilings,
    Polymarket,
}

impl SourceId {
    pub const ALL: [SourceId; 5] = [
        SourceId::MarketData,
        SourceId::CongressTrades,
        SourceId::InsiderTrades,
        SourceId::SecFilings,
        SourceId::Polymarket,
    ];

    /// Stable key used in front-matter and metrics labels.
    pub fn key(self) -> &'static str {
        match self {
            SourceId::MarketData => "market_data",
            SourceId::CongressTrades => "congress_trades",
            SourceId::InsiderTrades => "insider_trades",
            SourceId::SecFilings => "sec_filings",
            SourceId::Polymarket => "polymarket",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.key() == key)
    }

    /// File name inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            SourceId::MarketData => "market_snapshot.json",
            SourceId::CongressTrades => "congress_trades.json",
            SourceId::InsiderTrades => "insider_trades.json",
            SourceId::SecFilings => "sec_filings.json",
            SourceId::Polymarket => "polymarket.json",
        }
    }

    /// Top-level key holding the records.
    pub fn records_key(self) -> &'static str {
        match self {
            SourceId::MarketData => "market_data",
            SourceId::CongressTrades | SourceId::InsiderTrades => "trades",
            SourceId::SecFilings => "filings",
            SourceId::Polymarket => "markets",
        }
    }

    /// What one record counts as ("12 stocks", "3 trades").
    pub fn unit(self) -> &'static str {
        match self {
            SourceId::MarketData => "stocks",
            SourceId::CongressTrades | SourceId::InsiderTrades => "trades",
            SourceId::SecFilings => "filings",
            SourceId::Polymarket => "markets",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SourceId::MarketData => "Market data",
            SourceId::CongressTrades => "Congressional trades",
            SourceId::InsiderTrades => "Insider trades",
            SourceId::SecFilings => "SEC filings",
            SourceId::Polymarket => "Prediction markets",
        }
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A timestamped capture of one feed. Read-only to this crate.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSnapshot {
    pub source: SourceId,
    pub retrieved_at: Option<DateTime<Utc>>,
    pub records: Vec<Record>,
    /// Top-level keys other than the records and bookkeeping fields
    /// (e.g. market `indices`).
    pub extras: Record,
}

impl SourceSnapshot {
    pub fn empty(source: SourceId) -> Self {
        Self {
            source,
            retrieved_at: None,
            records: Vec::new(),
            extras: Record::new(),
        }
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.extras.is_empty()
    }

    /// Build a snapshot from a collector's JSON document.
    ///
    /// Array-valued record keys keep their order; object-valued ones (market data keyed by
    /// ticker) become one record per key with the key injected as `symbol`.
    pub fn from_value(source: SourceId, value: Value) -> Result<Self, String> {
        let Value::Object(mut top) = value else {
            return Err("top-level JSON is not an object".to_string());
        };

        let retrieved_at = top
            .remove("timestamp")
            .and_then(|v| v.as_str().and_then(parse_timestamp));
        top.remove("total_count");

        let records = match top.remove(source.records_key()) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items
                .into_iter()
                .filter_map(|v| match v {
                    Value::Object(m) => Some(m),
                    _ => None,
                })
                .collect(),
            Some(Value::Object(keyed)) => keyed
                .into_iter()
                .map(|(symbol, v)| {
                    let mut rec = match v {
                        Value::Object(m) => m,
                        other => {
                            let mut m = Record::new();
                            m.insert("value".to_string(), other);
                            m
                        }
                    };
                    rec.entry("symbol".to_string())
                        .or_insert(Value::String(symbol));
                    rec
                })
                .collect(),
            Some(_) => {
                return Err(format!(
                    "`{}` is neither an array nor an object",
                    source.records_key()
                ))
            }
        };

        Ok(Self {
            source,
            retrieved_at,
            records,
            extras: top,
        })
    }
}

/// Accepts RFC 3339 or a naive ISO timestamp (treated as UTC).
pub(crate) fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|n| n.and_utc())
}

/// Per-run, in-memory view over all feeds. Never persisted.
#[derive(Debug, Clone, Default)]
pub struct AggregatedContext {
    snapshots: BTreeMap<SourceId, SourceSnapshot>,
}

impl AggregatedContext {
    pub fn insert(&mut self, snapshot: SourceSnapshot) {
        self.snapshots.insert(snapshot.source, snapshot);
    }

    /// Always returns a snapshot; feeds that were never loaded read as empty.
    pub fn get(&self, id: SourceId) -> std::borrow::Cow<'_, SourceSnapshot> {
        match self.snapshots.get(&id) {
            Some(s) => std::borrow::Cow::Borrowed(s),
            None => std::borrow::Cow::Owned(SourceSnapshot::empty(id)),
        }
    }

    pub fn source_counts(&self) -> SourceCounts {
        SourceCounts(
            SourceId::ALL
                .into_iter()
                .map(|id| (id, self.snapshots.get(&id).map_or(0, |s| s.record_count())))
                .collect(),
        )
    }
}

/// Record count per feed, always covering every [`SourceId`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceCounts(pub BTreeMap<SourceId, usize>);

impl SourceCounts {
    pub fn get(&self, id: SourceId) -> usize {
        self.0.get(&id).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SourceId, usize)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }
}

impl FromIterator<(SourceId, usize)> for SourceCounts {
    fn from_iter<T: IntoIterator<Item = (SourceId, usize)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
