// src/prompt.rs
//! Prompt composer: turns the aggregated feeds into one bounded, deterministic prompt.
//!
//! Section order is fixed (market overview, indices, legislative trades, insider trades,
//! filings, prediction markets) so identical inputs give byte-identical prompts.
//! Each embedded JSON section is cut to [`SECTION_CHAR_BUDGET`] characters without
//! any marker; that truncation is policy, not an error.

use chrono::NaiveDate;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::ingest::types::{AggregatedContext, Record, SourceCounts, SourceId};
use crate::ingest::watchlist::WatchList;

/// Character ceiling for each embedded JSON section.
pub const SECTION_CHAR_BUDGET: usize = 3000;

/// Prediction markets embedded in the prompt.
pub const PREDICTION_MARKET_LIMIT: usize = 5;

/// Closed set of per-symbol recommendation tags the model may use.
pub const RECOMMENDATION_TAGS: [&str; 4] = ["BUY", "HOLD", "SELL", "WATCH"];

pub const SYSTEM_INSTRUCTION: &str = "You are a professional investment analyst who specializes in \
market data, insider-trading signals and prediction markets. Your analysis is objective, \
professional and backed by the data provided.";

const INSTRUCTIONS: &str = "\
Produce a structured trading brief with the following sections:

1. **Executive Summary** - the 3-5 most important findings today
2. **Market Overview** - index performance and market sentiment
3. **Signal Analysis** - what the congressional trades, insider trades and filings suggest
4. **Recommendations** - one line per watch-list symbol tagged BUY, HOLD, SELL or WATCH
5. **Risk Alerts** - risk factors to keep an eye on
6. **Prediction Market Insights** - interpretation of the prediction-market odds
7. **Tomorrow's Watch** - events and data to follow tomorrow

Use Markdown with `##` section headings. Keep the analysis professional, objective and data-driven.";

/// The composed request text plus what the generator needs if it has to fall back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
    pub as_of: NaiveDate,
    pub source_counts: SourceCounts,
}

impl Prompt {
    /// Hex SHA-256 of system + user text.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.system.as_bytes());
        hasher.update([0u8]);
        hasher.update(self.user.as_bytes());
        let out = hasher.finalize();
        let mut s = String::with_capacity(64);
        for b in out.iter() {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{b:02x}");
        }
        s
    }
}

pub fn compose(context: &AggregatedContext, watchlist: &WatchList, as_of: NaiveDate) -> Prompt {
    let market = context.get(SourceId::MarketData);
    let congress = context.get(SourceId::CongressTrades);
    let insider = context.get(SourceId::InsiderTrades);
    let filings = context.get(SourceId::SecFilings);
    let polymarket = context.get(SourceId::Polymarket);

    let watched: Vec<&str> = watchlist.tickers.iter().map(String::as_str).collect();
    let indices = market
        .extras
        .get("indices")
        .cloned()
        .unwrap_or_else(|| Value::Object(Record::new()));

    let sections = [
        ("Market Data", records_json(&market.records, watchlist, None)),
        ("Major Indices", bounded_json(&indices)),
        (
            "Congressional Trades",
            records_json(&congress.records, watchlist, None),
        ),
        ("Insider Trades", records_json(&insider.records, watchlist, None)),
        ("SEC Filings", records_json(&filings.records, watchlist, None)),
        (
            "Prediction Markets",
            records_json(&polymarket.records, watchlist, Some(PREDICTION_MARKET_LIMIT)),
        ),
    ];

    let mut user = String::with_capacity(SECTION_CHAR_BUDGET * sections.len() + 2048);
    user.push_str("You are a professional investment analyst. Write a detailed daily trading brief based on the data below.\n\n");
    user.push_str(&format!("## Date\n{}\n\n", as_of.format("%Y-%m-%d")));
    user.push_str(&format!(
        "## Watch List\n{}\n\n",
        serde_json::to_string(&watched).unwrap_or_else(|_| "[]".to_string())
    ));
    for (title, body) in sections.iter() {
        user.push_str(&format!("## {title}\n{body}\n\n"));
    }
    user.push_str("---\n\n");
    user.push_str(INSTRUCTIONS);
    user.push('\n');

    Prompt {
        system: SYSTEM_INSTRUCTION.to_string(),
        user,
        as_of,
        source_counts: context.source_counts(),
    }
}

/// Records kept for the prompt: watch-list filtered, optionally capped, serialized, bounded.
fn records_json(records: &[Record], watchlist: &WatchList, limit: Option<usize>) -> String {
    let kept: Vec<&Record> = records
        .iter()
        .filter(|r| symbol_of(r).map_or(true, |s| watchlist.admits(s)))
        .take(limit.unwrap_or(usize::MAX))
        .collect();
    bounded_json(&kept)
}

fn symbol_of(record: &Record) -> Option<&str> {
    record
        .get("ticker")
        .or_else(|| record.get("symbol"))
        .and_then(Value::as_str)
}

fn bounded_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    let full = serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string());
    truncate_chars(&full, SECTION_CHAR_BUDGET)
}

/// Cut to at most `max` characters on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
