// src/ingest/market.rs
//! Typed view over the market snapshot's `indices` block, used for summary cards.
//!
//! Collectors write `"N/A"` strings or `{"error": ..}` objects for quotes they could
//! not fetch; those read as `None` here instead of being carried around as text.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::types::{SourceId, SourceSnapshot};

pub const SP500: &str = "S&P 500";
pub const NASDAQ: &str = "NASDAQ";
pub const DOW_JONES: &str = "Dow Jones";
pub const VIX: &str = "VIX";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IndexQuote {
    pub price: Option<f64>,
    pub change_percent: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarketSummary {
    pub retrieved_at: Option<DateTime<Utc>>,
    pub indices: BTreeMap<String, IndexQuote>,
}

impl MarketSummary {
    pub fn from_snapshot(snapshot: &SourceSnapshot) -> Self {
        debug_assert_eq!(snapshot.source, SourceId::MarketData);
        let indices = match snapshot.extras.get("indices") {
            Some(Value::Object(map)) => map
                .iter()
                .map(|(name, v)| {
                    let q = IndexQuote {
                        price: v.get("price").and_then(as_number),
                        change_percent: v.get("change_percent").and_then(as_number),
                    };
                    (name.clone(), q)
                })
                .collect(),
            _ => BTreeMap::new(),
        };
        Self {
            retrieved_at: snapshot.retrieved_at,
            indices,
        }
    }

    pub fn index(&self, name: &str) -> IndexQuote {
        self.indices.get(name).copied().unwrap_or_default()
    }
}

/// Numbers, or numeric strings; anything else is "not available".
fn as_number(v: &Value) -> Option<f64> {
    let n: Option<f64> = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
        _ => None,
    };
    n.filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn tolerates_placeholders_and_errors() {
        let snap = SourceSnapshot::from_value(
            SourceId::MarketData,
            json!({
                "market_data": {},
                "indices": {
                    "S&P 500": {"price": 5900.25, "change_percent": -0.42},
                    "NASDAQ": {"price": "N/A", "change_percent": "1.5"},
                    "VIX": {"error": "timeout"}
                }
            }),
        )
        .unwrap();
        let m = MarketSummary::from_snapshot(&snap);
        assert_eq!(m.index(SP500).price, Some(5900.25));
        assert_eq!(m.index(SP500).change_percent, Some(-0.42));
        assert_eq!(m.index(NASDAQ).price, None);
        assert_eq!(m.index(NASDAQ).change_percent, Some(1.5));
        assert_eq!(m.index(VIX), IndexQuote::default());
        assert_eq!(m.index(DOW_JONES), IndexQuote::default());
    }
}
