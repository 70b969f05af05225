// src/site/cards.rs
//! Dashboard summary cards computed from the latest market snapshot.

use chrono::{DateTime, Utc};

use crate::ingest::market::{MarketSummary, NASDAQ, SP500, VIX};

/// Text shown wherever a value is missing.
pub const NOT_AVAILABLE: &str = "N/A";

pub const MAX_CARDS: usize = 4;

#[derive(Debug, Clone, PartialEq)]
pub enum CardChange {
    Percent(f64),
    Caption(String),
    Unavailable,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryCard {
    pub label: String,
    /// `None` renders as [`NOT_AVAILABLE`].
    pub value: Option<String>,
    pub change: CardChange,
}

impl SummaryCard {
    pub fn to_html(&self) -> String {
        let value = self.value.as_deref().unwrap_or(NOT_AVAILABLE);
        let change = match &self.change {
            CardChange::Percent(p) => {
                let class = if *p < 0.0 { "negative" } else { "positive" };
                format!(r#"<div class="change {class}">{p:+.2}%</div>"#)
            }
            CardChange::Caption(c) => format!(
                r#"<div class="change">{}</div>"#,
                html_escape::encode_text(c)
            ),
            CardChange::Unavailable => format!(r#"<div class="change">{NOT_AVAILABLE}</div>"#),
        };
        format!(
            "<div class=\"card\">\n<h3>{}</h3>\n<div class=\"value\">{}</div>\n{change}\n</div>",
            html_escape::encode_text(&self.label),
            html_escape::encode_text(value),
        )
    }
}

/// S&P 500, NASDAQ, VIX and a last-updated card. Missing quotes degrade to N/A.
pub fn summary_cards(market: &MarketSummary, last_updated: Option<DateTime<Utc>>) -> Vec<SummaryCard> {
    let quote_card = |label: &str, name: &str| {
        let q = market.index(name);
        SummaryCard {
            label: label.to_string(),
            value: q.price.map(format_price),
            change: q
                .change_percent
                .map_or(CardChange::Unavailable, CardChange::Percent),
        }
    };

    let mut vix = quote_card("VIX", VIX);
    vix.change = CardChange::Caption("Volatility index".to_string());

    let updated = SummaryCard {
        label: "Last updated".to_string(),
        value: last_updated.map(|t| t.format("%Y-%m-%d").to_string()),
        change: last_updated.map_or(CardChange::Unavailable, |t| {
            CardChange::Caption(t.format("%H:%M UTC").to_string())
        }),
    };

    let cards = vec![
        quote_card("S&P 500", SP500),
        quote_card("NASDAQ", NASDAQ),
        vix,
        updated,
    ];
    debug_assert!(cards.len() <= MAX_CARDS);
    cards
}

fn format_price(p: f64) -> String {
    format!("{p:.2}")
}
