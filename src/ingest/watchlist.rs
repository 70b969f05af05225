// src/ingest/watchlist.rs
use anyhow::{anyhow, Context, Result};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

/// Symbols the brief should focus on. Empty means "no filtering".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    pub tickers: BTreeSet<String>,
}

impl WatchList {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tickers: clean_list(tickers),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    /// Empty list admits everything.
    pub fn admits(&self, symbol: &str) -> bool {
        self.tickers.is_empty() || self.tickers.contains(&symbol.trim().to_ascii_uppercase())
    }
}

/// Load the watch-list. Missing or unreadable files yield an empty list.
pub fn load_watchlist(path: &Path) -> WatchList {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no watchlist file, not filtering");
        return WatchList::default();
    }
    match load_watchlist_from(path) {
        Ok(wl) => wl,
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), path = %path.display(), "watchlist unreadable, not filtering");
            WatchList::default()
        }
    }
}

/// Strict variant: `{"tickers": [..]}`, a bare JSON array, or TOML `tickers = [..]`.
pub fn load_watchlist_from(path: &Path) -> Result<WatchList> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading watchlist from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    parse_watchlist(&content, ext.as_str())
}

fn parse_watchlist(s: &str, hint_ext: &str) -> Result<WatchList> {
    if hint_ext == "toml" {
        return parse_toml(s);
    }
    if let Ok(v) = parse_json(s) {
        return Ok(v);
    }
    parse_toml(s).map_err(|_| anyhow!("unsupported watchlist format"))
}

#[derive(serde::Deserialize)]
struct Tickers {
    #[serde(default)]
    tickers: Vec<String>,
}

fn parse_toml(s: &str) -> Result<WatchList> {
    let v: Tickers = toml::from_str(s)?;
    Ok(WatchList::new(v.tickers))
}

fn parse_json(s: &str) -> Result<WatchList> {
    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum Shape {
        Object(Tickers),
        Bare(Vec<String>),
    }
    let v: Shape = serde_json::from_str(s)?;
    Ok(match v {
        Shape::Object(t) => WatchList::new(t.tickers),
        Shape::Bare(list) => WatchList::new(list),
    })
}

fn clean_list<I, S>(items: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    items
        .into_iter()
        .map(|it| it.as_ref().trim().to_ascii_uppercase())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_trim_and_formats_work() {
        let json = r#"{"tickers": [" nvda ", "", "AAPL", "AAPL"]}"#;
        let bare = r#"["msft", "  TSLA  "]"#;
        let toml = r#"tickers = ["GOOGL", "googl"]"#;

        let j = parse_watchlist(json, "json").unwrap();
        assert_eq!(j.tickers.iter().cloned().collect::<Vec<_>>(), vec!["AAPL", "NVDA"]);
        let b = parse_watchlist(bare, "json").unwrap();
        assert_eq!(b.tickers.len(), 2);
        let t = parse_watchlist(toml, "toml").unwrap();
        assert_eq!(t.tickers.len(), 1);
    }

    #[test]
    fn missing_file_is_empty_filter() {
        let dir = tempfile::tempdir().unwrap();
        let wl = load_watchlist(&dir.path().join("watchlist.json"));
        assert!(wl.is_empty());
        assert!(wl.admits("ANYTHING"));
    }

    #[test]
    fn corrupt_file_is_empty_filter() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("watchlist.json");
        fs::write(&p, "{not json").unwrap();
        assert!(load_watchlist(&p).is_empty());
    }

    #[test]
    fn admits_is_case_insensitive() {
        let wl = WatchList::new(["NVDA"]);
        assert!(wl.admits("nvda"));
        assert!(!wl.admits("AAPL"));
    }
}
