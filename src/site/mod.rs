// src/site/mod.rs
//! Site assembler: regenerates the whole static site from the document store.
//!
//! Layout under the output directory:
//!
//! ```text
//! index.html            dashboard, latest brief, archive of the newest N dates
//! css/style.css
//! briefs/YYYY-MM-DD.html  one page per stored document
//! ```
//!
//! Every run rewrites all of it; `briefs/` is cleared first so deleted documents
//! do not leave stale pages behind.

pub mod cards;
pub mod templates;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use metrics::counter;

use crate::config::SiteConfig;
use crate::error::BriefError;
use crate::ingest::market::MarketSummary;
use crate::render::render;
use crate::store::{Document, DocumentStore};

pub const PLACEHOLDER_BRIEF: &str =
    "# No brief yet\n\nWaiting for the first brief to be generated.";

const INDEX_FILE: &str = "index.html";
const CSS_DIR: &str = "css";
const CSS_FILE: &str = "style.css";
const PAGES_DIR: &str = "briefs";

/// In-memory site, before anything touches disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitePlan {
    pub index_html: String,
    /// One page per document, newest first.
    pub pages: Vec<(NaiveDate, String)>,
    /// Dates linked from the index, newest first, at most `archive_window`.
    pub archive: Vec<NaiveDate>,
}

/// What [`SiteAssembler::publish`] wrote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteArtifacts {
    pub index: PathBuf,
    pub stylesheet: PathBuf,
    pub pages: Vec<PathBuf>,
    pub archive: Vec<NaiveDate>,
}

/// Pure part of publishing. `docs` must be sorted newest first, as
/// [`DocumentStore::list_all`] returns them.
pub fn build_site(
    config: &SiteConfig,
    docs: &[Document],
    latest: Option<&Document>,
    market: &MarketSummary,
) -> SitePlan {
    let latest_html = match latest {
        Some(doc) => render(&doc.body),
        None => render(PLACEHOLDER_BRIEF),
    };
    let cards = cards::summary_cards(market, latest.map(|d| d.generated_at));

    let archive: Vec<NaiveDate> = docs
        .iter()
        .take(config.archive_window)
        .map(|d| d.date)
        .collect();

    let pages = docs
        .iter()
        .map(|d| (d.date, templates::brief_page(d.date, &render(&d.body))))
        .collect();

    SitePlan {
        index_html: templates::index_page(&config.title, &cards, &latest_html, &archive),
        pages,
        archive,
    }
}

pub struct SiteAssembler {
    out_dir: PathBuf,
    config: SiteConfig,
}

impl SiteAssembler {
    pub fn new(out_dir: impl Into<PathBuf>, config: SiteConfig) -> Self {
        Self {
            out_dir: out_dir.into(),
            config,
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    /// Read the store, build the site, write it out.
    ///
    /// A corrupt `latest.md` degrades to the newest dated document; store I/O
    /// failures and site write failures are returned.
    pub fn publish(
        &self,
        store: &DocumentStore,
        market: &MarketSummary,
    ) -> Result<SiteArtifacts, BriefError> {
        let docs = store.list_all()?;
        let latest = match store.read_latest() {
            Ok(doc) => doc,
            Err(BriefError::MalformedDocument { path, reason }) => {
                tracing::warn!(path = %path.display(), reason = %reason, "latest brief unreadable, using newest dated brief");
                None
            }
            Err(e) => return Err(e),
        };
        let latest = latest.as_ref().or_else(|| docs.first());

        let plan = build_site(&self.config, &docs, latest, market);
        self.write(&plan)
    }

    fn write(&self, plan: &SitePlan) -> Result<SiteArtifacts, BriefError> {
        let css_dir = self.out_dir.join(CSS_DIR);
        let pages_dir = self.out_dir.join(PAGES_DIR);

        if pages_dir.exists() {
            fs::remove_dir_all(&pages_dir).map_err(|e| BriefError::site_io(&pages_dir, e))?;
        }
        for dir in [&css_dir, &pages_dir] {
            fs::create_dir_all(dir).map_err(|e| BriefError::site_io(dir, e))?;
        }

        let stylesheet = css_dir.join(CSS_FILE);
        write_file(&stylesheet, templates::STYLESHEET)?;

        let index = self.out_dir.join(INDEX_FILE);
        write_file(&index, &plan.index_html)?;

        let mut pages = Vec::with_capacity(plan.pages.len());
        for (date, html) in &plan.pages {
            let path = pages_dir.join(format!("{}.html", date.format("%Y-%m-%d")));
            write_file(&path, html)?;
            pages.push(path);
        }

        counter!("brief_pages_written_total").increment(pages.len() as u64 + 1);
        tracing::info!(
            out_dir = %self.out_dir.display(),
            pages = pages.len(),
            archive = plan.archive.len(),
            "site published"
        );

        Ok(SiteArtifacts {
            index,
            stylesheet,
            pages,
            archive: plan.archive.clone(),
        })
    }
}

fn write_file(path: &Path, contents: &str) -> Result<(), BriefError> {
    fs::write(path, contents).map_err(|e| BriefError::site_io(path, e))
}
