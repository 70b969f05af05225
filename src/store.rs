// src/store.rs
//! Document store: one Markdown file per calendar day plus a `latest.md` alias.
//!
//! On-disk shape:
//!
//! ```text
//! ---
//! <YAML front-matter>
//! ---
//!
//! <narrative body>
//!
//! ---
//!
//! <disclaimer>
//!
//! *Generated: YYYY-MM-DD HH:MM:SS UTC*
//! ```
//!
//! The disclaimer footer is written for every document, fallback or not.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use metrics::counter;
use serde::{Deserialize, Serialize};

use crate::error::BriefError;
use crate::ingest::types::{parse_timestamp, SourceCounts, SourceId};
use crate::render::split_front_matter;

pub const DOCUMENT_TITLE: &str = "Daily Trading Brief";
pub const DISCLAIMER: &str =
    "*This brief is generated automatically by AI for reference only and is not investment advice.*";
pub const LATEST_FILE: &str = "latest.md";

const FILE_PREFIX: &str = "brief_";
const FILE_SUFFIX: &str = ".md";

/// The unit of output, keyed by `date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    pub body: String,
    pub source_counts: SourceCounts,
    pub is_fallback: bool,
    /// SHA-256 of the prompt this body was generated from.
    pub prompt_digest: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct FrontMatter {
    title: String,
    date: NaiveDate,
    #[serde(deserialize_with = "de_generated_at")]
    generated_at: DateTime<Utc>,
    #[serde(default)]
    fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    prompt_sha256: Option<String>,
    #[serde(default, deserialize_with = "de_data_sources")]
    data_sources: BTreeMap<String, usize>,
}

/// RFC 3339, or a naive ISO timestamp read as UTC (older briefs carry no offset).
fn de_generated_at<'de, D>(de: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = String::deserialize(de)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid generated_at: {raw}")))
}

#[derive(Deserialize)]
#[serde(untagged)]
enum DataSources {
    Map(BTreeMap<String, SourceCount>),
    /// `- market_data: 12 stocks` entries.
    List(Vec<BTreeMap<String, SourceCount>>),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SourceCount {
    Number(usize),
    Text(String),
}

impl SourceCount {
    /// `"12 stocks"` reads as 12; text without a leading integer is dropped.
    fn value(self) -> Option<usize> {
        match self {
            Self::Number(n) => Some(n),
            Self::Text(s) => {
                let s = s.trim_start();
                let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
                s[..end].parse().ok()
            }
        }
    }
}

fn de_data_sources<'de, D>(de: D) -> Result<BTreeMap<String, usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let entries: Vec<(String, SourceCount)> = match DataSources::deserialize(de)? {
        DataSources::Map(m) => m.into_iter().collect(),
        DataSources::List(items) => items.into_iter().flatten().collect(),
    };
    Ok(entries
        .into_iter()
        .filter_map(|(k, v)| v.value().map(|n| (k, n)))
        .collect())
}

impl Document {
    /// Persisted representation: front-matter, body, disclaimer footer.
    pub fn to_markdown(&self) -> String {
        let fm = FrontMatter {
            title: DOCUMENT_TITLE.to_string(),
            date: self.date,
            generated_at: self.generated_at,
            fallback: self.is_fallback,
            prompt_sha256: self.prompt_digest.clone(),
            data_sources: self
                .source_counts
                .iter()
                .map(|(id, n)| (id.key().to_string(), n))
                .collect(),
        };
        // FrontMatter holds only strings, dates, bools and a string-keyed map.
        let yaml = serde_yaml::to_string(&fm).unwrap_or_default();
        format!(
            "---\n{yaml}---\n\n{body}\n\n{footer}",
            body = self.body.trim(),
            footer = footer(self.generated_at),
        )
    }

    /// Inverse of [`Document::to_markdown`]. A missing footer is tolerated.
    pub fn parse(text: &str) -> Result<Self, String> {
        let (yaml, rest) = split_front_matter(text).ok_or("missing front-matter block")?;
        let fm: FrontMatter = serde_yaml::from_str(yaml).map_err(|e| e.to_string())?;

        let marker = format!("\n---\n\n{DISCLAIMER}");
        let body = match rest.rfind(&marker) {
            Some(idx) => &rest[..idx],
            None => rest,
        };

        let source_counts = SourceId::ALL
            .into_iter()
            .map(|id| (id, fm.data_sources.get(id.key()).copied().unwrap_or(0)))
            .collect();

        Ok(Self {
            date: fm.date,
            generated_at: fm.generated_at,
            body: body.trim().to_string(),
            source_counts,
            is_fallback: fm.fallback,
            prompt_digest: fm.prompt_sha256,
        })
    }
}

fn footer(generated_at: DateTime<Utc>) -> String {
    format!(
        "---\n\n{DISCLAIMER}\n\n*Generated: {} UTC*\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Filesystem-backed store. Single writer per run.
#[derive(Debug, Clone)]
pub struct DocumentStore {
    dir: PathBuf,
}

impl DocumentStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        self.dir
            .join(format!("{FILE_PREFIX}{}{FILE_SUFFIX}", date.format("%Y-%m-%d")))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }

    /// Last-writer-wins per date; always repoints `latest.md` at this document.
    pub fn write(&self, doc: &Document) -> Result<PathBuf, BriefError> {
        fs::create_dir_all(&self.dir).map_err(|e| BriefError::store_io(&self.dir, e))?;
        let text = doc.to_markdown();
        let dated = self.path_for(doc.date);
        write_atomic(&dated, &text)?;
        write_atomic(&self.latest_path(), &text)?;
        counter!("brief_documents_written_total").increment(1);
        tracing::info!(
            date = %doc.date,
            fallback = doc.is_fallback,
            path = %dated.display(),
            "brief stored"
        );
        Ok(dated)
    }

    pub fn read(&self, date: NaiveDate) -> Result<Option<Document>, BriefError> {
        read_document(&self.path_for(date))
    }

    pub fn read_latest(&self) -> Result<Option<Document>, BriefError> {
        read_document(&self.latest_path())
    }

    /// Every dated document, newest first. An absent directory is an empty store.
    /// Files that fail to parse are skipped with a warning.
    pub fn list_all(&self) -> Result<Vec<Document>, BriefError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(e) => e,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(BriefError::store_io(&self.dir, e)),
        };

        let mut docs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| BriefError::store_io(&self.dir, e))?;
            let path = entry.path();
            let Some(file_date) = path
                .file_name()
                .and_then(|n| n.to_str())
                .and_then(date_from_file_name)
            else {
                continue;
            };
            match read_document(&path) {
                Ok(Some(mut doc)) => {
                    if doc.date != file_date {
                        tracing::warn!(
                            path = %path.display(),
                            front_matter = %doc.date,
                            "front-matter date disagrees with file name, using file name"
                        );
                        doc.date = file_date;
                    }
                    docs.push(doc);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "skipping unreadable brief"),
            }
        }
        docs.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(docs)
    }
}

fn date_from_file_name(name: &str) -> Option<NaiveDate> {
    let stem = name.strip_prefix(FILE_PREFIX)?.strip_suffix(FILE_SUFFIX)?;
    NaiveDate::parse_from_str(stem, "%Y-%m-%d").ok()
}

fn read_document(path: &Path) -> Result<Option<Document>, BriefError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(BriefError::store_io(path, e)),
    };
    Document::parse(&text)
        .map(Some)
        .map_err(|reason| BriefError::MalformedDocument {
            path: path.to_path_buf(),
            reason,
        })
}

fn write_atomic(path: &Path, text: &str) -> Result<(), BriefError> {
    let tmp = path.with_extension("md.tmp");
    let mut f = fs::File::create(&tmp).map_err(|e| BriefError::store_io(&tmp, e))?;
    f.write_all(text.as_bytes())
        .map_err(|e| BriefError::store_io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| BriefError::store_io(path, e))?;
    Ok(())
}
