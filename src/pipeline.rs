// src/pipeline.rs
//! Stage orchestration. Each stage reads what the previous one persisted, so
//! `generate`, `publish` and `notify` can also run as separate invocations.

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::AppConfig;
use crate::error::BriefError;
use crate::generate::provider::DynGenerator;
use crate::generate::NarrativeGenerator;
use crate::ingest::{self, market::MarketSummary, types::SourceId, watchlist::load_watchlist};
use crate::notify::{self, BriefNotice, NotifierMux, NotifyReport};
use crate::prompt;
use crate::site::{SiteArtifacts, SiteAssembler};
use crate::store::{Document, DocumentStore};

#[derive(Debug)]
pub struct RunSummary {
    pub document: Document,
    pub site: SiteArtifacts,
    /// `None` when there was nothing to announce.
    pub notify: Option<NotifyReport>,
}

pub struct Pipeline {
    config: AppConfig,
    narrator: NarrativeGenerator,
    store: DocumentStore,
}

impl Pipeline {
    pub fn from_config(config: AppConfig) -> Self {
        let narrator = NarrativeGenerator::from_config(&config.generation);
        Self::with_narrator(config, narrator)
    }

    /// Same as [`Pipeline::from_config`] but with an injected provider.
    pub fn with_generator(config: AppConfig, generator: DynGenerator) -> Self {
        let narrator = NarrativeGenerator::new(generator, &config.generation);
        Self::with_narrator(config, narrator)
    }

    fn with_narrator(config: AppConfig, narrator: NarrativeGenerator) -> Self {
        let store = DocumentStore::new(&config.paths.briefs_dir);
        Self {
            config,
            narrator,
            store,
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Aggregate, compose, generate, persist. Only store I/O fails this stage.
    pub async fn generate(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Document, BriefError> {
        let paths = &self.config.paths;
        let context = ingest::load_all(&paths.data_dir);
        let watchlist = load_watchlist(&paths.watchlist);
        let prompt = prompt::compose(&context, &watchlist, date);
        tracing::info!(
            %date,
            records = prompt.source_counts.total(),
            watchlist = watchlist.tickers.len(),
            provider = self.narrator.provider_name(),
            "composing brief"
        );

        let narrative = self.narrator.generate(&prompt).await;
        let (body, is_fallback) = narrative.into_parts();
        let document = Document {
            date,
            generated_at: now,
            body,
            source_counts: prompt.source_counts.clone(),
            is_fallback,
            prompt_digest: Some(prompt.digest()),
        };
        self.store.write(&document)?;
        Ok(document)
    }

    /// Rebuild the static site from everything in the store.
    pub fn publish(&self) -> Result<SiteArtifacts, BriefError> {
        let market = ingest::load(&self.config.paths.data_dir, SourceId::MarketData);
        let summary = MarketSummary::from_snapshot(&market);
        SiteAssembler::new(&self.config.paths.site_dir, self.config.site.clone())
            .publish(&self.store, &summary)
    }

    /// Announce the latest brief. `Ok(None)` when the store has nothing readable.
    pub async fn notify(&self, now: DateTime<Utc>) -> Result<Option<NotifyReport>, BriefError> {
        let latest = match self.store.read_latest() {
            Ok(Some(doc)) => doc,
            Ok(None) => {
                tracing::info!("no brief stored yet, nothing to announce");
                return Ok(None);
            }
            Err(BriefError::MalformedDocument { path, reason }) => {
                tracing::warn!(path = %path.display(), reason = %reason, "latest brief unreadable, skipping notifications");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let notify_cfg = &self.config.notify;
        let notice = BriefNotice::from_document(
            &latest,
            notify_cfg.summary_lines,
            notify::notice_url(&self.config.site),
            now,
        );
        let report = NotifierMux::from_config(notify_cfg).notify(&notice).await;
        notify::write_log(&self.config.paths.notification_log, &notice, &report);
        Ok(Some(report))
    }

    /// generate, then publish, then notify.
    pub async fn run(&self, date: NaiveDate, now: DateTime<Utc>) -> Result<RunSummary, BriefError> {
        let document = self.generate(date, now).await?;
        let site = self.publish()?;
        let notify = self.notify(now).await?;
        Ok(RunSummary {
            document,
            site,
            notify,
        })
    }
}
