//! trade-brief: daily brief pipeline entrypoint.
//! Loads `.env` and config, initialises tracing and metrics, then runs one stage.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use trade_brief::config::{AppConfig, DEFAULT_CONFIG_PATH, ENV_CONFIG_PATH};
use trade_brief::metrics::Metrics;
use trade_brief::Pipeline;

#[derive(Parser)]
#[command(name = "trade-brief", version, about = "Daily trading-intelligence brief")]
struct Cli {
    /// TOML config; defaults to $BRIEF_CONFIG_PATH, then config/brief.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate sources, generate and store today's brief.
    Generate {
        /// Brief date (YYYY-MM-DD); today in UTC when omitted.
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Rebuild the static site from the stored briefs.
    Publish,
    /// Announce the latest brief on the configured channels.
    Notify,
    /// generate, publish and notify in one go.
    Run {
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Write Prometheus exposition text here after the run.
        #[arg(long)]
        metrics_file: Option<PathBuf>,
    },
    /// Preview the generated site locally.
    Serve {
        #[arg(long, default_value = "127.0.0.1:8000")]
        addr: SocketAddr,
    },
}

/// Compact logs by default, JSON when BRIEF_LOG_JSON=1. RUST_LOG overrides the filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("trade_brief=info,warn"));
    let json = std::env::var("BRIEF_LOG_JSON").is_ok_and(|v| v == "1");

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer().compact()).init();
    }
}

fn load_config(explicit: Option<PathBuf>) -> Result<AppConfig> {
    let cfg = match explicit {
        Some(path) => AppConfig::load(&path),
        None => AppConfig::load_default(),
    };
    cfg.with_context(|| {
        format!("loading config (--config, ${ENV_CONFIG_PATH} or {DEFAULT_CONFIG_PATH})")
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    let config = load_config(cli.config)?;

    let metrics = match Metrics::init() {
        Ok(m) => Some(m),
        Err(e) => {
            tracing::warn!(error = %format!("{e:#}"), "metrics disabled");
            None
        }
    };

    let site_dir = config.paths.site_dir.clone();
    let pipeline = Pipeline::from_config(config);
    let now = Utc::now();

    match cli.command {
        Command::Generate { date } => {
            let doc = pipeline
                .generate(date.unwrap_or_else(|| now.date_naive()), now)
                .await?;
            tracing::info!(date = %doc.date, fallback = doc.is_fallback, "generate done");
        }
        Command::Publish => {
            let site = pipeline.publish()?;
            tracing::info!(index = %site.index.display(), pages = site.pages.len(), "publish done");
        }
        Command::Notify => {
            if let Some(report) = pipeline.notify(now).await? {
                tracing::info!(delivered = report.delivered(), "notify done");
            }
        }
        Command::Run { date, metrics_file } => {
            let summary = pipeline
                .run(date.unwrap_or_else(|| now.date_naive()), now)
                .await?;
            tracing::info!(
                date = %summary.document.date,
                fallback = summary.document.is_fallback,
                pages = summary.site.pages.len(),
                delivered = summary.notify.as_ref().map_or(0, |r| r.delivered()),
                "run done"
            );
            if let (Some(path), Some(m)) = (metrics_file, metrics.as_ref()) {
                std::fs::write(&path, m.render())
                    .with_context(|| format!("writing metrics to {}", path.display()))?;
            }
        }
        Command::Serve { addr } => {
            let app = trade_brief::router(&site_dir, metrics.as_ref());
            let listener = tokio::net::TcpListener::bind(addr)
                .await
                .with_context(|| format!("binding {addr}"))?;
            tracing::info!(%addr, site = %site_dir.display(), "serving preview");
            axum::serve(listener, app).await.context("preview server")?;
        }
    }
    Ok(())
}
