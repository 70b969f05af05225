// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod metrics;
pub mod notify;
pub mod pipeline;
pub mod prompt;
pub mod render;
pub mod site;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::api::router;
pub use crate::config::AppConfig;
pub use crate::error::{BriefError, GenerationFailure};
pub use crate::pipeline::{Pipeline, RunSummary};
pub use crate::render::render;
pub use crate::store::{Document, DocumentStore};
