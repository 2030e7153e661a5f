//! Unit-Harvest: a resumable catalog enrichment pipeline
//!
//! This crate discovers units from a remote listing page, enriches each one by
//! fetching its custom-card and overview documents, extracts structured fields
//! with regex rules, and appends finished units to a line-delimited results log
//! so an interrupted run can pick up where it stopped.

pub mod checkpoint;
pub mod config;
pub mod endpoint;
pub mod extract;
pub mod harvest;
pub mod model;
pub mod output;
pub mod state;

use thiserror::Error;

/// Main error type for Unit-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    #[error("Checkpoint error: {0}")]
    Checkpoint(#[from] checkpoint::CheckpointError),

    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid phase transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunPhase,
        to: state::RunPhase,
    },

    #[error("Result sink stopped before {id} could be written")]
    SinkClosed { id: String },

    #[error("Task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("Harvest interrupted with {remaining} units still pending")]
    Interrupted { remaining: usize },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Unit-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{FieldExtractor, FieldSchema};
pub use harvest::{run_harvest, Orchestrator, RunReport};
pub use model::{CardFacts, Entity, OverviewFacts, PendingEntry};
pub use state::RunPhase;
