//! Harvest pipeline
//!
//! This module contains the moving parts of a run:
//! - HTTP fetching with redirect detection and retry
//! - Discovery of pending units from the listing page
//! - The worker pool that enriches units concurrently
//! - The result sink, sole writer of the results log and snapshot
//! - The orchestrator that drives a run from start to finish

mod discover;
mod fetcher;
mod orchestrator;
mod sink;
mod worker;

pub use discover::{discover, Discoverer};
pub use fetcher::{build_http_client, is_transient, FetchOutcome, Fetcher};
pub use orchestrator::{run_harvest, Orchestrator, PendingOrigin, RunReport};
pub use sink::{ResultSink, SinkReport};
pub use worker::{Completion, Enricher, WorkerPool};
