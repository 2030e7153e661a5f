//! Output module for summarising harvest results
//!
//! This module reads the results log and pending snapshot back and reports
//! what a harvest has produced so far.

pub mod stats;

pub use stats::{load_statistics, print_statistics, HarvestStatistics};
