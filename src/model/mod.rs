//! Data model for harvested units
//!
//! - `Entity`: a unit with its identifier, designation and scraped facts
//! - `CardFacts` / `OverviewFacts`: fixed field schemas with lenient defaults
//! - `PendingEntry`: the identifier/designation pair kept in the pending snapshot

mod entity;
mod facts;

pub use entity::{Entity, PendingEntry};
pub use facts::{CardFacts, OverviewFacts};
