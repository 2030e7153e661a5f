//! Regex-driven field extraction
//!
//! This module turns raw document text into named field values:
//! - `FieldRule` / `FieldSchema`: immutable, explicitly constructed rule sets
//! - `FieldExtractor`: applies a schema with per-field fault isolation
//! - `card_schema` / `overview_schema`: the built-in rule sets for the catalog site

mod extractor;
mod rules;
mod schemas;

pub use extractor::{parse_grouped_int, ExtractedFields, FieldExtractor, FieldFault, FieldValue};
pub use rules::{FieldKind, FieldRule, FieldSchema, Transform};
pub use schemas::{card_schema, overview_schema};
