//! Lenient field extraction
//!
//! Every rule in a schema is applied independently. A rule that does not match
//! leaves its field absent; a rule that matches but yields an unusable value
//! records a `FieldFault` and leaves its field absent. Neither stops the
//! remaining rules, and neither is reported to the caller as an error.

use crate::extract::rules::{FieldKind, FieldRule, FieldSchema};
use std::collections::HashMap;
use thiserror::Error;

/// A value extracted for one field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Flag(bool),
}

/// A problem confined to a single field
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldFault {
    #[error("field '{field}': pattern matched but capture group {group} is missing")]
    MissingCapture { field: String, group: usize },

    #[error("field '{field}': '{value}' is not a number")]
    InvalidNumber { field: String, value: String },
}

/// The outcome of running a schema over one document
#[derive(Debug, Clone, Default)]
pub struct ExtractedFields {
    values: HashMap<String, FieldValue>,
    faults: Vec<FieldFault>,
}

impl ExtractedFields {
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.values.get(name)
    }

    /// Text value of a field, or an empty string
    pub fn text(&self, name: &str) -> String {
        match self.values.get(name) {
            Some(FieldValue::Text(value)) => value.clone(),
            _ => String::new(),
        }
    }

    /// Integer value of a field, or zero
    pub fn int(&self, name: &str) -> i64 {
        match self.values.get(name) {
            Some(FieldValue::Int(value)) => *value,
            _ => 0,
        }
    }

    /// Flag value of a field, or false
    pub fn flag(&self, name: &str) -> bool {
        matches!(self.values.get(name), Some(FieldValue::Flag(true)))
    }

    /// Faults recorded while extracting, in schema order
    pub fn faults(&self) -> &[FieldFault] {
        &self.faults
    }

    /// Number of fields that produced a value
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Applies a field schema to raw document text
#[derive(Debug, Clone)]
pub struct FieldExtractor {
    schema: FieldSchema,
}

impl FieldExtractor {
    pub fn new(schema: FieldSchema) -> Self {
        Self { schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }

    /// Extracts every field of the schema from `document`
    ///
    /// # Arguments
    ///
    /// * `document` - Raw document text
    /// * `context` - Label used in log lines (usually the unit designation)
    pub fn extract(&self, document: &str, context: &str) -> ExtractedFields {
        let mut extracted = ExtractedFields::default();

        for rule in self.schema.rules() {
            match extract_field(rule, document) {
                Ok(Some(value)) => {
                    extracted.values.insert(rule.name().to_string(), value);
                }
                Ok(None) => {
                    tracing::trace!(
                        "{}: no match for field '{}' in {} document",
                        context,
                        rule.name(),
                        self.schema.name()
                    );
                }
                Err(fault) => {
                    match &fault {
                        FieldFault::MissingCapture { .. } => {
                            tracing::warn!("{}: {}", context, fault)
                        }
                        FieldFault::InvalidNumber { .. } => {
                            tracing::debug!("{}: {}", context, fault)
                        }
                    }
                    extracted.faults.push(fault);
                }
            }
        }

        extracted
    }
}

/// Extracts one field; `Ok(None)` means the pattern did not match
fn extract_field(rule: &FieldRule, document: &str) -> Result<Option<FieldValue>, FieldFault> {
    let Some(captures) = rule.pattern().captures(document) else {
        return Ok(None);
    };

    let raw = captures
        .get(rule.group())
        .ok_or_else(|| FieldFault::MissingCapture {
            field: rule.name().to_string(),
            group: rule.group(),
        })?
        .as_str();
    let raw = rule.transform().apply(raw);

    let value = match rule.kind() {
        FieldKind::Text => FieldValue::Text(raw.to_string()),
        FieldKind::Int => {
            let number = parse_grouped_int(raw).ok_or_else(|| FieldFault::InvalidNumber {
                field: rule.name().to_string(),
                value: raw.to_string(),
            })?;
            FieldValue::Int(number)
        }
        FieldKind::Flag { marker } => FieldValue::Flag(raw.contains(marker.as_str())),
    };

    Ok(Some(value))
}

/// Parses an integer written with thousands separators, e.g. "12,345"
pub fn parse_grouped_int(raw: &str) -> Option<i64> {
    let digits: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::rules::Transform;

    fn schema() -> FieldSchema {
        FieldSchema::new(
            "test",
            vec![
                FieldRule::text("name", r#"id="Data_Name".*value="(.*)""#).unwrap(),
                FieldRule::int("pv", r#"id="Data_PV".*value="(.*)""#).unwrap(),
                FieldRule::flag("short_min", r#"id="Data_ShortMin"(.*)"#, "checked").unwrap(),
                FieldRule::int("cost", r"<dt>Cost</dt>\s*<dd>([\d,]+)</dd>").unwrap(),
            ],
        )
    }

    #[test]
    fn test_extracts_all_kinds() {
        let doc = r#"
<input id="Data_Name" type="text" value="Atlas" />
<input id="Data_PV" type="text" value="52" />
<input id="Data_ShortMin" type="checkbox" checked="checked" />
<dt>Cost</dt><dd>9,626,000</dd>
"#;
        let fields = FieldExtractor::new(schema()).extract(doc, "Atlas");

        assert_eq!(fields.text("name"), "Atlas");
        assert_eq!(fields.int("pv"), 52);
        assert!(fields.flag("short_min"));
        assert_eq!(fields.int("cost"), 9_626_000);
        assert!(fields.faults().is_empty());
    }

    #[test]
    fn test_unmatched_field_defaults_and_others_still_extract() {
        let doc = r#"<input id="Data_PV" type="text" value="23" />"#;
        let fields = FieldExtractor::new(schema()).extract(doc, "Locust");

        assert_eq!(fields.text("name"), "");
        assert!(!fields.flag("short_min"));
        assert_eq!(fields.int("cost"), 0);
        assert_eq!(fields.int("pv"), 23);
        assert_eq!(fields.len(), 1);
        assert!(fields.faults().is_empty());
    }

    #[test]
    fn test_flag_false_when_marker_absent() {
        let doc = r#"<input id="Data_ShortMin" type="checkbox" />"#;
        let fields = FieldExtractor::new(schema()).extract(doc, "Wasp");

        assert_eq!(fields.get("short_min"), Some(&FieldValue::Flag(false)));
        assert!(!fields.flag("short_min"));
    }

    #[test]
    fn test_non_numeric_value_leaves_zero_and_records_fault() {
        let doc = r#"
<input id="Data_Name" type="text" value="Commando" />
<input id="Data_PV" type="text" value="n/a" />
"#;
        let fields = FieldExtractor::new(schema()).extract(doc, "Commando");

        assert_eq!(fields.int("pv"), 0);
        assert_eq!(fields.text("name"), "Commando");
        assert_eq!(
            fields.faults(),
            &[FieldFault::InvalidNumber {
                field: "pv".to_string(),
                value: "n/a".to_string(),
            }]
        );
    }

    #[test]
    fn test_missing_capture_group_is_isolated() {
        let schema = FieldSchema::new(
            "test",
            vec![
                FieldRule::text("broken", r#"value="(.*)""#).unwrap().with_group(3),
                FieldRule::text("name", r#"id="Data_Name".*value="(.*)""#).unwrap(),
            ],
        );
        let doc = r#"<input id="Data_Name" value="Shadow Hawk" />"#;
        let fields = FieldExtractor::new(schema).extract(doc, "Shadow Hawk");

        assert_eq!(fields.text("broken"), "");
        assert_eq!(fields.text("name"), "Shadow Hawk");
        assert!(matches!(
            fields.faults(),
            [FieldFault::MissingCapture { group: 3, .. }]
        ));
    }

    #[test]
    fn test_first_match_wins() {
        let schema = FieldSchema::new(
            "test",
            vec![FieldRule::int("n", r"<b>(\d+)</b>").unwrap()],
        );
        let fields = FieldExtractor::new(schema).extract("<b>1</b><b>2</b>", "x");
        assert_eq!(fields.int("n"), 1);
    }

    #[test]
    fn test_trim_transform_applies_before_parse() {
        let schema = FieldSchema::new(
            "test",
            vec![FieldRule::text("specials", r"<p>(.*)</p>")
                .unwrap()
                .with_transform(Transform::Trim)],
        );
        let fields = FieldExtractor::new(schema).extract("<p>   ENE, REAR1/1/-  </p>", "x");
        assert_eq!(fields.text("specials"), "ENE, REAR1/1/-");
    }

    #[test]
    fn test_parse_grouped_int() {
        assert_eq!(parse_grouped_int("12,345"), Some(12345));
        assert_eq!(parse_grouped_int(" 1,234,567 "), Some(1_234_567));
        assert_eq!(parse_grouped_int("80"), Some(80));
        assert_eq!(parse_grouped_int(""), None);
        assert_eq!(parse_grouped_int("12a"), None);
        assert_eq!(parse_grouped_int("Unknown"), None);
    }
}
