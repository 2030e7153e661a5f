//! Built-in schemas for the catalog site's custom card and overview pages
//!
//! Field names here must match the names read by `CardFacts::from_fields` and
//! `OverviewFacts::from_fields`.

use crate::extract::rules::{FieldRule, FieldSchema, Transform};

/// Marker that sets a "minimum damage" checkbox flag
const CHECKED: &str = "checked";

/// Pattern for an `<input id="Data_X" ... value="...">` form field
fn input_value(id: &str) -> String {
    format!(r#"id="Data_{}".*value="(.*)""#, id)
}

/// Pattern for a checkbox; captures the remainder of the tag's line
fn input_checkbox(id: &str) -> String {
    format!(r#"id="Data_{}"(.*)"#, id)
}

/// Pattern for a block element whose text sits on the line after its opening tag
fn block_body(id: &str) -> String {
    format!(r#"id="Data_{}".*>.*\n(.*)\n.*<"#, id)
}

/// Pattern for a `<dt>Label</dt>` followed by `<dd>value</dd>` on the next line
fn definition(label: &str, value: &str) -> String {
    format!(r"<dt>{}</dt>.*\n.*<dd>({})</dd>", regex::escape(label), value)
}

/// Schema for the custom card page
///
/// # Errors
///
/// Returns a regex error if any built-in pattern fails to compile.
pub fn card_schema() -> Result<FieldSchema, regex::Error> {
    let rules = vec![
        FieldRule::text("name", &input_value("Name"))?,
        FieldRule::text("model", &input_value("Model"))?,
        FieldRule::int("point_value", &input_value("PV"))?,
        FieldRule::text("type_code", &input_value("Type"))?,
        FieldRule::int("size", &input_value("Size"))?,
        FieldRule::int("movement", &input_value("Move"))?,
        FieldRule::text("role", &input_value("Role"))?,
        FieldRule::int("skill", &input_value("Skill"))?,
        FieldRule::int("short_damage", &input_value("Short"))?,
        FieldRule::flag("is_short_min_damage", &input_checkbox("ShortMin"), CHECKED)?,
        FieldRule::int("medium_damage", &input_value("Medium"))?,
        FieldRule::flag("is_medium_min_damage", &input_checkbox("MediumMin"), CHECKED)?,
        FieldRule::int("long_damage", &input_value("Long"))?,
        FieldRule::flag("is_long_min_damage", &input_checkbox("LongMin"), CHECKED)?,
        FieldRule::int("extreme_damage", &input_value("Extreme"))?,
        FieldRule::flag("is_extreme_min_damage", &input_checkbox("ExtremeMin"), CHECKED)?,
        FieldRule::int("overheat", &input_value("Overheat"))?,
        FieldRule::int("armor", &input_value("Armor"))?,
        FieldRule::int("structure", &input_value("Structure"))?,
        FieldRule::int("threshold", &input_value("Threshold"))?,
        FieldRule::text("specials", &block_body("Specials"))?.with_transform(Transform::Trim),
        FieldRule::text("image_url", &block_body("Image"))?.with_transform(Transform::Trim),
    ];

    Ok(FieldSchema::new("custom card", rules))
}

/// Schema for the unit overview page
pub fn overview_schema() -> Result<FieldSchema, regex::Error> {
    const WORDS: &str = "[a-zA-Z0-9 ,]+";

    let rules = vec![
        FieldRule::int("tonnage", &definition("Tonnage", r"\d+"))?,
        FieldRule::int("battle_value", &definition("Battle Value", r"[\d,]+"))?,
        FieldRule::int("cost", &definition("Cost", r"[\d,]+"))?,
        FieldRule::text("rules_level", &definition("Rules Level", r"\w+"))?,
        FieldRule::text("technology", &definition("Technology", WORDS))?,
        FieldRule::text("unit_type", &definition("Unit Type", WORDS))?,
        FieldRule::text("unit_role", &definition("Unit Role", WORDS))?,
        FieldRule::int("date_introduced", &definition("Date Introduced", r"\d+"))?,
        FieldRule::text("era", &definition("Era", r"[a-zA-Z0-9 ,()\-]+"))?,
        FieldRule::text("notes", &definition("Notes", r"[a-zA-Z0-9 ,()]+"))?,
    ];

    Ok(FieldSchema::new("overview", rules))
}
