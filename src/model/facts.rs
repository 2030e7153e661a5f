use crate::extract::ExtractedFields;
use serde::{Deserialize, Serialize};

/// Alpha Strike card values scraped from the custom card page
///
/// Every field falls back to its zero value when the page does not yield it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardFacts {
    pub name: String,
    pub model: String,
    pub point_value: i64,
    pub type_code: String,
    pub size: i64,
    pub movement: i64,
    pub role: String,
    pub skill: i64,
    pub short_damage: i64,
    pub is_short_min_damage: bool,
    pub medium_damage: i64,
    pub is_medium_min_damage: bool,
    pub long_damage: i64,
    pub is_long_min_damage: bool,
    pub extreme_damage: i64,
    pub is_extreme_min_damage: bool,
    pub overheat: i64,
    pub armor: i64,
    pub structure: i64,
    pub threshold: i64,
    pub specials: String,
    pub image_url: String,
}

/// Catalog values scraped from the unit overview page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewFacts {
    pub tonnage: i64,
    pub battle_value: i64,
    pub cost: i64,
    pub rules_level: String,
    pub technology: String,
    pub unit_type: String,
    pub unit_role: String,
    pub date_introduced: i64,
    pub era: String,
    pub notes: String,
}

impl CardFacts {
    /// Builds card facts from fields extracted with the card schema
    pub fn from_fields(fields: &ExtractedFields) -> Self {
        Self {
            name: fields.text("name"),
            model: fields.text("model"),
            point_value: fields.int("point_value"),
            type_code: fields.text("type_code"),
            size: fields.int("size"),
            movement: fields.int("movement"),
            role: fields.text("role"),
            skill: fields.int("skill"),
            short_damage: fields.int("short_damage"),
            is_short_min_damage: fields.flag("is_short_min_damage"),
            medium_damage: fields.int("medium_damage"),
            is_medium_min_damage: fields.flag("is_medium_min_damage"),
            long_damage: fields.int("long_damage"),
            is_long_min_damage: fields.flag("is_long_min_damage"),
            extreme_damage: fields.int("extreme_damage"),
            is_extreme_min_damage: fields.flag("is_extreme_min_damage"),
            overheat: fields.int("overheat"),
            armor: fields.int("armor"),
            structure: fields.int("structure"),
            threshold: fields.int("threshold"),
            specials: fields.text("specials"),
            image_url: fields.text("image_url"),
        }
    }

    /// Returns true if any value was scraped from a custom card
    pub fn is_present(&self) -> bool {
        self != &Self::default()
    }
}

impl OverviewFacts {
    /// Builds overview facts from fields extracted with the overview schema
    pub fn from_fields(fields: &ExtractedFields) -> Self {
        Self {
            tonnage: fields.int("tonnage"),
            battle_value: fields.int("battle_value"),
            cost: fields.int("cost"),
            rules_level: fields.text("rules_level"),
            technology: fields.text("technology"),
            unit_type: fields.text("unit_type"),
            unit_role: fields.text("unit_role"),
            date_introduced: fields.int("date_introduced"),
            era: fields.text("era"),
            notes: fields.text("notes"),
        }
    }
}
