use crate::model::{CardFacts, OverviewFacts};
use serde::{Deserialize, Serialize};

/// One catalog unit, as discovered and then enriched
///
/// An entity is owned by a single worker while it is being enriched and is
/// never modified after it has been handed to the result sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Identifier assigned by the listing source
    pub id: String,

    /// Human-readable slug used in the overview URL
    pub designation: String,

    /// Fields scraped from the custom card page
    #[serde(default)]
    pub card: CardFacts,

    /// Fields scraped from the unit overview page
    #[serde(default)]
    pub overview: OverviewFacts,
}

/// The snapshot form of a unit that has not been enriched yet
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PendingEntry {
    pub id: String,
    pub designation: String,
}

impl Entity {
    /// Creates an unenriched entity with all facts at their defaults
    pub fn pending(id: impl Into<String>, designation: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            designation: designation.into(),
            ..Self::default()
        }
    }

    /// Projects this entity onto its pending snapshot entry
    pub fn pending_entry(&self) -> PendingEntry {
        PendingEntry {
            id: self.id.clone(),
            designation: self.designation.clone(),
        }
    }

    /// Fills an empty card role from the overview's unit role
    ///
    /// Returns true if the role was backfilled.
    pub fn backfill_role(&mut self) -> bool {
        if self.card.role.is_empty() && !self.overview.unit_role.is_empty() {
            self.card.role = self.overview.unit_role.clone();
            true
        } else {
            false
        }
    }
}

impl From<PendingEntry> for Entity {
    fn from(entry: PendingEntry) -> Self {
        Entity::pending(entry.id, entry.designation)
    }
}
