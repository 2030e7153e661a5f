//! Statistics generation from the results log
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the checkpoint files.

use crate::checkpoint::{CheckpointResult, CompletedLog, PendingSnapshot};
use crate::model::Entity;
use std::collections::HashMap;
use std::path::Path;

/// Harvest statistics summary
#[derive(Debug, Clone, Default)]
pub struct HarvestStatistics {
    /// Total number of records in the results log
    pub total_records: usize,

    /// Records whose custom card was found
    pub with_custom_card: usize,

    /// Records whose card role was filled from the overview
    pub role_from_overview: usize,

    /// Count of records by overview unit type
    pub by_unit_type: HashMap<String, usize>,

    /// Units listed in the pending snapshot, if one exists
    pub pending: Option<usize>,
}

impl HarvestStatistics {
    /// Builds statistics from already-loaded records
    pub fn from_records(records: &[Entity], pending: Option<usize>) -> Self {
        let mut stats = HarvestStatistics {
            total_records: records.len(),
            pending,
            ..Default::default()
        };

        for record in records {
            // A backfilled role alone does not mean a card was found
            let mut card = record.card.clone();
            card.role.clear();

            if card.is_present() {
                stats.with_custom_card += 1;
            } else if !record.card.role.is_empty() {
                stats.role_from_overview += 1;
            }

            let unit_type = if record.overview.unit_type.is_empty() {
                "(unknown)".to_string()
            } else {
                record.overview.unit_type.clone()
            };
            *stats.by_unit_type.entry(unit_type).or_insert(0) += 1;
        }

        stats
    }
}

/// Loads statistics from the results log and optional snapshot
///
/// # Arguments
///
/// * `results_path` - The results log to replay
/// * `snapshot` - The pending snapshot, if snapshot mode is enabled
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(CheckpointError)` - The log or snapshot could not be read
pub fn load_statistics(
    results_path: &Path,
    snapshot: Option<&PendingSnapshot>,
) -> CheckpointResult<HarvestStatistics> {
    let records = CompletedLog::read_all(results_path)?;

    let pending = match snapshot {
        Some(snapshot) => snapshot.load()?.map(|entries| entries.len()),
        None => None,
    };

    Ok(HarvestStatistics::from_records(&records, pending))
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Records written: {}", stats.total_records);
    println!("  With custom card: {}", stats.with_custom_card);
    println!("  Role taken from overview: {}", stats.role_from_overview);
    match stats.pending {
        Some(pending) => println!("  Pending in snapshot: {}", pending),
        None => println!("  Pending in snapshot: none"),
    }
    println!();

    println!("Records by Unit Type:");
    // Sort types by count (descending), then name
    let mut type_counts: Vec<_> = stats.by_unit_type.iter().collect();
    type_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    for (unit_type, count) in type_counts {
        let percentage = if stats.total_records > 0 {
            (*count as f64 / stats.total_records as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", unit_type, count, percentage);
    }
    println!();

    let card_rate = if stats.total_records > 0 {
        (stats.with_custom_card as f64 / stats.total_records as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Custom Card Coverage: {:.1}% ({} / {} records)",
        card_rate, stats.with_custom_card, stats.total_records
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PendingEntry;
    use std::io::Write;
    use tempfile::TempDir;

    fn record(id: &str, unit_type: &str, card_name: &str, role: &str) -> Entity {
        let mut entity = Entity::pending(id, format!("Unit-{}", id));
        entity.overview.unit_type = unit_type.to_string();
        entity.overview.unit_role = role.to_string();
        entity.card.name = card_name.to_string();
        entity.card.role = role.to_string();
        entity
    }

    #[test]
    fn test_statistics_from_records() {
        let records = vec![
            record("1", "BattleMech", "Atlas", "Juggernaut"),
            record("2", "BattleMech", "", "Scout"),
            record("3", "Combat Vehicle", "Demolisher", "Brawler"),
            record("4", "", "", ""),
        ];

        let stats = HarvestStatistics::from_records(&records, Some(3));

        assert_eq!(stats.total_records, 4);
        assert_eq!(stats.with_custom_card, 2);
        assert_eq!(stats.role_from_overview, 1);
        assert_eq!(stats.by_unit_type.get("BattleMech"), Some(&2));
        assert_eq!(stats.by_unit_type.get("Combat Vehicle"), Some(&1));
        assert_eq!(stats.by_unit_type.get("(unknown)"), Some(&1));
        assert_eq!(stats.pending, Some(3));
    }

    #[test]
    fn test_load_statistics_from_files() {
        let dir = TempDir::new().unwrap();
        let results = dir.path().join("results.jsonl");

        let mut file = std::fs::File::create(&results).unwrap();
        for entity in [
            record("1", "BattleMech", "Atlas", "Juggernaut"),
            record("2", "Aerospace Fighter", "", ""),
        ] {
            writeln!(file, "{}", serde_json::to_string(&entity).unwrap()).unwrap();
        }
        drop(file);

        let snapshot = PendingSnapshot::new(dir.path().join("remaining.json"));
        snapshot
            .save(&[PendingEntry {
                id: "3".to_string(),
                designation: "Unit-3".to_string(),
            }])
            .unwrap();

        let stats = load_statistics(&results, Some(&snapshot)).unwrap();
        assert_eq!(stats.total_records, 2);
        assert_eq!(stats.with_custom_card, 1);
        assert_eq!(stats.pending, Some(1));
    }

    #[test]
    fn test_missing_files_give_empty_statistics() {
        let dir = TempDir::new().unwrap();
        let snapshot = PendingSnapshot::new(dir.path().join("remaining.json"));

        let stats = load_statistics(&dir.path().join("results.jsonl"), Some(&snapshot)).unwrap();
        assert_eq!(stats.total_records, 0);
        assert_eq!(stats.pending, None);
        assert!(stats.by_unit_type.is_empty());
    }
}
