//! Structured report content — what the renderer draws.
//!
//! `SectionConfig` is a pure projection over the per-room comparisons: it hides
//! buckets, rooms and photo references, and never changes the matching itself.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::inspection::models::{
    match_key, Detection, MatchedPair, Property, RoomComparison, UnpairedDetection,
};
use crate::inspection::summary::{summarize, InspectionSummary};

// ────────────────────────────────────────────────────────────────────────────
// Section configuration
// ────────────────────────────────────────────────────────────────────────────

/// Which report sections the user chose to include.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionConfig {
    pub summary: bool,
    pub changed: bool,
    pub unchanged: bool,
    pub new_items: bool,
    pub missing: bool,
    /// Keep photo references on detections.
    pub photos: bool,
    /// Room labels to leave out, matched like room grouping keys.
    pub excluded_rooms: Vec<String>,
}

impl Default for SectionConfig {
    fn default() -> Self {
        Self {
            summary: true,
            changed: true,
            unchanged: true,
            new_items: true,
            missing: true,
            photos: true,
            excluded_rooms: Vec::new(),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Content model
// ────────────────────────────────────────────────────────────────────────────

/// The full report payload sent to the renderer.
///
/// Top-level sections render in this order: header, summary (if present), then one
/// section per room. The renderer reports one protected block per top-level section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportContent {
    pub property_name: String,
    pub property_address: Option<String>,
    pub entry_date: Option<DateTime<Utc>>,
    pub exit_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<InspectionSummary>,
    pub rooms: Vec<RoomComparison>,
}

impl ReportContent {
    /// Number of top-level sections the renderer is expected to lay out.
    pub fn section_count(&self) -> usize {
        1 + usize::from(self.summary.is_some()) + self.rooms.len()
    }
}

/// Projects the room comparisons through `config` into renderable content.
pub fn build_report_content(
    property: &Property,
    entry_date: Option<DateTime<Utc>>,
    exit_date: Option<DateTime<Utc>>,
    rooms: &[RoomComparison],
    config: &SectionConfig,
) -> ReportContent {
    let excluded: HashSet<String> = config.excluded_rooms.iter().map(|r| match_key(r)).collect();

    let visible: Vec<RoomComparison> = rooms
        .iter()
        .filter(|room| !excluded.contains(&match_key(&room.room)))
        .map(|room| project_room(room, config))
        .filter(|room| !room.is_empty())
        .collect();

    let summary = config.summary.then(|| summarize(&visible));

    ReportContent {
        property_name: property.name.clone(),
        property_address: property.address.clone(),
        entry_date,
        exit_date,
        summary,
        rooms: visible,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

fn project_room(room: &RoomComparison, config: &SectionConfig) -> RoomComparison {
    let pairs = |enabled: bool, source: &[MatchedPair]| -> Vec<MatchedPair> {
        if !enabled {
            return Vec::new();
        }
        source
            .iter()
            .map(|p| MatchedPair {
                entry: strip_photo(&p.entry, config.photos),
                exit: strip_photo(&p.exit, config.photos),
            })
            .collect()
    };
    let unpaired = |enabled: bool, source: &[UnpairedDetection]| -> Vec<UnpairedDetection> {
        if !enabled {
            return Vec::new();
        }
        source
            .iter()
            .map(|u| UnpairedDetection {
                detection: strip_photo(&u.detection, config.photos),
                context_photo_url: u.context_photo_url.clone().filter(|_| config.photos),
            })
            .collect()
    };

    RoomComparison {
        room: room.room.clone(),
        changed: pairs(config.changed, &room.changed),
        unchanged: pairs(config.unchanged, &room.unchanged),
        new: unpaired(config.new_items, &room.new),
        missing: unpaired(config.missing, &room.missing),
    }
}

fn strip_photo(detection: &Detection, keep: bool) -> Detection {
    let mut detection = detection.clone();
    if !keep {
        detection.source_photo_url = None;
    }
    detection
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inspection::diff::compare_inspections;
    use crate::inspection::models::Condition;
    use uuid::Uuid;

    fn make_property() -> Property {
        Property {
            id: Uuid::new_v4(),
            name: "Apto 302".to_string(),
            address: Some("Rua das Flores, 12".to_string()),
        }
    }

    fn make_detection(room: &str, item: &str, condition: &str) -> Detection {
        Detection {
            item: item.to_string(),
            condition: Condition::from(condition),
            room: room.to_string(),
            source_photo_url: Some(format!("https://photos/{room}.jpg")),
        }
    }

    fn make_rooms() -> Vec<RoomComparison> {
        let entry = vec![
            make_detection("Sala", "Sofá", "used"),
            make_detection("Sala", "Mesa", "used"),
            make_detection("Cozinha", "Fogão", "new"),
        ];
        let exit = vec![
            make_detection("Sala", "Sofá", "damaged"),
            make_detection("Cozinha", "Fogão", "new"),
        ];
        compare_inspections(&entry, &exit)
    }

    #[test]
    fn test_default_config_keeps_everything() {
        let rooms = make_rooms();
        let content =
            build_report_content(&make_property(), None, None, &rooms, &SectionConfig::default());
        assert_eq!(content.rooms, rooms);
        assert_eq!(content.summary.unwrap().changed, 1);
        assert_eq!(content.section_count(), 4);
    }

    #[test]
    fn test_hidden_buckets_are_emptied_and_empty_rooms_dropped() {
        let config = SectionConfig {
            unchanged: false,
            ..Default::default()
        };
        let content = build_report_content(&make_property(), None, None, &make_rooms(), &config);
        // Cozinha only had an unchanged pair.
        assert_eq!(content.rooms.len(), 1);
        assert_eq!(content.rooms[0].room, "Sala");
        assert!(content.rooms[0].unchanged.is_empty());
        assert_eq!(content.summary.unwrap().rooms, 1);
    }

    #[test]
    fn test_excluded_rooms_match_loosely() {
        let config = SectionConfig {
            excluded_rooms: vec![" SALA ".to_string()],
            ..Default::default()
        };
        let content = build_report_content(&make_property(), None, None, &make_rooms(), &config);
        assert_eq!(content.rooms.len(), 1);
        assert_eq!(content.rooms[0].room, "Cozinha");
    }

    #[test]
    fn test_photos_off_strips_all_photo_references() {
        let config = SectionConfig {
            photos: false,
            ..Default::default()
        };
        let content = build_report_content(&make_property(), None, None, &make_rooms(), &config);
        let sala = &content.rooms[0];
        assert!(sala.changed[0].entry.source_photo_url.is_none());
        assert!(sala.missing[0].detection.source_photo_url.is_none());
        assert!(sala.missing[0].context_photo_url.is_none());
    }

    #[test]
    fn test_summary_off_removes_summary_section() {
        let config = SectionConfig {
            summary: false,
            ..Default::default()
        };
        let content = build_report_content(&make_property(), None, None, &make_rooms(), &config);
        assert!(content.summary.is_none());
        assert_eq!(content.section_count(), 3);
    }

    #[test]
    fn test_section_config_deserializes_partial_json() {
        let config: SectionConfig = serde_json::from_str(r#"{"photos": false}"#).unwrap();
        assert!(!config.photos);
        assert!(config.changed);
    }
}
