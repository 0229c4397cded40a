//! Inspection diff engine — reconciles entry and exit detection inventories.
//!
//! Matching is greedy and order-dependent: each exit detection (in order) consumes
//! the first remaining entry detection with the same normalized name. There are no
//! stable identifiers across inspections, so duplicate names are treated as fungible
//! units and consumed in entry order.
//!
//! Exit detections marked `not_found` are dropped: they neither consume an entry
//! match nor appear as new items.

use crate::inspection::models::{
    match_key, Detection, MatchedPair, RoomComparison, UnpairedDetection,
};

/// Compares one room's entry and exit detections.
///
/// Every entry detection lands in exactly one of `changed`, `unchanged`, `missing`;
/// every exit detection other than `not_found` lands in exactly one of `changed`,
/// `unchanged`, `new`.
pub fn compare_room(entry: &[Detection], exit: &[Detection]) -> RoomComparison {
    let room = entry
        .first()
        .or_else(|| exit.first())
        .map(|d| d.room.clone())
        .unwrap_or_default();

    let entry_photo = first_photo(entry);
    let exit_photo = first_photo(exit);

    let mut pool: Vec<&Detection> = entry.iter().collect();
    let mut comparison = RoomComparison {
        room,
        ..Default::default()
    };

    for exit_detection in exit {
        if exit_detection.condition.is_not_found() {
            continue;
        }

        let key = match_key(&exit_detection.item);
        match pool.iter().position(|d| match_key(&d.item) == key) {
            Some(idx) => {
                let entry_detection = pool.remove(idx);
                let pair = MatchedPair {
                    entry: entry_detection.clone(),
                    exit: exit_detection.clone(),
                };
                if pair.entry.condition == pair.exit.condition {
                    comparison.unchanged.push(pair);
                } else {
                    comparison.changed.push(pair);
                }
            }
            None => comparison.new.push(UnpairedDetection {
                detection: exit_detection.clone(),
                context_photo_url: entry_photo.clone(),
            }),
        }
    }

    comparison.missing = pool
        .into_iter()
        .map(|d| UnpairedDetection {
            detection: d.clone(),
            context_photo_url: exit_photo.clone(),
        })
        .collect();

    comparison
}

/// Groups both inspections by room and compares each room.
///
/// Rooms appear in first-seen order over the entry inspection, followed by
/// exit-only rooms in first-seen order. A room with nothing to compare (only
/// `not_found` exit rows) is left out.
pub fn compare_inspections(entry: &[Detection], exit: &[Detection]) -> Vec<RoomComparison> {
    let mut rooms: Vec<RoomGroup<'_>> = Vec::new();

    for detection in entry {
        group_for(&mut rooms, &detection.room).entry.push(detection.clone());
    }
    for detection in exit {
        group_for(&mut rooms, &detection.room).exit.push(detection.clone());
    }

    rooms
        .into_iter()
        .map(|group| {
            let mut comparison = compare_room(&group.entry, &group.exit);
            comparison.room = group.label.to_string();
            comparison
        })
        .filter(|comparison| !comparison.is_empty())
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// Internal helpers
// ────────────────────────────────────────────────────────────────────────────

struct RoomGroup<'a> {
    key: String,
    label: &'a str,
    entry: Vec<Detection>,
    exit: Vec<Detection>,
}

fn group_for<'a, 'b>(rooms: &'b mut Vec<RoomGroup<'a>>, label: &'a str) -> &'b mut RoomGroup<'a> {
    let key = match_key(label);
    let idx = match rooms.iter().position(|g| g.key == key) {
        Some(idx) => idx,
        None => {
            rooms.push(RoomGroup {
                key,
                label,
                entry: Vec::new(),
                exit: Vec::new(),
            });
            rooms.len() - 1
        }
    };
    &mut rooms[idx]
}

/// The room photo used as context: the first detection's source photo, if any.
fn first_photo(detections: &[Detection]) -> Option<String> {
    detections.iter().find_map(|d| d.source_photo_url.clone())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
