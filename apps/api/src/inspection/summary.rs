use serde::{Deserialize, Serialize};

use crate::inspection::models::{Condition, RoomComparison};

/// Report-level counts, folded from per-room comparisons.
///
/// Both the report cover block and the dashboard counter read this; neither
/// recomputes matching on its own.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InspectionSummary {
    pub rooms: usize,
    pub changed: usize,
    pub unchanged: usize,
    pub new: usize,
    pub missing: usize,
    /// Exit-side damage not already recorded at entry (damaged items in `changed` or `new`).
    pub critical_issues: usize,
}

pub fn summarize<'a, I>(rooms: I) -> InspectionSummary
where
    I: IntoIterator<Item = &'a RoomComparison>,
{
    rooms
        .into_iter()
        .fold(InspectionSummary::default(), |mut acc, room| {
            acc.rooms += 1;
            acc.changed += room.changed.len();
            acc.unchanged += room.unchanged.len();
            acc.new += room.new.len();
            acc.missing += room.missing.len();
            acc.critical_issues += room
                .changed
                .iter()
                .filter(|p| p.exit.condition == Condition::Damaged)
                .count()
                + room
                    .new
                    .iter()
                    .filter(|u| u.detection.condition == Condition::Damaged)
                    .count();
            acc
        })
}
