use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Condition
// ────────────────────────────────────────────────────────────────────────────

/// Condition label attached to a detection by the upstream AI step.
///
/// The set is open: labels outside the known four are carried verbatim in
/// `Other` and compared as opaque strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Condition {
    New,
    Used,
    Damaged,
    NotFound,
    Other(String),
}

impl Condition {
    pub fn as_str(&self) -> &str {
        match self {
            Condition::New => "new",
            Condition::Used => "used",
            Condition::Damaged => "damaged",
            Condition::NotFound => "not_found",
            Condition::Other(raw) => raw,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Condition::NotFound)
    }
}

impl From<String> for Condition {
    fn from(raw: String) -> Self {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "new" => Condition::New,
            "used" => Condition::Used,
            "damaged" => Condition::Damaged,
            "not_found" => Condition::NotFound,
            _ => Condition::Other(raw),
        }
    }
}

impl From<&str> for Condition {
    fn from(raw: &str) -> Self {
        Condition::from(raw.to_string())
    }
}

impl From<Condition> for String {
    fn from(condition: Condition) -> Self {
        match condition {
            Condition::Other(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Detection
// ────────────────────────────────────────────────────────────────────────────

/// One AI-identified object instance in one photo. Never mutated after load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub item: String,
    pub condition: Condition,
    pub room: String,
    #[serde(default)]
    pub source_photo_url: Option<String>,
}

/// Normalized key used for both item matching and room grouping.
///
/// Empty or whitespace-only names collapse to the empty key and therefore match
/// each other.
pub fn match_key(label: &str) -> String {
    label.trim().to_lowercase()
}

// ────────────────────────────────────────────────────────────────────────────
// Comparison output
// ────────────────────────────────────────────────────────────────────────────

/// An entry detection paired with the exit detection that matched it by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub entry: Detection,
    pub exit: Detection,
}

/// A detection that exists on one side only, with the other side's room photo
/// attached for context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnpairedDetection {
    pub detection: Detection,
    pub context_photo_url: Option<String>,
}

/// Per-room diff between an entry and an exit inspection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomComparison {
    pub room: String,
    pub changed: Vec<MatchedPair>,
    pub unchanged: Vec<MatchedPair>,
    pub new: Vec<UnpairedDetection>,
    pub missing: Vec<UnpairedDetection>,
}

impl RoomComparison {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty()
            && self.unchanged.is_empty()
            && self.new.is_empty()
            && self.missing.is_empty()
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Report inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionKind {
    Entry,
    Exit,
}

impl InspectionKind {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "entry" => Some(InspectionKind::Entry),
            "exit" => Some(InspectionKind::Exit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Property {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
}

/// One photo session with its detections in load order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inspection {
    pub id: Uuid,
    pub kind: InspectionKind,
    pub performed_at: Option<DateTime<Utc>>,
    pub detections: Vec<Detection>,
}
