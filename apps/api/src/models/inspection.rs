use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::inspection::models::{Condition, Detection};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InspectionRow {
    pub id: Uuid,
    pub property_id: Uuid,
    /// "entry" | "exit"
    pub kind: String,
    pub performed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DetectionRow {
    pub id: Uuid,
    pub inspection_id: Uuid,
    pub room: String,
    pub item: String,
    pub condition: String,
    pub source_photo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DetectionRow> for Detection {
    fn from(row: DetectionRow) -> Self {
        Detection {
            item: row.item,
            condition: Condition::from(row.condition),
            room: row.room,
            source_photo_url: row.source_photo_url,
        }
    }
}
