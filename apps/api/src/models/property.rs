use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::inspection::models::Property;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PropertyRow {
    pub id: Uuid,
    pub name: String,
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<PropertyRow> for Property {
    fn from(row: PropertyRow) -> Self {
        Property {
            id: row.id,
            name: row.name,
            address: row.address,
        }
    }
}
