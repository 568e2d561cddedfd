use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Show {
    pub id: i64,
    pub hall_id: i64,
    pub name: String,
    pub starts_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub description: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShowStatus {
    Scheduled,
    Cancelled,
    Completed,
}

impl ShowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShowStatus::Scheduled => "scheduled",
            ShowStatus::Cancelled => "cancelled",
            ShowStatus::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scheduled" => Some(ShowStatus::Scheduled),
            "cancelled" => Some(ShowStatus::Cancelled),
            "completed" => Some(ShowStatus::Completed),
            _ => None,
        }
    }
}
