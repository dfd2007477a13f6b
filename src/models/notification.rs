use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub message: String,
    pub link: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// Outbound message emitted after a committed state change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub recipient_id: Uuid,
    pub message: String,
    pub link: String,
}

impl Notice {
    pub fn new(recipient_id: Uuid, message: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            recipient_id,
            message: message.into(),
            link: link.into(),
        }
    }
}
