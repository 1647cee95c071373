//! Admin notification Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Notification shown in the admin panel feed
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct AdminNotification {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

/// New notification payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationCreate {
    pub kind: String,
    pub title: String,
    pub body: Option<String>,
    pub url: Option<String>,
}

/// Mark-as-read request; `ids: None` marks every notification of the restaurant
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarkReadRequest {
    #[serde(default)]
    pub ids: Option<Vec<Uuid>>,
}
