//! Web push Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Browser push subscription registered by an admin device
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PushSubscription {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub endpoint: String,
    pub p256dh: String,
    pub auth: String,
}

/// Sanitised push message, as delivered to the relay
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PushPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub body: String,
    pub url: String,
}

/// Raw push request; every field optional, see `sanitize` in the cloud crate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushSendRequest {
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PushSendResponse {
    pub queued: usize,
}
