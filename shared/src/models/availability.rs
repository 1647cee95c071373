//! Availability rules: closure windows and blocked addresses

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ZoneQuote;

/// Time window during which a restaurant does not take orders
///
/// A window only applies when both bounds are set; `weekday` uses
/// 0 = Sunday … 6 = Saturday, `None` meaning every day.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ClosureWindow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub weekday: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub reason: Option<String>,
    pub active: bool,
}

/// How a blocked-address pattern is compared with a delivery address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Prefix,
    Contains,
}

impl MatchType {
    /// `None` for types this version does not know
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "exact" => Some(MatchType::Exact),
            "prefix" => Some(MatchType::Prefix),
            "contains" => Some(MatchType::Contains),
            _ => None,
        }
    }
}

/// Delivery address block rule
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BlockedAddress {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub pattern: String,
    /// Raw stored type; see [`MatchType::parse`]
    pub match_type: String,
    pub active: bool,
}

/// Body of the public availability check
///
/// The restaurant is named by id or slug; the id wins when both are sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restaurant_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(default)]
    pub delivery: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_value: Option<f64>,
}

/// Positive availability answer; rejections are error responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityResponse {
    pub ok: bool,
    /// Driving distance, `null` when it could not be determined
    pub km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<ZoneQuote>,
}
