//! Order Model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Order status
///
/// Transitions (see [`OrderStatus::can_transition_to`]):
/// - `pending → accepted`, `accepted → accepted` (ETA refresh)
/// - `pending | accepted → cancelled`, `cancelled → cancelled` (no-op)
/// - `accepted → completed`
///
/// Nothing leaves `cancelled`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::Pending,
        OrderStatus::Accepted,
        OrderStatus::Cancelled,
        OrderStatus::Completed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Accepted => "accepted",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Accepted)
                | (Accepted, Accepted)
                | (Pending, Cancelled)
                | (Accepted, Cancelled)
                | (Cancelled, Cancelled)
                | (Accepted, Completed)
        )
    }

    /// Statuses an order may be in for a move to `target` to apply
    pub fn sources_for(target: OrderStatus) -> Vec<OrderStatus> {
        Self::ALL
            .into_iter()
            .filter(|s| s.can_transition_to(target))
            .collect()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a status string is not one of [`OrderStatus::ALL`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown order status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "accepted" => Ok(OrderStatus::Accepted),
            "cancelled" | "canceled" => Ok(OrderStatus::Cancelled),
            "completed" => Ok(OrderStatus::Completed),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

/// Order entity (canonical shape, legacy column names already folded in)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    /// `delivery` or `pickup`
    pub selected_option: Option<String>,
    /// Promised ready/delivery time
    #[serde(rename = "deliveryTime")]
    pub delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    pub fn is_delivery(&self) -> bool {
        self.selected_option
            .as_deref()
            .is_some_and(|o| o.eq_ignore_ascii_case("delivery"))
    }
}

/// Response of a successful status transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderTransitionResponse {
    pub id: Uuid,
    pub status: OrderStatus,
    #[serde(rename = "deliveryTime", skip_serializing_if = "Option::is_none", default)]
    pub delivery_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nothing_leaves_cancelled() {
        for next in OrderStatus::ALL {
            let allowed = OrderStatus::Cancelled.can_transition_to(next);
            assert_eq!(allowed, next == OrderStatus::Cancelled, "cancelled -> {next}");
        }
    }

    #[test]
    fn accept_sources_are_pending_and_accepted() {
        assert_eq!(
            OrderStatus::sources_for(OrderStatus::Accepted),
            vec![OrderStatus::Pending, OrderStatus::Accepted]
        );
        assert_eq!(
            OrderStatus::sources_for(OrderStatus::Cancelled),
            vec![
                OrderStatus::Pending,
                OrderStatus::Accepted,
                OrderStatus::Cancelled
            ]
        );
        assert_eq!(
            OrderStatus::sources_for(OrderStatus::Pending),
            Vec::<OrderStatus>::new()
        );
    }

    #[test]
    fn completed_only_from_accepted() {
        assert!(OrderStatus::Accepted.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
    }

    #[test]
    fn parse_status() {
        assert_eq!("Accepted".parse::<OrderStatus>(), Ok(OrderStatus::Accepted));
        assert_eq!("canceled".parse::<OrderStatus>(), Ok(OrderStatus::Cancelled));
        assert_eq!(
            "shipped".parse::<OrderStatus>(),
            Err(UnknownStatus("shipped".into()))
        );
    }

    #[test]
    fn transition_response_uses_camel_case_eta() {
        let id = Uuid::nil();
        let resp = OrderTransitionResponse {
            id,
            status: OrderStatus::Cancelled,
            delivery_time: None,
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["status"], "cancelled");
        assert!(json.get("deliveryTime").is_none());
    }
}
