//! Row shapes and their normalisation into canonical models
//!
//! Tables carry historical column names next to the current ones (the order
//! ETA lives in both `delivery_time` and `"deliveryTime"`). Rows are read
//! into the structs below and folded into `shared::models` here, so nothing
//! past the data-access boundary sees the legacy names.

use chrono::{DateTime, Utc};
use shared::models::{Order, OrderStatus, Role};
use uuid::Uuid;

use super::{RoleValue, StoreError, StoreResult};

/// Column list matching [`OrderRow`]
pub const ORDER_COLUMNS: &str = r#"id, restaurant_id, status, contact_email, phone, name, selected_option, delivery_time, "deliveryTime", created_at"#;

/// `orders` row as stored
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub status: String,
    pub contact_email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub selected_option: Option<String>,
    pub delivery_time: Option<DateTime<Utc>>,
    #[sqlx(rename = "deliveryTime")]
    pub legacy_delivery_time: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl OrderRow {
    /// Write an ETA the way every reader expects it: both columns
    pub fn set_delivery_time(&mut self, eta: DateTime<Utc>) {
        self.delivery_time = Some(eta);
        self.legacy_delivery_time = Some(eta);
    }
}

/// Row returned by the conditional status update
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TransitionRow {
    #[sqlx(flatten)]
    pub order: OrderRow,
    pub previous_status: String,
}

pub fn parse_status(raw: &str) -> StoreResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| StoreError::InvalidRow(e.to_string()))
}

/// Lowercase spellings a stored status may take, for SQL matching on
/// `lower(btrim(status))`
pub fn stored_spellings(statuses: impl IntoIterator<Item = OrderStatus>) -> Vec<&'static str> {
    let mut out = Vec::new();
    for status in statuses {
        out.push(status.as_str());
        if status == OrderStatus::Cancelled {
            out.push("canceled");
        }
    }
    out
}

/// Canonical order; the current ETA column wins over the legacy one
pub fn order_from_row(row: OrderRow) -> StoreResult<Order> {
    Ok(Order {
        id: row.id,
        restaurant_id: row.restaurant_id,
        status: parse_status(&row.status)?,
        contact_email: non_empty(row.contact_email),
        phone: non_empty(row.phone),
        name: non_empty(row.name),
        selected_option: non_empty(row.selected_option),
        delivery_time: row.delivery_time.or(row.legacy_delivery_time),
        created_at: row.created_at,
    })
}

/// Membership `role` column value
pub fn role_value(raw: Option<&str>) -> RoleValue {
    match raw.map(str::trim) {
        None | Some("") => RoleValue::Missing,
        Some(value) => match Role::parse(value) {
            Some(role) => RoleValue::Known(role),
            None => RoleValue::Unrecognized(value.to_string()),
        },
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row() -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            status: "pending".into(),
            contact_email: Some("jan@example.com".into()),
            phone: Some("  ".into()),
            name: None,
            selected_option: Some("delivery".into()),
            delivery_time: None,
            legacy_delivery_time: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn legacy_eta_is_used_when_current_is_empty() {
        let legacy = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let mut r = row();
        r.legacy_delivery_time = Some(legacy);
        let order = order_from_row(r).unwrap();
        assert_eq!(order.delivery_time, Some(legacy));
    }

    #[test]
    fn current_eta_wins_over_legacy() {
        let legacy = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let current = Utc.with_ymd_and_hms(2024, 6, 1, 13, 0, 0).unwrap();
        let mut r = row();
        r.legacy_delivery_time = Some(legacy);
        r.delivery_time = Some(current);
        assert_eq!(order_from_row(r).unwrap().delivery_time, Some(current));
    }

    #[test]
    fn blank_contact_fields_are_dropped() {
        let order = order_from_row(row()).unwrap();
        assert!(order.phone.is_none());
        assert!(order.is_delivery());
    }

    #[test]
    fn unknown_status_is_an_invalid_row() {
        let mut r = row();
        r.status = "teleported".into();
        assert!(matches!(order_from_row(r), Err(StoreError::InvalidRow(_))));
    }

    #[test]
    fn stored_spellings_cover_parse_status() {
        let spellings = stored_spellings(OrderStatus::ALL);
        assert!(spellings.contains(&"canceled"));
        assert!(spellings.contains(&"cancelled"));
        for raw in ["Accepted", " PENDING ", "Canceled", "completed"] {
            let folded = raw.trim().to_ascii_lowercase();
            assert!(spellings.contains(&folded.as_str()), "{raw}");
            assert!(parse_status(raw).is_ok());
        }
        assert_eq!(
            stored_spellings(OrderStatus::sources_for(OrderStatus::Cancelled)),
            vec!["pending", "accepted", "cancelled", "canceled"]
        );
    }

    #[test]
    fn role_values() {
        assert_eq!(role_value(Some("Manager")), RoleValue::Known(Role::Manager));
        assert_eq!(role_value(Some("")), RoleValue::Missing);
        assert_eq!(role_value(None), RoleValue::Missing);
        assert_eq!(
            role_value(Some("cook")),
            RoleValue::Unrecognized("cook".into())
        );
    }
}
