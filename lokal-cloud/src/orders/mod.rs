//! Order lifecycle
//!
//! Every status change is one conditional update scoped by
//! `(order_id, restaurant_id)`; concurrent writers race and the last one
//! wins. Customer and admin notifications are queued only after the update
//! has been applied.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};
use shared::models::{NotificationCreate, Order, OrderStatus, OrderTransitionResponse};
use uuid::Uuid;

use crate::db::{RestaurantStore, TransitionOutcome};
use crate::error::ServiceResult;
use crate::notify::{NotificationJob, NotificationQueue, SmsMessage, email};

pub const DEFAULT_ETA_MINUTES: f64 = 30.0;
pub const MIN_ETA_MINUTES: f64 = 5.0;
pub const MAX_ETA_MINUTES: f64 = 180.0;
pub const DEFAULT_LIST_LIMIT: i64 = 50;
pub const MAX_LIST_LIMIT: i64 = 100;

/// Parse a path/body order id; anything but a UUID is a 400
pub fn parse_order_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::new(ErrorCode::InvalidOrderId))
}

/// Absent or non-finite → 30, then clamp to `[5, 180]`
pub fn clamp_minutes(minutes: Option<f64>) -> f64 {
    minutes
        .filter(|m| m.is_finite())
        .unwrap_or(DEFAULT_ETA_MINUTES)
        .clamp(MIN_ETA_MINUTES, MAX_ETA_MINUTES)
}

pub fn eta_after(now: DateTime<Utc>, minutes: f64) -> DateTime<Utc> {
    now + Duration::milliseconds((minutes * 60_000.0).round() as i64)
}

pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
}

pub struct OrderLifecycle {
    store: Arc<dyn RestaurantStore>,
    notifier: NotificationQueue,
    timezone: Tz,
}

impl OrderLifecycle {
    pub fn new(store: Arc<dyn RestaurantStore>, notifier: NotificationQueue, timezone: Tz) -> Self {
        Self {
            store,
            notifier,
            timezone,
        }
    }

    /// `pending | accepted → accepted` with a fresh ETA
    pub async fn accept(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        minutes: f64,
    ) -> ServiceResult<OrderTransitionResponse> {
        let eta = eta_after(Utc::now(), minutes);
        let order = self
            .apply(restaurant_id, order_id, OrderStatus::Accepted, Some(eta))
            .await?
            .0;

        tracing::info!(
            order_id = %order_id,
            restaurant_id = %restaurant_id,
            minutes,
            eta = %eta,
            "Order accepted"
        );
        self.after_accept(&order, eta).await;

        Ok(OrderTransitionResponse {
            id: order.id,
            status: order.status,
            delivery_time: Some(eta),
        })
    }

    /// `pending | accepted → cancelled`; cancelling twice is a quiet success
    pub async fn cancel(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> ServiceResult<OrderTransitionResponse> {
        let (order, previous) = self
            .apply(restaurant_id, order_id, OrderStatus::Cancelled, None)
            .await?;

        if previous == OrderStatus::Cancelled {
            tracing::debug!(order_id = %order_id, "Order already cancelled");
        } else {
            tracing::info!(
                order_id = %order_id,
                restaurant_id = %restaurant_id,
                previous = %previous,
                "Order cancelled"
            );
            self.after_cancel(&order).await;
        }

        Ok(OrderTransitionResponse {
            id: order.id,
            status: order.status,
            delivery_time: None,
        })
    }

    /// Generic status change; acceptance and cancellation keep their side effects
    pub async fn update_status(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
    ) -> ServiceResult<OrderTransitionResponse> {
        match target {
            OrderStatus::Accepted => {
                self.accept(restaurant_id, order_id, DEFAULT_ETA_MINUTES)
                    .await
            }
            OrderStatus::Cancelled => self.cancel(restaurant_id, order_id).await,
            OrderStatus::Pending | OrderStatus::Completed => {
                let (order, previous) = self.apply(restaurant_id, order_id, target, None).await?;
                tracing::info!(
                    order_id = %order_id,
                    restaurant_id = %restaurant_id,
                    from = %previous,
                    to = %target,
                    "Order status updated"
                );
                Ok(OrderTransitionResponse {
                    id: order.id,
                    status: order.status,
                    delivery_time: order.delivery_time,
                })
            }
        }
    }

    pub async fn list(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
        limit: Option<i64>,
    ) -> ServiceResult<Vec<Order>> {
        Ok(self
            .store
            .list_orders(restaurant_id, status, clamp_limit(limit))
            .await?)
    }

    async fn apply(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
        eta: Option<DateTime<Utc>>,
    ) -> ServiceResult<(Order, OrderStatus)> {
        match self
            .store
            .transition_order(restaurant_id, order_id, target, eta)
            .await?
        {
            TransitionOutcome::Applied { order, previous } => Ok((order, previous)),
            TransitionOutcome::Rejected { current } => {
                tracing::info!(
                    order_id = %order_id,
                    current = %current,
                    target = %target,
                    "Order transition rejected"
                );
                Err(AppError::new(ErrorCode::InvalidTransition)
                    .with_detail("current", current.as_str())
                    .with_detail("target", target.as_str())
                    .into())
            }
            TransitionOutcome::NotFound => Err(AppError::new(ErrorCode::OrderNotFound).into()),
        }
    }

    async fn restaurant_name(&self, restaurant_id: Uuid) -> String {
        match self.store.restaurant_by_id(restaurant_id).await {
            Ok(Some(r)) => r.name,
            Ok(None) => "Lokal".to_string(),
            Err(e) => {
                tracing::warn!(restaurant_id = %restaurant_id, error = %e, "Restaurant lookup for notification failed");
                "Lokal".to_string()
            }
        }
    }

    async fn after_accept(&self, order: &Order, eta: DateTime<Utc>) {
        let name = self.restaurant_name(order.restaurant_id).await;
        let local = email::format_local_time(eta, self.timezone);

        if let Some(message) = email::order_accepted(order, &name, eta, self.timezone) {
            self.notifier.enqueue(NotificationJob::Email(message));
        }
        if let Some(sms) = order.phone.as_deref().and_then(|phone| {
            SmsMessage::new(
                phone,
                format!("{name}: zamówienie przyjęte, szacowany czas {local}."),
            )
        }) {
            self.notifier.enqueue(NotificationJob::Sms(sms));
        }

        self.record(
            order,
            NotificationCreate {
                kind: "order_accepted".into(),
                title: format!("Zamówienie przyjęte ({local})"),
                body: order.name.clone(),
                url: Some(format!("/admin/orders/{}", order.id)),
            },
        )
        .await;
    }

    async fn after_cancel(&self, order: &Order) {
        let name = self.restaurant_name(order.restaurant_id).await;

        if let Some(message) = email::order_cancelled(order, &name) {
            self.notifier.enqueue(NotificationJob::Email(message));
        }
        if let Some(sms) = order
            .phone
            .as_deref()
            .and_then(|phone| SmsMessage::new(phone, format!("{name}: zamówienie anulowane.")))
        {
            self.notifier.enqueue(NotificationJob::Sms(sms));
        }

        self.record(
            order,
            NotificationCreate {
                kind: "order_cancelled".into(),
                title: "Zamówienie anulowane".into(),
                body: order.name.clone(),
                url: Some(format!("/admin/orders/{}", order.id)),
            },
        )
        .await;
    }

    /// Admin feed entry; failures are logged only
    async fn record(&self, order: &Order, notification: NotificationCreate) {
        if let Err(e) = self
            .store
            .insert_notification(order.restaurant_id, notification)
            .await
        {
            tracing::warn!(order_id = %order.id, error = %e, "Failed to record admin notification");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::db::schema::OrderRow;
    use crate::notify::Channels;
    use shared::RetryPolicy;

    #[test]
    fn minutes_are_clamped() {
        assert_eq!(clamp_minutes(None), 30.0);
        assert_eq!(clamp_minutes(Some(f64::NAN)), 30.0);
        assert_eq!(clamp_minutes(Some(1.0)), 5.0);
        assert_eq!(clamp_minutes(Some(500.0)), 180.0);
        assert_eq!(clamp_minutes(Some(45.0)), 45.0);
    }

    #[test]
    fn eta_uses_fractional_minutes() {
        let now = Utc::now();
        assert_eq!(eta_after(now, 7.5) - now, Duration::seconds(450));
    }

    #[test]
    fn order_id_must_be_uuid() {
        let err = parse_order_id("42").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidOrderId);
        assert_eq!(err.message, "Invalid order id");
        assert!(parse_order_id(&Uuid::new_v4().to_string()).is_ok());
    }

    #[test]
    fn list_limit_is_capped() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(1000)), 100);
        assert_eq!(clamp_limit(Some(0)), 1);
    }

    fn row(restaurant_id: Uuid, status: &str) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            restaurant_id,
            status: status.into(),
            contact_email: None,
            phone: None,
            name: None,
            selected_option: None,
            delivery_time: None,
            legacy_delivery_time: None,
            created_at: Utc::now(),
        }
    }

    async fn lifecycle(store: Arc<MemoryStore>) -> OrderLifecycle {
        let queue = NotificationQueue::start(Channels::disabled(), RetryPolicy::default());
        OrderLifecycle::new(store, queue, chrono_tz::Europe::Warsaw)
    }

    fn app_error(e: crate::error::ServiceError) -> AppError {
        e.into()
    }

    #[tokio::test]
    async fn accept_writes_both_eta_columns() {
        let store = Arc::new(MemoryStore::new());
        let rid = Uuid::new_v4();
        let order = row(rid, "pending");
        store.insert_order(order.clone()).await;

        let resp = lifecycle(store.clone())
            .await
            .accept(rid, order.id, 45.0)
            .await
            .unwrap();
        assert_eq!(resp.status, OrderStatus::Accepted);

        let stored = store.order_row(order.id).await.unwrap();
        assert_eq!(stored.status, "accepted");
        assert_eq!(stored.delivery_time, resp.delivery_time);
        assert_eq!(stored.legacy_delivery_time, resp.delivery_time);
    }

    #[tokio::test]
    async fn second_accept_overwrites_eta() {
        let store = Arc::new(MemoryStore::new());
        let rid = Uuid::new_v4();
        let order = row(rid, "pending");
        store.insert_order(order.clone()).await;
        let lifecycle = lifecycle(store.clone()).await;

        let first = lifecycle.accept(rid, order.id, 10.0).await.unwrap();
        let second = lifecycle.accept(rid, order.id, 60.0).await.unwrap();
        assert!(second.delivery_time > first.delivery_time);
        let stored = store.order_row(order.id).await.unwrap();
        assert_eq!(stored.delivery_time, second.delivery_time);
    }

    #[tokio::test]
    async fn cancelled_orders_cannot_be_accepted() {
        let store = Arc::new(MemoryStore::new());
        let rid = Uuid::new_v4();
        let order = row(rid, "cancelled");
        store.insert_order(order.clone()).await;
        let lifecycle = lifecycle(store.clone()).await;

        let err = app_error(lifecycle.accept(rid, order.id, 30.0).await.unwrap_err());
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        // cancelling again is fine
        let resp = lifecycle.cancel(rid, order.id).await.unwrap();
        assert_eq!(resp.status, OrderStatus::Cancelled);
    }

    #[tokio::test]
    async fn foreign_orders_are_not_found() {
        let store = Arc::new(MemoryStore::new());
        let order = row(Uuid::new_v4(), "pending");
        store.insert_order(order.clone()).await;

        let err = app_error(
            lifecycle(store.clone())
                .await
                .cancel(Uuid::new_v4(), order.id)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::OrderNotFound);
        assert_eq!(store.order_row(order.id).await.unwrap().status, "pending");
    }

    #[tokio::test]
    async fn completion_requires_acceptance() {
        let store = Arc::new(MemoryStore::new());
        let rid = Uuid::new_v4();
        let order = row(rid, "pending");
        store.insert_order(order.clone()).await;
        let lifecycle = lifecycle(store.clone()).await;

        let err = app_error(
            lifecycle
                .update_status(rid, order.id, OrderStatus::Completed)
                .await
                .unwrap_err(),
        );
        assert_eq!(err.code, ErrorCode::InvalidTransition);

        lifecycle.accept(rid, order.id, 30.0).await.unwrap();
        let resp = lifecycle
            .update_status(rid, order.id, OrderStatus::Completed)
            .await
            .unwrap();
        assert_eq!(resp.status, OrderStatus::Completed);
        assert!(resp.delivery_time.is_some());
    }

    #[tokio::test]
    async fn transitions_record_admin_notifications() {
        let store = Arc::new(MemoryStore::new());
        let rid = Uuid::new_v4();
        let order = row(rid, "pending");
        store.insert_order(order.clone()).await;
        let lifecycle = lifecycle(store.clone()).await;

        lifecycle.accept(rid, order.id, 30.0).await.unwrap();
        lifecycle.cancel(rid, order.id).await.unwrap();
        lifecycle.cancel(rid, order.id).await.unwrap();

        let feed = store.list_notifications(rid, 50).await.unwrap();
        let kinds: Vec<&str> = feed.iter().map(|n| n.kind.as_str()).collect();
        assert_eq!(kinds.len(), 2);
        assert!(kinds.contains(&"order_accepted"));
        assert!(kinds.contains(&"order_cancelled"));
    }
}
