//! In-memory backend
//!
//! Implements both store traits over `HashMap`s guarded by a
//! `tokio::sync::RwLock`. Used for local development without `DATABASE_URL`
//! and by the test suite. Not durable; state is lost on restart.
//!
//! Orders are kept as [`OrderRow`] so the same schema normalisation runs as
//! with Postgres.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    AdminNotification, BlockedAddress, ClosureWindow, DeliveryZone, DeliveryZonePatch,
    NotificationCreate, Order, OrderStatus, PushSubscription, Restaurant,
};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::schema::{self, OrderRow};
use super::{
    MembershipDirectory, RestaurantStore, RoleValue, StoreError, StoreResult, TransitionOutcome,
};

#[derive(Debug, Clone)]
struct MembershipRecord {
    user_id: String,
    restaurant_id: Uuid,
    role: Option<String>,
    added_at: DateTime<Utc>,
}

#[derive(Default)]
struct Inner {
    restaurants: HashMap<Uuid, Restaurant>,
    memberships: Vec<MembershipRecord>,
    orders: HashMap<Uuid, OrderRow>,
    zones: HashMap<Uuid, DeliveryZone>,
    closures: Vec<ClosureWindow>,
    blocked: Vec<BlockedAddress>,
    notifications: Vec<AdminNotification>,
    subscriptions: Vec<PushSubscription>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
    /// Behave like a membership table without a `role` column
    role_column_missing: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Membership table without a `role` column; role lookups fail with
    /// [`StoreError::RoleColumnMissing`]
    pub fn without_role_column() -> Self {
        Self {
            role_column_missing: true,
            ..Self::default()
        }
    }

    // ── Seeding ──

    pub async fn insert_restaurant(&self, restaurant: Restaurant) {
        let mut inner = self.inner.write().await;
        inner.restaurants.insert(restaurant.id, restaurant);
    }

    pub async fn insert_membership(
        &self,
        user_id: &str,
        restaurant_id: Uuid,
        role: Option<&str>,
        added_at: DateTime<Utc>,
    ) {
        let mut inner = self.inner.write().await;
        inner
            .memberships
            .retain(|m| !(m.user_id == user_id && m.restaurant_id == restaurant_id));
        inner.memberships.push(MembershipRecord {
            user_id: user_id.to_string(),
            restaurant_id,
            role: role.map(str::to_string),
            added_at,
        });
    }

    pub async fn insert_order(&self, row: OrderRow) {
        let mut inner = self.inner.write().await;
        inner.orders.insert(row.id, row);
    }

    pub async fn insert_zone(&self, zone: DeliveryZone) {
        let mut inner = self.inner.write().await;
        inner.zones.insert(zone.id, zone);
    }

    pub async fn insert_closure_window(&self, window: ClosureWindow) {
        self.inner.write().await.closures.push(window);
    }

    pub async fn insert_blocked_address(&self, rule: BlockedAddress) {
        self.inner.write().await.blocked.push(rule);
    }

    pub async fn insert_push_subscription(&self, subscription: PushSubscription) {
        self.inner.write().await.subscriptions.push(subscription);
    }

    /// Raw order row, for asserting on both ETA columns
    pub async fn order_row(&self, order_id: Uuid) -> Option<OrderRow> {
        self.inner.read().await.orders.get(&order_id).cloned()
    }
}

#[async_trait]
impl MembershipDirectory for MemoryStore {
    async fn membership_exists(&self, user_id: &str, restaurant_id: Uuid) -> StoreResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .any(|m| m.user_id == user_id && m.restaurant_id == restaurant_id))
    }

    async fn earliest_restaurant(&self, user_id: &str) -> StoreResult<Option<Uuid>> {
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .min_by_key(|m| m.added_at)
            .map(|m| m.restaurant_id))
    }

    async fn membership_role(
        &self,
        user_id: &str,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<RoleValue>> {
        if self.role_column_missing {
            return Err(StoreError::RoleColumnMissing);
        }
        let inner = self.inner.read().await;
        Ok(inner
            .memberships
            .iter()
            .find(|m| m.user_id == user_id && m.restaurant_id == restaurant_id)
            .map(|m| schema::role_value(m.role.as_deref())))
    }
}

#[async_trait]
impl RestaurantStore for MemoryStore {
    async fn restaurant_by_id(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        Ok(self.inner.read().await.restaurants.get(&id).cloned())
    }

    async fn restaurant_by_slug(&self, slug: &str) -> StoreResult<Option<Restaurant>> {
        let inner = self.inner.read().await;
        Ok(inner.restaurants.values().find(|r| r.slug == slug).cloned())
    }

    async fn list_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> StoreResult<Vec<Order>> {
        let inner = self.inner.read().await;
        let mut orders = inner
            .orders
            .values()
            .filter(|row| row.restaurant_id == restaurant_id)
            .cloned()
            .map(schema::order_from_row)
            .collect::<StoreResult<Vec<_>>>()?;
        if let Some(status) = status {
            orders.retain(|o| o.status == status);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        orders.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(orders)
    }

    async fn transition_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
        delivery_time: Option<DateTime<Utc>>,
    ) -> StoreResult<TransitionOutcome> {
        let mut inner = self.inner.write().await;
        let Some(row) = inner
            .orders
            .get_mut(&order_id)
            .filter(|row| row.restaurant_id == restaurant_id)
        else {
            return Ok(TransitionOutcome::NotFound);
        };

        let previous = schema::parse_status(&row.status)?;
        if !previous.can_transition_to(target) {
            return Ok(TransitionOutcome::Rejected { current: previous });
        }

        row.status = target.as_str().to_string();
        if let Some(eta) = delivery_time {
            row.set_delivery_time(eta);
        }
        let order = schema::order_from_row(row.clone())?;
        Ok(TransitionOutcome::Applied { order, previous })
    }

    async fn closure_windows(&self, restaurant_id: Uuid) -> StoreResult<Vec<ClosureWindow>> {
        let inner = self.inner.read().await;
        Ok(inner
            .closures
            .iter()
            .filter(|w| w.restaurant_id == restaurant_id && w.active)
            .cloned()
            .collect())
    }

    async fn blocked_addresses(&self, restaurant_id: Uuid) -> StoreResult<Vec<BlockedAddress>> {
        let inner = self.inner.read().await;
        Ok(inner
            .blocked
            .iter()
            .filter(|b| b.restaurant_id == restaurant_id && b.active)
            .cloned()
            .collect())
    }

    async fn delivery_zones(&self, restaurant_id: Uuid) -> StoreResult<Vec<DeliveryZone>> {
        let inner = self.inner.read().await;
        let mut zones: Vec<DeliveryZone> = inner
            .zones
            .values()
            .filter(|z| z.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        zones.sort_by(|a, b| {
            a.min_distance_km
                .total_cmp(&b.min_distance_km)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(zones)
    }

    async fn patch_zone(
        &self,
        restaurant_id: Uuid,
        zone_id: Uuid,
        patch: &DeliveryZonePatch,
    ) -> StoreResult<Option<DeliveryZone>> {
        let mut inner = self.inner.write().await;
        let Some(zone) = inner
            .zones
            .get_mut(&zone_id)
            .filter(|z| z.restaurant_id == restaurant_id)
        else {
            return Ok(None);
        };
        patch.apply(zone);
        Ok(Some(zone.clone()))
    }

    async fn list_notifications(
        &self,
        restaurant_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<AdminNotification>> {
        let inner = self.inner.read().await;
        let mut items: Vec<AdminNotification> = inner
            .notifications
            .iter()
            .filter(|n| n.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(items)
    }

    async fn insert_notification(
        &self,
        restaurant_id: Uuid,
        notification: NotificationCreate,
    ) -> StoreResult<AdminNotification> {
        let record = AdminNotification {
            id: Uuid::new_v4(),
            restaurant_id,
            kind: notification.kind,
            title: notification.title,
            body: notification.body,
            url: notification.url,
            read: false,
            created_at: Utc::now(),
        };
        self.inner.write().await.notifications.push(record.clone());
        Ok(record)
    }

    async fn mark_notifications_read(
        &self,
        restaurant_id: Uuid,
        ids: Option<&[Uuid]>,
    ) -> StoreResult<u64> {
        let mut inner = self.inner.write().await;
        let mut updated = 0;
        for n in inner
            .notifications
            .iter_mut()
            .filter(|n| n.restaurant_id == restaurant_id && !n.read)
        {
            if ids.is_none_or(|ids| ids.contains(&n.id)) {
                n.read = true;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn push_subscriptions(&self, restaurant_id: Uuid) -> StoreResult<Vec<PushSubscription>> {
        let inner = self.inner.read().await;
        Ok(inner
            .subscriptions
            .iter()
            .filter(|s| s.restaurant_id == restaurant_id)
            .cloned()
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn order_row(restaurant_id: Uuid, status: &str) -> OrderRow {
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

    #[tokio::test]
    async fn earliest_membership_wins() {
        let store = MemoryStore::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let now = Utc::now();
        store.insert_membership("u1", a, Some("owner"), now).await;
        store
            .insert_membership("u1", b, Some("employee"), now - Duration::days(3))
            .await;
        assert_eq!(store.earliest_restaurant("u1").await.unwrap(), Some(b));
        assert_eq!(store.earliest_restaurant("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn transition_is_scoped_by_restaurant() {
        let store = MemoryStore::new();
        let (mine, theirs) = (Uuid::new_v4(), Uuid::new_v4());
        let row = order_row(theirs, "pending");
        let id = row.id;
        store.insert_order(row).await;

        let outcome = store
            .transition_order(mine, id, OrderStatus::Cancelled, None)
            .await
            .unwrap();
        assert!(matches!(outcome, TransitionOutcome::NotFound));
        let untouched = store.order_row(id).await.unwrap();
        assert_eq!(untouched.status, "pending");
    }

    #[tokio::test]
    async fn accept_writes_both_eta_columns() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        let row = order_row(rid, "pending");
        let id = row.id;
        store.insert_order(row).await;
        let eta = Utc::now() + Duration::minutes(30);

        let outcome = store
            .transition_order(rid, id, OrderStatus::Accepted, Some(eta))
            .await
            .unwrap();
        let TransitionOutcome::Applied { order, previous } = outcome else {
            panic!("expected transition to apply");
        };
        assert_eq!(previous, OrderStatus::Pending);
        assert_eq!(order.delivery_time, Some(eta));
        let raw = store.order_row(id).await.unwrap();
        assert_eq!(raw.delivery_time, Some(eta));
        assert_eq!(raw.legacy_delivery_time, Some(eta));
    }

    #[tokio::test]
    async fn cancelled_order_rejects_accept() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        let row = order_row(rid, "cancelled");
        let id = row.id;
        store.insert_order(row).await;
        let outcome = store
            .transition_order(rid, id, OrderStatus::Accepted, Some(Utc::now()))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            TransitionOutcome::Rejected {
                current: OrderStatus::Cancelled
            }
        ));
    }

    #[tokio::test]
    async fn mark_read_counts_only_unread_rows() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        let create = |title: &str| NotificationCreate {
            kind: "order".into(),
            title: title.into(),
            body: None,
            url: None,
        };
        let first = store.insert_notification(rid, create("a")).await.unwrap();
        store.insert_notification(rid, create("b")).await.unwrap();

        assert_eq!(
            store
                .mark_notifications_read(rid, Some(&[first.id]))
                .await
                .unwrap(),
            1
        );
        assert_eq!(store.mark_notifications_read(rid, None).await.unwrap(), 1);
        assert_eq!(store.mark_notifications_read(rid, None).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn missing_role_column_is_reported() {
        let store = MemoryStore::without_role_column();
        let rid = Uuid::new_v4();
        store.insert_membership("u1", rid, None, Utc::now()).await;
        assert!(matches!(
            store.membership_role("u1", rid).await,
            Err(StoreError::RoleColumnMissing)
        ));
        assert!(store.membership_exists("u1", rid).await.unwrap());
    }
}
