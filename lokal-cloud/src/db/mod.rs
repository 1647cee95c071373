//! Datastore access
//!
//! Two handles with different reach:
//! - [`RestaurantStore`]: ordinary data access; every query is scoped by a
//!   `restaurant_id` the caller already resolved.
//! - [`MembershipDirectory`]: cross-tenant membership lookups. Only reachable
//!   through [`PrivilegedContext`], which is built once at start-up and handed
//!   to the tenant resolver and the role gate.
//!
//! Both are implemented by the Postgres backend and the in-memory backend.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    AdminNotification, BlockedAddress, ClosureWindow, DeliveryZone, DeliveryZonePatch,
    NotificationCreate, Order, OrderStatus, PushSubscription, Restaurant, Role,
};
use thiserror::Error;
use uuid::Uuid;

pub mod memory;
pub mod postgres;
pub mod schema;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The membership table has no `role` column (SQLSTATE 42703)
    #[error("membership role column missing")]
    RoleColumnMissing,
    #[error("invalid row: {0}")]
    InvalidRow(String),
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Unexpected(e.into())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Membership table layout
///
/// `Legacy` tables have no `role` column; any membership there counts as `admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MembershipSchema {
    #[default]
    Current,
    Legacy,
}

impl FromStr for MembershipSchema {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(MembershipSchema::Current),
            "legacy" => Ok(MembershipSchema::Legacy),
            other => Err(format!("unknown MEMBERSHIP_SCHEMA: {other}")),
        }
    }
}

impl fmt::Display for MembershipSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MembershipSchema::Current => f.write_str("current"),
            MembershipSchema::Legacy => f.write_str("legacy"),
        }
    }
}

/// Stored role of one membership row
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleValue {
    Known(Role),
    /// Non-empty value that is not a known role
    Unrecognized(String),
    /// Null or empty
    Missing,
}

/// Result of a conditional status update
#[derive(Debug, Clone)]
pub enum TransitionOutcome {
    Applied { order: Order, previous: OrderStatus },
    /// The order exists in this restaurant but its status does not allow the move
    Rejected { current: OrderStatus },
    /// No order with this id in this restaurant
    NotFound,
}

#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    async fn membership_exists(&self, user_id: &str, restaurant_id: Uuid) -> StoreResult<bool>;

    /// Restaurant of the user's earliest membership (`added_at` ascending)
    async fn earliest_restaurant(&self, user_id: &str) -> StoreResult<Option<Uuid>>;

    /// Role of the (user, restaurant) membership, `None` when there is no row.
    /// Fails with [`StoreError::RoleColumnMissing`] on tables without a role column.
    async fn membership_role(
        &self,
        user_id: &str,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<RoleValue>>;
}

#[async_trait]
pub trait RestaurantStore: Send + Sync {
    async fn restaurant_by_id(&self, id: Uuid) -> StoreResult<Option<Restaurant>>;
    async fn restaurant_by_slug(&self, slug: &str) -> StoreResult<Option<Restaurant>>;

    async fn list_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> StoreResult<Vec<Order>>;

    /// Move the order to `target` if its current status is one of
    /// `OrderStatus::sources_for(target)`. A `delivery_time` is written to
    /// both ETA columns.
    async fn transition_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
        delivery_time: Option<DateTime<Utc>>,
    ) -> StoreResult<TransitionOutcome>;

    /// Active closure windows
    async fn closure_windows(&self, restaurant_id: Uuid) -> StoreResult<Vec<ClosureWindow>>;
    /// Active blocked-address rules
    async fn blocked_addresses(&self, restaurant_id: Uuid) -> StoreResult<Vec<BlockedAddress>>;

    /// All zones ordered by `min_distance_km`
    async fn delivery_zones(&self, restaurant_id: Uuid) -> StoreResult<Vec<DeliveryZone>>;
    /// `None` when the zone does not exist in this restaurant
    async fn patch_zone(
        &self,
        restaurant_id: Uuid,
        zone_id: Uuid,
        patch: &DeliveryZonePatch,
    ) -> StoreResult<Option<DeliveryZone>>;

    /// Newest first
    async fn list_notifications(
        &self,
        restaurant_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<AdminNotification>>;
    async fn insert_notification(
        &self,
        restaurant_id: Uuid,
        notification: NotificationCreate,
    ) -> StoreResult<AdminNotification>;
    /// Marks `ids` (or every unread notification when `None`) as read; returns the row count
    async fn mark_notifications_read(
        &self,
        restaurant_id: Uuid,
        ids: Option<&[Uuid]>,
    ) -> StoreResult<u64>;

    async fn push_subscriptions(&self, restaurant_id: Uuid) -> StoreResult<Vec<PushSubscription>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn backend_name(&self) -> &'static str;
}

/// Privileged membership access
///
/// Cloning shares the same directory. Only [`crate::auth::TenantResolver`]
/// and [`crate::auth::RoleGate`] hold one.
#[derive(Clone)]
pub struct PrivilegedContext {
    directory: Arc<dyn MembershipDirectory>,
    schema: MembershipSchema,
}

impl PrivilegedContext {
    pub fn new(directory: Arc<dyn MembershipDirectory>, schema: MembershipSchema) -> Self {
        Self { directory, schema }
    }

    pub(crate) fn directory(&self) -> &dyn MembershipDirectory {
        self.directory.as_ref()
    }

    pub fn schema(&self) -> MembershipSchema {
        self.schema
    }
}
