//! PostgreSQL backend
//!
//! All restaurant data queries filter on `restaurant_id`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    AdminNotification, BlockedAddress, ClosureWindow, DeliveryZone, DeliveryZonePatch,
    NotificationCreate, Order, OrderStatus, PushSubscription, Restaurant,
};
use sqlx::PgPool;
use uuid::Uuid;

use super::schema::{self, ORDER_COLUMNS, OrderRow, TransitionRow};
use super::{
    MembershipDirectory, RestaurantStore, RoleValue, StoreError, StoreResult, TransitionOutcome,
};

/// SQLSTATE `undefined_column`
const UNDEFINED_COLUMN: &str = "42703";

const RESTAURANT_COLUMNS: &str =
    "id, slug, name, city, phone, email, address, active, lat, lng, max_delivery_km";

const ZONE_COLUMNS: &str = "id, restaurant_id, name, min_distance_km, max_distance_km, min_order_value, cost, free_over, cost_per_km, eta_min_minutes, eta_max_minutes, active";

const NOTIFICATION_COLUMNS: &str = "id, restaurant_id, kind, title, body, url, read, created_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply pending migrations
    pub async fn connect(database_url: &str) -> Result<Self, crate::error::BoxError> {
        let pool = PgPool::connect(database_url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self::new(pool))
    }
}

fn is_undefined_column(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        return db_err
            .code()
            .map(|code| code == UNDEFINED_COLUMN)
            .unwrap_or(false);
    }
    false
}

#[async_trait]
impl MembershipDirectory for PgStore {
    async fn membership_exists(&self, user_id: &str, restaurant_id: Uuid) -> StoreResult<bool> {
        let found: Option<(i32,)> = sqlx::query_as(
            "SELECT 1 FROM restaurant_users WHERE user_id = $1 AND restaurant_id = $2",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.is_some())
    }

    async fn earliest_restaurant(&self, user_id: &str) -> StoreResult<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT restaurant_id
            FROM restaurant_users
            WHERE user_id = $1
            ORDER BY added_at ASC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn membership_role(
        &self,
        user_id: &str,
        restaurant_id: Uuid,
    ) -> StoreResult<Option<RoleValue>> {
        let row: Option<(Option<String>,)> = sqlx::query_as(
            "SELECT role FROM restaurant_users WHERE user_id = $1 AND restaurant_id = $2",
        )
        .bind(user_id)
        .bind(restaurant_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            if is_undefined_column(&e) {
                StoreError::RoleColumnMissing
            } else {
                e.into()
            }
        })?;
        Ok(row.map(|(role,)| schema::role_value(role.as_deref())))
    }
}

#[async_trait]
impl RestaurantStore for PgStore {
    async fn restaurant_by_id(&self, id: Uuid) -> StoreResult<Option<Restaurant>> {
        let row = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn restaurant_by_slug(&self, slug: &str) -> StoreResult<Option<Restaurant>> {
        let row = sqlx::query_as(&format!(
            "SELECT {RESTAURANT_COLUMNS} FROM restaurants WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_orders(
        &self,
        restaurant_id: Uuid,
        status: Option<OrderStatus>,
        limit: i64,
    ) -> StoreResult<Vec<Order>> {
        let rows: Vec<OrderRow> = sqlx::query_as(&format!(
            r#"
            SELECT {ORDER_COLUMNS}
            FROM orders
            WHERE restaurant_id = $1 AND ($2::TEXT IS NULL OR status = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        ))
        .bind(restaurant_id)
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(schema::order_from_row).collect()
    }

    async fn transition_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
        delivery_time: Option<DateTime<Utc>>,
    ) -> StoreResult<TransitionOutcome> {
        let sources = schema::stored_spellings(OrderStatus::sources_for(target));

        // Single conditional UPDATE; the CTE only exposes the pre-update status.
        // Stored statuses may differ in case or spelling from the canonical form.
        let row: Option<TransitionRow> = sqlx::query_as(
            r#"
            WITH prev AS (
                SELECT id, status
                FROM orders
                WHERE id = $1 AND restaurant_id = $2
                FOR UPDATE
            )
            UPDATE orders o
            SET status = $3,
                delivery_time = COALESCE($4, o.delivery_time),
                "deliveryTime" = COALESCE($4, o."deliveryTime")
            FROM prev
            WHERE o.id = prev.id AND lower(btrim(prev.status)) = ANY($5)
            RETURNING o.id, o.restaurant_id, o.status, o.contact_email, o.phone, o.name,
                      o.selected_option, o.delivery_time, o."deliveryTime", o.created_at,
                      prev.status AS previous_status
            "#,
        )
        .bind(order_id)
        .bind(restaurant_id)
        .bind(target.as_str())
        .bind(delivery_time)
        .bind(&sources)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = row {
            let previous = schema::parse_status(&row.previous_status)?;
            let order = schema::order_from_row(row.order)?;
            return Ok(TransitionOutcome::Applied { order, previous });
        }

        let current: Option<(String,)> =
            sqlx::query_as("SELECT status FROM orders WHERE id = $1 AND restaurant_id = $2")
                .bind(order_id)
                .bind(restaurant_id)
                .fetch_optional(&self.pool)
                .await?;
        match current {
            Some((status,)) => Ok(TransitionOutcome::Rejected {
                current: schema::parse_status(&status)?,
            }),
            None => Ok(TransitionOutcome::NotFound),
        }
    }

    async fn closure_windows(&self, restaurant_id: Uuid) -> StoreResult<Vec<ClosureWindow>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, weekday, start_time, end_time, reason, active
            FROM closure_windows
            WHERE restaurant_id = $1 AND active
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn blocked_addresses(&self, restaurant_id: Uuid) -> StoreResult<Vec<BlockedAddress>> {
        let rows = sqlx::query_as(
            r#"
            SELECT id, restaurant_id, pattern, match_type, active
            FROM blocked_addresses
            WHERE restaurant_id = $1 AND active
            "#,
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn delivery_zones(&self, restaurant_id: Uuid) -> StoreResult<Vec<DeliveryZone>> {
        let rows = sqlx::query_as(&format!(
            "SELECT {ZONE_COLUMNS} FROM delivery_zones WHERE restaurant_id = $1 ORDER BY min_distance_km, name"
        ))
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn patch_zone(
        &self,
        restaurant_id: Uuid,
        zone_id: Uuid,
        patch: &DeliveryZonePatch,
    ) -> StoreResult<Option<DeliveryZone>> {
        let row = sqlx::query_as(&format!(
            r#"
            UPDATE delivery_zones SET
                name = COALESCE($3, name),
                min_distance_km = COALESCE($4, min_distance_km),
                max_distance_km = COALESCE($5, max_distance_km),
                min_order_value = COALESCE($6, min_order_value),
                cost = COALESCE($7, cost),
                free_over = COALESCE($8, free_over),
                cost_per_km = COALESCE($9, cost_per_km),
                eta_min_minutes = COALESCE($10, eta_min_minutes),
                eta_max_minutes = COALESCE($11, eta_max_minutes),
                active = COALESCE($12, active)
            WHERE id = $1 AND restaurant_id = $2
            RETURNING {ZONE_COLUMNS}
            "#
        ))
        .bind(zone_id)
        .bind(restaurant_id)
        .bind(&patch.name)
        .bind(patch.min_distance_km)
        .bind(patch.max_distance_km)
        .bind(patch.min_order_value)
        .bind(patch.cost)
        .bind(patch.free_over)
        .bind(patch.cost_per_km)
        .bind(patch.eta_min_minutes)
        .bind(patch.eta_max_minutes)
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list_notifications(
        &self,
        restaurant_id: Uuid,
        limit: i64,
    ) -> StoreResult<Vec<AdminNotification>> {
        let rows = sqlx::query_as(&format!(
            r#"
            SELECT {NOTIFICATION_COLUMNS}
            FROM admin_notifications
            WHERE restaurant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(restaurant_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_notification(
        &self,
        restaurant_id: Uuid,
        notification: NotificationCreate,
    ) -> StoreResult<AdminNotification> {
        let row = sqlx::query_as(&format!(
            r#"
            INSERT INTO admin_notifications (restaurant_id, kind, title, body, url)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {NOTIFICATION_COLUMNS}
            "#
        ))
        .bind(restaurant_id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.body)
        .bind(&notification.url)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn mark_notifications_read(
        &self,
        restaurant_id: Uuid,
        ids: Option<&[Uuid]>,
    ) -> StoreResult<u64> {
        let result = match ids {
            Some(ids) => {
                sqlx::query(
                    "UPDATE admin_notifications SET read = TRUE WHERE restaurant_id = $1 AND id = ANY($2) AND NOT read",
                )
                .bind(restaurant_id)
                .bind(ids)
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "UPDATE admin_notifications SET read = TRUE WHERE restaurant_id = $1 AND NOT read",
                )
                .bind(restaurant_id)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected())
    }

    async fn push_subscriptions(&self, restaurant_id: Uuid) -> StoreResult<Vec<PushSubscription>> {
        let rows = sqlx::query_as(
            "SELECT id, restaurant_id, endpoint, p256dh, auth FROM push_subscriptions WHERE restaurant_id = $1",
        )
        .bind(restaurant_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
