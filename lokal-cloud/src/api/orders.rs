//! Order endpoints: accept, cancel, status update, list

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use serde::Deserialize;
use serde_json::Value;
use shared::error::{AppError, ErrorCode};
use shared::models::{ALL_ROLES, Order, OrderStatus, OrderTransitionResponse};
use shared::util::coerce_number;

use super::{ApiResult, parse_body, parse_optional_body};
use crate::auth::TenantScope;
use crate::orders::{clamp_minutes, parse_order_id};
use crate::state::AppState;

/// POST /api/admin/{id}/accept
///
/// Body `{minutes?}`; a number or numeric string, clamped to `[5, 180]`.
pub async fn accept(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<OrderTransitionResponse> {
    let order_id = parse_order_id(&id)?;
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;

    let body: Value = parse_optional_body(&body)?;
    let minutes = clamp_minutes(body.get("minutes").and_then(coerce_number));

    let resp = state
        .orders
        .accept(ctx.restaurant_id, order_id, minutes)
        .await?;
    Ok(Json(resp))
}

/// POST /api/orders/cancel
///
/// Body `{orderId}`
pub async fn cancel(
    State(state): State<AppState>,
    scope: TenantScope,
    body: Bytes,
) -> ApiResult<OrderTransitionResponse> {
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;

    let body: Value = parse_body(&body)?;
    let raw = body
        .get("orderId")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::RequiredField, "orderId is required")
                .with_detail("field", "orderId")
        })?;
    let order_id = parse_order_id(raw)?;

    let resp = state.orders.cancel(ctx.restaurant_id, order_id).await?;
    Ok(Json(resp))
}

/// PATCH /api/admin/orders/{id}
///
/// Body `{status}`; must name a known status reachable from the current one.
pub async fn update_status(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<OrderTransitionResponse> {
    let order_id = parse_order_id(&id)?;
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;

    let body: Value = parse_body(&body)?;
    let raw = body
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| AppError::invalid_field("status", "status is required"))?;
    let target: OrderStatus = raw.parse().map_err(|_| {
        AppError::invalid_field("status", format!("Unknown status '{raw}'"))
            .with_detail("allowed", OrderStatus::ALL.map(|s| s.as_str()).to_vec())
    })?;

    let resp = state
        .orders
        .update_status(ctx.restaurant_id, order_id, target)
        .await?;
    Ok(Json(resp))
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub limit: Option<String>,
}

/// GET /api/admin/orders?status=&limit=
pub async fn list_orders(
    State(state): State<AppState>,
    scope: TenantScope,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Vec<Order>> {
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;

    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(raw.parse::<OrderStatus>().map_err(|_| {
            AppError::invalid_field("status", format!("Unknown status '{raw}'"))
        })?),
        None => None,
    };
    let limit = match query.limit.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            raw.parse::<i64>()
                .map_err(|_| AppError::invalid_field("limit", "limit must be an integer"))?,
        ),
        None => None,
    };

    let orders = state.orders.list(ctx.restaurant_id, status, limit).await?;
    Ok(Json(orders))
}
