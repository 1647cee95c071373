//! Admin notification feed

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use serde::Serialize;
use shared::models::{ALL_ROLES, AdminNotification, MarkReadRequest};

use super::{ApiResult, parse_optional_body};
use crate::auth::TenantScope;
use crate::state::AppState;

/// Page size of the feed
pub const FEED_LIMIT: i64 = 50;

#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub updated: u64,
}

/// GET /api/admin/notifications
pub async fn list(
    State(state): State<AppState>,
    scope: TenantScope,
) -> ApiResult<Vec<AdminNotification>> {
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;
    let feed = state
        .store
        .list_notifications(ctx.restaurant_id, FEED_LIMIT)
        .await?;
    Ok(Json(feed))
}

/// POST /api/admin/notifications
///
/// Body `{ids?}`; without ids every notification of the restaurant is marked read.
pub async fn mark_read(
    State(state): State<AppState>,
    scope: TenantScope,
    body: Bytes,
) -> ApiResult<MarkReadResponse> {
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;
    let req: MarkReadRequest = parse_optional_body(&body)?;

    let updated = state
        .store
        .mark_notifications_read(ctx.restaurant_id, req.ids.as_deref())
        .await?;
    tracing::debug!(restaurant_id = %ctx.restaurant_id, updated, "Notifications marked read");
    Ok(Json(MarkReadResponse { updated }))
}
