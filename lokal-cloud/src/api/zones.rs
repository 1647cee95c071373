//! Delivery zone administration

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use serde_json::{Map, Value};
use shared::error::{AppError, ErrorCode};
use shared::models::{ALL_ROLES, DeliveryZone, DeliveryZonePatch, MANAGEMENT_ROLES};
use shared::util::{coerce_number, truncate_chars};
use uuid::Uuid;

use super::{ApiResult, parse_body};
use crate::auth::TenantScope;
use crate::state::AppState;

const MAX_ZONE_NAME_CHARS: usize = 80;

/// GET /api/admin/zones
pub async fn list_zones(
    State(state): State<AppState>,
    scope: TenantScope,
) -> ApiResult<Vec<DeliveryZone>> {
    let ctx = state.role_gate.require(&scope, ALL_ROLES).await?;
    let zones = state.store.delivery_zones(ctx.restaurant_id).await?;
    Ok(Json(zones))
}

/// PATCH /api/admin/{id}
///
/// Numeric fields accept numbers or numeric strings; anything that does not
/// coerce is dropped. Only the remaining keys are written.
pub async fn patch_zone(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(id): Path<String>,
    body: Bytes,
) -> ApiResult<DeliveryZone> {
    let zone_id = Uuid::parse_str(id.trim())
        .map_err(|_| AppError::invalid_field("id", "Invalid zone id"))?;
    let ctx = state.role_gate.require(&scope, MANAGEMENT_ROLES).await?;

    let body: Value = parse_body(&body)?;
    let fields = body
        .as_object()
        .ok_or_else(|| AppError::validation("Body must be a JSON object"))?;
    let patch = zone_patch_from_json(fields);
    if patch.is_empty() {
        return Err(AppError::validation("No updatable fields in body").into());
    }

    let zone = state
        .store
        .patch_zone(ctx.restaurant_id, zone_id, &patch)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ZoneNotFound))?;

    tracing::info!(zone_id = %zone_id, restaurant_id = %ctx.restaurant_id, "Delivery zone updated");
    Ok(Json(zone))
}

fn number(fields: &Map<String, Value>, key: &str) -> Option<f64> {
    fields.get(key).and_then(coerce_number).filter(|n| *n >= 0.0)
}

fn minutes(fields: &Map<String, Value>, key: &str) -> Option<i32> {
    number(fields, key)
        .filter(|n| *n <= f64::from(i32::MAX))
        .map(|n| n.round() as i32)
}

fn flag(fields: &Map<String, Value>, key: &str) -> Option<bool> {
    match fields.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Coerce a loose JSON object into a patch; unknown keys are ignored
pub fn zone_patch_from_json(fields: &Map<String, Value>) -> DeliveryZonePatch {
    DeliveryZonePatch {
        name: fields
            .get("name")
            .and_then(Value::as_str)
            .map(|s| truncate_chars(s, MAX_ZONE_NAME_CHARS))
            .filter(|s| !s.is_empty()),
        min_distance_km: number(fields, "min_distance_km"),
        max_distance_km: number(fields, "max_distance_km"),
        min_order_value: number(fields, "min_order_value"),
        cost: number(fields, "cost"),
        free_over: number(fields, "free_over"),
        cost_per_km: number(fields, "cost_per_km"),
        eta_min_minutes: minutes(fields, "eta_min_minutes"),
        eta_max_minutes: minutes(fields, "eta_max_minutes"),
        active: flag(fields, "active"),
    }
}
