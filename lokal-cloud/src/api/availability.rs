//! Public availability check

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use shared::models::{AvailabilityRequest, AvailabilityResponse};

use super::{ApiResult, parse_body};
use crate::state::AppState;

/// POST /api/orders/check-availability
///
/// Body `{restaurantId | slug, delivery, address?, orderValue?}`. Rejections
/// (closed, blocked, out of range, below minimum) are 403s.
pub async fn check_availability(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<AvailabilityResponse> {
    let req: AvailabilityRequest = parse_body(&body)?;
    let resp = state.availability.check(&req).await?;
    Ok(Json(resp))
}
