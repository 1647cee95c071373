//! Push send endpoint

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use shared::models::{MANAGEMENT_ROLES, PushSendRequest, PushSendResponse};

use super::{ApiResult, parse_optional_body};
use crate::auth::TenantScope;
use crate::notify::{NotificationJob, push::sanitize};
use crate::state::AppState;

/// POST /api/push/send
///
/// Fans the sanitised payload out to every push subscription of the restaurant.
pub async fn send(
    State(state): State<AppState>,
    scope: TenantScope,
    body: Bytes,
) -> ApiResult<PushSendResponse> {
    let ctx = state.role_gate.require(&scope, MANAGEMENT_ROLES).await?;
    let req: PushSendRequest = parse_optional_body(&body)?;
    let payload = sanitize(&req, &state.config.push_default_url);

    let subscriptions = state.store.push_subscriptions(ctx.restaurant_id).await?;
    let queued = subscriptions.len();
    for subscription in subscriptions {
        state.notifier.enqueue(NotificationJob::Push {
            subscription,
            payload: payload.clone(),
        });
    }

    tracing::info!(
        restaurant_id = %ctx.restaurant_id,
        user_id = %ctx.user.id,
        queued,
        kind = %payload.kind,
        "Push queued"
    );
    Ok(Json(PushSendResponse { queued }))
}
