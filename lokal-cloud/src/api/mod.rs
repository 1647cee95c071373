//! HTTP routes
//!
//! Two groups:
//! - public: health and the availability check
//! - tenant-scoped: everything behind [`require_tenant`], which resolves the
//!   session and the restaurant before any handler runs. Handlers then pass
//!   the scope through the role gate with the roles their operation accepts.

pub mod availability;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod push;
pub mod zones;

use axum::body::Bytes;
use axum::routing::{get, patch, post};
use axum::{Json, Router, middleware};
use http::HeaderValue;
use http::header::CACHE_CONTROL;
use serde::de::DeserializeOwned;
use shared::error::{AppError, ErrorCode};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::auth::require_tenant;
use crate::error::ServiceError;
use crate::state::AppState;

pub type ApiResult<T> = Result<Json<T>, ServiceError>;

/// Parse a JSON body; malformed JSON is a 400 carrying the parser's reason
pub(crate) fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| {
        AppError::with_message(ErrorCode::InvalidFormat, "Invalid JSON body")
            .with_detail("reason", e.to_string())
    })
}

/// Like [`parse_body`], but an empty body yields `T::default()`
pub(crate) fn parse_optional_body<T: DeserializeOwned + Default>(body: &Bytes) -> Result<T, AppError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    parse_body(body)
}

/// Build the full application router
pub fn create_router(state: AppState) -> Router {
    let tenant = Router::new()
        .route("/api/admin/orders", get(orders::list_orders))
        .route("/api/admin/orders/{id}", patch(orders::update_status))
        .route("/api/admin/{id}/accept", post(orders::accept))
        .route("/api/admin/{id}", patch(zones::patch_zone))
        .route("/api/admin/zones", get(zones::list_zones))
        .route(
            "/api/admin/notifications",
            get(notifications::list).post(notifications::mark_read),
        )
        .route("/api/orders/cancel", post(orders::cancel))
        .route("/api/push/send", post(push::send))
        .layer(middleware::from_fn_with_state(state.clone(), require_tenant));

    let public = Router::new()
        .route("/health", get(health::health_check))
        .route(
            "/api/orders/check-availability",
            post(availability::check_availability),
        );

    Router::new()
        .merge(public)
        .merge(tenant)
        .layer(SetResponseHeaderLayer::overriding(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
