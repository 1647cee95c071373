//! Tenant resolution
//!
//! Maps a verified user to exactly one restaurant per request:
//! 1. The `restaurant_id` hint cookie, if it normalises to a UUID **and** the
//!    user has a membership there.
//! 2. Otherwise the user's earliest membership.
//!
//! The resolved id is written back into the hint cookie (plus a readable
//! slug cookie) when it differs from the hint. Cookie writing is best-effort.

use std::borrow::Cow;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http::HeaderValue;
use http::header::SET_COOKIE;
use http::request::Parts;
use shared::error::{AppError, ErrorCode};
use uuid::Uuid;

use super::identity::AuthUser;
use super::session;
use crate::db::{PrivilegedContext, RestaurantStore};
use crate::security_log;
use crate::state::AppState;

/// Hint cookie lifetime (30 days)
pub const TENANT_COOKIE_MAX_AGE: i64 = 60 * 60 * 24 * 30;

/// User and restaurant of the current request; role not yet checked
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub user: AuthUser,
    pub restaurant_id: Uuid,
}

#[derive(Debug, Clone)]
pub struct TenantCookies {
    pub id_cookie: String,
    pub slug_cookie: String,
    pub secure: bool,
}

/// Resolved scope plus the `Set-Cookie` values to attach to the response
#[derive(Debug)]
pub struct Resolution {
    pub scope: TenantScope,
    pub set_cookies: Vec<HeaderValue>,
}

pub struct TenantResolver {
    privileged: PrivilegedContext,
    store: Arc<dyn RestaurantStore>,
    cookies: TenantCookies,
}

/// Percent-decode, keep `[0-9A-Fa-f-]`, lowercase, and accept only the
/// 8-4-4-4-12 shape
pub fn normalize_restaurant_id(raw: &str) -> Option<Uuid> {
    // `%22` would otherwise leave stray hex digits behind
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    let cleaned: String = decoded
        .chars()
        .filter(|c| c.is_ascii_hexdigit() || *c == '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();

    let groups: Vec<&str> = cleaned.split('-').collect();
    let shape_ok = groups.len() == 5
        && groups
            .iter()
            .zip([8usize, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len);
    if !shape_ok {
        return None;
    }
    Uuid::parse_str(&cleaned).ok()
}

impl TenantResolver {
    pub fn new(
        privileged: PrivilegedContext,
        store: Arc<dyn RestaurantStore>,
        cookies: TenantCookies,
    ) -> Self {
        Self {
            privileged,
            store,
            cookies,
        }
    }

    pub async fn resolve(&self, user: AuthUser, hint: Option<&str>) -> Result<Resolution, AppError> {
        let directory = self.privileged.directory();
        let hinted = hint.and_then(normalize_restaurant_id);

        let mut restaurant_id = None;
        if let Some(candidate) = hinted {
            let member = directory
                .membership_exists(&user.id, candidate)
                .await
                .map_err(|e| {
                    tracing::error!(user_id = %user.id, error = %e, "Membership lookup failed");
                    AppError::new(ErrorCode::RoleLookupFailed)
                })?;
            if member {
                restaurant_id = Some(candidate);
            } else {
                security_log!(
                    WARN,
                    "tenant_hint_rejected",
                    user_id = %user.id,
                    restaurant_id = %candidate
                );
            }
        }

        let restaurant_id = match restaurant_id {
            Some(id) => id,
            None => directory
                .earliest_restaurant(&user.id)
                .await
                .map_err(|e| {
                    tracing::error!(user_id = %user.id, error = %e, "Membership lookup failed");
                    AppError::new(ErrorCode::RoleLookupFailed)
                })?
                .ok_or_else(|| {
                    security_log!(WARN, "no_restaurant_access", user_id = %user.id);
                    AppError::new(ErrorCode::NoRestaurantAccess)
                })?,
        };

        let set_cookies = if hinted == Some(restaurant_id) {
            Vec::new()
        } else {
            self.heal_cookies(restaurant_id).await
        };

        Ok(Resolution {
            scope: TenantScope {
                user,
                restaurant_id,
            },
            set_cookies,
        })
    }

    async fn heal_cookies(&self, restaurant_id: Uuid) -> Vec<HeaderValue> {
        let mut out = Vec::with_capacity(2);
        if let Some(v) = self.cookie(&self.cookies.id_cookie, &restaurant_id.to_string(), true) {
            out.push(v);
        }

        match self.store.restaurant_by_id(restaurant_id).await {
            Ok(Some(restaurant)) => {
                let slug = urlencoding::encode(&restaurant.slug);
                if let Some(v) = self.cookie(&self.cookies.slug_cookie, &slug, false) {
                    out.push(v);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::debug!(restaurant_id = %restaurant_id, "Slug lookup for cookie failed: {e}"),
        }
        out
    }

    fn cookie(&self, name: &str, value: &str, http_only: bool) -> Option<HeaderValue> {
        let mut cookie =
            format!("{name}={value}; Path=/; Max-Age={TENANT_COOKIE_MAX_AGE}; SameSite=Lax");
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.cookies.secure {
            cookie.push_str("; Secure");
        }
        HeaderValue::from_str(&cookie)
            .map_err(|e| tracing::debug!("Skipping cookie {name}: {e}"))
            .ok()
    }
}

/// Middleware for tenant-scoped routes
///
/// Verifies the session, resolves the restaurant, injects [`TenantScope`]
/// into request extensions and appends the cookie write-back to the response.
pub async fn require_tenant(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let headers = request.headers();
    let Some(token) = session::extract_token(headers, &state.config.session_cookie_name) else {
        security_log!(WARN, "auth_missing", uri = %request.uri());
        return AppError::unauthorized().into_response();
    };

    let Some(user) = state.identity.verify(&token).await else {
        security_log!(WARN, "auth_failed", uri = %request.uri());
        return AppError::unauthorized().into_response();
    };

    let hint = session::cookie_value(request.headers(), &state.config.tenant_cookie_name);
    let resolution = match state.tenant_resolver.resolve(user, hint.as_deref()).await {
        Ok(r) => r,
        Err(e) => return e.into_response(),
    };

    request.extensions_mut().insert(resolution.scope);
    let mut response = next.run(request).await;
    for cookie in resolution.set_cookies {
        response.headers_mut().append(SET_COOKIE, cookie);
    }
    response
}

impl<S> FromRequestParts<S> for TenantScope
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<TenantScope>()
            .cloned()
            .ok_or_else(AppError::unauthorized)
    }
}
