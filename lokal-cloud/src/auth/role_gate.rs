//! Role gate
//!
//! Confirms the (user, restaurant) membership carries one of the roles an
//! operation accepts. Runs after tenant resolution on every admin handler.

use axum::response::{IntoResponse, Response};
use http::StatusCode;
use shared::error::{AppError, ErrorCode};
use shared::models::{DEFAULT_ADMIN_ROLES, Role};
use uuid::Uuid;

use super::identity::AuthUser;
use super::tenant::TenantScope;
use crate::db::{MembershipSchema, PrivilegedContext, RoleValue, StoreError};
use crate::error::ServiceError;
use crate::security_log;

pub const FORBIDDEN: &str = "FORBIDDEN";
pub const FORBIDDEN_ROLE: &str = "FORBIDDEN_ROLE";
pub const ROLE_LOOKUP_ERROR: &str = "ROLE_LOOKUP_ERROR";

/// Fully authorized request context
#[derive(Debug, Clone)]
pub struct TenantContext {
    pub user: AuthUser,
    pub restaurant_id: Uuid,
    pub role: Role,
}

#[derive(Debug, Clone, thiserror::Error)]
#[error("{message}")]
pub struct AdminAuthError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl AdminAuthError {
    fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: FORBIDDEN,
            message: "Forbidden".into(),
        }
    }

    fn forbidden_role(role: &str) -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            code: FORBIDDEN_ROLE,
            message: format!("Role '{role}' is not allowed to perform this operation"),
        }
    }

    fn lookup_failed() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: ROLE_LOOKUP_ERROR,
            message: ErrorCode::RoleLookupFailed.message().into(),
        }
    }
}

impl From<AdminAuthError> for AppError {
    fn from(e: AdminAuthError) -> Self {
        let code = match e.code {
            FORBIDDEN_ROLE => ErrorCode::RoleNotAllowed,
            ROLE_LOOKUP_ERROR => ErrorCode::RoleLookupFailed,
            _ => ErrorCode::PermissionDenied,
        };
        AppError::with_message(code, e.message)
    }
}

impl From<AdminAuthError> for ServiceError {
    fn from(e: AdminAuthError) -> Self {
        ServiceError::App(e.into())
    }
}

impl IntoResponse for AdminAuthError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}

pub struct RoleGate {
    privileged: PrivilegedContext,
}

impl RoleGate {
    pub fn new(privileged: PrivilegedContext) -> Self {
        Self { privileged }
    }

    /// Check the membership role against `accepted` (empty means
    /// [`DEFAULT_ADMIN_ROLES`]).
    pub async fn require(
        &self,
        scope: &TenantScope,
        accepted: &[Role],
    ) -> Result<TenantContext, AdminAuthError> {
        let accepted = if accepted.is_empty() {
            DEFAULT_ADMIN_ROLES
        } else {
            accepted
        };

        let role = self.lookup_role(scope).await?;
        if !accepted.contains(&role) {
            security_log!(
                WARN,
                "role_denied",
                user_id = %scope.user.id,
                restaurant_id = %scope.restaurant_id,
                role = %role
            );
            return Err(AdminAuthError::forbidden_role(role.as_str()));
        }

        Ok(TenantContext {
            user: scope.user.clone(),
            restaurant_id: scope.restaurant_id,
            role,
        })
    }

    async fn lookup_role(&self, scope: &TenantScope) -> Result<Role, AdminAuthError> {
        if self.privileged.schema() == MembershipSchema::Legacy {
            return self.legacy_role(scope).await;
        }

        let lookup = self
            .privileged
            .directory()
            .membership_role(&scope.user.id, scope.restaurant_id)
            .await;

        match lookup {
            Ok(Some(RoleValue::Known(role))) => Ok(role),
            Ok(Some(RoleValue::Unrecognized(raw))) => {
                security_log!(
                    WARN,
                    "role_unrecognized",
                    user_id = %scope.user.id,
                    restaurant_id = %scope.restaurant_id,
                    role = %raw
                );
                Err(AdminAuthError::forbidden_role(&raw))
            }
            Ok(Some(RoleValue::Missing)) | Ok(None) => {
                security_log!(
                    WARN,
                    "role_missing",
                    user_id = %scope.user.id,
                    restaurant_id = %scope.restaurant_id
                );
                Err(AdminAuthError::forbidden())
            }
            Err(StoreError::RoleColumnMissing) => {
                tracing::warn!(
                    restaurant_id = %scope.restaurant_id,
                    "Membership table has no role column, treating membership as admin"
                );
                self.legacy_role(scope).await
            }
            Err(e) => {
                tracing::error!(user_id = %scope.user.id, error = %e, "Role lookup failed");
                Err(AdminAuthError::lookup_failed())
            }
        }
    }

    /// Tables without roles: any membership counts as `admin`
    async fn legacy_role(&self, scope: &TenantScope) -> Result<Role, AdminAuthError> {
        let exists = self
            .privileged
            .directory()
            .membership_exists(&scope.user.id, scope.restaurant_id)
            .await
            .map_err(|e| {
                tracing::error!(user_id = %scope.user.id, error = %e, "Membership lookup failed");
                AdminAuthError::lookup_failed()
            })?;
        if exists {
            Ok(Role::Admin)
        } else {
            Err(AdminAuthError::forbidden())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use chrono::Utc;
    use shared::models::{ALL_ROLES, MANAGEMENT_ROLES};
    use std::sync::Arc;

    fn scope(user: &str, restaurant_id: Uuid) -> TenantScope {
        TenantScope {
            user: AuthUser {
                id: user.into(),
                email: None,
            },
            restaurant_id,
        }
    }

    fn gate(store: MemoryStore, schema: MembershipSchema) -> RoleGate {
        RoleGate::new(PrivilegedContext::new(Arc::new(store), schema))
    }

    #[tokio::test]
    async fn default_roles_reject_employee() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        store
            .insert_membership("u1", rid, Some("employee"), Utc::now())
            .await;
        let gate = gate(store, MembershipSchema::Current);

        let err = gate.require(&scope("u1", rid), &[]).await.unwrap_err();
        assert_eq!(err.code, FORBIDDEN_ROLE);
        assert_eq!(err.status, StatusCode::FORBIDDEN);

        let ctx = gate.require(&scope("u1", rid), ALL_ROLES).await.unwrap();
        assert_eq!(ctx.role, Role::Employee);
    }

    #[tokio::test]
    async fn no_membership_is_forbidden() {
        let gate = gate(MemoryStore::new(), MembershipSchema::Current);
        let err = gate
            .require(&scope("u1", Uuid::new_v4()), ALL_ROLES)
            .await
            .unwrap_err();
        assert_eq!(err.code, FORBIDDEN);
    }

    #[tokio::test]
    async fn null_role_is_forbidden() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        store.insert_membership("u1", rid, None, Utc::now()).await;
        let err = gate(store, MembershipSchema::Current)
            .require(&scope("u1", rid), ALL_ROLES)
            .await
            .unwrap_err();
        assert_eq!(err.code, FORBIDDEN);
    }

    #[tokio::test]
    async fn legacy_schema_treats_membership_as_admin() {
        let store = MemoryStore::new();
        let rid = Uuid::new_v4();
        store
            .insert_membership("u1", rid, Some("employee"), Utc::now())
            .await;
        let ctx = gate(store, MembershipSchema::Legacy)
            .require(&scope("u1", rid), MANAGEMENT_ROLES)
            .await
            .unwrap();
        assert_eq!(ctx.role, Role::Admin);
    }

    #[tokio::test]
    async fn missing_role_column_falls_back_but_still_needs_membership() {
        let store = MemoryStore::without_role_column();
        let rid = Uuid::new_v4();
        store.insert_membership("u1", rid, None, Utc::now()).await;
        let gate = gate(store, MembershipSchema::Current);

        let ctx = gate.require(&scope("u1", rid), &[]).await.unwrap();
        assert_eq!(ctx.role, Role::Admin);

        let err = gate
            .require(&scope("stranger", rid), &[])
            .await
            .unwrap_err();
        assert_eq!(err.code, FORBIDDEN);
    }

    #[test]
    fn maps_to_app_error_codes() {
        let app: AppError = AdminAuthError::lookup_failed().into();
        assert_eq!(app.code, ErrorCode::RoleLookupFailed);
        assert_eq!(app.http_status(), StatusCode::INTERNAL_SERVER_ERROR);
        let app: AppError = AdminAuthError::forbidden_role("employee").into();
        assert_eq!(app.code.as_str(), "FORBIDDEN_ROLE");
    }
}
