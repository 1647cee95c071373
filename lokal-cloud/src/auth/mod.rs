//! Request authentication and authorization
//!
//! session token → [`AuthUser`] → [`TenantScope`] → [`TenantContext`]

pub mod identity;
pub mod role_gate;
pub mod session;
pub mod tenant;

pub use identity::{AuthUser, IdentityProvider, JwtIdentityProvider, RemoteIdentityProvider};
pub use role_gate::{AdminAuthError, RoleGate, TenantContext};
pub use tenant::{TenantCookies, TenantResolver, TenantScope, require_tenant};
