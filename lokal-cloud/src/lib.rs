//! lokal-cloud: restaurant ordering core
//!
//! - Session and tenant resolution for the admin panel
//! - Role gate per operation
//! - Order lifecycle (accept / cancel / status) with queued customer notifications
//! - Public availability check (closures, blocked addresses, distance, zones)
//! - Admin notification feed and web push fan-out

pub mod api;
pub mod auth;
pub mod availability;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod orders;
pub mod state;

pub use config::Config;
pub use state::AppState;

/// Security event logging
///
/// Emits on the `security` target so denials can be routed separately.
///
/// ```ignore
/// security_log!(WARN, "role_denied", user_id = %user.id, restaurant_id = %rid);
/// ```
#[macro_export]
macro_rules! security_log {
    (WARN, $event:expr, $($arg:tt)*) => {
        tracing::warn!(target: "security", event = $event, $($arg)*)
    };
    (ERROR, $event:expr, $($arg:tt)*) => {
        tracing::error!(target: "security", event = $event, $($arg)*)
    };
    (INFO, $event:expr, $($arg:tt)*) => {
        tracing::info!(target: "security", event = $event, $($arg)*)
    };
}
