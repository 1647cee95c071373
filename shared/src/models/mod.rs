//! Data models
//!
//! Canonical records shared by the cloud service and the admin client.
//! Simple rows derive `sqlx::FromRow` behind the `db` feature; records with
//! legacy column names (orders, memberships) are normalised by the cloud
//! service's schema layer instead.
//! All IDs are UUIDs except the external user id, which is opaque.

pub mod availability;
pub mod delivery_zone;
pub mod membership;
pub mod notification;
pub mod order;
pub mod push;
pub mod restaurant;

// Re-exports
pub use availability::*;
pub use delivery_zone::*;
pub use membership::*;
pub use notification::*;
pub use order::*;
pub use push::*;
pub use restaurant::*;
