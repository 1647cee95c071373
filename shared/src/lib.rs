//! Shared types for the Lokal ordering platform
//!
//! Common types used across the cloud service and the admin client:
//! error codes and the JSON error body, tenant/order domain models,
//! the retry policy used for outbound calls, and JSON coercion helpers.

pub mod error;
pub mod models;
pub mod retry;
pub mod util;

// Re-exports
pub use error::{AppError, AppResult, ErrorBody, ErrorCode};
pub use retry::RetryPolicy;
