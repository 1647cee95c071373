//! Errors shared by the cloud service and the admin client
//!
//! - [`ErrorCode`]: numeric code, machine string, default message, HTTP status
//! - [`AppError`]: code plus message and optional details
//! - [`ErrorBody`]: the JSON body every failed request returns
//!
//! ```
//! use shared::error::{AppError, ErrorBody};
//!
//! let err = AppError::invalid_field("status", "Unknown status");
//! let body = ErrorBody::from(&err);
//! assert_eq!(body.code.as_deref(), Some("VALIDATION_FAILED"));
//! ```

mod codes;
mod types;

pub use codes::ErrorCode;
pub use types::{AppError, AppResult, ErrorBody};
