//! Lokal admin client
//!
//! Typed HTTP client for the cloud service's admin and public ordering
//! endpoints.
//!
//! # Example
//!
//! ```ignore
//! use lokal_client::{AdminClient, ClientConfig};
//!
//! let client = AdminClient::new(ClientConfig::new("http://localhost:8080").with_token(token))?;
//! let accepted = client.accept_order(order_id, Some(45)).await?;
//! ```

pub mod config;
pub mod error;
pub mod http;

pub use config::ClientConfig;
pub use error::{ClientError, ClientResult};
pub use http::AdminClient;

// Re-export shared types for convenience
pub use shared::models::{AvailabilityRequest, AvailabilityResponse, OrderTransitionResponse};
pub use shared::{ErrorBody, RetryPolicy};
