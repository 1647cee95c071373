//! HTTP client for the restaurant admin API

use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use shared::ErrorBody;
use shared::models::{AvailabilityRequest, AvailabilityResponse, OrderTransitionResponse};
use shared::retry::RetryError;
use uuid::Uuid;

use crate::{ClientConfig, ClientError, ClientResult};

/// Admin API client bound to one session token
#[derive(Debug, Clone)]
pub struct AdminClient {
    client: Client,
    config: ClientConfig,
}

impl AdminClient {
    /// Create a new client from configuration
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Get the current token
    pub fn token(&self) -> Option<&str> {
        self.config.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Make a POST request with JSON body
    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ClientResult<T> {
        let mut request = self.client.post(self.url(path)).json(body);
        if let Some(token) = self.token() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        Self::handle_response(response).await
    }

    /// Map non-2xx statuses onto [`ClientError`] using the JSON error body
    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await?;
            let body = serde_json::from_str::<ErrorBody>(&text).unwrap_or(ErrorBody {
                error: text,
                code: None,
                details: None,
            });
            return Err(match status {
                StatusCode::UNAUTHORIZED => ClientError::Unauthorized,
                StatusCode::FORBIDDEN => ClientError::Forbidden(body),
                StatusCode::NOT_FOUND => ClientError::NotFound(body),
                StatusCode::BAD_REQUEST => ClientError::Validation(body),
                StatusCode::CONFLICT => ClientError::Conflict(body),
                s => ClientError::Server {
                    status: s.as_u16(),
                    body,
                },
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| ClientError::InvalidResponse(format!("{e}: {}", String::from_utf8_lossy(&bytes))))
    }

    // ========== Orders ==========

    /// Accept an order; `minutes` is clamped server-side, `None` means the default ETA
    pub async fn accept_order(
        &self,
        order_id: Uuid,
        minutes: Option<u32>,
    ) -> ClientResult<OrderTransitionResponse> {
        let body = match minutes {
            Some(m) => json!({ "minutes": m }),
            None => json!({}),
        };
        self.post(&format!("api/admin/{order_id}/accept"), &body).await
    }

    /// Cancel an order, retrying transport failures, timeouts and 5xx
    pub async fn cancel_order(&self, order_id: Uuid) -> ClientResult<OrderTransitionResponse> {
        let body = json!({ "orderId": order_id });
        let body = &body;
        let policy = self.config.cancel_retry;

        let result = policy
            .run(
                move |attempt| {
                    if attempt > 0 {
                        tracing::info!(order_id = %order_id, attempt, "Retrying order cancellation");
                    }
                    self.post::<OrderTransitionResponse, _>("api/orders/cancel", body)
                },
                ClientError::is_retryable,
            )
            .await;

        result.map_err(|e| match e {
            RetryError::Failed(e) => e,
            RetryError::Timeout { timeout, .. } => ClientError::Timeout(timeout),
        })
    }

    // ========== Public ==========

    /// Ask whether the restaurant takes this order right now
    pub async fn check_availability(
        &self,
        request: &AvailabilityRequest,
    ) -> ClientResult<AvailabilityResponse> {
        self.post("api/orders/check-availability", request).await
    }
}
