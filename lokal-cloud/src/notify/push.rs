//! Web push through an HTTP relay
//!
//! The relay holds the VAPID keys; this side only sanitises the payload and
//! forwards it together with the subscription.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use shared::models::{PushPayload, PushSendRequest, PushSubscription};
use shared::util::truncate_chars;

use super::{NotifyError, check_status};
use crate::config::PushRelayConfig;

pub const MAX_TITLE_CHARS: usize = 120;
pub const MAX_BODY_CHARS: usize = 500;
const DEFAULT_KIND: &str = "info";
const DEFAULT_TITLE: &str = "Lokal";

/// Relative in-app path: single leading `/`, no scheme, no backslash, no CR/LF
pub fn is_internal_path(url: &str) -> bool {
    url.starts_with('/')
        && !url.starts_with("//")
        && !url.contains('\\')
        && !url.contains("://")
        && !url.contains(['\r', '\n'])
}

/// Build the payload that is actually sent
pub fn sanitize(req: &PushSendRequest, default_url: &str) -> PushPayload {
    let kind = req
        .kind
        .as_deref()
        .map(|k| truncate_chars(k, 32))
        .filter(|k| !k.is_empty())
        .unwrap_or_else(|| DEFAULT_KIND.to_string());
    let title = req
        .title
        .as_deref()
        .map(|t| truncate_chars(t, MAX_TITLE_CHARS))
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE.to_string());
    let body = req
        .body
        .as_deref()
        .map(|b| truncate_chars(b, MAX_BODY_CHARS))
        .unwrap_or_default();
    let url = req
        .url
        .as_deref()
        .filter(|u| !u.contains(['\r', '\n']))
        .map(str::trim)
        .filter(|u| is_internal_path(u))
        .unwrap_or(default_url)
        .to_string();

    PushPayload {
        kind,
        title,
        body,
        url,
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotifyError>;
}

pub struct RelayPushGateway {
    http: reqwest::Client,
    config: PushRelayConfig,
}

impl RelayPushGateway {
    pub fn new(config: PushRelayConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { http, config })
    }
}

#[derive(Serialize)]
struct RelayKeys<'a> {
    p256dh: &'a str,
    auth: &'a str,
}

#[derive(Serialize)]
struct RelaySubscription<'a> {
    endpoint: &'a str,
    keys: RelayKeys<'a>,
}

#[derive(Serialize)]
struct RelayBody<'a> {
    subscription: RelaySubscription<'a>,
    payload: &'a PushPayload,
}

#[async_trait]
impl PushGateway for RelayPushGateway {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(&self.config.url)
            .bearer_auth(&self.config.key)
            .json(&RelayBody {
                subscription: RelaySubscription {
                    endpoint: &subscription.endpoint,
                    keys: RelayKeys {
                        p256dh: &subscription.p256dh,
                        auth: &subscription.auth,
                    },
                },
                payload,
            })
            .send()
            .await?;
        check_status(resp).await?;

        tracing::debug!(subscription_id = %subscription.id, "Push relayed");
        Ok(())
    }
}

/// Used when no push relay is configured
pub struct DisabledPush;

#[async_trait]
impl PushGateway for DisabledPush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        _payload: &PushPayload,
    ) -> Result<(), NotifyError> {
        tracing::debug!(subscription_id = %subscription.id, "Push disabled, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(title: Option<&str>, url: Option<&str>) -> PushSendRequest {
        PushSendRequest {
            kind: None,
            title: title.map(str::to_string),
            body: Some("x".repeat(MAX_BODY_CHARS + 50)),
            url: url.map(str::to_string),
        }
    }

    #[test]
    fn internal_paths_only() {
        assert!(is_internal_path("/admin/orders"));
        assert!(!is_internal_path("//evil.example"));
        assert!(!is_internal_path("https://evil.example"));
        assert!(!is_internal_path("/foo\\bar"));
        assert!(!is_internal_path("/a\r\nSet-Cookie: x"));
        assert!(!is_internal_path("admin"));
    }

    #[test]
    fn sanitize_applies_defaults_and_caps() {
        let payload = sanitize(&req(None, Some("https://evil.example")), "/admin");
        assert_eq!(payload.kind, "info");
        assert_eq!(payload.title, "Lokal");
        assert_eq!(payload.body.chars().count(), MAX_BODY_CHARS);
        assert_eq!(payload.url, "/admin");
    }

    #[test]
    fn sanitize_keeps_valid_fields() {
        let long_title = "T".repeat(200);
        let payload = sanitize(&req(Some(&long_title), Some(" /admin/orders ")), "/admin");
        assert_eq!(payload.title.chars().count(), MAX_TITLE_CHARS);
        assert_eq!(payload.url, "/admin/orders");
    }

    #[test]
    fn sanitize_rejects_line_breaks_at_the_edges() {
        for raw in ["/admin/orders\n", "\r\n/admin/orders", "/admin/orders\r"] {
            let payload = sanitize(&req(None, Some(raw)), "/admin");
            assert_eq!(payload.url, "/admin", "{raw:?}");
        }
    }
}
