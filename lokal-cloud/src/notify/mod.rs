//! Notification dispatch
//!
//! Email, SMS and push are side effects of state changes that have already
//! committed, so they never fail a request. Handlers enqueue a
//! [`NotificationJob`]; a background worker delivers it under the shared
//! [`RetryPolicy`] and logs a dead letter when every attempt fails.

pub mod email;
pub mod push;
pub mod queue;
pub mod sms;

use std::sync::Arc;

pub use email::{EmailMessage, HttpMailer, Mailer};
pub use push::{PushGateway, RelayPushGateway};
pub use queue::NotificationQueue;
pub use sms::{SmsMessage, SmsSender};

use shared::models::{PushPayload, PushSubscription};

/// Delivery failure of a single attempt
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("provider returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("provider rejected message: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
pub enum NotificationJob {
    Email(EmailMessage),
    Sms(SmsMessage),
    Push {
        subscription: PushSubscription,
        payload: PushPayload,
    },
}

impl NotificationJob {
    pub fn kind(&self) -> &'static str {
        match self {
            NotificationJob::Email(_) => "email",
            NotificationJob::Sms(_) => "sms",
            NotificationJob::Push { .. } => "push",
        }
    }

    /// Recipient for logs
    pub fn recipient(&self) -> &str {
        match self {
            NotificationJob::Email(m) => &m.to,
            NotificationJob::Sms(m) => &m.to,
            NotificationJob::Push { subscription, .. } => &subscription.endpoint,
        }
    }
}

/// Outbound senders, one per channel
#[derive(Clone)]
pub struct Channels {
    pub mailer: Arc<dyn Mailer>,
    pub sms: Arc<dyn SmsSender>,
    pub push: Arc<dyn PushGateway>,
}

impl Channels {
    /// Every channel disabled
    pub fn disabled() -> Self {
        Self {
            mailer: Arc::new(email::DisabledMailer),
            sms: Arc::new(sms::DisabledSms),
            push: Arc::new(push::DisabledPush),
        }
    }

    pub async fn deliver(&self, job: &NotificationJob) -> Result<(), NotifyError> {
        match job {
            NotificationJob::Email(message) => self.mailer.send(message).await,
            NotificationJob::Sms(message) => self.sms.send(message).await,
            NotificationJob::Push {
                subscription,
                payload,
            } => self.push.send(subscription, payload).await,
        }
    }
}

/// Turn a non-2xx provider response into [`NotifyError::Status`]
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, NotifyError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(NotifyError::Status {
        status: status.as_u16(),
        body: body.chars().take(200).collect(),
    })
}
