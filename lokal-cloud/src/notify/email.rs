//! Transactional email
//!
//! Provider-agnostic HTTP API: `POST {EMAIL_API_URL}` with
//! `{from, to, subject, text}` and a bearer API key.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use shared::models::Order;

use super::{NotifyError, check_status};
use crate::config::EmailConfig;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

pub struct HttpMailer {
    http: reqwest::Client,
    config: EmailConfig,
}

impl HttpMailer {
    pub fn new(config: EmailConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self { http, config })
    }
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&SendEmailBody {
                from: &self.config.from,
                to: &message.to,
                subject: &message.subject,
                text: &message.text,
            })
            .send()
            .await?;
        check_status(resp).await?;

        tracing::info!(to = %message.to, "Email sent");
        Ok(())
    }
}

/// Used when no email provider is configured
pub struct DisabledMailer;

#[async_trait]
impl Mailer for DisabledMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        tracing::debug!(to = %message.to, "Email disabled, skipping");
        Ok(())
    }
}

/// `HH:MM` in the business time zone
pub fn format_local_time(at: DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%H:%M").to_string()
}

fn greeting(order: &Order) -> String {
    match order.name.as_deref() {
        Some(name) => format!("Dzień dobry {name},"),
        None => "Dzień dobry,".to_string(),
    }
}

/// Acceptance email; `None` without a contact address
pub fn order_accepted(
    order: &Order,
    restaurant_name: &str,
    eta: DateTime<Utc>,
    tz: Tz,
) -> Option<EmailMessage> {
    let to = order.contact_email.clone()?;
    let time = format_local_time(eta, tz);
    let (pl, en) = if order.is_delivery() {
        ("Szacowany czas dostawy", "Estimated delivery time")
    } else {
        ("Zamówienie będzie gotowe do odbioru o", "Ready for pickup at")
    };

    let text = format!(
        "{greeting}\n\n\
         Restauracja {restaurant_name} przyjęła Twoje zamówienie.\n\
         {pl}: {time}\n\n\
         {restaurant_name} has accepted your order.\n\
         {en}: {time}",
        greeting = greeting(order),
    );

    Some(EmailMessage {
        to,
        subject: format!("Zamówienie przyjęte / Order accepted: {restaurant_name}"),
        text,
    })
}

/// Cancellation email; `None` without a contact address
pub fn order_cancelled(order: &Order, restaurant_name: &str) -> Option<EmailMessage> {
    let to = order.contact_email.clone()?;
    let text = format!(
        "{greeting}\n\n\
         Niestety restauracja {restaurant_name} anulowała Twoje zamówienie.\n\n\
         Unfortunately {restaurant_name} has cancelled your order.",
        greeting = greeting(order),
    );
    Some(EmailMessage {
        to,
        subject: format!("Zamówienie anulowane / Order cancelled: {restaurant_name}"),
        text,
    })
}
