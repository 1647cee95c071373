//! SMS delivery
//!
//! Two Polish gateways are supported, picked by `SMS_PROVIDER`. Numbers are
//! normalised to `48XXXXXXXXX` before sending.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{NotifyError, check_status};
use crate::config::SmsConfig;

const SMSAPI_URL: &str = "https://api.smsapi.pl/sms.do";
const SERWERSMS_URL: &str = "https://api2.serwersms.pl/messages/send_sms";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SmsProvider {
    SmsApi,
    SerwerSms,
}

impl FromStr for SmsProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "smsapi" => Ok(Self::SmsApi),
            "serwersms" => Ok(Self::SerwerSms),
            other => Err(format!("unknown SMS_PROVIDER '{other}'")),
        }
    }
}

impl fmt::Display for SmsProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SmsApi => "smsapi",
            Self::SerwerSms => "serwersms",
        })
    }
}

/// Normalise a Polish phone number to `48XXXXXXXXX`
///
/// Separators are ignored; a leading `+` or `00` is dropped. Nine digits get
/// the country code prepended.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    let digits = digits.strip_prefix("00").unwrap_or(&digits);
    match digits.len() {
        9 => Some(format!("48{digits}")),
        11 if digits.starts_with("48") => Some(digits.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmsMessage {
    /// Normalised number
    pub to: String,
    pub text: String,
}

impl SmsMessage {
    /// `None` (with a warning) when the number cannot be normalised
    pub fn new(phone: &str, text: impl Into<String>) -> Option<Self> {
        match normalize_phone(phone) {
            Some(to) => Some(Self {
                to,
                text: text.into(),
            }),
            None => {
                tracing::warn!(phone = %phone, "Skipping SMS to unrecognised phone number");
                None
            }
        }
    }
}

#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError>;
}

/// Build the sender for the configured provider
pub fn sender_for(config: SmsConfig) -> Result<Box<dyn SmsSender>, reqwest::Error> {
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(15))
        .build()?;
    Ok(match config.provider {
        SmsProvider::SmsApi => Box::new(SmsApiSender { http, config }),
        SmsProvider::SerwerSms => Box::new(SerwerSmsSender { http, config }),
    })
}

pub struct SmsApiSender {
    http: reqwest::Client,
    config: SmsConfig,
}

#[derive(Deserialize)]
struct SmsApiReply {
    #[serde(default)]
    error: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

#[async_trait]
impl SmsSender for SmsApiSender {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(SMSAPI_URL)
            .bearer_auth(&self.config.api_token)
            .form(&[
                ("to", message.to.as_str()),
                ("message", message.text.as_str()),
                ("from", self.config.sender.as_str()),
                ("encoding", "utf-8"),
                ("format", "json"),
            ])
            .send()
            .await?;
        let reply: SmsApiReply = check_status(resp).await?.json().await?;
        // SMSAPI reports errors with HTTP 200 and an `error` code
        if let Some(code) = reply.error {
            return Err(NotifyError::Rejected(format!(
                "smsapi error {code}: {}",
                reply.message.unwrap_or_default()
            )));
        }

        tracing::info!(to = %message.to, provider = "smsapi", "SMS sent");
        Ok(())
    }
}

pub struct SerwerSmsSender {
    http: reqwest::Client,
    config: SmsConfig,
}

#[derive(Serialize)]
struct SerwerSmsBody<'a> {
    phone: &'a str,
    text: &'a str,
    sender: &'a str,
}

#[derive(Deserialize)]
struct SerwerSmsReply {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[async_trait]
impl SmsSender for SerwerSmsSender {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
        let resp = self
            .http
            .post(SERWERSMS_URL)
            .bearer_auth(&self.config.api_token)
            .json(&SerwerSmsBody {
                phone: &message.to,
                text: &message.text,
                sender: &self.config.sender,
            })
            .send()
            .await?;
        let reply: SerwerSmsReply = check_status(resp).await?.json().await?;
        if !reply.success {
            let detail = reply.error.map(|e| e.to_string()).unwrap_or_default();
            return Err(NotifyError::Rejected(format!("serwersms: {detail}")));
        }

        tracing::info!(to = %message.to, provider = "serwersms", "SMS sent");
        Ok(())
    }
}

/// Used when no SMS provider is configured
pub struct DisabledSms;

#[async_trait]
impl SmsSender for DisabledSms {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
        tracing::debug!(to = %message.to, "SMS disabled, skipping");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_common_formats() {
        assert_eq!(normalize_phone("600 700 800").as_deref(), Some("48600700800"));
        assert_eq!(normalize_phone("+48 600-700-800").as_deref(), Some("48600700800"));
        assert_eq!(normalize_phone("0048600700800").as_deref(), Some("48600700800"));
        assert_eq!(normalize_phone("48600700800").as_deref(), Some("48600700800"));
    }

    #[test]
    fn rejects_foreign_or_short_numbers() {
        assert_eq!(normalize_phone("12345"), None);
        assert_eq!(normalize_phone("+49 151 23456789"), None);
        assert_eq!(normalize_phone(""), None);
        assert!(SmsMessage::new("abc", "hi").is_none());
    }

    #[test]
    fn provider_parses_case_insensitively() {
        assert_eq!("SMSAPI".parse::<SmsProvider>(), Ok(SmsProvider::SmsApi));
        assert_eq!("serwersms".parse::<SmsProvider>(), Ok(SmsProvider::SerwerSms));
        assert!("twilio".parse::<SmsProvider>().is_err());
    }
}
