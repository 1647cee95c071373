//! Cloud server configuration

use chrono_tz::Tz;

use crate::db::MembershipSchema;
use crate::error::BoxError;
use crate::notify::sms::SmsProvider;

/// How bearer tokens are verified
#[derive(Debug, Clone)]
pub enum IdentityConfig {
    /// Local HS256 verification with a shared secret
    Jwt { secret: String },
    /// Remote identity service (`GET {url}/auth/v1/user`)
    Remote { url: String, anon_key: String },
}

#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct SmsConfig {
    pub provider: SmsProvider,
    pub api_token: String,
    pub sender: String,
}

#[derive(Debug, Clone)]
pub struct PushRelayConfig {
    pub url: String,
    pub key: String,
}

/// Cloud server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Environment: development | staging | production
    pub environment: String,
    /// HTTP port
    pub http_port: u16,
    /// PostgreSQL connection URL; `None` selects the in-memory store (development only)
    pub database_url: Option<String>,
    pub identity: IdentityConfig,
    /// Session cookie base name; chunks are `<name>.0`, `<name>.1`, …
    pub session_cookie_name: String,
    /// Tenant hint cookie
    pub tenant_cookie_name: String,
    /// Companion cookie holding the tenant slug (readable by the browser)
    pub tenant_slug_cookie_name: String,
    pub membership_schema: MembershipSchema,
    /// Time zone used for closure windows and customer-facing times
    pub business_timezone: Tz,
    pub email: Option<EmailConfig>,
    pub sms: Option<SmsConfig>,
    /// Distance-matrix API key; without it distance is never checked
    pub maps_api_key: Option<String>,
    pub push_relay: Option<PushRelayConfig>,
    /// Fallback for push URLs that are not internal paths
    pub push_default_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".into(),
            http_port: 8080,
            database_url: None,
            identity: IdentityConfig::Jwt {
                secret: "dev-AUTH_JWT_SECRET-not-for-production".into(),
            },
            session_cookie_name: "lokal-auth-token".into(),
            tenant_cookie_name: "restaurant_id".into(),
            tenant_slug_cookie_name: "restaurant_slug".into(),
            membership_schema: MembershipSchema::Current,
            business_timezone: chrono_tz::Europe::Warsaw,
            email: None,
            sms: None,
            maps_api_key: None,
            push_relay: None,
            push_default_url: "/admin".into(),
        }
    }
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Optional env var; empty counts as unset
    fn optional(name: &str) -> Option<String> {
        std::env::var(name).ok().filter(|s| !s.trim().is_empty())
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let defaults = Self::default();
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let database_url = Self::optional("DATABASE_URL");
        if database_url.is_none() && environment != "development" {
            return Err(format!("DATABASE_URL must be set in {environment} environment").into());
        }

        let identity = match Self::optional("AUTH_URL") {
            Some(url) => IdentityConfig::Remote {
                url: url.trim_end_matches('/').to_string(),
                anon_key: Self::require_secret("AUTH_ANON_KEY", &environment)?,
            },
            None => IdentityConfig::Jwt {
                secret: Self::require_secret("AUTH_JWT_SECRET", &environment)?,
            },
        };

        let membership_schema = match Self::optional("MEMBERSHIP_SCHEMA") {
            Some(v) => v.parse()?,
            None => defaults.membership_schema,
        };

        let business_timezone = match Self::optional("BUSINESS_TIMEZONE") {
            Some(v) => v
                .parse::<Tz>()
                .map_err(|e| format!("BUSINESS_TIMEZONE: {e}"))?,
            None => defaults.business_timezone,
        };

        let email = match (Self::optional("EMAIL_API_URL"), Self::optional("EMAIL_API_KEY")) {
            (Some(api_url), Some(api_key)) => Some(EmailConfig {
                api_url,
                api_key,
                from: std::env::var("EMAIL_FROM")
                    .unwrap_or_else(|_| "Lokal <zamowienia@lokal.app>".into()),
            }),
            _ => None,
        };

        let sms = match Self::optional("SMS_PROVIDER") {
            Some(provider) => Some(SmsConfig {
                provider: provider.parse()?,
                api_token: Self::require_secret("SMS_API_TOKEN", &environment)?,
                sender: std::env::var("SMS_SENDER").unwrap_or_else(|_| "Lokal".into()),
            }),
            None => None,
        };

        let push_relay = match (Self::optional("PUSH_RELAY_URL"), Self::optional("PUSH_RELAY_KEY")) {
            (Some(url), Some(key)) => Some(PushRelayConfig { url, key }),
            _ => None,
        };

        Ok(Self {
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.http_port),
            database_url,
            identity,
            session_cookie_name: std::env::var("SESSION_COOKIE_NAME")
                .unwrap_or(defaults.session_cookie_name),
            tenant_cookie_name: std::env::var("TENANT_COOKIE_NAME")
                .unwrap_or(defaults.tenant_cookie_name),
            tenant_slug_cookie_name: std::env::var("TENANT_SLUG_COOKIE_NAME")
                .unwrap_or(defaults.tenant_slug_cookie_name),
            membership_schema,
            business_timezone,
            email,
            sms,
            maps_api_key: Self::optional("MAPS_API_KEY"),
            push_relay,
            push_default_url: std::env::var("PUSH_DEFAULT_URL")
                .unwrap_or(defaults.push_default_url),
            environment,
        })
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
