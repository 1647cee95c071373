//! Application state for lokal-cloud

use std::sync::Arc;

use shared::RetryPolicy;

use crate::auth::{
    IdentityProvider, JwtIdentityProvider, RemoteIdentityProvider, RoleGate, TenantCookies,
    TenantResolver,
};
use crate::availability::{AvailabilityChecker, DistanceService, MapsDistanceService};
use crate::config::{Config, IdentityConfig};
use crate::db::{MembershipDirectory, MemoryStore, PgStore, PrivilegedContext, RestaurantStore};
use crate::error::BoxError;
use crate::notify::{Channels, HttpMailer, NotificationQueue, RelayPushGateway, sms};
use crate::orders::OrderLifecycle;

/// Shared application state
///
/// The membership directory is not reachable from here: only the tenant
/// resolver and the role gate hold the [`PrivilegedContext`].
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Tenant-scoped data access
    pub store: Arc<dyn RestaurantStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub tenant_resolver: Arc<TenantResolver>,
    pub role_gate: Arc<RoleGate>,
    pub orders: Arc<OrderLifecycle>,
    pub availability: Arc<AvailabilityChecker>,
    pub notifier: NotificationQueue,
}

impl AppState {
    /// Create a new AppState from configuration
    ///
    /// Without `DATABASE_URL` the in-memory store is used (development only,
    /// enforced by [`Config::from_env`]).
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let identity: Arc<dyn IdentityProvider> = match &config.identity {
            IdentityConfig::Jwt { secret } => Arc::new(JwtIdentityProvider::new(secret)),
            IdentityConfig::Remote { url, anon_key } => {
                Arc::new(RemoteIdentityProvider::new(url, anon_key)?)
            }
        };
        let distance = Arc::new(MapsDistanceService::new(config.maps_api_key.clone())?);
        let channels = build_channels(config)?;

        match &config.database_url {
            Some(url) => {
                let store = Arc::new(PgStore::connect(url).await?);
                tracing::info!("Connected to PostgreSQL");
                Ok(Self::assemble(config.clone(), store, identity, distance, channels))
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using the in-memory store");
                let store = Arc::new(MemoryStore::new());
                Ok(Self::assemble(config.clone(), store, identity, distance, channels))
            }
        }
    }

    /// Wire the components around one backend; spawns the notification worker
    pub fn assemble<S>(
        config: Config,
        store: Arc<S>,
        identity: Arc<dyn IdentityProvider>,
        distance: Arc<dyn DistanceService>,
        channels: Channels,
    ) -> Self
    where
        S: RestaurantStore + MembershipDirectory + 'static,
    {
        let directory: Arc<dyn MembershipDirectory> = store.clone();
        let store: Arc<dyn RestaurantStore> = store;
        let privileged = PrivilegedContext::new(directory, config.membership_schema);

        let cookies = TenantCookies {
            id_cookie: config.tenant_cookie_name.clone(),
            slug_cookie: config.tenant_slug_cookie_name.clone(),
            secure: config.is_production(),
        };
        let tenant_resolver = Arc::new(TenantResolver::new(
            privileged.clone(),
            store.clone(),
            cookies,
        ));
        let role_gate = Arc::new(RoleGate::new(privileged));

        let notifier = NotificationQueue::start(channels, RetryPolicy::default());
        let orders = Arc::new(OrderLifecycle::new(
            store.clone(),
            notifier.clone(),
            config.business_timezone,
        ));
        let availability = Arc::new(AvailabilityChecker::new(
            store.clone(),
            distance,
            config.business_timezone,
        ));

        Self {
            config: Arc::new(config),
            store,
            identity,
            tenant_resolver,
            role_gate,
            orders,
            availability,
            notifier,
        }
    }
}

/// Real senders where configured, no-op senders elsewhere
fn build_channels(config: &Config) -> Result<Channels, BoxError> {
    let mut channels = Channels::disabled();

    match &config.email {
        Some(email) => channels.mailer = Arc::new(HttpMailer::new(email.clone())?),
        None => tracing::warn!("Email provider not configured, customer emails disabled"),
    }
    match &config.sms {
        Some(sms_config) => {
            tracing::info!(provider = %sms_config.provider, "SMS enabled");
            channels.sms = Arc::from(sms::sender_for(sms_config.clone())?);
        }
        None => tracing::info!("SMS provider not configured"),
    }
    if let Some(relay) = &config.push_relay {
        channels.push = Arc::new(RelayPushGateway::new(relay.clone())?);
    }

    Ok(channels)
}
