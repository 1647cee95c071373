//! Test harness: real router over the in-memory store, local JWT identity
//! and recording notification channels.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use chrono::Utc;
use http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use lokal_cloud::auth::identity::create_token;
use lokal_cloud::auth::JwtIdentityProvider;
use lokal_cloud::availability::MapsDistanceService;
use lokal_cloud::db::MemoryStore;
use lokal_cloud::db::schema::OrderRow;
use lokal_cloud::notify::{
    Channels, EmailMessage, Mailer, NotifyError, PushGateway, SmsMessage, SmsSender,
};
use lokal_cloud::{AppState, Config, api};
use serde_json::Value;
use shared::models::{PushPayload, PushSubscription, Restaurant};
use tower::ServiceExt;
use uuid::Uuid;

pub const SECRET: &str = "integration-test-secret";

#[derive(Default)]
pub struct Recorder {
    pub emails: Mutex<Vec<EmailMessage>>,
    pub sms: Mutex<Vec<SmsMessage>>,
    pub pushes: Mutex<Vec<(PushSubscription, PushPayload)>>,
}

impl Recorder {
    pub fn emails(&self) -> Vec<EmailMessage> {
        self.emails.lock().unwrap().clone()
    }

    pub fn sms(&self) -> Vec<SmsMessage> {
        self.sms.lock().unwrap().clone()
    }

    pub fn pushes(&self) -> Vec<(PushSubscription, PushPayload)> {
        self.pushes.lock().unwrap().clone()
    }
}

struct RecordingMailer(Arc<Recorder>);
struct RecordingSms(Arc<Recorder>);
struct RecordingPush(Arc<Recorder>);

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.0.emails.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl SmsSender for RecordingSms {
    async fn send(&self, message: &SmsMessage) -> Result<(), NotifyError> {
        self.0.sms.lock().unwrap().push(message.clone());
        Ok(())
    }
}

#[async_trait]
impl PushGateway for RecordingPush {
    async fn send(
        &self,
        subscription: &PushSubscription,
        payload: &PushPayload,
    ) -> Result<(), NotifyError> {
        self.0
            .pushes
            .lock()
            .unwrap()
            .push((subscription.clone(), payload.clone()));
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub recorder: Arc<Recorder>,
    pub config: Config,
}

pub fn config() -> Config {
    Config {
        identity: lokal_cloud::config::IdentityConfig::Jwt {
            secret: SECRET.into(),
        },
        ..Config::default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new())
    }

    pub fn with_store(store: MemoryStore) -> Self {
        let config = config();
        let store = Arc::new(store);
        let recorder = Arc::new(Recorder::default());
        let channels = Channels {
            mailer: Arc::new(RecordingMailer(recorder.clone())),
            sms: Arc::new(RecordingSms(recorder.clone())),
            push: Arc::new(RecordingPush(recorder.clone())),
        };
        let state = AppState::assemble(
            config.clone(),
            store.clone(),
            Arc::new(JwtIdentityProvider::new(SECRET)),
            Arc::new(MapsDistanceService::new(None).unwrap()),
            channels,
        );
        Self {
            router: api::create_router(state),
            store,
            recorder,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let resp = self.router.clone().oneshot(request).await.unwrap();
        let status = resp.status();
        let headers = resp.headers().clone();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn restaurant(&self, slug: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .insert_restaurant(Restaurant {
                id,
                slug: slug.into(),
                name: format!("Lokal {slug}"),
                city: "Kraków".into(),
                phone: None,
                email: None,
                address: None,
                active: true,
                lat: Some(50.06),
                lng: Some(19.94),
                max_delivery_km: Some(0.0),
            })
            .await;
        id
    }

    pub async fn member(&self, user: &str, restaurant_id: Uuid, role: &str) {
        self.store
            .insert_membership(user, restaurant_id, Some(role), Utc::now())
            .await;
    }

    pub async fn order(&self, restaurant_id: Uuid, email: Option<&str>, phone: Option<&str>) -> Uuid {
        let id = Uuid::new_v4();
        self.store
            .insert_order(OrderRow {
                id,
                restaurant_id,
                status: "pending".into(),
                contact_email: email.map(str::to_string),
                phone: phone.map(str::to_string),
                name: Some("Anna".into()),
                selected_option: Some("delivery".into()),
                delivery_time: None,
                legacy_delivery_time: None,
                created_at: Utc::now(),
            })
            .await;
        id
    }

    pub async fn order_status(&self, order_id: Uuid) -> String {
        self.store.order_row(order_id).await.unwrap().status
    }

    /// Wait for queued notifications to reach the recorder
    pub async fn settle(&self) {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}

pub fn token(user: &str) -> String {
    create_token(user, None, SECRET, chrono::Duration::hours(1)).unwrap()
}

pub fn json_request(method: &str, uri: &str, user: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, user: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    builder.body(Body::empty()).unwrap()
}
