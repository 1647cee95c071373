//! Driving distance via the distance-matrix API
//!
//! Every failure degrades to "unknown" (`None`); callers never block an
//! order on a distance they could not measure.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

const DISTANCE_MATRIX_URL: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";

#[async_trait]
pub trait DistanceService: Send + Sync {
    /// Kilometres from `origin` (`"lat,lng"`) to `destination`, if known
    async fn distance_km(&self, origin: &str, destination: &str) -> Option<f64>;
}

pub struct MapsDistanceService {
    http: reqwest::Client,
    api_key: Option<String>,
}

impl MapsDistanceService {
    pub fn new(api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { http, api_key })
    }
}

#[derive(Deserialize)]
struct MatrixResponse {
    status: String,
    #[serde(default)]
    rows: Vec<MatrixRow>,
}

#[derive(Deserialize)]
struct MatrixRow {
    #[serde(default)]
    elements: Vec<MatrixElement>,
}

#[derive(Deserialize)]
struct MatrixElement {
    status: String,
    #[serde(default)]
    distance: Option<MatrixValue>,
}

#[derive(Deserialize)]
struct MatrixValue {
    /// Metres
    value: f64,
}

impl MatrixResponse {
    fn km(&self) -> Option<f64> {
        if self.status != "OK" {
            return None;
        }
        let element = self.rows.first()?.elements.first()?;
        if element.status != "OK" {
            return None;
        }
        element.distance.as_ref().map(|d| d.value / 1000.0)
    }
}

#[async_trait]
impl DistanceService for MapsDistanceService {
    async fn distance_km(&self, origin: &str, destination: &str) -> Option<f64> {
        let key = self.api_key.as_deref()?;

        let resp = self
            .http
            .get(DISTANCE_MATRIX_URL)
            .query(&[
                ("origins", origin),
                ("destinations", destination),
                ("mode", "driving"),
                ("units", "metric"),
                ("key", key),
            ])
            .send()
            .await
            .map_err(|e| tracing::warn!("Distance request failed: {e}"))
            .ok()?;

        if !resp.status().is_success() {
            tracing::warn!(status = %resp.status(), "Distance service returned an error");
            return None;
        }

        let body: MatrixResponse = resp
            .json()
            .await
            .map_err(|e| tracing::warn!("Distance response malformed: {e}"))
            .ok()?;
        let km = body.km();
        if km.is_none() {
            tracing::debug!(status = %body.status, "Distance not available for destination");
        }
        km
    }
}
