//! Restaurant (tenant) Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Restaurant entity: one tenant of the platform, usually one per city
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Restaurant {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub city: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub active: bool,
    /// Origin latitude for delivery distance checks
    pub lat: Option<f64>,
    /// Origin longitude for delivery distance checks
    pub lng: Option<f64>,
    /// Maximum driving distance accepted for delivery, in km
    pub max_delivery_km: Option<f64>,
}

impl Restaurant {
    /// `"lat,lng"` origin for the distance service, if both coordinates are set
    pub fn origin(&self) -> Option<String> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(format!("{lat},{lng}")),
            _ => None,
        }
    }
}
