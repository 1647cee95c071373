//! Delivery Zone Model

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery zone (distance band with its own price and ETA)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct DeliveryZone {
    pub id: Uuid,
    pub restaurant_id: Uuid,
    pub name: String,
    pub min_distance_km: f64,
    pub max_distance_km: f64,
    pub min_order_value: f64,
    /// Flat delivery cost
    pub cost: f64,
    /// Order value above which delivery is free
    pub free_over: Option<f64>,
    /// Additional cost per km on top of `cost`
    pub cost_per_km: Option<f64>,
    pub eta_min_minutes: i32,
    pub eta_max_minutes: i32,
    pub active: bool,
}

impl DeliveryZone {
    pub fn covers(&self, km: f64) -> bool {
        self.active && self.min_distance_km <= km && km <= self.max_distance_km
    }

    /// Price and ETA for a delivery of `km` with the given order value
    pub fn quote(&self, km: f64, order_value: Option<f64>) -> ZoneQuote {
        let free = match (self.free_over, order_value) {
            (Some(threshold), Some(value)) => value >= threshold,
            _ => false,
        };
        let cost = if free {
            0.0
        } else {
            let per_km = self.cost_per_km.unwrap_or(0.0) * km;
            ((self.cost + per_km) * 100.0).round() / 100.0
        };
        ZoneQuote {
            zone_id: self.id,
            name: self.name.clone(),
            cost,
            min_order_value: self.min_order_value,
            eta_min_minutes: self.eta_min_minutes,
            eta_max_minutes: self.eta_max_minutes,
        }
    }
}

/// Partial zone update; `None` fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DeliveryZonePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_distance_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_order_value: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub free_over: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_per_km: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_min_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta_max_minutes: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl DeliveryZonePatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, zone: &mut DeliveryZone) {
        if let Some(v) = &self.name {
            zone.name = v.clone();
        }
        if let Some(v) = self.min_distance_km {
            zone.min_distance_km = v;
        }
        if let Some(v) = self.max_distance_km {
            zone.max_distance_km = v;
        }
        if let Some(v) = self.min_order_value {
            zone.min_order_value = v;
        }
        if let Some(v) = self.cost {
            zone.cost = v;
        }
        if let Some(v) = self.free_over {
            zone.free_over = Some(v);
        }
        if let Some(v) = self.cost_per_km {
            zone.cost_per_km = Some(v);
        }
        if let Some(v) = self.eta_min_minutes {
            zone.eta_min_minutes = v;
        }
        if let Some(v) = self.eta_max_minutes {
            zone.eta_max_minutes = v;
        }
        if let Some(v) = self.active {
            zone.active = v;
        }
    }
}

/// Delivery price/ETA returned by the availability check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneQuote {
    pub zone_id: Uuid,
    pub name: String,
    pub cost: f64,
    pub min_order_value: f64,
    pub eta_min_minutes: i32,
    pub eta_max_minutes: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> DeliveryZone {
        DeliveryZone {
            id: Uuid::new_v4(),
            restaurant_id: Uuid::new_v4(),
            name: "Centrum".into(),
            min_distance_km: 0.0,
            max_distance_km: 3.0,
            min_order_value: 40.0,
            cost: 5.0,
            free_over: Some(100.0),
            cost_per_km: Some(1.5),
            eta_min_minutes: 30,
            eta_max_minutes: 45,
            active: true,
        }
    }

    #[test]
    fn covers_is_inclusive_and_requires_active() {
        let mut z = zone();
        assert!(z.covers(0.0));
        assert!(z.covers(3.0));
        assert!(!z.covers(3.01));
        z.active = false;
        assert!(!z.covers(1.0));
    }

    #[test]
    fn quote_adds_per_km_and_honours_free_threshold() {
        let z = zone();
        assert_eq!(z.quote(2.0, Some(50.0)).cost, 8.0);
        assert_eq!(z.quote(2.0, Some(120.0)).cost, 0.0);
        assert_eq!(z.quote(2.0, None).cost, 8.0);
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut z = zone();
        let patch = DeliveryZonePatch {
            cost: Some(7.0),
            eta_max_minutes: Some(60),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut z);
        assert_eq!(z.cost, 7.0);
        assert_eq!(z.eta_max_minutes, 60);
        assert_eq!(z.min_order_value, 40.0);
        assert!(DeliveryZonePatch::default().is_empty());
    }
}
