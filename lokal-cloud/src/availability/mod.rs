//! Availability checks
//!
//! Decides whether a restaurant takes orders right now and, for delivery,
//! whether it delivers to a given address. Malformed rules and unmeasurable
//! distances never block an order.

pub mod blocklist;
pub mod closure;
pub mod distance;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use shared::error::{AppError, ErrorCode};
use shared::models::{AvailabilityRequest, AvailabilityResponse, DeliveryZone, Restaurant};

pub use blocklist::is_address_blocked;
pub use closure::is_closed;
pub use distance::{DistanceService, MapsDistanceService};

use crate::db::RestaurantStore;
use crate::error::ServiceResult;

pub struct AvailabilityChecker {
    store: Arc<dyn RestaurantStore>,
    distance: Arc<dyn DistanceService>,
    timezone: Tz,
}

impl AvailabilityChecker {
    pub fn new(store: Arc<dyn RestaurantStore>, distance: Arc<dyn DistanceService>, timezone: Tz) -> Self {
        Self {
            store,
            distance,
            timezone,
        }
    }

    pub async fn check(&self, req: &AvailabilityRequest) -> ServiceResult<AvailabilityResponse> {
        self.check_at(req, Utc::now()).await
    }

    pub async fn check_at(
        &self,
        req: &AvailabilityRequest,
        now: DateTime<Utc>,
    ) -> ServiceResult<AvailabilityResponse> {
        let restaurant = self.restaurant(req).await?;

        let windows = self.store.closure_windows(restaurant.id).await?;
        if let Some(window) = closure::matching_window(&windows, now, self.timezone) {
            tracing::debug!(restaurant_id = %restaurant.id, window_id = %window.id, "Ordering closed");
            let mut err = AppError::new(ErrorCode::OrderingClosed);
            if let Some(reason) = &window.reason {
                err = err.with_detail("reason", reason.as_str());
            }
            return Err(err.into());
        }

        let address = req
            .address
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let (true, Some(address)) = (req.delivery, address) else {
            return Ok(AvailabilityResponse {
                ok: true,
                km: None,
                zone: None,
            });
        };

        let rules = self.store.blocked_addresses(restaurant.id).await?;
        if let Some(rule) = blocklist::blocking_rule(address, &rules) {
            tracing::info!(restaurant_id = %restaurant.id, rule_id = %rule.id, "Delivery address blocked");
            return Err(AppError::new(ErrorCode::AddressBlocked).into());
        }

        let km = match restaurant.origin() {
            Some(origin) => self.distance.distance_km(&origin, address).await,
            None => None,
        };

        if let (Some(km), Some(max)) = (km, restaurant.max_delivery_km) {
            if km > max {
                return Err(AppError::new(ErrorCode::OutOfDeliveryRange)
                    .with_detail("km", km)
                    .with_detail("maxKm", max)
                    .into());
            }
        }

        let zone = match km {
            Some(km) => {
                let zones = self.store.delivery_zones(restaurant.id).await?;
                pick_zone(&zones, km).map(|z| z.quote(km, req.order_value))
            }
            None => None,
        };

        if let (Some(quote), Some(value)) = (&zone, req.order_value) {
            if value < quote.min_order_value {
                return Err(AppError::new(ErrorCode::BelowMinimumOrder)
                    .with_detail("minOrderValue", quote.min_order_value)
                    .into());
            }
        }

        Ok(AvailabilityResponse { ok: true, km, zone })
    }

    /// Active restaurant named by id (preferred) or slug
    async fn restaurant(&self, req: &AvailabilityRequest) -> ServiceResult<Restaurant> {
        let found = match (req.restaurant_id, req.slug.as_deref().map(str::trim)) {
            (Some(id), _) => self.store.restaurant_by_id(id).await?,
            (None, Some(slug)) if !slug.is_empty() => self.store.restaurant_by_slug(slug).await?,
            _ => {
                return Err(AppError::with_message(
                    ErrorCode::RequiredField,
                    "restaurantId or slug is required",
                )
                .with_detail("field", "restaurantId")
                .into());
            }
        };

        found
            .filter(|r| r.active)
            .ok_or_else(|| AppError::new(ErrorCode::RestaurantNotFound).into())
    }
}

/// First active zone whose range covers `km`; zones arrive sorted by `min_distance_km`
pub fn pick_zone(zones: &[DeliveryZone], km: f64) -> Option<&DeliveryZone> {
    zones.iter().find(|z| z.covers(km))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use async_trait::async_trait;
    use chrono::{NaiveTime, TimeZone};
    use shared::models::{BlockedAddress, ClosureWindow};
    use uuid::Uuid;

    struct FixedDistance(Option<f64>);

    #[async_trait]
    impl DistanceService for FixedDistance {
        async fn distance_km(&self, _origin: &str, _destination: &str) -> Option<f64> {
            self.0
        }
    }

    fn restaurant(max_km: Option<f64>) -> Restaurant {
        Restaurant {
            id: Uuid::new_v4(),
            slug: "krakow".into(),
            name: "Lokal Kraków".into(),
            city: "Kraków".into(),
            phone: None,
            email: None,
            address: None,
            active: true,
            lat: Some(50.06),
            lng: Some(19.94),
            max_delivery_km: max_km,
        }
    }

    fn zone(restaurant_id: Uuid, min: f64, max: f64, min_order: f64) -> DeliveryZone {
        DeliveryZone {
            id: Uuid::new_v4(),
            restaurant_id,
            name: format!("{min}-{max} km"),
            min_distance_km: min,
            max_distance_km: max,
            min_order_value: min_order,
            cost: 5.0,
            free_over: None,
            cost_per_km: None,
            eta_min_minutes: 30,
            eta_max_minutes: 50,
            active: true,
        }
    }

    fn delivery(address: &str) -> AvailabilityRequest {
        AvailabilityRequest {
            slug: Some("krakow".into()),
            delivery: true,
            address: Some(address.into()),
            ..Default::default()
        }
    }

    fn noon() -> DateTime<Utc> {
        chrono_tz::Europe::Warsaw
            .with_ymd_and_hms(2024, 7, 3, 12, 0, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    async fn checker(store: MemoryStore, km: Option<f64>) -> AvailabilityChecker {
        AvailabilityChecker::new(
            Arc::new(store),
            Arc::new(FixedDistance(km)),
            chrono_tz::Europe::Warsaw,
        )
    }

    fn code(e: crate::error::ServiceError) -> ErrorCode {
        AppError::from(e).code
    }

    #[tokio::test]
    async fn open_restaurant_with_unknown_distance() {
        let store = MemoryStore::new();
        store.insert_restaurant(restaurant(Some(0.0))).await;
        let resp = checker(store, None)
            .await
            .check_at(&delivery("ul. Nowa 5"), noon())
            .await
            .unwrap();
        assert!(resp.ok);
        assert_eq!(resp.km, None);
    }

    #[tokio::test]
    async fn closed_window_rejects_with_reason() {
        let store = MemoryStore::new();
        let r = restaurant(None);
        store
            .insert_closure_window(ClosureWindow {
                id: Uuid::new_v4(),
                restaurant_id: r.id,
                weekday: None,
                start_time: NaiveTime::from_hms_opt(10, 0, 0),
                end_time: NaiveTime::from_hms_opt(22, 0, 0),
                reason: Some("Remont".into()),
                active: true,
            })
            .await;
        store.insert_restaurant(r).await;

        let err = checker(store, None)
            .await
            .check_at(&delivery("ul. Nowa 5"), noon())
            .await
            .unwrap_err();
        let app = AppError::from(err);
        assert_eq!(app.code, ErrorCode::OrderingClosed);
        assert_eq!(app.http_status(), http::StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn blocked_address_only_matters_for_delivery() {
        let store = MemoryStore::new();
        let r = restaurant(None);
        store
            .insert_blocked_address(BlockedAddress {
                id: Uuid::new_v4(),
                restaurant_id: r.id,
                pattern: "ul. stara".into(),
                match_type: "prefix".into(),
                active: true,
            })
            .await;
        store.insert_restaurant(r).await;
        let checker = checker(store, None).await;

        let err = checker
            .check_at(&delivery("ul. Stara 5"), noon())
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::AddressBlocked);

        let mut pickup = delivery("ul. Stara 5");
        pickup.delivery = false;
        assert!(checker.check_at(&pickup, noon()).await.is_ok());
    }

    #[tokio::test]
    async fn known_distance_beyond_max_is_out_of_range() {
        let store = MemoryStore::new();
        store.insert_restaurant(restaurant(Some(5.0))).await;
        let err = checker(store, Some(7.2))
            .await
            .check_at(&delivery("ul. Daleka 1"), noon())
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::OutOfDeliveryRange);
    }

    #[tokio::test]
    async fn zone_quote_and_minimum_order() {
        let store = MemoryStore::new();
        let r = restaurant(Some(10.0));
        store.insert_zone(zone(r.id, 0.0, 3.0, 30.0)).await;
        store.insert_zone(zone(r.id, 3.0, 10.0, 60.0)).await;
        let rid = r.id;
        store.insert_restaurant(r).await;
        let checker = checker(store, Some(4.0)).await;

        let mut req = delivery("ul. Nowa 5");
        req.order_value = Some(80.0);
        let resp = checker.check_at(&req, noon()).await.unwrap();
        assert_eq!(resp.km, Some(4.0));
        assert_eq!(resp.zone.unwrap().min_order_value, 60.0);

        req.order_value = Some(40.0);
        let err = checker.check_at(&req, noon()).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::BelowMinimumOrder);

        req.slug = None;
        req.restaurant_id = Some(rid);
        req.order_value = None;
        assert!(checker.check_at(&req, noon()).await.is_ok());
    }

    #[tokio::test]
    async fn unknown_or_inactive_restaurant_is_not_found() {
        let store = MemoryStore::new();
        let mut r = restaurant(None);
        r.active = false;
        store.insert_restaurant(r).await;
        let checker = checker(store, None).await;

        let err = checker.check_at(&delivery("x"), noon()).await.unwrap_err();
        assert_eq!(code(err), ErrorCode::RestaurantNotFound);

        let err = checker
            .check_at(&AvailabilityRequest::default(), noon())
            .await
            .unwrap_err();
        assert_eq!(code(err), ErrorCode::RequiredField);
    }
}
