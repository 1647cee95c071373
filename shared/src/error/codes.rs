//! Error codes
//!
//! The numeric value groups codes by area:
//! - 0xxx: request shape
//! - 1xxx: authentication
//! - 2xxx: permission
//! - 3xxx: tenant resolution
//! - 4xxx: orders
//! - 5xxx: availability
//! - 6xxx: delivery zones
//! - 9xxx: system
//!
//! The string form ([`ErrorCode::as_str`]) is what clients match on.

use http::StatusCode;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum ErrorCode {
    ValidationFailed = 2,
    /// Body is not valid JSON or has the wrong shape
    InvalidFormat = 6,
    RequiredField = 7,

    /// No verifiable identity on the request
    NotAuthenticated = 1001,

    /// No role found for the (user, restaurant) pair
    PermissionDenied = 2001,
    /// Role exists but the operation does not accept it
    RoleNotAllowed = 2002,

    /// Identity verified but the user belongs to no restaurant
    NoRestaurantAccess = 3001,
    /// Unknown or inactive restaurant
    RestaurantNotFound = 3002,
    /// Membership lookup failed in the datastore
    RoleLookupFailed = 3003,

    /// Missing, or owned by another restaurant
    OrderNotFound = 4001,
    InvalidOrderId = 4002,
    /// Current status does not allow the requested one
    InvalidTransition = 4003,

    OrderingClosed = 5001,
    AddressBlocked = 5002,
    OutOfDeliveryRange = 5003,
    BelowMinimumOrder = 5004,

    ZoneNotFound = 6001,

    InternalError = 9001,
}

impl ErrorCode {
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// 9xxx codes; logged server-side when returned
    pub const fn is_system(&self) -> bool {
        self.code() >= 9000
    }

    /// (machine code, default message, status)
    const fn meta(&self) -> (&'static str, &'static str, StatusCode) {
        use ErrorCode::*;
        match self {
            ValidationFailed => ("VALIDATION_FAILED", "Validation failed", StatusCode::BAD_REQUEST),
            InvalidFormat => ("INVALID_FORMAT", "Invalid request body", StatusCode::BAD_REQUEST),
            RequiredField => ("REQUIRED_FIELD", "Required field is missing", StatusCode::BAD_REQUEST),

            NotAuthenticated => ("UNAUTHORIZED", "Unauthorized", StatusCode::UNAUTHORIZED),

            PermissionDenied => ("FORBIDDEN", "Forbidden", StatusCode::FORBIDDEN),
            RoleNotAllowed => (
                "FORBIDDEN_ROLE",
                "Your role does not allow this operation",
                StatusCode::FORBIDDEN,
            ),

            NoRestaurantAccess => (
                "NO_RESTAURANT_ACCESS",
                "No restaurant access",
                StatusCode::FORBIDDEN,
            ),
            RestaurantNotFound => (
                "RESTAURANT_NOT_FOUND",
                "Restaurant not found",
                StatusCode::NOT_FOUND,
            ),
            RoleLookupFailed => (
                "ROLE_LOOKUP_ERROR",
                "Role lookup failed",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),

            OrderNotFound => ("ORDER_NOT_FOUND", "Order not found", StatusCode::NOT_FOUND),
            InvalidOrderId => ("INVALID_ORDER_ID", "Invalid order id", StatusCode::BAD_REQUEST),
            InvalidTransition => (
                "INVALID_TRANSITION",
                "Order status does not allow this change",
                StatusCode::CONFLICT,
            ),

            OrderingClosed => (
                "ORDERING_CLOSED",
                "Ordering is currently closed",
                StatusCode::FORBIDDEN,
            ),
            AddressBlocked => (
                "ADDRESS_BLOCKED",
                "Delivery to this address is not available",
                StatusCode::FORBIDDEN,
            ),
            OutOfDeliveryRange => (
                "OUT_OF_RANGE",
                "Address is outside the delivery range",
                StatusCode::FORBIDDEN,
            ),
            BelowMinimumOrder => (
                "BELOW_MINIMUM_ORDER",
                "Order value is below the delivery minimum",
                StatusCode::FORBIDDEN,
            ),

            ZoneNotFound => ("ZONE_NOT_FOUND", "Delivery zone not found", StatusCode::NOT_FOUND),

            InternalError => (
                "INTERNAL_ERROR",
                "Internal server error",
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }

    /// Machine-readable `code` of the JSON error body
    pub const fn as_str(&self) -> &'static str {
        self.meta().0
    }

    /// Default client-facing message
    pub const fn message(&self) -> &'static str {
        self.meta().1
    }

    pub const fn http_status(&self) -> StatusCode {
        self.meta().2
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
