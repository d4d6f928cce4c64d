use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::order::{CourierId, OrderId, OrderStatus, RestaurantId};

/// Why a restaurant turned an order down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyReason {
    /// Closed, at capacity, or not a known restaurant.
    Unavailable,
    /// The restaurant's system flaked; retrying may succeed.
    TransientFailure,
}

impl std::fmt::Display for BusyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusyReason::Unavailable => f.write_str("not accepting orders"),
            BusyReason::TransientFailure => f.write_str("system busy, try again later"),
        }
    }
}

/// Rejections from order lifecycle operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("order {order_id} not found")]
    OrderNotFound { order_id: OrderId },

    #[error("order {order_id} cannot move from {current} to {attempted}")]
    InvalidOrderStatus {
        order_id: OrderId,
        current: OrderStatus,
        attempted: OrderStatus,
    },

    #[error("restaurant {restaurant_id} is busy: {reason}")]
    RestaurantBusy {
        restaurant_id: RestaurantId,
        reason: BusyReason,
    },

    #[error("courier {courier_id} is unavailable for order {order_id}")]
    DeliveryPersonUnavailable {
        order_id: OrderId,
        courier_id: CourierId,
    },

    // Reserved for a payment step; nothing in the lifecycle raises it yet.
    #[error("payment for order {order_id} failed (amount {amount}): {reason}")]
    PaymentFailed {
        order_id: OrderId,
        amount: Decimal,
        reason: String,
    },
}

impl DeliveryError {
    /// Business conditions a caller may work around by retrying or picking
    /// another restaurant or courier.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DeliveryError::RestaurantBusy { .. } | DeliveryError::DeliveryPersonUnavailable { .. }
        )
    }

    /// Short stable tag, used as a metrics label.
    pub fn kind(&self) -> &'static str {
        match self {
            DeliveryError::InvalidArgument(_) => "invalid_argument",
            DeliveryError::OrderNotFound { .. } => "order_not_found",
            DeliveryError::InvalidOrderStatus { .. } => "invalid_order_status",
            DeliveryError::RestaurantBusy { .. } => "restaurant_busy",
            DeliveryError::DeliveryPersonUnavailable { .. } => "delivery_person_unavailable",
            DeliveryError::PaymentFailed { .. } => "payment_failed",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),
}
