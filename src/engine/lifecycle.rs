use crate::error::DeliveryError;
use crate::models::order::{Order, OrderStatus};

/// Whether `to` is a legal next status for an order currently in `from`.
///
/// The happy path is strictly linear. Cancellation is allowed from anything
/// except a delivered order.
pub fn can_transition(from: OrderStatus, to: OrderStatus) -> bool {
    match to {
        OrderStatus::Cancelled => from != OrderStatus::Delivered,
        _ => from.next() == Some(to),
    }
}

/// Checks that `order` may move to `attempted`.
pub fn ensure_transition(order: &Order, attempted: OrderStatus) -> Result<(), DeliveryError> {
    if can_transition(order.status, attempted) {
        Ok(())
    } else {
        Err(DeliveryError::InvalidOrderStatus {
            order_id: order.id,
            current: order.status,
            attempted,
        })
    }
}
