use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::engine::failure::{FailureInjector, RandomFailure};
use crate::engine::lifecycle::ensure_transition;
use crate::error::{AppError, BusyReason, DeliveryError};
use crate::models::order::{NewOrder, Order, OrderId, OrderStatus};
use crate::observability::metrics::Metrics;
use crate::state::OrderRegistry;

/// Drives orders through their lifecycle.
pub struct DeliveryService {
    registry: OrderRegistry,
    failures: Box<dyn FailureInjector>,
    metrics: Metrics,
}

impl DeliveryService {
    pub fn new(registry: OrderRegistry, failures: impl FailureInjector + 'static) -> Self {
        Self {
            registry,
            failures: Box::new(failures),
            metrics: Metrics::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let registry = OrderRegistry::new(config.load_availability()?);
        let failures = match config.rng_seed {
            Some(seed) => RandomFailure::seeded(config.accept_failure_rate, seed),
            None => RandomFailure::new(config.accept_failure_rate),
        };
        Ok(Self::new(registry, failures))
    }

    pub fn registry(&self) -> &OrderRegistry {
        &self.registry
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn create_order(&self, request: NewOrder) -> Result<Order, DeliveryError> {
        info!(
            customer_id = %request.customer_id,
            restaurant_id = %request.restaurant_id,
            items = %request.items,
            amount = %request.total_amount,
            "creating order"
        );

        let result = validate_new_order(&request).map(|()| {
            let order = Order::from_request(request);
            self.registry.put(order.clone());
            self.metrics.orders_created_total.inc();
            info!(order_id = %order.id, "order created");
            order
        });

        self.observe("create_order", result)
    }

    pub fn accept_order(
        &self,
        order_id: &OrderId,
        restaurant_id: &str,
    ) -> Result<(), DeliveryError> {
        debug!(order_id = %order_id, restaurant_id, "restaurant accepting order");

        self.transition("accept_order", order_id, OrderStatus::Accepted, |order| {
            if order.restaurant_id != restaurant_id {
                return Err(DeliveryError::InvalidArgument(format!(
                    "order {} was placed with restaurant {}, not {restaurant_id}",
                    order.id, order.restaurant_id
                )));
            }

            if !self.registry.restaurant_available(restaurant_id) {
                return Err(DeliveryError::RestaurantBusy {
                    restaurant_id: restaurant_id.to_string(),
                    reason: BusyReason::Unavailable,
                });
            }

            if self.failures.should_fail() {
                return Err(DeliveryError::RestaurantBusy {
                    restaurant_id: restaurant_id.to_string(),
                    reason: BusyReason::TransientFailure,
                });
            }

            Ok(())
        })
    }

    pub fn prepare_food(&self, order_id: &OrderId) -> Result<(), DeliveryError> {
        self.transition("prepare_food", order_id, OrderStatus::Preparing, |_| Ok(()))
    }

    pub fn food_ready(&self, order_id: &OrderId) -> Result<(), DeliveryError> {
        self.transition("food_ready", order_id, OrderStatus::Ready, |_| Ok(()))
    }

    pub fn assign_delivery_person(
        &self,
        order_id: &OrderId,
        courier_id: &str,
    ) -> Result<(), DeliveryError> {
        debug!(order_id = %order_id, courier_id, "assigning courier");

        self.transition("assign_delivery_person", order_id, OrderStatus::PickedUp, |order| {
            if !self.registry.claim_courier(courier_id) {
                return Err(DeliveryError::DeliveryPersonUnavailable {
                    order_id: order.id,
                    courier_id: courier_id.to_string(),
                });
            }

            order.courier_id = Some(courier_id.to_string());
            self.metrics.couriers_busy.inc();
            Ok(())
        })
    }

    pub fn complete_delivery(&self, order_id: &OrderId) -> Result<(), DeliveryError> {
        self.transition("complete_delivery", order_id, OrderStatus::Delivered, |order| {
            if let Some(courier_id) = &order.courier_id {
                self.release_courier(courier_id);
            }
            Ok(())
        })
    }

    /// Cancels anything that has not been delivered yet. A courier already on
    /// the road is freed. Cancelling twice keeps the first reason.
    pub fn cancel_order(&self, order_id: &OrderId, reason: &str) -> Result<(), DeliveryError> {
        warn!(order_id = %order_id, reason, "cancellation requested");

        self.transition("cancel_order", order_id, OrderStatus::Cancelled, |order| {
            // Delivered was rejected above, so terminal here means already cancelled.
            if order.status.is_terminal() {
                return Ok(());
            }

            if order.status == OrderStatus::PickedUp {
                if let Some(courier_id) = &order.courier_id {
                    self.release_courier(courier_id);
                }
            }
            order.cancellation_reason = Some(reason.to_string());
            Ok(())
        })
    }

    pub fn get_order(&self, order_id: &OrderId) -> Result<Order, DeliveryError> {
        self.registry.get(order_id).inspect_err(|err| {
            warn!(error = %err, "lookup of unknown order");
        })
    }

    /// Lock, check the precondition, run the operation's own checks and effects,
    /// then set the new status. Nothing is written unless every check passes.
    fn transition<F>(
        &self,
        operation: &'static str,
        order_id: &OrderId,
        attempted: OrderStatus,
        apply: F,
    ) -> Result<(), DeliveryError>
    where
        F: FnOnce(&mut Order) -> Result<(), DeliveryError>,
    {
        let result = self.registry.get_mut(order_id).and_then(|mut order| {
            ensure_transition(&order, attempted)?;
            apply(&mut *order)?;

            if order.status != attempted {
                order.status = attempted;
                order.updated_at = Utc::now();
            }
            Ok(())
        });

        if result.is_ok() {
            info!(operation, order_id = %order_id, status = %attempted, "order status updated");
        }
        self.observe(operation, result)
    }

    fn release_courier(&self, courier_id: &str) {
        self.registry.release_courier(courier_id);
        self.metrics.couriers_busy.dec();
        info!(courier_id, "courier released");
    }

    fn observe<T>(
        &self,
        operation: &'static str,
        result: Result<T, DeliveryError>,
    ) -> Result<T, DeliveryError> {
        match &result {
            Ok(_) => self.metrics.record(operation, "success"),
            Err(err) => {
                self.metrics.record(operation, err.kind());
                warn!(operation, error = %err, "order operation rejected");
            }
        }
        result
    }
}

fn validate_new_order(request: &NewOrder) -> Result<(), DeliveryError> {
    if request.total_amount <= Decimal::ZERO {
        return Err(DeliveryError::InvalidArgument(format!(
            "total amount must be greater than zero, got {}",
            request.total_amount
        )));
    }

    if request.delivery_address.trim().is_empty() {
        return Err(DeliveryError::InvalidArgument(
            "delivery address cannot be empty".to_string(),
        ));
    }

    Ok(())
}
