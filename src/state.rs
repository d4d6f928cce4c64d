use dashmap::DashMap;
use dashmap::mapref::one::RefMut;

use crate::error::DeliveryError;
use crate::models::availability::AvailabilitySeed;
use crate::models::order::{Order, OrderId};

/// Orders plus restaurant/courier availability. Unknown ids are unavailable.
#[derive(Default)]
pub struct OrderRegistry {
    orders: DashMap<OrderId, Order>,
    restaurants: DashMap<String, bool>,
    couriers: DashMap<String, bool>,
}

impl OrderRegistry {
    pub fn new(seed: AvailabilitySeed) -> Self {
        Self {
            orders: DashMap::new(),
            restaurants: seed.restaurants.into_iter().collect(),
            couriers: seed.couriers.into_iter().collect(),
        }
    }

    pub fn put(&self, order: Order) {
        self.orders.insert(order.id, order);
    }

    pub fn get(&self, order_id: &OrderId) -> Result<Order, DeliveryError> {
        self.orders
            .get(order_id)
            .map(|entry| entry.value().clone())
            .ok_or(DeliveryError::OrderNotFound {
                order_id: *order_id,
            })
    }

    /// Locks the order's entry for a read-modify-write. Do not touch `orders`
    /// again while the guard is alive.
    pub(crate) fn get_mut(
        &self,
        order_id: &OrderId,
    ) -> Result<RefMut<'_, OrderId, Order>, DeliveryError> {
        self.orders
            .get_mut(order_id)
            .ok_or(DeliveryError::OrderNotFound {
                order_id: *order_id,
            })
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    pub fn restaurant_available(&self, restaurant_id: &str) -> bool {
        self.restaurants
            .get(restaurant_id)
            .map(|flag| *flag)
            .unwrap_or(false)
    }

    pub fn set_restaurant_available(&self, restaurant_id: &str, available: bool) {
        self.restaurants.insert(restaurant_id.to_string(), available);
    }

    pub fn courier_available(&self, courier_id: &str) -> bool {
        self.couriers
            .get(courier_id)
            .map(|flag| *flag)
            .unwrap_or(false)
    }

    pub fn set_courier_available(&self, courier_id: &str, available: bool) {
        self.couriers.insert(courier_id.to_string(), available);
    }

    /// Marks the courier busy if it is currently available.
    pub(crate) fn claim_courier(&self, courier_id: &str) -> bool {
        match self.couriers.get_mut(courier_id) {
            Some(mut available) if *available => {
                *available = false;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn release_courier(&self, courier_id: &str) {
        self.set_courier_available(courier_id, true);
    }
}
