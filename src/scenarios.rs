use std::time::Duration;

use rust_decimal::Decimal;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::engine::service::DeliveryService;
use crate::error::DeliveryError;
use crate::models::order::{NewOrder, OrderId};

#[derive(Debug, Clone)]
pub struct ScenarioReport {
    pub name: &'static str,
    pub as_expected: bool,
    pub detail: String,
}

pub struct ScenarioRunner<'a> {
    service: &'a DeliveryService,
    delay: Duration,
}

impl<'a> ScenarioRunner<'a> {
    pub fn new(service: &'a DeliveryService, delay: Duration) -> Self {
        Self { service, delay }
    }

    pub async fn run_all(&self) -> Vec<ScenarioReport> {
        vec![
            self.normal_flow().await,
            self.restaurant_busy().await,
            self.invalid_parameters().await,
            self.invalid_transition().await,
            self.courier_unavailable().await,
            self.cancellation().await,
            self.order_not_found().await,
        ]
    }

    pub async fn normal_flow(&self) -> ScenarioReport {
        let result = async {
            let id = self.place(
                "C001",
                "R001",
                "bubble tea x2, chicken bento x1",
                250,
                "100 Wenhua Rd",
            )?;
            self.service.accept_order(&id, "R001")?;
            self.pause().await;
            self.service.prepare_food(&id)?;
            self.pause().await;
            self.service.food_ready(&id)?;
            self.service.assign_delivery_person(&id, "D001")?;
            self.pause().await;
            self.service.complete_delivery(&id)
        }
        .await;

        let as_expected = result.is_ok();
        report("normal order flow", result, as_expected)
    }

    pub async fn restaurant_busy(&self) -> ScenarioReport {
        let result = self
            .place("C002", "R002", "beef noodle soup", 120, "50 Sanmin Rd")
            .and_then(|id| self.service.accept_order(&id, "R002"));

        let as_expected = matches!(&result, Err(DeliveryError::RestaurantBusy { .. }));
        report("restaurant busy", result, as_expected)
    }

    pub async fn invalid_parameters(&self) -> ScenarioReport {
        let negative = self.place("C003", "R001", "fried chicken set", -50, "200 Jianguo Rd");
        let no_address = self.place("C004", "R001", "pizza", 300, "");

        let as_expected = matches!(negative, Err(DeliveryError::InvalidArgument(_)))
            && matches!(no_address, Err(DeliveryError::InvalidArgument(_)));
        let result = negative.and(no_address).map(|_| ());
        report("invalid order parameters", result, as_expected)
    }

    pub async fn invalid_transition(&self) -> ScenarioReport {
        let result = self
            .place("C005", "R001", "sushi platter", 450, "88 Ziyou Rd")
            .and_then(|id| self.service.prepare_food(&id));

        let as_expected = matches!(&result, Err(DeliveryError::InvalidOrderStatus { .. }));
        report("invalid status transition", result, as_expected)
    }

    pub async fn courier_unavailable(&self) -> ScenarioReport {
        let result = async {
            let id = self.place("C006", "R003", "hot pot set", 680, "123 Gongyi Rd")?;
            self.service.accept_order(&id, "R003")?;
            self.service.prepare_food(&id)?;
            self.service.food_ready(&id)?;
            self.pause().await;
            self.service.assign_delivery_person(&id, "D003")
        }
        .await;

        let as_expected = matches!(&result, Err(DeliveryError::DeliveryPersonUnavailable { .. }));
        report("courier unavailable", result, as_expected)
    }

    pub async fn cancellation(&self) -> ScenarioReport {
        let result = async {
            let id = self.place("C007", "R001", "burger combo", 180, "456 Wenxin Rd")?;
            self.service.accept_order(&id, "R001")?;
            self.pause().await;
            self.service
                .cancel_order(&id, "customer will pick the order up")
        }
        .await;

        let as_expected = result.is_ok();
        report("order cancellation", result, as_expected)
    }

    pub async fn order_not_found(&self) -> ScenarioReport {
        let result = self.service.get_order(&OrderId::new()).map(|_| ());

        let as_expected = matches!(&result, Err(DeliveryError::OrderNotFound { .. }));
        report("order not found", result, as_expected)
    }

    fn place(
        &self,
        customer_id: &str,
        restaurant_id: &str,
        items: &str,
        amount: i64,
        address: &str,
    ) -> Result<OrderId, DeliveryError> {
        self.service
            .create_order(NewOrder {
                customer_id: customer_id.to_string(),
                restaurant_id: restaurant_id.to_string(),
                items: items.to_string(),
                total_amount: Decimal::from(amount),
                delivery_address: address.to_string(),
            })
            .map(|order| order.id)
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
    }
}

fn report(
    name: &'static str,
    result: Result<(), DeliveryError>,
    as_expected: bool,
) -> ScenarioReport {
    let detail = match &result {
        Ok(()) => "completed".to_string(),
        Err(err) => err.to_string(),
    };

    match (&result, as_expected) {
        (Ok(()), true) => info!(scenario = name, "scenario completed"),
        (Err(err), true) => warn!(
            scenario = name,
            error = %err,
            recoverable = err.is_recoverable(),
            "scenario rejected as expected"
        ),
        (_, false) => error!(scenario = name, detail = %detail, "scenario ended unexpectedly"),
    }

    ScenarioReport {
        name,
        as_expected,
        detail,
    }
}
