use std::sync::Arc;
use std::thread;
use std::time::Duration;

use food_delivery::engine::failure::{AlwaysFail, NeverFail, RandomFailure};
use food_delivery::engine::service::DeliveryService;
use food_delivery::error::{BusyReason, DeliveryError};
use food_delivery::models::availability::AvailabilitySeed;
use food_delivery::models::order::{NewOrder, OrderId, OrderStatus};
use food_delivery::scenarios::ScenarioRunner;
use food_delivery::state::OrderRegistry;
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn setup() -> DeliveryService {
    DeliveryService::new(OrderRegistry::new(AvailabilitySeed::demo()), NeverFail)
}

fn new_order(restaurant_id: &str) -> NewOrder {
    NewOrder {
        customer_id: "C001".to_string(),
        restaurant_id: restaurant_id.to_string(),
        items: "bubble tea x2, chicken bento x1".to_string(),
        total_amount: dec!(250),
        delivery_address: "100 Wenhua Rd, Xitun".to_string(),
    }
}

/// Creates an order and walks it forward until it reaches `target`.
fn order_at(service: &DeliveryService, target: OrderStatus) -> OrderId {
    let id = service.create_order(new_order("R001")).unwrap().id;

    if target == OrderStatus::Cancelled {
        service.cancel_order(&id, "test setup").unwrap();
        return id;
    }

    let mut status = OrderStatus::Pending;
    while status != target {
        let next = status.next().expect("target reachable on happy path");
        match next {
            OrderStatus::Accepted => service.accept_order(&id, "R001").unwrap(),
            OrderStatus::Preparing => service.prepare_food(&id).unwrap(),
            OrderStatus::Ready => service.food_ready(&id).unwrap(),
            OrderStatus::PickedUp => service.assign_delivery_person(&id, "D001").unwrap(),
            OrderStatus::Delivered => service.complete_delivery(&id).unwrap(),
            OrderStatus::Pending | OrderStatus::Cancelled => unreachable!(),
        }
        status = next;
    }

    id
}

/// Requests the move into `attempted` through the matching operation.
fn attempt(
    service: &DeliveryService,
    id: &OrderId,
    attempted: OrderStatus,
) -> Result<(), DeliveryError> {
    match attempted {
        OrderStatus::Accepted => service.accept_order(id, "R001"),
        OrderStatus::Preparing => service.prepare_food(id),
        OrderStatus::Ready => service.food_ready(id),
        OrderStatus::PickedUp => service.assign_delivery_person(id, "D002"),
        OrderStatus::Delivered => service.complete_delivery(id),
        OrderStatus::Cancelled => service.cancel_order(id, "test"),
        OrderStatus::Pending => unreachable!("no operation moves an order back to pending"),
    }
}

#[test]
fn happy_path_delivers_and_frees_courier() {
    let service = setup();

    let order = service.create_order(new_order("R001")).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    let id = order.id;

    service.accept_order(&id, "R001").unwrap();
    service.prepare_food(&id).unwrap();
    service.food_ready(&id).unwrap();
    service.assign_delivery_person(&id, "D001").unwrap();
    assert!(!service.registry().courier_available("D001"));
    service.complete_delivery(&id).unwrap();

    let order = service.get_order(&id).unwrap();
    assert_eq!(order.status, OrderStatus::Delivered);
    assert_eq!(order.courier_id.as_deref(), Some("D001"));
    assert!(service.registry().courier_available("D001"));
}

#[test]
fn unavailable_restaurant_keeps_order_pending() {
    let service = setup();
    let id = service.create_order(new_order("R002")).unwrap().id;

    let err = service.accept_order(&id, "R002").unwrap_err();

    assert_eq!(
        err,
        DeliveryError::RestaurantBusy {
            restaurant_id: "R002".to_string(),
            reason: BusyReason::Unavailable,
        }
    );
    assert_eq!(service.get_order(&id).unwrap().status, OrderStatus::Pending);
}

#[test]
fn prepare_without_accept_is_invalid() {
    let service = setup();
    let id = service.create_order(new_order("R001")).unwrap().id;

    let err = service.prepare_food(&id).unwrap_err();

    assert_eq!(
        err,
        DeliveryError::InvalidOrderStatus {
            order_id: id,
            current: OrderStatus::Pending,
            attempted: OrderStatus::Preparing,
        }
    );
}

#[test]
fn unavailable_courier_keeps_order_ready() {
    let service = setup();
    let id = service.create_order(new_order("R003")).unwrap().id;
    service.accept_order(&id, "R003").unwrap();
    service.prepare_food(&id).unwrap();
    service.food_ready(&id).unwrap();

    let err = service.assign_delivery_person(&id, "D003").unwrap_err();

    assert!(matches!(err, DeliveryError::DeliveryPersonUnavailable { order_id, .. } if order_id == id));
    assert_eq!(service.get_order(&id).unwrap().status, OrderStatus::Ready);
}

#[rstest]
#[case(dec!(0))]
#[case(dec!(-50))]
#[case(dec!(-0.01))]
fn non_positive_amount_is_rejected(#[case] amount: Decimal) {
    let service = setup();
    let mut request = new_order("R001");
    request.total_amount = amount;

    let err = service.create_order(request).unwrap_err();

    assert!(matches!(err, DeliveryError::InvalidArgument(_)));
    assert!(service.registry().is_empty());
}

#[rstest]
#[case("")]
#[case("   ")]
#[case("\n\t")]
fn blank_address_is_rejected(#[case] address: &str) {
    let service = setup();
    let mut request = new_order("R001");
    request.delivery_address = address.to_string();

    let err = service.create_order(request).unwrap_err();

    assert!(matches!(err, DeliveryError::InvalidArgument(_)));
    assert!(service.registry().is_empty());
}

#[test]
fn unavailable_restaurant_wins_over_wrong_status_only_when_pending() {
    let service = setup();
    let id = order_at(&service, OrderStatus::Accepted);

    // Status is checked first: an already accepted order reports the status.
    let err = service.accept_order(&id, "R002").unwrap_err();
    assert!(matches!(err, DeliveryError::InvalidOrderStatus { .. }));

    let pending = service.create_order(new_order("R002")).unwrap().id;
    let err = service.accept_order(&pending, "R002").unwrap_err();
    assert!(matches!(err, DeliveryError::RestaurantBusy { .. }));
}

#[test]
fn accepting_on_behalf_of_another_restaurant_is_rejected() {
    let service = setup();
    let id = service.create_order(new_order("R002")).unwrap().id;

    let err = service.accept_order(&id, "R001").unwrap_err();

    assert!(matches!(err, DeliveryError::InvalidArgument(_)));
    let order = service.get_order(&id).unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.restaurant_id, "R002");
    assert_eq!(
        service.metrics().transitions("accept_order", "invalid_argument"),
        1
    );

    // The order's own restaurant is still the one whose availability counts.
    let err = service.accept_order(&id, "R002").unwrap_err();
    assert!(matches!(err, DeliveryError::RestaurantBusy { reason: BusyReason::Unavailable, .. }));
}

#[test]
fn unknown_restaurant_is_busy() {
    let service = setup();
    let id = service.create_order(new_order("R404")).unwrap().id;

    let err = service.accept_order(&id, "R404").unwrap_err();

    assert!(matches!(err, DeliveryError::RestaurantBusy { reason: BusyReason::Unavailable, .. }));
}

#[test]
fn restaurant_availability_can_change_after_acceptance() {
    let service = setup();
    let id = order_at(&service, OrderStatus::Accepted);

    service.registry().set_restaurant_available("R001", false);

    service.prepare_food(&id).unwrap();
    assert_eq!(service.get_order(&id).unwrap().status, OrderStatus::Preparing);
}

#[rstest]
#[case(OrderStatus::Pending)]
#[case(OrderStatus::Accepted)]
#[case(OrderStatus::Preparing)]
#[case(OrderStatus::Ready)]
#[case(OrderStatus::PickedUp)]
#[case(OrderStatus::Delivered)]
#[case(OrderStatus::Cancelled)]
fn only_the_next_step_or_cancel_is_accepted(#[case] from: OrderStatus) {
    let targets = [
        OrderStatus::Accepted,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::PickedUp,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    for attempted in targets {
        let service = setup();
        let id = order_at(&service, from);

        let result = attempt(&service, &id, attempted);
        let legal = from.next() == Some(attempted)
            || (attempted == OrderStatus::Cancelled && from != OrderStatus::Delivered);

        if legal {
            assert!(result.is_ok(), "{from:?} -> {attempted:?} should succeed: {result:?}");
            assert_eq!(service.get_order(&id).unwrap().status, attempted);
        } else {
            assert_eq!(
                result,
                Err(DeliveryError::InvalidOrderStatus {
                    order_id: id,
                    current: from,
                    attempted,
                }),
            );
            assert_eq!(service.get_order(&id).unwrap().status, from);
        }
    }
}

#[test]
fn cancel_picked_up_order_frees_courier() {
    let service = setup();
    let id = order_at(&service, OrderStatus::PickedUp);
    assert!(!service.registry().courier_available("D001"));

    service.cancel_order(&id, "customer unreachable").unwrap();

    assert_eq!(service.get_order(&id).unwrap().status, OrderStatus::Cancelled);
    assert!(service.registry().courier_available("D001"));
}

#[test]
fn delivered_order_cannot_be_cancelled() {
    let service = setup();
    let id = order_at(&service, OrderStatus::Delivered);

    let err = service.cancel_order(&id, "too late").unwrap_err();

    assert_eq!(
        err,
        DeliveryError::InvalidOrderStatus {
            order_id: id,
            current: OrderStatus::Delivered,
            attempted: OrderStatus::Cancelled,
        }
    );
    assert!(service.get_order(&id).unwrap().cancellation_reason.is_none());
}

#[test]
fn unknown_order_is_not_found_for_every_operation() {
    let service = setup();
    let id = OrderId::new();
    let not_found = DeliveryError::OrderNotFound { order_id: id };

    assert_eq!(service.get_order(&id).unwrap_err(), not_found);
    assert_eq!(service.accept_order(&id, "R001").unwrap_err(), not_found);
    assert_eq!(service.prepare_food(&id).unwrap_err(), not_found);
    assert_eq!(service.food_ready(&id).unwrap_err(), not_found);
    assert_eq!(service.assign_delivery_person(&id, "D001").unwrap_err(), not_found);
    assert_eq!(service.complete_delivery(&id).unwrap_err(), not_found);
    assert_eq!(service.cancel_order(&id, "nope").unwrap_err(), not_found);
    assert!(service.registry().courier_available("D001"));
}

#[test]
fn busy_courier_cannot_take_a_second_order() {
    let service = setup();
    let first = order_at(&service, OrderStatus::PickedUp);
    let second = order_at(&service, OrderStatus::Ready);

    let err = service.assign_delivery_person(&second, "D001").unwrap_err();
    assert!(matches!(err, DeliveryError::DeliveryPersonUnavailable { .. }));

    service.complete_delivery(&first).unwrap();
    service.assign_delivery_person(&second, "D001").unwrap();
    assert_eq!(service.get_order(&second).unwrap().status, OrderStatus::PickedUp);
}

#[test]
fn concurrent_assignments_claim_a_courier_once() {
    let service = Arc::new(setup());
    let ids: Vec<OrderId> = (0..8).map(|_| order_at(&service, OrderStatus::Ready)).collect();

    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let service = Arc::clone(&service);
            let id = *id;
            thread::spawn(move || service.assign_delivery_person(&id, "D002").is_ok())
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    let picked_up = ids
        .iter()
        .filter(|id| service.get_order(id).unwrap().status == OrderStatus::PickedUp)
        .count();
    assert_eq!(picked_up, 1);
}

#[test]
fn transient_failure_can_be_retried_by_caller() {
    let always = DeliveryService::new(OrderRegistry::new(AvailabilitySeed::demo()), AlwaysFail);
    let id = always.create_order(new_order("R001")).unwrap().id;
    for _ in 0..3 {
        let err = always.accept_order(&id, "R001").unwrap_err();
        assert!(matches!(err, DeliveryError::RestaurantBusy { reason: BusyReason::TransientFailure, .. }));
        assert!(err.is_recoverable());
    }
    assert_eq!(always.get_order(&id).unwrap().status, OrderStatus::Pending);

    // With a 50% seeded failure rate, a handful of retries is enough.
    let flaky = DeliveryService::new(
        OrderRegistry::new(AvailabilitySeed::demo()),
        RandomFailure::seeded(0.5, 11),
    );
    let id = flaky.create_order(new_order("R001")).unwrap().id;
    let accepted = (0..64).any(|_| flaky.accept_order(&id, "R001").is_ok());
    assert!(accepted);
    assert_eq!(flaky.get_order(&id).unwrap().status, OrderStatus::Accepted);
}

#[test]
fn services_do_not_share_state() {
    let first = setup();
    let second = setup();

    let id = order_at(&first, OrderStatus::PickedUp);

    assert!(matches!(second.get_order(&id), Err(DeliveryError::OrderNotFound { .. })));
    assert!(second.registry().courier_available("D001"));
}

#[tokio::test]
async fn scenario_driver_reports_expected_outcomes() {
    let service = setup();
    let runner = ScenarioRunner::new(&service, Duration::ZERO);

    let reports = runner.run_all().await;

    assert_eq!(reports.len(), 7);
    for report in &reports {
        assert!(report.as_expected, "{} -> {}", report.name, report.detail);
    }
    // normal flow, restaurant busy, invalid transition, courier unavailable, cancellation
    assert_eq!(service.registry().len(), 5);
    assert!(service.registry().courier_available("D001"));
    assert_eq!(service.metrics().transitions("complete_delivery", "success"), 1);
}
