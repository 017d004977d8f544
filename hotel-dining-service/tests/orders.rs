mod common;

use common::{dec, setup};
use hotel_core::notification::NotificationKind;
use hotel_core::{Actor, ErrorKind, Role};
use hotel_dining_service::catalog::MenuItemChanges;
use hotel_dining_service::models::{OrderStatus, PaymentMethod, PaymentStatus, TableStatus};
use hotel_dining_service::orders::{OrderQuery, PaymentUpdate, RatingInput, StatusChange};

fn rating() -> RatingInput {
    RatingInput {
        food_quality: 5,
        service: 4,
        ambiance: 4,
        overall: 5,
        feedback: Some("Lovely".to_string()),
    }
}

#[test]
fn test_place_order_prices_and_occupies_table() {
    let fx = setup();
    let table = fx.table(5);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let salad = fx.menu_item("Salad", "5.00", 5);

    let details = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1), (&salad, 1)]))
        .unwrap();
    let order = &details.order;

    assert!(order.order_code.starts_with("ORD-"));
    assert_eq!(order.subtotal, dec("15.00"));
    assert_eq!(order.tax_amount, dec("2.40"));
    assert_eq!(order.service_charge, dec("1.50"));
    assert_eq!(order.total_price, dec("18.90"));
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.user_id, fx.guest.user_id());
    assert_eq!(details.line_items.len(), 2);
    assert_eq!(details.line_items[0].name, "Soup");
    assert_eq!(details.line_items[1].line_total, dec("5.00"));

    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
    assert_eq!(table.current_order_id, Some(order.id));
    assert!(table.last_occupied_at.is_some());

    let placed = fx
        .notifier
        .sent()
        .into_iter()
        .find(|n| n.kind == NotificationKind::OrderPlaced)
        .unwrap();
    assert!(placed.recipients.roles.contains(&Role::Admin));
    assert!(placed.recipients.roles.contains(&Role::Waiter));
    assert_eq!(placed.recipients.users, vec![fx.guest.user_id().unwrap()]);
}

#[test]
fn test_totals_do_not_change_with_menu_prices() {
    let fx = setup();
    let table = fx.table(1);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 2)]))
        .unwrap()
        .order
        .order_code;

    fx.dining
        .catalog
        .update_item(
            &fx.admin,
            soup.id,
            MenuItemChanges {
                price: Some(dec("99.00")),
                ..Default::default()
            },
        )
        .unwrap();
    fx.dining
        .orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Confirmed))
        .unwrap();

    let order = fx.dining.orders.get_order(&fx.waiter, &code).unwrap().order;
    assert_eq!(order.subtotal, dec("20.00"));
    assert_eq!(order.total_price, dec("25.20"));
}

#[test]
fn test_anonymous_order_requires_contact() {
    let fx = setup();
    let table = fx.table(2);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let mut input = fx.order_input(&table, &[(&soup, 1)]);
    input.customer_phone = None;

    let err = fx
        .dining
        .orders
        .place_order(&Actor::Anonymous, input)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let input = fx.order_input(&table, &[(&soup, 1)]);
    let order = fx
        .dining
        .orders
        .place_order(&Actor::Anonymous, input)
        .unwrap()
        .order;
    assert_eq!(order.user_id, None);
    assert_eq!(order.customer_name.as_deref(), Some("Ana"));
}

#[test]
fn test_place_order_rejections() {
    let fx = setup();
    let table = fx.table(3);
    let soup = fx.menu_item("Soup", "10.00", 10);

    let mut empty = fx.order_input(&table, &[]);
    empty.items.clear();
    assert_eq!(
        fx.dining.orders.place_order(&fx.guest, empty).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let zero = fx.order_input(&table, &[(&soup, 0)]);
    assert_eq!(
        fx.dining.orders.place_order(&fx.guest, zero).unwrap_err().kind(),
        ErrorKind::Validation
    );

    let mut missing_table = fx.order_input(&table, &[(&soup, 1)]);
    missing_table.table_id = uuid::Uuid::new_v4();
    assert_eq!(
        fx.dining
            .orders
            .place_order(&fx.guest, missing_table)
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );

    fx.dining
        .catalog
        .update_item(
            &fx.admin,
            soup.id,
            MenuItemChanges {
                is_available: Some(false),
                ..Default::default()
            },
        )
        .unwrap();
    let unavailable = fx.order_input(&table, &[(&soup, 1)]);
    assert_eq!(
        fx.dining
            .orders
            .place_order(&fx.guest, unavailable)
            .unwrap_err()
            .kind(),
        ErrorKind::Validation
    );

    // A failed placement leaves the table untouched.
    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.status, TableStatus::Available);
}

#[test]
fn test_table_in_maintenance_rejects_orders() {
    let fx = setup();
    let table = fx.table(4);
    let soup = fx.menu_item("Soup", "10.00", 10);
    fx.dining
        .tables
        .change_status(&fx.waiter, table.id, TableStatus::Maintenance)
        .unwrap();

    let err = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap_err();
    assert!(err.is_conflict());
}

#[test]
fn test_second_order_keeps_current_order() {
    let fx = setup();
    let table = fx.table(6);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let first = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;
    let second = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;

    assert_eq!(second.table_id, table.id);
    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.current_order_id, Some(first.id));
}

#[test]
fn test_waiter_order_is_auto_assigned() {
    let fx = setup();
    let table = fx.table(7);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let order = fx
        .dining
        .orders
        .place_order(&fx.waiter, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;

    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.assigned_to, fx.waiter.user_id());
    assert!(order.assigned_at.is_some());
}

#[test]
fn test_status_transitions_follow_lifecycle() {
    let fx = setup();
    let table = fx.table(8);
    let soup = fx.menu_item("Soup", "10.00", 20);
    let salad = fx.menu_item("Salad", "5.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1), (&salad, 2)]))
        .unwrap()
        .order
        .order_code;

    let err = fx
        .dining
        .orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Ready))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
    assert_eq!(
        err.to_string(),
        "Invalid status transition from pending to ready"
    );

    let orders = &fx.dining.orders;
    orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Confirmed))
        .unwrap();
    let preparing = orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Preparing))
        .unwrap()
        .order;
    let eta = preparing.estimated_ready_at.unwrap() - preparing.updated_at;
    assert_eq!(eta.num_minutes(), 30);

    orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Ready))
        .unwrap();
    orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Served))
        .unwrap();
    let completed = orders
        .update_status(&fx.staff, &code, StatusChange::to(OrderStatus::Completed))
        .unwrap()
        .order;
    assert!(completed.completed_at.is_some());

    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.status, TableStatus::Cleaning);
    assert_eq!(table.current_order_id, None);

    let err = orders
        .update_status(&fx.admin, &code, StatusChange::to(OrderStatus::Cancelled))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[test]
fn test_guest_cannot_change_status() {
    let fx = setup();
    let table = fx.table(9);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let err = fx
        .dining
        .orders
        .update_status(&fx.guest, &code, StatusChange::to(OrderStatus::Confirmed))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_cancel_records_reason_and_frees_table() {
    let fx = setup();
    let table = fx.table(10);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let cancelled = fx
        .dining
        .orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Cancelled))
        .unwrap()
        .order;
    assert_eq!(
        cancelled.cancellation_reason.as_deref(),
        Some("No reason provided")
    );
    assert_eq!(cancelled.cancelled_by, fx.waiter.user_id());
    assert!(cancelled.cancelled_at.is_some());

    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.status, TableStatus::Cleaning);

    let sent = fx.notifier.sent();
    let cancelled = sent
        .iter()
        .find(|n| n.kind == NotificationKind::OrderCancelled)
        .unwrap();
    assert!(cancelled.recipients.roles.contains(&Role::Admin));
    assert!(cancelled.message.contains("No reason provided"));
    assert!(!fx.notifier.kinds().contains(&NotificationKind::OrderStatusChanged));
}

#[test]
fn test_table_stays_occupied_while_other_orders_active() {
    let fx = setup();
    let table = fx.table(11);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let first = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;
    fx.dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap();

    fx.dining
        .orders
        .update_status(
            &fx.waiter,
            &first.order_code,
            StatusChange::to(OrderStatus::Cancelled),
        )
        .unwrap();
    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.status, TableStatus::Occupied);
}

#[test]
fn test_self_assign_confirms_pending_order() {
    let fx = setup();
    let table = fx.table(12);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let order = fx
        .dining
        .orders
        .self_assign(&fx.waiter, &code)
        .unwrap()
        .order;
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.assigned_to, fx.waiter.user_id());
    assert_eq!(order.assigned_by, fx.waiter.user_id());

    let err = fx
        .dining
        .orders
        .self_assign(&fx.staff, &code)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert!(fx.notifier.kinds().contains(&NotificationKind::OrderAssigned));
}

#[test]
fn test_admin_assign_validates_assignee() {
    let fx = setup();
    let table = fx.table(13);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let err = fx
        .dining
        .orders
        .assign(&fx.staff, &code, fx.waiter.user_id().unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let err = fx
        .dining
        .orders
        .assign(&fx.admin, &code, uuid::Uuid::new_v4())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = fx
        .dining
        .orders
        .assign(&fx.admin, &code, fx.guest.user_id().unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let retired = fx.add_user("Rita", Role::Waiter, false);
    let err = fx.dining.orders.assign(&fx.admin, &code, retired).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let order = fx
        .dining
        .orders
        .assign(&fx.admin, &code, fx.waiter.user_id().unwrap())
        .unwrap()
        .order;
    assert_eq!(order.assigned_to, fx.waiter.user_id());
    assert_eq!(order.assigned_by, fx.admin.user_id());
    assert_eq!(order.status, OrderStatus::Confirmed);
}

#[test]
fn test_cannot_assign_order_in_kitchen() {
    let fx = setup();
    let table = fx.table(14);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;
    let orders = &fx.dining.orders;
    orders
        .update_status(&fx.staff, &code, StatusChange::to(OrderStatus::Confirmed))
        .unwrap();
    orders
        .update_status(&fx.staff, &code, StatusChange::to(OrderStatus::Preparing))
        .unwrap();

    let err = orders.self_assign(&fx.waiter, &code).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

fn completed_order(fx: &common::Fixture, number: i32) -> String {
    let table = fx.table(number);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Completed,
    ] {
        fx.dining
            .orders
            .update_status(&fx.waiter, &code, StatusChange::to(status))
            .unwrap();
    }
    code
}

#[test]
fn test_rating_succeeds_once() {
    let fx = setup();
    let code = completed_order(&fx, 15);

    let order = fx.dining.orders.rate(&fx.guest, &code, rating()).unwrap().order;
    assert_eq!(order.rating_overall, Some(5));
    assert_eq!(order.feedback.as_deref(), Some("Lovely"));
    assert!(order.rated_at.is_some());

    let err = fx.dining.orders.rate(&fx.guest, &code, rating()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_rating_rules() {
    let fx = setup();
    let table = fx.table(16);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let pending = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let err = fx.dining.orders.rate(&fx.guest, &pending, rating()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let code = completed_order(&fx, 17);
    let err = fx.dining.orders.rate(&fx.waiter, &code, rating()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);

    let err = fx
        .dining
        .orders
        .rate(&Actor::Anonymous, &code, rating())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authentication);

    let mut bad = rating();
    bad.ambiance = 6;
    let err = fx.dining.orders.rate(&fx.guest, &code, bad).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    // The rejected attempt did not consume the single rating.
    assert!(fx.dining.orders.rate(&fx.guest, &code, rating()).is_ok());
}

#[test]
fn test_payment_update_stamps_paid_at() {
    let fx = setup();
    let table = fx.table(18);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let order = fx
        .dining
        .orders
        .update_payment(
            &fx.waiter,
            &code,
            PaymentUpdate {
                status: PaymentStatus::Paid,
                method: Some(PaymentMethod::Card),
                reference: Some("TX-42".to_string()),
            },
        )
        .unwrap()
        .order;
    assert_eq!(order.payment_status, PaymentStatus::Paid);
    assert_eq!(order.payment_method, Some(PaymentMethod::Card));
    assert_eq!(order.payment_reference.as_deref(), Some("TX-42"));
    assert!(order.paid_at.is_some());
}

#[test]
fn test_queries() {
    let fx = setup();
    let table = fx.table(19);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let mine = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;
    let walk_in = fx
        .dining
        .orders
        .place_order(&Actor::Anonymous, fx.order_input(&table, &[(&soup, 3)]))
        .unwrap()
        .order;

    let own = fx.dining.orders.my_orders(&fx.guest).unwrap();
    assert_eq!(own.len(), 1);
    assert_eq!(own[0].order.id, mine.id);

    let available = fx.dining.orders.available(&fx.waiter).unwrap();
    assert_eq!(available.len(), 2);
    assert_eq!(available[0].order.id, mine.id);

    fx.dining
        .orders
        .self_assign(&fx.waiter, &walk_in.order_code)
        .unwrap();
    let assigned = fx.dining.orders.my_assigned(&fx.waiter).unwrap();
    assert_eq!(assigned.len(), 1);
    assert_eq!(assigned[0].order.id, walk_in.id);

    let confirmed = fx
        .dining
        .orders
        .list(
            &fx.staff,
            &OrderQuery {
                status: Some(OrderStatus::Confirmed),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(confirmed.len(), 1);

    let at_table = fx.dining.orders.table_orders(&fx.waiter, table.id, false).unwrap();
    assert_eq!(at_table.len(), 2);

    assert_eq!(
        fx.dining.orders.list(&fx.guest, &OrderQuery::default()).unwrap_err().kind(),
        ErrorKind::Authorization
    );
    assert_eq!(
        fx.dining
            .orders
            .get_order(&fx.guest, &walk_in.order_code)
            .unwrap_err()
            .kind(),
        ErrorKind::Authorization
    );

    let tracking = fx
        .dining
        .orders
        .track(&Actor::Anonymous, &walk_in.order_code)
        .unwrap();
    assert_eq!(tracking.table_number, Some(19));
    assert_eq!(tracking.items[0].quantity, 3);
    assert_eq!(tracking.assigned_to.as_deref(), Some("Walter"));
    assert_eq!(tracking.total_price, dec("37.80"));
}

#[test]
fn test_cannot_delete_menu_item_in_active_order() {
    let fx = setup();
    let table = fx.table(20);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let err = fx.dining.catalog.delete_item(&fx.admin, soup.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    fx.dining
        .orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Cancelled))
        .unwrap();
    fx.dining.catalog.delete_item(&fx.admin, soup.id).unwrap();
    assert_eq!(
        fx.dining.catalog.get_item(&fx.admin, soup.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
}
