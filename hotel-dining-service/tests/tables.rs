mod common;

use common::setup;
use hotel_core::notification::NotificationKind;
use hotel_core::ErrorKind;
use hotel_dining_service::models::{OrderStatus, TableSection, TableStatus};
use hotel_dining_service::orders::StatusChange;
use hotel_dining_service::store::TableFilter;
use hotel_dining_service::tables::{NewTable, TableChanges};

#[test]
fn test_create_table_defaults_and_duplicates() {
    let fx = setup();
    let table = fx.table(5);
    assert_eq!(table.name, "Table 5");
    assert_eq!(table.status, TableStatus::Available);
    assert!(table.is_active);

    let err = fx
        .dining
        .tables
        .create(
            &fx.admin,
            NewTable {
                table_number: 5,
                name: Some("Window".to_string()),
                section: None,
                capacity: 2,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = fx
        .dining
        .tables
        .create(
            &fx.admin,
            NewTable {
                table_number: 6,
                name: None,
                section: None,
                capacity: 21,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = fx
        .dining
        .tables
        .create(
            &fx.waiter,
            NewTable {
                table_number: 7,
                name: None,
                section: None,
                capacity: 2,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Authorization);
}

#[test]
fn test_manual_occupy_transition_fails() {
    let fx = setup();
    let table = fx.table(1);
    let err = fx
        .dining
        .tables
        .change_status(&fx.waiter, table.id, TableStatus::Occupied)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidTransition);
}

#[test]
fn test_manual_moves_stamp_cleaning_time() {
    let fx = setup();
    let table = fx.table(2);
    let table = fx
        .dining
        .tables
        .change_status(&fx.staff, table.id, TableStatus::Maintenance)
        .unwrap();
    assert_eq!(table.status, TableStatus::Maintenance);
    assert!(fx.notifier.kinds().contains(&NotificationKind::TableMaintenance));

    let table = fx
        .dining
        .tables
        .change_status(&fx.staff, table.id, TableStatus::Available)
        .unwrap();
    assert!(table.last_cleaned_at.is_some());
}

#[test]
fn test_occupy_clear_and_mark_available() {
    let fx = setup();
    let table = fx.table(3);

    let err = fx
        .dining
        .tables
        .occupy(&fx.waiter, table.id, Some(5))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let occupied = fx.dining.tables.occupy(&fx.waiter, table.id, Some(4)).unwrap();
    assert_eq!(occupied.status, TableStatus::Occupied);
    assert!(occupied.last_occupied_at.is_some());

    let err = fx
        .dining
        .tables
        .occupy(&fx.waiter, table.id, Some(2))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = fx.dining.tables.mark_available(&fx.waiter, table.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let cleaning = fx.dining.tables.clear(&fx.waiter, table.id).unwrap();
    assert_eq!(cleaning.status, TableStatus::Cleaning);
    assert!(cleaning.last_cleaned_at.is_some());

    let available = fx.dining.tables.mark_available(&fx.waiter, table.id).unwrap();
    assert_eq!(available.status, TableStatus::Available);

    let kinds = fx.notifier.kinds();
    assert!(kinds.contains(&NotificationKind::TableOccupied));
    assert!(kinds.contains(&NotificationKind::TableCleared));
}

#[test]
fn test_clear_blocked_by_active_orders() {
    let fx = setup();
    let table = fx.table(4);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let code = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order
        .order_code;

    let err = fx.dining.tables.clear(&fx.waiter, table.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    let err = fx.dining.tables.delete(&fx.admin, table.id).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    fx.dining
        .orders
        .update_status(&fx.waiter, &code, StatusChange::to(OrderStatus::Cancelled))
        .unwrap();
    fx.dining.tables.mark_available(&fx.waiter, table.id).unwrap();
    fx.dining.tables.delete(&fx.admin, table.id).unwrap();
    assert_eq!(
        fx.dining.tables.get(&fx.admin, table.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // Finished orders keep their history after the table is gone.
    let order = fx.dining.orders.get_order(&fx.admin, &code).unwrap().order;
    assert_eq!(order.table_id, table.id);
    assert_eq!(order.status, OrderStatus::Cancelled);
    let tracking = fx.dining.orders.track(&fx.guest, &code).unwrap();
    assert_eq!(tracking.table_number, None);
}

#[test]
fn test_inactive_table_rejects_orders() {
    let fx = setup();
    let table = fx.table(8);
    let soup = fx.menu_item("Soup", "10.00", 10);
    fx.dining
        .tables
        .update(
            &fx.admin,
            table.id,
            TableChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let err = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
}

#[test]
fn test_order_on_manually_occupied_table_becomes_current() {
    let fx = setup();
    let table = fx.table(9);
    let soup = fx.menu_item("Soup", "10.00", 10);
    fx.dining.tables.occupy(&fx.waiter, table.id, None).unwrap();

    let order = fx
        .dining
        .orders
        .place_order(&fx.guest, fx.order_input(&table, &[(&soup, 1)]))
        .unwrap()
        .order;
    let table = fx.dining.tables.get(&fx.admin, table.id).unwrap();
    assert_eq!(table.current_order_id, Some(order.id));
}

#[test]
fn test_listing_and_available_tables() {
    let fx = setup();
    for (number, capacity, section) in [
        (1, 6, TableSection::Terrace),
        (2, 2, TableSection::MainHall),
        (3, 4, TableSection::Terrace),
    ] {
        fx.dining
            .tables
            .create(
                &fx.admin,
                NewTable {
                    table_number: number,
                    name: None,
                    section: Some(section),
                    capacity,
                },
            )
            .unwrap();
    }

    let terrace = fx
        .dining
        .tables
        .list(
            &fx.guest,
            &TableFilter {
                section: Some(TableSection::Terrace),
                ..Default::default()
            },
        )
        .unwrap();
    let numbers: Vec<i32> = terrace.iter().map(|t| t.table_number).collect();
    assert_eq!(numbers, vec![1, 3]);

    let free = fx.dining.tables.available(&fx.guest, Some(3), None).unwrap();
    let numbers: Vec<i32> = free.iter().map(|t| t.table_number).collect();
    assert_eq!(numbers, vec![3, 1]);
}
