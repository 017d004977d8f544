//! Runs against a real Postgres when `TEST_DATABASE_URL` is set, and is
//! skipped otherwise.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use diesel::PgConnection;
use diesel_migrations::MigrationHarness;
use hotel_core::notification::RecordingNotifier;
use hotel_core::{establish_connection, Actor, Role};
use hotel_dining_service::catalog::NewMenuItem;
use hotel_dining_service::models::OrderStatus;
use hotel_dining_service::orders::{LineItemRequest, PlaceOrder, StatusChange};
use hotel_dining_service::pricing::PricingRates;
use hotel_dining_service::store::PgDiningStore;
use hotel_dining_service::tables::NewTable;
use hotel_dining_service::DiningServices;
use uuid::Uuid;

static MIGRATING: Mutex<()> = Mutex::new(());

fn connect() -> Option<PgConnection> {
    let url = std::env::var("TEST_DATABASE_URL").ok()?;
    let _guard = MIGRATING.lock().unwrap();
    let mut conn = establish_connection(&url).unwrap();
    conn.run_pending_migrations(hotel_core::MIGRATIONS).unwrap();
    conn.run_pending_migrations(hotel_dining_service::MIGRATIONS)
        .unwrap();
    Some(conn)
}

fn unique_number() -> i32 {
    (Uuid::new_v4().as_u128() % 1_000_000) as i32 + 1_000
}

#[test]
fn test_deleting_table_keeps_finished_orders() {
    let Some(conn) = connect() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let dining = DiningServices::new(
        Arc::new(PgDiningStore::new(conn)),
        Arc::new(RecordingNotifier::new()),
        PricingRates::default(),
    );
    let admin = Actor::user(Uuid::new_v4(), Role::Admin);
    let waiter = Actor::user(Uuid::new_v4(), Role::Waiter);

    let number = unique_number();
    let table = dining
        .tables
        .create(
            &admin,
            NewTable {
                table_number: number,
                name: None,
                section: None,
                capacity: 4,
            },
        )
        .unwrap();
    let category = dining
        .catalog
        .create_category(&admin, &format!("Soups {number}"))
        .unwrap();
    let soup = dining
        .catalog
        .create_item(
            &admin,
            NewMenuItem {
                name: "Soup".to_string(),
                description: None,
                price: BigDecimal::from_str("10.00").unwrap(),
                category_id: category.id,
                is_available: None,
                preparation_time: Some(10),
            },
        )
        .unwrap();

    let code = dining
        .orders
        .place_order(
            &Actor::Anonymous,
            PlaceOrder {
                table_id: table.id,
                items: vec![LineItemRequest {
                    menu_item_id: soup.id,
                    quantity: 1,
                    special_instructions: None,
                }],
                customer_name: Some("Ana".to_string()),
                customer_phone: Some("555-0100".to_string()),
                ..Default::default()
            },
        )
        .unwrap()
        .order
        .order_code;
    dining
        .orders
        .update_status(&waiter, &code, StatusChange::to(OrderStatus::Cancelled))
        .unwrap();
    dining.tables.mark_available(&waiter, table.id).unwrap();

    dining.tables.delete(&admin, table.id).unwrap();

    let order = dining.orders.get_order(&admin, &code).unwrap().order;
    assert_eq!(order.table_id, table.id);
    assert_eq!(dining.orders.track(&Actor::Anonymous, &code).unwrap().table_number, None);
}
