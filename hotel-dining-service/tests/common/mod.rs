#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use hotel_core::models::UserAccount;
use hotel_core::notification::RecordingNotifier;
use hotel_core::{Actor, Role};
use hotel_dining_service::catalog::NewMenuItem;
use hotel_dining_service::models::{DiningTable, MenuItem, TableSection};
use hotel_dining_service::orders::{LineItemRequest, PlaceOrder};
use hotel_dining_service::pricing::PricingRates;
use hotel_dining_service::store::MemoryDiningStore;
use hotel_dining_service::tables::NewTable;
use hotel_dining_service::DiningServices;
use uuid::Uuid;

pub struct Fixture {
    pub store: Arc<MemoryDiningStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub dining: DiningServices,
    pub admin: Actor,
    pub waiter: Actor,
    pub staff: Actor,
    pub guest: Actor,
}

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

fn account(store: &MemoryDiningStore, name: &str, role: Role) -> Actor {
    let id = Uuid::new_v4();
    store.add_user(UserAccount {
        id,
        name: name.to_string(),
        email: format!("{}@hotel.test", name.to_lowercase()),
        role,
        is_active: true,
        created_at: Utc::now(),
    });
    Actor::user(id, role)
}

pub fn setup() -> Fixture {
    let store = Arc::new(MemoryDiningStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let dining = DiningServices::new(store.clone(), notifier.clone(), PricingRates::default());
    let admin = account(&store, "Alice", Role::Admin);
    let waiter = account(&store, "Walter", Role::Waiter);
    let staff = account(&store, "Sam", Role::Staff);
    let guest = account(&store, "Gina", Role::Guest);
    Fixture {
        store,
        notifier,
        dining,
        admin,
        waiter,
        staff,
        guest,
    }
}

impl Fixture {
    pub fn add_user(&self, name: &str, role: Role, is_active: bool) -> Uuid {
        let id = Uuid::new_v4();
        self.store.add_user(UserAccount {
            id,
            name: name.to_string(),
            email: format!("{}@hotel.test", name.to_lowercase()),
            role,
            is_active,
            created_at: Utc::now(),
        });
        id
    }

    pub fn table(&self, number: i32) -> DiningTable {
        self.dining
            .tables
            .create(
                &self.admin,
                NewTable {
                    table_number: number,
                    name: None,
                    section: Some(TableSection::MainHall),
                    capacity: 4,
                },
            )
            .unwrap()
    }

    pub fn menu_item(&self, name: &str, price: &str, prep: i32) -> MenuItem {
        let category = match self.dining.catalog.list_categories(&self.admin).unwrap().first() {
            Some(c) => c.clone(),
            None => self
                .dining
                .catalog
                .create_category(&self.admin, "Mains")
                .unwrap(),
        };
        self.dining
            .catalog
            .create_item(
                &self.admin,
                NewMenuItem {
                    name: name.to_string(),
                    description: None,
                    price: dec(price),
                    category_id: category.id,
                    is_available: None,
                    preparation_time: Some(prep),
                },
            )
            .unwrap()
    }

    pub fn order_input(&self, table: &DiningTable, items: &[(&MenuItem, i32)]) -> PlaceOrder {
        PlaceOrder {
            table_id: table.id,
            items: items
                .iter()
                .map(|(item, quantity)| LineItemRequest {
                    menu_item_id: item.id,
                    quantity: *quantity,
                    special_instructions: None,
                })
                .collect(),
            customer_name: Some("Ana".to_string()),
            customer_phone: Some("555-0100".to_string()),
            ..Default::default()
        }
    }
}
