use std::sync::Arc;

use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use hotel_core::notification::Notifier;

pub mod catalog;
pub mod models;
pub mod orders;
pub mod pricing;
pub mod reports;
pub mod schema;
pub mod store;
pub mod tables;

use catalog::MenuCatalog;
use orders::OrderEngine;
use pricing::PricingRates;
use reports::DiningReports;
use store::DiningStore;
use tables::TableRegistry;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Menu, tables, orders and their reports sharing one store and one notifier.
pub struct DiningServices {
    pub catalog: MenuCatalog,
    pub tables: TableRegistry,
    pub orders: OrderEngine,
    pub reports: DiningReports,
}

impl DiningServices {
    pub fn new(store: Arc<dyn DiningStore>, notifier: Arc<dyn Notifier>, rates: PricingRates) -> Self {
        DiningServices {
            catalog: MenuCatalog::new(store.clone()),
            tables: TableRegistry::new(store.clone(), notifier.clone()),
            orders: OrderEngine::new(store.clone(), notifier, rates),
            reports: DiningReports::new(store),
        }
    }
}
