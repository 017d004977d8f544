use std::sync::Arc;

use diesel_migrations::{embed_migrations, EmbeddedMigrations};
use hotel_core::notification::Notifier;

pub mod bookings;
pub mod models;
pub mod schema;
pub mod store;
pub mod venues;

use bookings::BookingEngine;
use store::BookingStore;
use venues::VenueDirectory;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Room and event bookings plus the venues they reserve.
pub struct BookingServices {
    pub venues: VenueDirectory,
    pub bookings: BookingEngine,
}

impl BookingServices {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        BookingServices {
            venues: VenueDirectory::new(store.clone(), notifier.clone()),
            bookings: BookingEngine::new(store, notifier),
        }
    }
}
