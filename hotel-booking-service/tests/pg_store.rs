//! Runs against a real Postgres when `TEST_DATABASE_URL` is set, and is
//! skipped otherwise.

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use diesel::PgConnection;
use diesel_migrations::MigrationHarness;
use hotel_booking_service::bookings::NewBooking;
use hotel_booking_service::models::{Booking, BookingKind, BookingPaymentStatus, BookingStatus};
use hotel_booking_service::store::{BookingStore, PgBookingStore};
use hotel_booking_service::venues::NewRoom;
use hotel_booking_service::BookingServices;
use hotel_core::notification::RecordingNotifier;
use hotel_core::{establish_connection, Actor, ErrorKind, Role};
use uuid::Uuid;

static MIGRATING: Mutex<()> = Mutex::new(());

fn database_url() -> Option<String> {
    std::env::var("TEST_DATABASE_URL").ok()
}

fn connect(url: &str) -> PgConnection {
    let _guard = MIGRATING.lock().unwrap();
    let mut conn = establish_connection(url).unwrap();
    conn.run_pending_migrations(hotel_core::MIGRATIONS).unwrap();
    conn.run_pending_migrations(hotel_booking_service::MIGRATIONS)
        .unwrap();
    conn
}

fn services(url: &str) -> BookingServices {
    BookingServices::new(
        Arc::new(PgBookingStore::new(connect(url))),
        Arc::new(RecordingNotifier::new()),
    )
}

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, d, 0, 0, 0).unwrap()
}

fn new_room(services: &BookingServices) -> Uuid {
    services
        .venues
        .create_room(
            &Actor::user(Uuid::new_v4(), Role::Admin),
            NewRoom {
                name: format!("Suite {}", Uuid::new_v4()),
                room_type: "suite".to_string(),
                description: None,
                price_per_night: BigDecimal::from_str("150.00").unwrap(),
            },
        )
        .unwrap()
        .id
}

fn request(room_id: Uuid, start: u32, end: u32) -> NewBooking {
    NewBooking {
        kind: BookingKind::Room,
        resource_id: room_id,
        start_at: day(start),
        end_at: day(end),
        guests: Some(2),
        notes: None,
    }
}

#[test]
fn test_concurrent_connections_admit_one_booking() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let room_id = new_room(&services(&url));

    let results: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..6u32)
            .map(|i| {
                let url = &url;
                scope.spawn(move || {
                    let guest = Actor::user(Uuid::new_v4(), Role::Guest);
                    services(url)
                        .bookings
                        .create(&guest, request(room_id, 10 + i % 3, 14))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|err| err.kind() == ErrorKind::Conflict));
}

#[test]
fn test_exclusion_constraint_reports_conflict() {
    let Some(url) = database_url() else {
        eprintln!("TEST_DATABASE_URL not set, skipping");
        return;
    };
    let room_id = new_room(&services(&url));
    let store = PgBookingStore::new(connect(&url));

    let row = |code: String, start: u32, end: u32| {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            booking_code: code,
            kind: BookingKind::Room,
            resource_id: room_id,
            user_id: Uuid::new_v4(),
            start_at: day(start),
            end_at: day(end),
            guests: None,
            notes: None,
            total_price: BigDecimal::from_str("300.00").unwrap(),
            payment_status: BookingPaymentStatus::Unpaid,
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        }
    };
    let first = row(format!("RB-{}", Uuid::new_v4()), 1, 3);
    store
        .transaction(&mut |repo| repo.insert_booking(&first))
        .unwrap();

    // Skips the engine's overlap check so only the database can object.
    let overlapping = row(format!("RB-{}", Uuid::new_v4()), 2, 4);
    let err = store
        .transaction(&mut |repo| repo.insert_booking(&overlapping))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(
        err.public_message(),
        "Resource is not available for the selected dates"
    );

    let adjacent = row(format!("RB-{}", Uuid::new_v4()), 3, 5);
    store
        .transaction(&mut |repo| repo.insert_booking(&adjacent))
        .unwrap();
}
