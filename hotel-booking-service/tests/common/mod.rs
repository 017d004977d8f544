#![allow(dead_code)]

use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, TimeZone, Utc};
use hotel_booking_service::bookings::NewBooking;
use hotel_booking_service::models::{BookingKind, Event, Room};
use hotel_booking_service::store::MemoryBookingStore;
use hotel_booking_service::venues::{NewEvent, NewRoom};
use hotel_booking_service::BookingServices;
use hotel_core::notification::RecordingNotifier;
use hotel_core::{Actor, Role};
use uuid::Uuid;

pub struct Fixture {
    pub notifier: Arc<RecordingNotifier>,
    pub booking: BookingServices,
    pub admin: Actor,
    pub staff: Actor,
    pub waiter: Actor,
    pub guest: Actor,
}

pub fn dec(s: &str) -> BigDecimal {
    BigDecimal::from_str(s).unwrap()
}

pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

pub fn setup() -> Fixture {
    let notifier = Arc::new(RecordingNotifier::new());
    let booking = BookingServices::new(Arc::new(MemoryBookingStore::new()), notifier.clone());
    Fixture {
        notifier,
        booking,
        admin: Actor::user(Uuid::new_v4(), Role::Admin),
        staff: Actor::user(Uuid::new_v4(), Role::Staff),
        waiter: Actor::user(Uuid::new_v4(), Role::Waiter),
        guest: Actor::user(Uuid::new_v4(), Role::Guest),
    }
}

impl Fixture {
    pub fn room(&self, name: &str, price: &str) -> Room {
        self.booking
            .venues
            .create_room(
                &self.admin,
                NewRoom {
                    name: name.to_string(),
                    room_type: "double".to_string(),
                    description: None,
                    price_per_night: dec(price),
                },
            )
            .unwrap()
    }

    pub fn event(&self, name: &str, price: &str, capacity: Option<i32>) -> Event {
        self.booking
            .venues
            .create_event(
                &self.staff,
                NewEvent {
                    name: name.to_string(),
                    description: None,
                    location: Some("Ballroom".to_string()),
                    event_date: day(20),
                    capacity,
                    price_per_day: dec(price),
                },
            )
            .unwrap()
    }

    pub fn room_request(&self, room: &Room, start: u32, end: u32) -> NewBooking {
        NewBooking {
            kind: BookingKind::Room,
            resource_id: room.id,
            start_at: day(start),
            end_at: day(end),
            guests: None,
            notes: None,
        }
    }
}
