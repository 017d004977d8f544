use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use hotel_core::access::{policies, Policy};
use hotel_core::code::{EVENT_BOOKING_PREFIX, ROOM_BOOKING_PREFIX};
use hotel_core::notification::NotificationKind;
use uuid::Uuid;

use crate::schema::{bookings, events, rooms};

hotel_core::sql_enum! {
    pub enum BookingKind => crate::schema::sql_types::BookingKind {
        Room = "room",
        Event = "event",
    }
}

hotel_core::sql_enum! {
    pub enum BookingStatus => crate::schema::sql_types::BookingStatus {
        Pending = "pending",
        Confirmed = "confirmed",
        CheckedIn = "checked_in",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

hotel_core::sql_enum! {
    pub enum BookingPaymentStatus => crate::schema::sql_types::BookingPaymentStatus {
        Unpaid = "unpaid",
        Paid = "paid",
        Refunded = "refunded",
    }
}

hotel_core::sql_enum! {
    pub enum RoomStatus => crate::schema::sql_types::RoomStatus {
        Available = "available",
        Booked = "booked",
        Maintenance = "maintenance",
    }
}

impl BookingStatus {
    /// Statuses that hold the resource for their date range.
    pub const ACTIVE: &'static [BookingStatus] = &[
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl BookingKind {
    pub fn code_prefix(&self) -> &'static str {
        match self {
            BookingKind::Room => ROOM_BOOKING_PREFIX,
            BookingKind::Event => EVENT_BOOKING_PREFIX,
        }
    }

    pub fn create_policy(&self) -> &'static Policy {
        match self {
            BookingKind::Room => &policies::CREATE_ROOM_BOOKING,
            BookingKind::Event => &policies::CREATE_EVENT_BOOKING,
        }
    }

    pub fn manage_policy(&self) -> &'static Policy {
        match self {
            BookingKind::Room => &policies::MANAGE_ROOM_BOOKINGS,
            BookingKind::Event => &policies::MANAGE_EVENT_BOOKINGS,
        }
    }

    pub fn created_notification(&self) -> NotificationKind {
        match self {
            BookingKind::Room => NotificationKind::BookingCreated,
            BookingKind::Event => NotificationKind::EventBooking,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BookingKind::Room => "Room",
            BookingKind::Event => "Event",
        }
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = rooms, treat_none_as_null = true)]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: BigDecimal,
    pub status: RoomStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = events, treat_none_as_null = true)]
pub struct Event {
    pub id: Uuid,
    pub event_code: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_per_day: BigDecimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = bookings, treat_none_as_null = true)]
pub struct Booking {
    pub id: Uuid,
    pub booking_code: String,
    pub kind: BookingKind,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub guests: Option<i32>,
    pub notes: Option<String>,
    pub total_price: BigDecimal,
    pub payment_status: BookingPaymentStatus,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Half-open `[start_at, end_at)` ranges; touching ends do not overlap.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        self.start_at < end && self.end_at > start
    }
}

/// The thing a booking reserves.
#[derive(Debug, Clone, PartialEq)]
pub enum Resource {
    Room(Room),
    Event(Event),
}

impl Resource {
    pub fn id(&self) -> Uuid {
        match self {
            Resource::Room(room) => room.id,
            Resource::Event(event) => event.id,
        }
    }

    pub fn kind(&self) -> BookingKind {
        match self {
            Resource::Room(_) => BookingKind::Room,
            Resource::Event(_) => BookingKind::Event,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Resource::Room(room) => &room.name,
            Resource::Event(event) => &event.name,
        }
    }

    /// Price per booked day.
    pub fn daily_rate(&self) -> &BigDecimal {
        match self {
            Resource::Room(room) => &room.price_per_night,
            Resource::Event(event) => &event.price_per_day,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn booking(start_day: u32, end_day: u32) -> Booking {
        let now = Utc::now();
        Booking {
            id: Uuid::new_v4(),
            booking_code: "RM-1".to_string(),
            kind: BookingKind::Room,
            resource_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_at: Utc.with_ymd_and_hms(2024, 1, start_day, 0, 0, 0).unwrap(),
            end_at: Utc.with_ymd_and_hms(2024, 1, end_day, 0, 0, 0).unwrap(),
            guests: None,
            notes: None,
            total_price: BigDecimal::from(0),
            payment_status: BookingPaymentStatus::Unpaid,
            status: BookingStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_overlap_is_half_open() {
        let existing = booking(10, 12);
        let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
        assert!(existing.overlaps(day(11), day(13)));
        assert!(existing.overlaps(day(9), day(11)));
        assert!(existing.overlaps(day(10), day(12)));
        assert!(!existing.overlaps(day(12), day(14)));
        assert!(!existing.overlaps(day(8), day(10)));
    }

    #[test]
    fn test_active_statuses() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::CheckedIn.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }
}
