//! Persistence seam of the booking engine.
//!
//! A booking's overlap check and its insert share one
//! [`BookingStore::transaction`], opened by locking the resource row.

use chrono::{DateTime, Utc};
use hotel_core::ServiceError;
use uuid::Uuid;

use crate::models::{Booking, BookingKind, BookingStatus, Event, Resource, Room, RoomStatus};

pub mod memory;
pub mod pg;

pub use memory::MemoryBookingStore;
pub use pg::PgBookingStore;

#[derive(Debug, Clone, Default)]
pub struct BookingFilter {
    pub kind: Option<BookingKind>,
    pub status: Option<BookingStatus>,
    pub user_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
}

impl BookingFilter {
    pub fn matches(&self, booking: &Booking) -> bool {
        self.kind.is_none_or(|k| booking.kind == k)
            && self.status.is_none_or(|s| booking.status == s)
            && self.user_id.is_none_or(|u| booking.user_id == u)
            && self.resource_id.is_none_or(|r| booking.resource_id == r)
    }
}

pub trait BookingRepository {
    fn insert_room(&mut self, room: &Room) -> Result<(), ServiceError>;
    fn find_room(&mut self, id: Uuid) -> Result<Option<Room>, ServiceError>;
    fn list_rooms(&mut self) -> Result<Vec<Room>, ServiceError>;
    fn set_room_status(&mut self, id: Uuid, status: RoomStatus) -> Result<(), ServiceError>;

    fn insert_event(&mut self, event: &Event) -> Result<(), ServiceError>;
    fn find_event(&mut self, id: Uuid) -> Result<Option<Event>, ServiceError>;
    fn list_events(&mut self) -> Result<Vec<Event>, ServiceError>;

    /// Loads the room or event behind `id` and holds a row lock on it until
    /// the unit of work ends.
    fn lock_resource(&mut self, kind: BookingKind, id: Uuid) -> Result<Option<Resource>, ServiceError>;

    /// Active bookings on `resource_id` whose range intersects `[start, end)`.
    fn find_overlapping(
        &mut self,
        resource_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, ServiceError>;

    fn insert_booking(&mut self, booking: &Booking) -> Result<(), ServiceError>;
    fn find_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError>;
    fn lock_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError>;
    fn update_booking(&mut self, booking: &Booking) -> Result<(), ServiceError>;
    /// Newest first.
    fn list_bookings(&mut self, filter: &BookingFilter) -> Result<Vec<Booking>, ServiceError>;
}

pub trait BookingStore: Send + Sync {
    /// Runs `work` as one atomic unit. An `Err` from `work` discards every write it made.
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn BookingRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError>;
}

/// Runs `work` inside one unit of work on `store` and returns its result.
pub fn atomically<T>(
    store: &dyn BookingStore,
    work: impl FnOnce(&mut dyn BookingRepository) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    let mut work = Some(work);
    let mut output = None;
    store.transaction(&mut |repo| {
        let work = work
            .take()
            .ok_or_else(|| ServiceError::internal("unit of work invoked twice"))?;
        output = Some(work(repo)?);
        Ok(())
    })?;
    output.ok_or_else(|| ServiceError::internal("unit of work produced no result"))
}
