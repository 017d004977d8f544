use std::sync::Mutex;

use chrono::{DateTime, Utc};
use hotel_core::ServiceError;
use uuid::Uuid;

use super::{BookingFilter, BookingRepository, BookingStore};
use crate::models::{Booking, BookingKind, Event, Resource, Room, RoomStatus};

#[derive(Debug, Clone, Default)]
struct BookingState {
    rooms: Vec<Room>,
    events: Vec<Event>,
    bookings: Vec<Booking>,
}

/// Process-local store. The mutex held for a whole unit of work is what keeps
/// the overlap check and the insert atomic.
#[derive(Debug, Default)]
pub struct MemoryBookingStore {
    state: Mutex<BookingState>,
}

impl MemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BookingStore for MemoryBookingStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn BookingRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ServiceError::internal("booking store poisoned"))?;
        let snapshot = state.clone();
        let result = work(&mut MemoryBookingRepository { state: &mut *state });
        if result.is_err() {
            *state = snapshot;
        }
        result
    }
}

struct MemoryBookingRepository<'a> {
    state: &'a mut BookingState,
}

impl BookingRepository for MemoryBookingRepository<'_> {
    fn insert_room(&mut self, room: &Room) -> Result<(), ServiceError> {
        self.state.rooms.push(room.clone());
        Ok(())
    }

    fn find_room(&mut self, id: Uuid) -> Result<Option<Room>, ServiceError> {
        Ok(self.state.rooms.iter().find(|r| r.id == id).cloned())
    }

    fn list_rooms(&mut self) -> Result<Vec<Room>, ServiceError> {
        let mut rooms = self.state.rooms.clone();
        rooms.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(rooms)
    }

    fn set_room_status(&mut self, id: Uuid, status: RoomStatus) -> Result<(), ServiceError> {
        let room = self
            .state
            .rooms
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| ServiceError::not_found("Room not found"))?;
        room.status = status;
        room.updated_at = Utc::now();
        Ok(())
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), ServiceError> {
        if self.state.events.iter().any(|e| e.event_code == event.event_code) {
            return Err(ServiceError::conflict(
                "Duplicate value for events_event_code_key, try again",
            ));
        }
        self.state.events.push(event.clone());
        Ok(())
    }

    fn find_event(&mut self, id: Uuid) -> Result<Option<Event>, ServiceError> {
        Ok(self.state.events.iter().find(|e| e.id == id).cloned())
    }

    fn list_events(&mut self) -> Result<Vec<Event>, ServiceError> {
        let mut events = self.state.events.clone();
        events.sort_by_key(|e| e.event_date);
        Ok(events)
    }

    fn lock_resource(&mut self, kind: BookingKind, id: Uuid) -> Result<Option<Resource>, ServiceError> {
        Ok(match kind {
            BookingKind::Room => self.find_room(id)?.map(Resource::Room),
            BookingKind::Event => self.find_event(id)?.map(Resource::Event),
        })
    }

    fn find_overlapping(
        &mut self,
        resource_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, ServiceError> {
        Ok(self
            .state
            .bookings
            .iter()
            .filter(|b| b.resource_id == resource_id && b.status.is_active() && b.overlaps(start, end))
            .cloned()
            .collect())
    }

    fn insert_booking(&mut self, booking: &Booking) -> Result<(), ServiceError> {
        if self
            .state
            .bookings
            .iter()
            .any(|b| b.booking_code == booking.booking_code)
        {
            return Err(ServiceError::conflict(
                "Duplicate value for bookings_booking_code_key, try again",
            ));
        }
        self.state.bookings.push(booking.clone());
        Ok(())
    }

    fn find_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError> {
        Ok(self
            .state
            .bookings
            .iter()
            .find(|b| b.booking_code == code)
            .cloned())
    }

    fn lock_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError> {
        self.find_booking_by_code(code)
    }

    fn update_booking(&mut self, booking: &Booking) -> Result<(), ServiceError> {
        let slot = self
            .state
            .bookings
            .iter_mut()
            .find(|b| b.id == booking.id)
            .ok_or_else(|| ServiceError::not_found("Booking not found"))?;
        *slot = booking.clone();
        Ok(())
    }

    fn list_bookings(&mut self, filter: &BookingFilter) -> Result<Vec<Booking>, ServiceError> {
        let mut bookings: Vec<Booking> = self
            .state
            .bookings
            .iter()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        bookings.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bookings)
    }
}
