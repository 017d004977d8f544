use std::sync::Mutex;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::{insert_into, update, PgConnection};
use hotel_core::ServiceError;
use uuid::Uuid;

use super::{BookingFilter, BookingRepository, BookingStore};
use crate::models::{Booking, BookingKind, BookingStatus, Event, Resource, Room, RoomStatus};
use crate::schema::{bookings, events, rooms};

/// Booking store backed by one Postgres connection.
///
/// Besides the resource row lock taken by [`BookingRepository::lock_resource`],
/// the `bookings_no_overlap` exclusion constraint rejects overlapping active
/// ranges written by any other path.
pub struct PgBookingStore {
    conn: Mutex<PgConnection>,
}

impl PgBookingStore {
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl BookingStore for PgBookingStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn BookingRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ServiceError::internal("database connection poisoned"))?;
        conn.transaction(|conn| work(&mut PgBookingRepository { conn }))
    }
}

struct PgBookingRepository<'a> {
    conn: &'a mut PgConnection,
}

impl BookingRepository for PgBookingRepository<'_> {
    fn insert_room(&mut self, room: &Room) -> Result<(), ServiceError> {
        insert_into(rooms::table).values(room).execute(self.conn)?;
        Ok(())
    }

    fn find_room(&mut self, id: Uuid) -> Result<Option<Room>, ServiceError> {
        Ok(rooms::table
            .find(id)
            .select(Room::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn list_rooms(&mut self) -> Result<Vec<Room>, ServiceError> {
        Ok(rooms::table
            .order(rooms::name.asc())
            .select(Room::as_select())
            .load(self.conn)?)
    }

    fn set_room_status(&mut self, id: Uuid, status: RoomStatus) -> Result<(), ServiceError> {
        update(rooms::table.find(id))
            .set((rooms::status.eq(status), rooms::updated_at.eq(Utc::now())))
            .execute(self.conn)?;
        Ok(())
    }

    fn insert_event(&mut self, event: &Event) -> Result<(), ServiceError> {
        insert_into(events::table).values(event).execute(self.conn)?;
        Ok(())
    }

    fn find_event(&mut self, id: Uuid) -> Result<Option<Event>, ServiceError> {
        Ok(events::table
            .find(id)
            .select(Event::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn list_events(&mut self) -> Result<Vec<Event>, ServiceError> {
        Ok(events::table
            .order(events::event_date.asc())
            .select(Event::as_select())
            .load(self.conn)?)
    }

    fn lock_resource(&mut self, kind: BookingKind, id: Uuid) -> Result<Option<Resource>, ServiceError> {
        Ok(match kind {
            BookingKind::Room => rooms::table
                .find(id)
                .select(Room::as_select())
                .for_update()
                .get_result(self.conn)
                .optional()?
                .map(Resource::Room),
            BookingKind::Event => events::table
                .find(id)
                .select(Event::as_select())
                .for_update()
                .get_result(self.conn)
                .optional()?
                .map(Resource::Event),
        })
    }

    fn find_overlapping(
        &mut self,
        resource_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, ServiceError> {
        Ok(bookings::table
            .filter(bookings::resource_id.eq(resource_id))
            .filter(bookings::status.eq_any(BookingStatus::ACTIVE.to_vec()))
            .filter(bookings::start_at.lt(end))
            .filter(bookings::end_at.gt(start))
            .order(bookings::start_at.asc())
            .select(Booking::as_select())
            .load(self.conn)?)
    }

    fn insert_booking(&mut self, booking: &Booking) -> Result<(), ServiceError> {
        insert_into(bookings::table)
            .values(booking)
            .execute(self.conn)?;
        Ok(())
    }

    fn find_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError> {
        Ok(bookings::table
            .filter(bookings::booking_code.eq(code))
            .select(Booking::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn lock_booking_by_code(&mut self, code: &str) -> Result<Option<Booking>, ServiceError> {
        Ok(bookings::table
            .filter(bookings::booking_code.eq(code))
            .select(Booking::as_select())
            .for_update()
            .get_result(self.conn)
            .optional()?)
    }

    fn update_booking(&mut self, booking: &Booking) -> Result<(), ServiceError> {
        update(bookings::table.find(booking.id))
            .set(booking)
            .execute(self.conn)?;
        Ok(())
    }

    fn list_bookings(&mut self, filter: &BookingFilter) -> Result<Vec<Booking>, ServiceError> {
        let mut query = bookings::table
            .select(Booking::as_select())
            .order(bookings::created_at.desc())
            .into_boxed();
        if let Some(kind) = filter.kind {
            query = query.filter(bookings::kind.eq(kind));
        }
        if let Some(status) = filter.status {
            query = query.filter(bookings::status.eq(status));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(bookings::user_id.eq(user_id));
        }
        if let Some(resource_id) = filter.resource_id {
            query = query.filter(bookings::resource_id.eq(resource_id));
        }
        Ok(query.load(self.conn)?)
    }
}
