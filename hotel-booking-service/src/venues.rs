use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use hotel_core::access::{authorize, policies};
use hotel_core::code::{generate_code, EVENT_PREFIX};
use hotel_core::notification::{dispatch, Notification, NotificationKind, Notifier, Recipients};
use hotel_core::{Actor, Role, ServiceError};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::{Event, Room, RoomStatus};
use crate::store::{atomically, BookingStore};

#[derive(Debug, Clone)]
pub struct NewRoom {
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: BigDecimal,
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_per_day: BigDecimal,
}

fn required(value: String, field: &str) -> Result<String, ServiceError> {
    let value = value.trim().to_string();
    if value.is_empty() {
        return Err(ServiceError::validation(format!("{field} is required")));
    }
    Ok(value)
}

fn price(value: BigDecimal, field: &str) -> Result<BigDecimal, ServiceError> {
    if value < BigDecimal::from(0) {
        return Err(ServiceError::validation(format!("{field} cannot be negative")));
    }
    Ok(value.with_scale_round(2, RoundingMode::HalfUp))
}

/// Rooms and events that bookings reserve.
pub struct VenueDirectory {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
}

impl VenueDirectory {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn create_room(&self, actor: &Actor, input: NewRoom) -> Result<Room, ServiceError> {
        authorize(actor, &policies::MANAGE_VENUES)?;
        let now = Utc::now();
        let room = Room {
            id: Uuid::new_v4(),
            name: required(input.name, "Room name")?,
            room_type: required(input.room_type, "Room type")?,
            description: input.description,
            price_per_night: price(input.price_per_night, "Nightly price")?,
            status: RoomStatus::Available,
            created_at: now,
            updated_at: now,
        };
        atomically(self.store.as_ref(), |repo| repo.insert_room(&room))?;
        info!(room = %room.name, "room created");
        Ok(room)
    }

    pub fn create_event(&self, actor: &Actor, input: NewEvent) -> Result<Event, ServiceError> {
        authorize(actor, &policies::MANAGE_VENUES)?;
        if input.capacity.is_some_and(|c| c < 1) {
            return Err(ServiceError::validation("Event capacity must be at least 1"));
        }
        let now = Utc::now();
        let event = Event {
            id: Uuid::new_v4(),
            event_code: generate_code(EVENT_PREFIX),
            name: required(input.name, "Event name")?,
            description: input.description,
            location: input.location,
            event_date: input.event_date,
            capacity: input.capacity,
            price_per_day: price(input.price_per_day, "Price per day")?,
            created_at: now,
            updated_at: now,
        };
        atomically(self.store.as_ref(), |repo| repo.insert_event(&event))?;
        info!(event_code = %event.event_code, "event created");
        Ok(event)
    }

    pub fn get_room(&self, actor: &Actor, id: Uuid) -> Result<Room, ServiceError> {
        authorize(actor, &policies::VIEW_VENUES)?;
        atomically(self.store.as_ref(), |repo| repo.find_room(id))?
            .ok_or_else(|| ServiceError::not_found("Room not found"))
    }

    pub fn list_rooms(&self, actor: &Actor) -> Result<Vec<Room>, ServiceError> {
        authorize(actor, &policies::VIEW_VENUES)?;
        atomically(self.store.as_ref(), |repo| repo.list_rooms())
    }

    pub fn get_event(&self, actor: &Actor, id: Uuid) -> Result<Event, ServiceError> {
        authorize(actor, &policies::VIEW_VENUES)?;
        atomically(self.store.as_ref(), |repo| repo.find_event(id))?
            .ok_or_else(|| ServiceError::not_found("Event not found"))
    }

    pub fn list_events(&self, actor: &Actor) -> Result<Vec<Event>, ServiceError> {
        authorize(actor, &policies::VIEW_VENUES)?;
        atomically(self.store.as_ref(), |repo| repo.list_events())
    }

    /// Manual room status change, e.g. taking a room out for maintenance.
    pub fn set_room_status(
        &self,
        actor: &Actor,
        id: Uuid,
        status: RoomStatus,
    ) -> Result<Room, ServiceError> {
        authorize(actor, &policies::MANAGE_VENUES)?;
        let (room, changed) = atomically(self.store.as_ref(), |repo| {
            let mut room = repo
                .find_room(id)?
                .ok_or_else(|| ServiceError::not_found("Room not found"))?;
            if room.status == status {
                return Ok((room, false));
            }
            repo.set_room_status(id, status)?;
            room.status = status;
            room.updated_at = Utc::now();
            Ok((room, true))
        })?;
        if changed {
            info!(room = %room.name, %status, "room status changed");
            let notification = Notification::new(
                NotificationKind::RoomStatusChanged,
                Recipients::roles(&[Role::Admin, Role::Staff]),
                "Room Status Changed",
                format!("Room {} is now {}", room.name, status),
            )
            .with_data(json!({ "room_id": room.id, "status": status }))
            .with_sender(actor.user_id());
            dispatch(self.notifier.as_ref(), notification);
        }
        Ok(room)
    }
}
