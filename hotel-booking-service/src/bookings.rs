use std::sync::Arc;

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::{DateTime, Utc};
use hotel_core::access::{authorize, policies};
use hotel_core::code::generate_code;
use hotel_core::notification::{dispatch, Notification, NotificationKind, Notifier, Recipients};
use hotel_core::state_machine::StateMachine;
use hotel_core::{Actor, Role, ServiceError};
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::{
    Booking, BookingKind, BookingPaymentStatus, BookingStatus, Resource, RoomStatus,
};
use crate::store::{atomically, BookingFilter, BookingRepository, BookingStore};

const SECONDS_PER_DAY: i64 = 86_400;

pub const BOOKING_TRANSITIONS: StateMachine<BookingStatus> = StateMachine::new(&[
    (
        BookingStatus::Pending,
        &[
            BookingStatus::Confirmed,
            BookingStatus::CheckedIn,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ],
    ),
    (
        BookingStatus::Confirmed,
        &[
            BookingStatus::CheckedIn,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::Pending,
        ],
    ),
    (
        BookingStatus::CheckedIn,
        &[BookingStatus::Completed, BookingStatus::Cancelled],
    ),
    (BookingStatus::Completed, &[]),
    (BookingStatus::Cancelled, &[]),
]);

#[derive(Debug, Clone)]
pub struct NewBooking {
    pub kind: BookingKind,
    pub resource_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub guests: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookingUpdate {
    pub status: Option<BookingStatus>,
    pub payment_status: Option<BookingPaymentStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookedRange {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Availability {
    pub resource_id: Uuid,
    pub kind: BookingKind,
    pub available: bool,
    /// Active bookings that intersect the requested range.
    pub conflicts: Vec<BookedRange>,
}

/// Whole days covered by `[start, end)`, partial days rounded up, at least one.
pub fn booked_days(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    let seconds = (end - start).num_seconds();
    let days = seconds / SECONDS_PER_DAY + i64::from(seconds % SECONDS_PER_DAY > 0);
    days.max(1)
}

pub fn booking_price(daily_rate: &BigDecimal, start: DateTime<Utc>, end: DateTime<Utc>) -> BigDecimal {
    (daily_rate * BigDecimal::from(booked_days(start, end))).with_scale_round(2, RoundingMode::HalfUp)
}

fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), ServiceError> {
    if end <= start {
        return Err(ServiceError::validation("End date must be after start date"));
    }
    Ok(())
}

fn not_found(kind: BookingKind) -> ServiceError {
    ServiceError::not_found(format!("{} booking not found", kind.label()))
}

/// Loads `code` under a row lock, treating a booking of another kind as absent.
fn load_booking(
    repo: &mut dyn BookingRepository,
    kind: BookingKind,
    code: &str,
) -> Result<Booking, ServiceError> {
    repo.lock_booking_by_code(code)?
        .filter(|b| b.kind == kind)
        .ok_or_else(|| not_found(kind))
}

/// Room availability implied by a booking entering `status`.
fn room_status_for(status: BookingStatus) -> Option<RoomStatus> {
    match status {
        BookingStatus::Confirmed | BookingStatus::CheckedIn => Some(RoomStatus::Booked),
        BookingStatus::Completed | BookingStatus::Cancelled => Some(RoomStatus::Available),
        BookingStatus::Pending => None,
    }
}

fn status_notification(status: BookingStatus) -> Option<(NotificationKind, &'static str)> {
    match status {
        BookingStatus::Confirmed => Some((NotificationKind::BookingConfirmed, "Booking Confirmed")),
        BookingStatus::CheckedIn => Some((NotificationKind::BookingCheckedIn, "Checked In")),
        BookingStatus::Completed => Some((NotificationKind::BookingCheckedOut, "Checked Out")),
        BookingStatus::Cancelled => Some((NotificationKind::BookingCancelled, "Booking Cancelled")),
        BookingStatus::Pending => None,
    }
}

/// What a committed status update changed.
struct Applied {
    booking: Booking,
    status_from: Option<BookingStatus>,
    room_change: Option<(Uuid, String, RoomStatus)>,
}

/// One engine for room and event bookings; the kind decides the policies, the
/// code prefix and whether a room's availability follows the booking.
pub struct BookingEngine {
    store: Arc<dyn BookingStore>,
    notifier: Arc<dyn Notifier>,
}

impl BookingEngine {
    pub fn new(store: Arc<dyn BookingStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn create(&self, actor: &Actor, input: NewBooking) -> Result<Booking, ServiceError> {
        let kind = input.kind;
        authorize(actor, kind.create_policy())?;
        let user_id = actor.require_user_id()?;
        validate_range(input.start_at, input.end_at)?;
        if kind == BookingKind::Event && input.guests.is_none_or(|g| g < 1) {
            return Err(ServiceError::validation("Event bookings need at least one guest"));
        }
        if input.guests.is_some_and(|g| g < 1) {
            return Err(ServiceError::validation("Guest count must be at least 1"));
        }

        let (booking, resource) = atomically(self.store.as_ref(), |repo| {
            let resource = repo
                .lock_resource(kind, input.resource_id)?
                .ok_or_else(|| ServiceError::not_found(format!("{} not found", kind.label())))?;
            match &resource {
                Resource::Room(room) if room.status == RoomStatus::Maintenance => {
                    return Err(ServiceError::conflict("Room is under maintenance"));
                }
                Resource::Event(event) => {
                    if let (Some(capacity), Some(guests)) = (event.capacity, input.guests) {
                        if guests > capacity {
                            return Err(ServiceError::validation(format!(
                                "Guest count {guests} exceeds event capacity {capacity}"
                            )));
                        }
                    }
                }
                _ => {}
            }

            let overlapping = repo.find_overlapping(resource.id(), input.start_at, input.end_at)?;
            if !overlapping.is_empty() {
                debug!(
                    resource_id = %resource.id(),
                    conflicts = overlapping.len(),
                    "booking overlaps existing reservations"
                );
                return Err(ServiceError::conflict(
                    "Resource is not available for the selected dates",
                ));
            }

            let now = Utc::now();
            let booking = Booking {
                id: Uuid::new_v4(),
                booking_code: generate_code(kind.code_prefix()),
                kind,
                resource_id: resource.id(),
                user_id,
                start_at: input.start_at,
                end_at: input.end_at,
                guests: input.guests,
                notes: input.notes.clone().filter(|n| !n.trim().is_empty()),
                total_price: booking_price(resource.daily_rate(), input.start_at, input.end_at),
                payment_status: BookingPaymentStatus::Unpaid,
                status: BookingStatus::Pending,
                created_at: now,
                updated_at: now,
            };
            repo.insert_booking(&booking)?;
            Ok((booking, resource))
        })?;
        info!(
            booking_code = %booking.booking_code,
            kind = %kind,
            total = %booking.total_price,
            "booking created"
        );

        let notification = Notification::new(
            kind.created_notification(),
            Recipients::roles(&[Role::Admin]).with_user(Some(booking.user_id)),
            format!("New {} Booking", kind.label()),
            format!(
                "{} booked from {} to {}",
                resource.name(),
                booking.start_at.format("%Y-%m-%d"),
                booking.end_at.format("%Y-%m-%d")
            ),
        )
        .with_data(json!({
            "booking_code": booking.booking_code,
            "resource_id": booking.resource_id,
            "total_price": booking.total_price.to_string(),
        }))
        .with_sender(Some(booking.user_id));
        dispatch(self.notifier.as_ref(), notification);
        Ok(booking)
    }

    /// Applies a status and/or payment change. Writing the current status
    /// again leaves the status untouched.
    pub fn update_status(
        &self,
        actor: &Actor,
        kind: BookingKind,
        code: &str,
        update: BookingUpdate,
    ) -> Result<Booking, ServiceError> {
        self.apply(actor, kind, code, update, false)
    }

    fn apply(
        &self,
        actor: &Actor,
        kind: BookingKind,
        code: &str,
        update: BookingUpdate,
        cancelling: bool,
    ) -> Result<Booking, ServiceError> {
        authorize(actor, kind.manage_policy())?;
        let applied = atomically(self.store.as_ref(), |repo| {
            let mut booking = load_booking(repo, kind, code)?;
            let mut applied = Applied {
                booking: booking.clone(),
                status_from: None,
                room_change: None,
            };
            let mut changed = false;

            if let Some(to) = update.status.filter(|to| *to != booking.status) {
                let from = booking.status;
                // Completed stays released their room when they completed.
                let voiding_completed = cancelling && from == BookingStatus::Completed;
                if !voiding_completed {
                    BOOKING_TRANSITIONS.check(from, to)?;
                }
                applied.status_from = Some(from);
                booking.status = to;
                changed = true;
                if kind == BookingKind::Room && !voiding_completed {
                    applied.room_change = sync_room(repo, booking.resource_id, to)?;
                }
            }
            if let Some(payment) = update.payment_status {
                if payment != booking.payment_status {
                    booking.payment_status = payment;
                    changed = true;
                }
            }
            if changed {
                booking.updated_at = Utc::now();
                repo.update_booking(&booking)?;
            }
            applied.booking = booking;
            Ok(applied)
        })?;
        self.announce(actor, &applied);
        Ok(applied.booking)
    }

    /// Cancels the booking in any status and frees its room. A booking that
    /// is already cancelled is returned as is.
    pub fn cancel(&self, actor: &Actor, kind: BookingKind, code: &str) -> Result<Booking, ServiceError> {
        self.apply(
            actor,
            kind,
            code,
            BookingUpdate {
                status: Some(BookingStatus::Cancelled),
                payment_status: None,
            },
            true,
        )
    }

    pub fn check_availability(
        &self,
        actor: &Actor,
        kind: BookingKind,
        resource_id: Uuid,
        start_at: DateTime<Utc>,
        end_at: DateTime<Utc>,
    ) -> Result<Availability, ServiceError> {
        authorize(actor, &policies::CHECK_AVAILABILITY)?;
        validate_range(start_at, end_at)?;
        let overlapping = atomically(self.store.as_ref(), |repo| {
            let exists = match kind {
                BookingKind::Room => repo.find_room(resource_id)?.is_some(),
                BookingKind::Event => repo.find_event(resource_id)?.is_some(),
            };
            if !exists {
                return Err(ServiceError::not_found(format!("{} not found", kind.label())));
            }
            repo.find_overlapping(resource_id, start_at, end_at)
        })?;
        Ok(Availability {
            resource_id,
            kind,
            available: overlapping.is_empty(),
            conflicts: overlapping
                .into_iter()
                .map(|b| BookedRange {
                    start_at: b.start_at,
                    end_at: b.end_at,
                })
                .collect(),
        })
    }

    pub fn get(&self, actor: &Actor, kind: BookingKind, code: &str) -> Result<Booking, ServiceError> {
        authorize(actor, kind.manage_policy())?;
        atomically(self.store.as_ref(), |repo| repo.find_booking_by_code(code))?
            .filter(|b| b.kind == kind)
            .ok_or_else(|| not_found(kind))
    }

    pub fn list(
        &self,
        actor: &Actor,
        kind: BookingKind,
        filter: BookingFilter,
    ) -> Result<Vec<Booking>, ServiceError> {
        authorize(actor, kind.manage_policy())?;
        let filter = BookingFilter {
            kind: Some(kind),
            ..filter
        };
        atomically(self.store.as_ref(), |repo| repo.list_bookings(&filter))
    }

    /// The caller's own bookings, optionally of one kind.
    pub fn my_bookings(
        &self,
        actor: &Actor,
        kind: Option<BookingKind>,
    ) -> Result<Vec<Booking>, ServiceError> {
        authorize(actor, &policies::VIEW_OWN_BOOKINGS)?;
        let filter = BookingFilter {
            kind,
            user_id: Some(actor.require_user_id()?),
            ..Default::default()
        };
        atomically(self.store.as_ref(), |repo| repo.list_bookings(&filter))
    }

    fn announce(&self, actor: &Actor, applied: &Applied) {
        let booking = &applied.booking;
        let Some(from) = applied.status_from else {
            return;
        };
        info!(
            booking_code = %booking.booking_code,
            %from,
            to = %booking.status,
            "booking status changed"
        );

        if let Some((kind, title)) = status_notification(booking.status) {
            let notification = Notification::new(
                kind,
                Recipients::users(&[booking.user_id]),
                title,
                format!("Booking {} is now {}", booking.booking_code, booking.status),
            )
            .with_data(json!({
                "booking_code": booking.booking_code,
                "from": from,
                "to": booking.status,
            }))
            .with_sender(actor.user_id());
            dispatch(self.notifier.as_ref(), notification);
        }

        if let Some((room_id, room_name, status)) = &applied.room_change {
            let notification = Notification::new(
                NotificationKind::RoomStatusChanged,
                Recipients::roles(&[Role::Admin, Role::Staff]),
                "Room Status Changed",
                format!("Room {room_name} is now {status}"),
            )
            .with_data(json!({
                "room_id": room_id,
                "status": status,
                "booking_code": booking.booking_code,
            }))
            .with_sender(actor.user_id());
            dispatch(self.notifier.as_ref(), notification);
        }
    }
}

/// Moves the room behind a booking to the availability implied by `status`.
/// Returns the room's new state when it changed.
fn sync_room(
    repo: &mut dyn BookingRepository,
    room_id: Uuid,
    status: BookingStatus,
) -> Result<Option<(Uuid, String, RoomStatus)>, ServiceError> {
    let Some(target) = room_status_for(status) else {
        return Ok(None);
    };
    let Some(Resource::Room(room)) = repo.lock_resource(BookingKind::Room, room_id)? else {
        return Ok(None);
    };
    if room.status == target {
        return Ok(None);
    }
    repo.set_room_status(room.id, target)?;
    Ok(Some((room.id, room.name, target)))
}
