use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use chrono::{DateTime, Utc};
use hotel_booking_service::bookings::{BookingUpdate, NewBooking};
use hotel_booking_service::models::{BookingKind, BookingStatus, RoomStatus};
use hotel_booking_service::store::BookingFilter;
use hotel_booking_service::venues::{NewEvent, NewRoom};
use serde::Deserialize;
use tracing::instrument;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::*;

use super::{AppState, blocking};

/// Path segment selecting room or event bookings.
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum KindSegment {
    Rooms,
    Events,
}

impl From<KindSegment> for BookingKind {
    fn from(segment: KindSegment) -> Self {
        match segment {
            KindSegment::Rooms => BookingKind::Room,
            KindSegment::Events => BookingKind::Event,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub resource_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListBookingsQuery {
    pub status: Option<String>,
    pub user_id: Option<Uuid>,
    pub resource_id: Option<Uuid>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{id}", get(get_room))
        .route("/rooms/{id}/status", put(set_room_status))
        .route("/events", get(list_events).post(create_event))
        .route("/events/{id}", get(get_event))
        .route("/bookings/mine", get(my_bookings))
        .route("/bookings/{kind}", post(create_booking).get(list_bookings))
        .route("/bookings/{kind}/availability", get(check_availability))
        .route("/bookings/{kind}/{code}", get(get_booking))
        .route("/bookings/{kind}/{code}/status", put(update_booking_status))
        .route("/bookings/{kind}/{code}/cancel", post(cancel_booking))
}

#[utoipa::path(
    get,
    path = "/rooms",
    responses(
        (status = 200, description = "Rooms", body = [RoomResponse]),
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn list_rooms(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<RoomResponse>>, ApiError> {
    let booking = state.booking.clone();
    let rooms = blocking(move || booking.venues.list_rooms(&actor)).await?;
    Ok(Json(rooms.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/rooms",
    request_body = CreateRoomRequest,
    responses(
        (status = 201, description = "Room created", body = RoomResponse),
        (status = 400, description = "Invalid room", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn create_room(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomResponse>), ApiError> {
    let input = NewRoom {
        price_per_night: parse_money(&payload.price_per_night, "Nightly price")?,
        name: payload.name,
        room_type: payload.room_type,
        description: payload.description,
    };
    let booking = state.booking.clone();
    let room = blocking(move || booking.venues.create_room(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(room.into())))
}

#[utoipa::path(
    get,
    path = "/rooms/{id}",
    responses(
        (status = 200, description = "Room", body = RoomResponse),
        (status = 404, description = "Room not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Room ID")
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn get_room(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<RoomResponse>, ApiError> {
    let booking = state.booking.clone();
    let room = blocking(move || booking.venues.get_room(&actor, id)).await?;
    Ok(Json(room.into()))
}

#[utoipa::path(
    put,
    path = "/rooms/{id}/status",
    request_body = RoomStatusRequest,
    responses(
        (status = 200, description = "Room status changed", body = RoomResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Room not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Room ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn set_room_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<RoomStatusRequest>,
) -> Result<Json<RoomResponse>, ApiError> {
    let status: RoomStatus = payload.status.parse()?;
    let booking = state.booking.clone();
    let room = blocking(move || booking.venues.set_room_status(&actor, id, status)).await?;
    Ok(Json(room.into()))
}

#[utoipa::path(
    get,
    path = "/events",
    responses(
        (status = 200, description = "Events by date", body = [EventResponse]),
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn list_events(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<EventResponse>>, ApiError> {
    let booking = state.booking.clone();
    let events = blocking(move || booking.venues.list_events(&actor)).await?;
    Ok(Json(events.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/events",
    request_body = CreateEventRequest,
    responses(
        (status = 201, description = "Event created", body = EventResponse),
        (status = 400, description = "Invalid event", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn create_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<CreateEventRequest>,
) -> Result<(StatusCode, Json<EventResponse>), ApiError> {
    let input = NewEvent {
        price_per_day: parse_money(&payload.price_per_day, "Price per day")?,
        name: payload.name,
        description: payload.description,
        location: payload.location,
        event_date: payload.event_date,
        capacity: payload.capacity,
    };
    let booking = state.booking.clone();
    let event = blocking(move || booking.venues.create_event(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(event.into())))
}

#[utoipa::path(
    get,
    path = "/events/{id}",
    responses(
        (status = 200, description = "Event", body = EventResponse),
        (status = 404, description = "Event not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Event ID")
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn get_event(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<EventResponse>, ApiError> {
    let booking = state.booking.clone();
    let event = blocking(move || booking.venues.get_event(&actor, id)).await?;
    Ok(Json(event.into()))
}

#[utoipa::path(
    get,
    path = "/bookings/{kind}/availability",
    responses(
        (status = 200, description = "Whether the range is free", body = AvailabilityResponse),
        (status = 400, description = "Invalid range", body = ApiErrorResponse),
        (status = 404, description = "Room or event not found", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events"),
        ("resource_id" = Uuid, Query, description = "Room or event ID"),
        ("start_at" = DateTime<Utc>, Query, description = "Range start, inclusive"),
        ("end_at" = DateTime<Utc>, Query, description = "Range end, exclusive"),
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn check_availability(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(kind): AppPath<KindSegment>,
    AppQuery(query): AppQuery<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, ApiError> {
    let booking = state.booking.clone();
    let availability = blocking(move || {
        booking.bookings.check_availability(
            &actor,
            kind.into(),
            query.resource_id,
            query.start_at,
            query.end_at,
        )
    })
    .await?;
    Ok(Json(availability.into()))
}

#[utoipa::path(
    post,
    path = "/bookings/{kind}",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "Booking created", body = BookingResponse),
        (status = 400, description = "Invalid booking", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Room or event not found", body = ApiErrorResponse),
        (status = 409, description = "Resource already booked for those dates", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn create_booking(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(kind): AppPath<KindSegment>,
    AppJson(payload): AppJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), ApiError> {
    let input = NewBooking {
        kind: kind.into(),
        resource_id: payload.resource_id,
        start_at: payload.start_at,
        end_at: payload.end_at,
        guests: payload.guests,
        notes: payload.notes,
    };
    let booking = state.booking.clone();
    let created = blocking(move || booking.bookings.create(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

#[utoipa::path(
    get,
    path = "/bookings/{kind}",
    responses(
        (status = 200, description = "Bookings, newest first", body = [BookingResponse]),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("user_id" = Option<Uuid>, Query, description = "Filter by requester"),
        ("resource_id" = Option<Uuid>, Query, description = "Filter by room or event"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn list_bookings(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(kind): AppPath<KindSegment>,
    AppQuery(query): AppQuery<ListBookingsQuery>,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let filter = BookingFilter {
        status: parse_label::<BookingStatus>(query.status.as_deref())?,
        user_id: query.user_id,
        resource_id: query.resource_id,
        ..Default::default()
    };
    let booking = state.booking.clone();
    let bookings = blocking(move || booking.bookings.list(&actor, kind.into(), filter)).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/bookings/mine",
    responses(
        (status = 200, description = "The caller's bookings", body = [BookingResponse]),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn my_bookings(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<BookingResponse>>, ApiError> {
    let booking = state.booking.clone();
    let bookings = blocking(move || booking.bookings.my_bookings(&actor, None)).await?;
    Ok(Json(bookings.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/bookings/{kind}/{code}",
    responses(
        (status = 200, description = "Booking", body = BookingResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Booking not found", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events"),
        ("code" = String, Path, description = "Booking code, e.g. RM-123456789"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn get_booking(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath((kind, code)): AppPath<(KindSegment, String)>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.booking.clone();
    let found = blocking(move || booking.bookings.get(&actor, kind.into(), &code)).await?;
    Ok(Json(found.into()))
}

#[utoipa::path(
    put,
    path = "/bookings/{kind}/{code}/status",
    request_body = BookingStatusRequest,
    responses(
        (status = 200, description = "Booking updated", body = BookingResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Booking not found", body = ApiErrorResponse),
        (status = 409, description = "Transition not allowed", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events"),
        ("code" = String, Path, description = "Booking code"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn update_booking_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath((kind, code)): AppPath<(KindSegment, String)>,
    AppJson(payload): AppJson<BookingStatusRequest>,
) -> Result<Json<BookingResponse>, ApiError> {
    let update = BookingUpdate {
        status: parse_label(payload.status.as_deref())?,
        payment_status: parse_label(payload.payment_status.as_deref())?,
    };
    let booking = state.booking.clone();
    let updated =
        blocking(move || booking.bookings.update_status(&actor, kind.into(), &code, update))
            .await?;
    Ok(Json(updated.into()))
}

#[utoipa::path(
    post,
    path = "/bookings/{kind}/{code}/cancel",
    responses(
        (status = 200, description = "Booking cancelled", body = BookingResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Booking not found", body = ApiErrorResponse),
        (status = 409, description = "Booking already finished", body = ApiErrorResponse),
    ),
    params(
        ("kind" = KindSegment, Path, description = "rooms or events"),
        ("code" = String, Path, description = "Booking code"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "bookings"
)]
#[instrument(skip(state))]
pub async fn cancel_booking(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath((kind, code)): AppPath<(KindSegment, String)>,
) -> Result<Json<BookingResponse>, ApiError> {
    let booking = state.booking.clone();
    let cancelled = blocking(move || booking.bookings.cancel(&actor, kind.into(), &code)).await?;
    Ok(Json(cancelled.into()))
}
