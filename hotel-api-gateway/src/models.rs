use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use hotel_booking_service::bookings::{Availability, BookedRange};
use hotel_booking_service::models::{Booking, Event, Room};
use hotel_core::ServiceError;
use hotel_dining_service::models::{
    DiningTable, FoodCategory, MenuItem, OrderDetails, OrderLineItem,
};
use hotel_dining_service::orders::OrderTracking;
use hotel_dining_service::reports::{
    OrderStats, StatusCount, TableHistory, TableStats, WaiterWorkload,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

pub fn parse_money(value: &str, field: &str) -> Result<BigDecimal, ServiceError> {
    BigDecimal::from_str(value.trim())
        .map_err(|_| ServiceError::validation(format!("{field} must be a decimal amount")))
}

/// Parses an optional label into one of the persisted enums.
pub fn parse_label<T>(value: Option<&str>) -> Result<Option<T>, ServiceError>
where
    T: FromStr<Err = ServiceError>,
{
    value.map(T::from_str).transpose()
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorResponse {
    /// Machine readable error kind, e.g. `conflict`
    pub error: String,
    /// Human readable message
    pub message: String,
}

// Menu

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryResponse {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
}

impl From<FoodCategory> for CategoryResponse {
    fn from(c: FoodCategory) -> Self {
        CategoryResponse {
            id: c.id,
            name: c.name,
            is_active: c.is_active,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub description: Option<String>,
    /// Price as a decimal string, e.g. "12.50"
    pub price: String,
    pub category_id: Uuid,
    pub is_available: Option<bool>,
    /// Minutes
    pub preparation_time: Option<i32>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<String>,
    pub category_id: Option<Uuid>,
    pub is_available: Option<bool>,
    pub preparation_time: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MenuItemResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: String,
    pub category_id: Uuid,
    pub is_available: bool,
    pub preparation_time: i32,
}

impl From<MenuItem> for MenuItemResponse {
    fn from(m: MenuItem) -> Self {
        MenuItemResponse {
            id: m.id,
            name: m.name,
            description: m.description,
            price: m.price.to_string(),
            category_id: m.category_id,
            is_available: m.is_available,
            preparation_time: m.preparation_time,
        }
    }
}

// Tables

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTableRequest {
    pub table_number: i32,
    pub name: Option<String>,
    /// e.g. "Main Hall", "Terrace", "VIP"
    pub section: Option<String>,
    pub capacity: i32,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateTableRequest {
    pub name: Option<String>,
    pub section: Option<String>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TableStatusRequest {
    pub status: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OccupyTableRequest {
    pub party_size: Option<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableResponse {
    pub id: Uuid,
    pub table_number: i32,
    pub name: String,
    pub section: String,
    pub capacity: i32,
    pub is_active: bool,
    pub status: String,
    pub current_order_id: Option<Uuid>,
    pub last_occupied_at: Option<DateTime<Utc>>,
    pub last_cleaned_at: Option<DateTime<Utc>>,
}

impl From<DiningTable> for TableResponse {
    fn from(t: DiningTable) -> Self {
        TableResponse {
            id: t.id,
            table_number: t.table_number,
            name: t.name,
            section: t.section.to_string(),
            capacity: t.capacity,
            is_active: t.is_active,
            status: t.status.to_string(),
            current_order_id: t.current_order_id,
            last_occupied_at: t.last_occupied_at,
            last_cleaned_at: t.last_cleaned_at,
        }
    }
}

// Orders

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub table_id: Uuid,
    pub items: Vec<OrderItemRequest>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    pub notes: Option<String>,
    /// low, normal, high or urgent
    pub priority: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OrderStatusRequest {
    pub status: String,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignOrderRequest {
    pub waiter_id: Uuid,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RateOrderRequest {
    pub food_quality: i16,
    pub service: i16,
    pub ambiance: i16,
    pub overall: i16,
    pub feedback: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct PaymentRequest {
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub payment_reference: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LineItemResponse {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
    pub line_total: String,
    pub special_instructions: Option<String>,
}

impl From<OrderLineItem> for LineItemResponse {
    fn from(li: OrderLineItem) -> Self {
        LineItemResponse {
            menu_item_id: li.menu_item_id,
            name: li.name,
            quantity: li.quantity,
            unit_price: li.unit_price.to_string(),
            line_total: li.line_total.to_string(),
            special_instructions: li.special_instructions,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingResponse {
    pub food_quality: Option<i16>,
    pub service: Option<i16>,
    pub ambiance: Option<i16>,
    pub overall: Option<i16>,
    pub feedback: Option<String>,
    pub rated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderResponse {
    pub id: Uuid,
    pub order_code: String,
    pub user_id: Option<Uuid>,
    pub table_id: Uuid,
    pub items: Vec<LineItemResponse>,
    pub subtotal: String,
    pub tax_amount: String,
    pub service_charge: String,
    pub total_price: String,
    pub status: String,
    pub priority: String,
    pub payment_status: String,
    pub payment_method: Option<String>,
    pub assigned_to: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub special_requests: Option<String>,
    pub rating: Option<RatingResponse>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OrderDetails> for OrderResponse {
    fn from(details: OrderDetails) -> Self {
        let o = details.order;
        let rating = o.rated_at.map(|rated_at| RatingResponse {
            food_quality: o.rating_food,
            service: o.rating_service,
            ambiance: o.rating_ambiance,
            overall: o.rating_overall,
            feedback: o.feedback.clone(),
            rated_at,
        });
        OrderResponse {
            id: o.id,
            order_code: o.order_code,
            user_id: o.user_id,
            table_id: o.table_id,
            items: details.line_items.into_iter().map(Into::into).collect(),
            subtotal: o.subtotal.to_string(),
            tax_amount: o.tax_amount.to_string(),
            service_charge: o.service_charge.to_string(),
            total_price: o.total_price.to_string(),
            status: o.status.to_string(),
            priority: o.priority.to_string(),
            payment_status: o.payment_status.to_string(),
            payment_method: o.payment_method.map(|m| m.to_string()),
            assigned_to: o.assigned_to,
            assigned_at: o.assigned_at,
            customer_name: o.customer_name,
            customer_phone: o.customer_phone,
            customer_email: o.customer_email,
            notes: o.notes,
            special_requests: o.special_requests,
            rating,
            estimated_ready_at: o.estimated_ready_at,
            completed_at: o.completed_at,
            cancelled_at: o.cancelled_at,
            cancellation_reason: o.cancellation_reason,
            created_at: o.created_at,
            updated_at: o.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackedItemResponse {
    pub name: String,
    pub quantity: i32,
    pub unit_price: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderTrackingResponse {
    pub order_code: String,
    pub status: String,
    pub table_number: Option<i32>,
    pub table_name: Option<String>,
    pub section: Option<String>,
    pub items: Vec<TrackedItemResponse>,
    pub total_price: String,
    pub ordered_at: DateTime<Utc>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    /// Name of the waiter serving the order
    pub assigned_to: Option<String>,
}

impl From<OrderTracking> for OrderTrackingResponse {
    fn from(t: OrderTracking) -> Self {
        OrderTrackingResponse {
            order_code: t.order_code,
            status: t.status.to_string(),
            table_number: t.table_number,
            table_name: t.table_name,
            section: t.section.map(|s| s.to_string()),
            items: t
                .items
                .into_iter()
                .map(|i| TrackedItemResponse {
                    name: i.name,
                    quantity: i.quantity,
                    unit_price: i.unit_price.to_string(),
                })
                .collect(),
            total_price: t.total_price.to_string(),
            ordered_at: t.ordered_at,
            estimated_ready_at: t.estimated_ready_at,
            assigned_to: t.assigned_to,
        }
    }
}

// Rooms, events and bookings

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoomRequest {
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoomStatusRequest {
    /// available, booked or maintenance
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResponse {
    pub id: Uuid,
    pub name: String,
    pub room_type: String,
    pub description: Option<String>,
    pub price_per_night: String,
    pub status: String,
}

impl From<Room> for RoomResponse {
    fn from(r: Room) -> Self {
        RoomResponse {
            id: r.id,
            name: r.name,
            room_type: r.room_type,
            description: r.description,
            price_per_night: r.price_per_night.to_string(),
            status: r.status.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEventRequest {
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_per_day: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EventResponse {
    pub id: Uuid,
    pub event_code: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: DateTime<Utc>,
    pub capacity: Option<i32>,
    pub price_per_day: String,
}

impl From<Event> for EventResponse {
    fn from(e: Event) -> Self {
        EventResponse {
            id: e.id,
            event_code: e.event_code,
            name: e.name,
            description: e.description,
            location: e.location,
            event_date: e.event_date,
            capacity: e.capacity,
            price_per_day: e.price_per_day.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    /// Room or event id, depending on the booking kind
    pub resource_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub guests: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct BookingStatusRequest {
    pub status: Option<String>,
    /// unpaid, paid or refunded
    pub payment_status: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookingResponse {
    pub id: Uuid,
    pub booking_code: String,
    pub kind: String,
    pub resource_id: Uuid,
    pub user_id: Uuid,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub guests: Option<i32>,
    pub notes: Option<String>,
    pub total_price: String,
    pub payment_status: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Booking> for BookingResponse {
    fn from(b: Booking) -> Self {
        BookingResponse {
            id: b.id,
            booking_code: b.booking_code,
            kind: b.kind.to_string(),
            resource_id: b.resource_id,
            user_id: b.user_id,
            start_at: b.start_at,
            end_at: b.end_at,
            guests: b.guests,
            notes: b.notes,
            total_price: b.total_price.to_string(),
            payment_status: b.payment_status.to_string(),
            status: b.status.to_string(),
            created_at: b.created_at,
            updated_at: b.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BookedRangeResponse {
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub resource_id: Uuid,
    pub kind: String,
    pub available: bool,
    pub conflicts: Vec<BookedRangeResponse>,
}

impl From<Availability> for AvailabilityResponse {
    fn from(a: Availability) -> Self {
        AvailabilityResponse {
            resource_id: a.resource_id,
            kind: a.kind.to_string(),
            available: a.available,
            conflicts: a
                .conflicts
                .into_iter()
                .map(|BookedRange { start_at, end_at }| BookedRangeResponse { start_at, end_at })
                .collect(),
        }
    }
}

// Reports

#[derive(Debug, Serialize, ToSchema)]
pub struct StatusCountResponse {
    pub status: String,
    pub count: i64,
}

impl<S: std::fmt::Display> From<StatusCount<S>> for StatusCountResponse {
    fn from(c: StatusCount<S>) -> Self {
        StatusCountResponse {
            status: c.status.to_string(),
            count: c.count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PopularItemResponse {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableActivityResponse {
    pub table_id: Uuid,
    pub table_number: Option<i32>,
    pub section: Option<String>,
    pub order_count: i64,
    pub revenue: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RatingSummaryResponse {
    pub total_ratings: i64,
    pub food_quality: Option<f64>,
    pub service: Option<f64>,
    pub ambiance: Option<f64>,
    pub overall: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderStatsResponse {
    pub period: String,
    /// Start of the period, absent for all time
    pub since: Option<DateTime<Utc>>,
    pub total_orders: i64,
    pub by_status: Vec<StatusCountResponse>,
    pub revenue: String,
    pub average_order_value: String,
    pub popular_items: Vec<PopularItemResponse>,
    pub busiest_tables: Vec<TableActivityResponse>,
    pub ratings: RatingSummaryResponse,
}

impl From<OrderStats> for OrderStatsResponse {
    fn from(s: OrderStats) -> Self {
        OrderStatsResponse {
            period: s.period.to_string(),
            since: s.since,
            total_orders: s.total_orders,
            by_status: s.by_status.into_iter().map(Into::into).collect(),
            revenue: s.revenue.to_string(),
            average_order_value: s.average_order_value.to_string(),
            popular_items: s
                .popular_items
                .into_iter()
                .map(|i| PopularItemResponse {
                    menu_item_id: i.menu_item_id,
                    name: i.name,
                    quantity: i.quantity,
                    revenue: i.revenue.to_string(),
                })
                .collect(),
            busiest_tables: s
                .busiest_tables
                .into_iter()
                .map(|t| TableActivityResponse {
                    table_id: t.table_id,
                    table_number: t.table_number,
                    section: t.section.map(|s| s.to_string()),
                    order_count: t.order_count,
                    revenue: t.revenue.to_string(),
                })
                .collect(),
            ratings: RatingSummaryResponse {
                total_ratings: s.ratings.total_ratings,
                food_quality: s.ratings.food,
                service: s.ratings.service,
                ambiance: s.ratings.ambiance,
                overall: s.ratings.overall,
            },
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct WaiterResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    /// Orders assigned over the last 30 days
    pub assigned_orders: i64,
    pub completed_orders: i64,
    pub average_rating: Option<f64>,
}

impl From<WaiterWorkload> for WaiterResponse {
    fn from(w: WaiterWorkload) -> Self {
        WaiterResponse {
            id: w.waiter.id,
            name: w.waiter.name,
            email: w.waiter.email,
            is_active: w.waiter.is_active,
            created_at: w.waiter.created_at,
            assigned_orders: w.assigned_orders,
            completed_orders: w.completed_orders,
            average_rating: w.average_rating,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SectionSummaryResponse {
    pub section: String,
    pub count: i64,
    pub available: i64,
    pub occupied: i64,
    pub average_capacity: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CapacitySummaryResponse {
    pub capacity: i32,
    pub count: i64,
    pub available: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableStatsResponse {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    pub by_status: Vec<StatusCountResponse>,
    pub average_capacity: f64,
    pub sections: Vec<SectionSummaryResponse>,
    pub capacities: Vec<CapacitySummaryResponse>,
}

impl From<TableStats> for TableStatsResponse {
    fn from(s: TableStats) -> Self {
        TableStatsResponse {
            total: s.total,
            active: s.active,
            inactive: s.inactive,
            by_status: s.by_status.into_iter().map(Into::into).collect(),
            average_capacity: s.average_capacity,
            sections: s
                .sections
                .into_iter()
                .map(|sec| SectionSummaryResponse {
                    section: sec.section.to_string(),
                    count: sec.count,
                    available: sec.available,
                    occupied: sec.occupied,
                    average_capacity: sec.average_capacity,
                })
                .collect(),
            capacities: s
                .capacities
                .into_iter()
                .map(|c| CapacitySummaryResponse {
                    capacity: c.capacity,
                    count: c.count,
                    available: c.available,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HistoryOrderResponse {
    pub order_code: String,
    pub status: String,
    pub total_price: String,
    pub assigned_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TableHistoryResponse {
    pub table: TableResponse,
    pub days: i64,
    pub total_orders: i64,
    pub completed_orders: i64,
    pub revenue: String,
    pub average_order_value: String,
    pub average_duration_minutes: Option<f64>,
    /// The 20 most recent orders
    pub orders: Vec<HistoryOrderResponse>,
}

impl From<TableHistory> for TableHistoryResponse {
    fn from(h: TableHistory) -> Self {
        TableHistoryResponse {
            table: h.table.into(),
            days: h.days,
            total_orders: h.total_orders,
            completed_orders: h.completed_orders,
            revenue: h.revenue.to_string(),
            average_order_value: h.average_order_value.to_string(),
            average_duration_minutes: h.average_duration_minutes,
            orders: h
                .orders
                .into_iter()
                .map(|o| HistoryOrderResponse {
                    order_code: o.order_code,
                    status: o.status.to_string(),
                    total_price: o.total_price.to_string(),
                    assigned_to: o.assigned_to,
                    created_at: o.created_at,
                    completed_at: o.completed_at,
                })
                .collect(),
        }
    }
}
