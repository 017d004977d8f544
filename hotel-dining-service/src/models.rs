use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::schema::{dining_tables, food_categories, menu_items, order_line_items, orders};

hotel_core::sql_enum! {
    pub enum TableStatus => crate::schema::sql_types::TableStatus {
        Available = "available",
        Occupied = "occupied",
        Reserved = "reserved",
        Cleaning = "cleaning",
        Maintenance = "maintenance",
        OutOfService = "out_of_service",
    }
}

hotel_core::sql_enum! {
    pub enum TableSection => crate::schema::sql_types::TableSection {
        MainHall = "Main Hall",
        Terrace = "Terrace",
        PrivateRoom = "Private Room",
        BarArea = "Bar Area",
        Garden = "Garden",
        Vip = "VIP",
    }
}

hotel_core::sql_enum! {
    pub enum OrderStatus => crate::schema::sql_types::OrderStatus {
        Pending = "pending",
        Confirmed = "confirmed",
        Preparing = "preparing",
        Ready = "ready",
        Served = "served",
        Completed = "completed",
        Cancelled = "cancelled",
    }
}

hotel_core::sql_enum! {
    pub enum OrderPriority => crate::schema::sql_types::OrderPriority {
        Low = "low",
        Normal = "normal",
        High = "high",
        Urgent = "urgent",
    }
}

hotel_core::sql_enum! {
    pub enum PaymentStatus => crate::schema::sql_types::PaymentStatus {
        Pending = "pending",
        Paid = "paid",
        Failed = "failed",
        Refunded = "refunded",
    }
}

hotel_core::sql_enum! {
    pub enum PaymentMethod => crate::schema::sql_types::PaymentMethod {
        Cash = "cash",
        Card = "card",
        Mobile = "mobile",
        Online = "online",
    }
}

impl OrderStatus {
    /// Statuses that still hold a table.
    pub const ACTIVE: &'static [OrderStatus] = &[
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
    ];

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }
}

impl TableStatus {
    pub fn accepts_orders(&self) -> bool {
        !matches!(self, TableStatus::Maintenance | TableStatus::OutOfService)
    }
}

#[derive(Queryable, Selectable, Identifiable, Insertable, Debug, Clone, PartialEq)]
#[diesel(table_name = food_categories)]
pub struct FoodCategory {
    pub id: Uuid,
    pub name: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(
    Queryable, Selectable, Identifiable, Associations, Insertable, AsChangeset, Debug, Clone, PartialEq,
)]
#[diesel(belongs_to(FoodCategory, foreign_key = category_id))]
#[diesel(table_name = menu_items, treat_none_as_null = true)]
pub struct MenuItem {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category_id: Uuid,
    pub is_available: bool,
    /// Minutes.
    pub preparation_time: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = dining_tables, treat_none_as_null = true)]
pub struct DiningTable {
    pub id: Uuid,
    pub table_number: i32,
    pub name: String,
    pub section: TableSection,
    pub capacity: i32,
    pub is_active: bool,
    pub status: TableStatus,
    pub current_order_id: Option<Uuid>,
    pub last_occupied_at: Option<DateTime<Utc>>,
    pub last_cleaned_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Queryable, Selectable, Identifiable, Insertable, AsChangeset, Debug, Clone, PartialEq)]
#[diesel(table_name = orders, treat_none_as_null = true)]
pub struct Order {
    pub id: Uuid,
    pub order_code: String,
    pub user_id: Option<Uuid>,
    pub table_id: Uuid,
    pub subtotal: BigDecimal,
    pub tax_amount: BigDecimal,
    pub service_charge: BigDecimal,
    pub total_price: BigDecimal,
    pub status: OrderStatus,
    pub priority: OrderPriority,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub payment_reference: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<Uuid>,
    pub assigned_by: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub notes: Option<String>,
    pub special_requests: Option<String>,
    pub rating_food: Option<i16>,
    pub rating_service: Option<i16>,
    pub rating_ambiance: Option<i16>,
    pub rating_overall: Option<i16>,
    pub feedback: Option<String>,
    pub rated_at: Option<DateTime<Utc>>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub cancelled_by: Option<Uuid>,
    pub cancellation_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_rated(&self) -> bool {
        self.rated_at.is_some()
    }
}

#[derive(Queryable, Selectable, Identifiable, Associations, Insertable, Debug, Clone, PartialEq)]
#[diesel(belongs_to(Order))]
#[diesel(table_name = order_line_items)]
pub struct OrderLineItem {
    pub id: Uuid,
    pub order_id: Uuid,
    pub position: i32,
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
    pub line_total: BigDecimal,
    pub special_instructions: Option<String>,
}

/// An order together with its line items, in the order they were placed.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDetails {
    pub order: Order,
    pub line_items: Vec<OrderLineItem>,
}
