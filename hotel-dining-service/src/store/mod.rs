//! Persistence seam of the dining engines.
//!
//! Every engine operation runs inside exactly one [`DiningStore::transaction`];
//! the repository handed to the closure sees a consistent view and all of its
//! writes commit or roll back together.

use chrono::{DateTime, Utc};
use hotel_core::models::UserAccount;
use hotel_core::{Role, ServiceError};
use uuid::Uuid;

use crate::models::{
    DiningTable, FoodCategory, MenuItem, Order, OrderLineItem, OrderStatus, TableSection,
    TableStatus,
};

pub mod memory;
pub mod pg;

pub use memory::MemoryDiningStore;
pub use pg::PgDiningStore;

#[derive(Debug, Clone, Default)]
pub struct TableFilter {
    pub section: Option<TableSection>,
    pub status: Option<TableStatus>,
    pub min_capacity: Option<i32>,
    pub active_only: bool,
}

impl TableFilter {
    pub fn matches(&self, table: &DiningTable) -> bool {
        self.section.is_none_or(|s| table.section == s)
            && self.status.is_none_or(|s| table.status == s)
            && self.min_capacity.is_none_or(|c| table.capacity >= c)
            && (!self.active_only || table.is_active)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderSort {
    #[default]
    NewestFirst,
    OldestFirst,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    /// Empty means any status.
    pub statuses: Vec<OrderStatus>,
    pub table_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub unassigned: bool,
    /// Only orders placed at or after this instant.
    pub created_since: Option<DateTime<Utc>>,
    pub sort: OrderSort,
}

impl OrderFilter {
    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && self.table_id.is_none_or(|t| order.table_id == t)
            && self.user_id.is_none_or(|u| order.user_id == Some(u))
            && self.assigned_to.is_none_or(|a| order.assigned_to == Some(a))
            && (!self.unassigned || order.assigned_to.is_none())
            && self.created_since.is_none_or(|since| order.created_at >= since)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MenuFilter {
    pub category_id: Option<Uuid>,
    pub available_only: bool,
}

impl MenuFilter {
    pub fn matches(&self, item: &MenuItem) -> bool {
        self.category_id.is_none_or(|c| item.category_id == c)
            && (!self.available_only || item.is_available)
    }
}

/// Reads and writes available inside one unit of work.
///
/// `lock_*` methods take a row lock that is held until the unit of work ends.
pub trait DiningRepository {
    fn find_user(&mut self, id: Uuid) -> Result<Option<UserAccount>, ServiceError>;
    /// Accounts holding `role`, newest first.
    fn list_users(&mut self, role: Role, active_only: bool) -> Result<Vec<UserAccount>, ServiceError>;

    fn find_category(&mut self, id: Uuid) -> Result<Option<FoodCategory>, ServiceError>;
    fn list_categories(&mut self) -> Result<Vec<FoodCategory>, ServiceError>;
    fn insert_category(&mut self, category: &FoodCategory) -> Result<(), ServiceError>;

    fn find_menu_item(&mut self, id: Uuid) -> Result<Option<MenuItem>, ServiceError>;
    fn list_menu_items(&mut self, filter: &MenuFilter) -> Result<Vec<MenuItem>, ServiceError>;
    fn insert_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError>;
    fn update_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError>;
    fn delete_menu_item(&mut self, id: Uuid) -> Result<(), ServiceError>;
    fn count_active_orders_with_item(&mut self, menu_item_id: Uuid) -> Result<i64, ServiceError>;

    fn find_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError>;
    fn lock_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError>;
    fn find_table_by_number(&mut self, number: i32) -> Result<Option<DiningTable>, ServiceError>;
    fn list_tables(&mut self, filter: &TableFilter) -> Result<Vec<DiningTable>, ServiceError>;
    fn insert_table(&mut self, table: &DiningTable) -> Result<(), ServiceError>;
    fn update_table(&mut self, table: &DiningTable) -> Result<(), ServiceError>;
    fn delete_table(&mut self, id: Uuid) -> Result<(), ServiceError>;
    /// Active orders on `table_id`, not counting `excluding`.
    fn count_active_orders_on_table(
        &mut self,
        table_id: Uuid,
        excluding: Option<Uuid>,
    ) -> Result<i64, ServiceError>;

    fn insert_order(&mut self, order: &Order, items: &[OrderLineItem]) -> Result<(), ServiceError>;
    fn find_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError>;
    fn lock_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError>;
    fn update_order(&mut self, order: &Order) -> Result<(), ServiceError>;
    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError>;
    fn line_items(&mut self, order_id: Uuid) -> Result<Vec<OrderLineItem>, ServiceError>;
}

pub trait DiningStore: Send + Sync {
    /// Runs `work` as one atomic unit. An `Err` from `work` discards every write it made.
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn DiningRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError>;
}

/// Runs `work` inside one unit of work on `store` and returns its result.
pub fn atomically<T>(
    store: &dyn DiningStore,
    work: impl FnOnce(&mut dyn DiningRepository) -> Result<T, ServiceError>,
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
