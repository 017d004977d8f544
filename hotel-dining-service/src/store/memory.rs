use std::collections::HashMap;
use std::sync::Mutex;

use hotel_core::models::UserAccount;
use hotel_core::{Role, ServiceError};
use uuid::Uuid;

use super::{DiningRepository, DiningStore, MenuFilter, OrderFilter, OrderSort, TableFilter};
use crate::models::{DiningTable, FoodCategory, MenuItem, Order, OrderLineItem};

#[derive(Debug, Clone, Default)]
struct DiningState {
    users: HashMap<Uuid, UserAccount>,
    categories: Vec<FoodCategory>,
    menu_items: Vec<MenuItem>,
    tables: Vec<DiningTable>,
    orders: Vec<Order>,
    line_items: Vec<OrderLineItem>,
}

/// Process-local store. Units of work are serialized behind one mutex and
/// rolled back to a snapshot when they fail.
#[derive(Debug, Default)]
pub struct MemoryDiningStore {
    state: Mutex<DiningState>,
}

impl MemoryDiningStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user account that engines can look up.
    pub fn add_user(&self, user: UserAccount) {
        if let Ok(mut state) = self.state.lock() {
            state.users.insert(user.id, user);
        }
    }
}

impl DiningStore for MemoryDiningStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn DiningRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| ServiceError::internal("dining store poisoned"))?;
        let snapshot = state.clone();
        let result = work(&mut MemoryDiningRepository { state: &mut *state });
        if result.is_err() {
            *state = snapshot;
        }
        result
    }
}

struct MemoryDiningRepository<'a> {
    state: &'a mut DiningState,
}

impl MemoryDiningRepository<'_> {
    fn active_orders(&self) -> impl Iterator<Item = &Order> {
        self.state.orders.iter().filter(|o| o.status.is_active())
    }
}

fn replace<T: Clone>(rows: &mut [T], row: &T, same: impl Fn(&T) -> bool) -> Result<(), ServiceError> {
    match rows.iter_mut().find(|r| same(r)) {
        Some(slot) => {
            *slot = row.clone();
            Ok(())
        }
        None => Err(ServiceError::not_found("Record not found")),
    }
}

impl DiningRepository for MemoryDiningRepository<'_> {
    fn find_user(&mut self, id: Uuid) -> Result<Option<UserAccount>, ServiceError> {
        Ok(self.state.users.get(&id).cloned())
    }

    fn list_users(&mut self, role: Role, active_only: bool) -> Result<Vec<UserAccount>, ServiceError> {
        let mut users: Vec<UserAccount> = self
            .state
            .users
            .values()
            .filter(|u| u.role == role && (!active_only || u.is_active))
            .cloned()
            .collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    fn find_category(&mut self, id: Uuid) -> Result<Option<FoodCategory>, ServiceError> {
        Ok(self.state.categories.iter().find(|c| c.id == id).cloned())
    }

    fn list_categories(&mut self) -> Result<Vec<FoodCategory>, ServiceError> {
        let mut categories = self.state.categories.clone();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    fn insert_category(&mut self, category: &FoodCategory) -> Result<(), ServiceError> {
        if self.state.categories.iter().any(|c| c.name == category.name) {
            return Err(ServiceError::conflict(
                "Duplicate value for food_categories_name_key, try again",
            ));
        }
        self.state.categories.push(category.clone());
        Ok(())
    }

    fn find_menu_item(&mut self, id: Uuid) -> Result<Option<MenuItem>, ServiceError> {
        Ok(self.state.menu_items.iter().find(|m| m.id == id).cloned())
    }

    fn list_menu_items(&mut self, filter: &MenuFilter) -> Result<Vec<MenuItem>, ServiceError> {
        let mut items: Vec<MenuItem> = self
            .state
            .menu_items
            .iter()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        items.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(items)
    }

    fn insert_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError> {
        self.state.menu_items.push(item.clone());
        Ok(())
    }

    fn update_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError> {
        replace(&mut self.state.menu_items, item, |m| m.id == item.id)
    }

    fn delete_menu_item(&mut self, id: Uuid) -> Result<(), ServiceError> {
        self.state.menu_items.retain(|m| m.id != id);
        Ok(())
    }

    fn count_active_orders_with_item(&mut self, menu_item_id: Uuid) -> Result<i64, ServiceError> {
        let count = self
            .active_orders()
            .filter(|o| {
                self.state
                    .line_items
                    .iter()
                    .any(|li| li.order_id == o.id && li.menu_item_id == menu_item_id)
            })
            .count();
        Ok(count as i64)
    }

    fn find_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError> {
        Ok(self.state.tables.iter().find(|t| t.id == id).cloned())
    }

    fn lock_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError> {
        self.find_table(id)
    }

    fn find_table_by_number(&mut self, number: i32) -> Result<Option<DiningTable>, ServiceError> {
        Ok(self
            .state
            .tables
            .iter()
            .find(|t| t.table_number == number)
            .cloned())
    }

    fn list_tables(&mut self, filter: &TableFilter) -> Result<Vec<DiningTable>, ServiceError> {
        let mut tables: Vec<DiningTable> = self
            .state
            .tables
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect();
        tables.sort_by_key(|t| t.table_number);
        Ok(tables)
    }

    fn insert_table(&mut self, table: &DiningTable) -> Result<(), ServiceError> {
        if self
            .state
            .tables
            .iter()
            .any(|t| t.table_number == table.table_number)
        {
            return Err(ServiceError::conflict(
                "Duplicate value for dining_tables_table_number_key, try again",
            ));
        }
        self.state.tables.push(table.clone());
        Ok(())
    }

    fn update_table(&mut self, table: &DiningTable) -> Result<(), ServiceError> {
        replace(&mut self.state.tables, table, |t| t.id == table.id)
    }

    fn delete_table(&mut self, id: Uuid) -> Result<(), ServiceError> {
        self.state.tables.retain(|t| t.id != id);
        Ok(())
    }

    fn count_active_orders_on_table(
        &mut self,
        table_id: Uuid,
        excluding: Option<Uuid>,
    ) -> Result<i64, ServiceError> {
        let count = self
            .active_orders()
            .filter(|o| o.table_id == table_id && Some(o.id) != excluding)
            .count();
        Ok(count as i64)
    }

    fn insert_order(&mut self, order: &Order, items: &[OrderLineItem]) -> Result<(), ServiceError> {
        if self
            .state
            .orders
            .iter()
            .any(|o| o.order_code == order.order_code)
        {
            return Err(ServiceError::conflict(
                "Duplicate value for orders_order_code_key, try again",
            ));
        }
        self.state.orders.push(order.clone());
        self.state.line_items.extend_from_slice(items);
        Ok(())
    }

    fn find_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError> {
        Ok(self
            .state
            .orders
            .iter()
            .find(|o| o.order_code == code)
            .cloned())
    }

    fn lock_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError> {
        self.find_order_by_code(code)
    }

    fn update_order(&mut self, order: &Order) -> Result<(), ServiceError> {
        replace(&mut self.state.orders, order, |o| o.id == order.id)
    }

    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let mut orders: Vec<Order> = self
            .state
            .orders
            .iter()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        match filter.sort {
            OrderSort::NewestFirst => orders.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            OrderSort::OldestFirst => orders.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        }
        Ok(orders)
    }

    fn line_items(&mut self, order_id: Uuid) -> Result<Vec<OrderLineItem>, ServiceError> {
        let mut items: Vec<OrderLineItem> = self
            .state
            .line_items
            .iter()
            .filter(|li| li.order_id == order_id)
            .cloned()
            .collect();
        items.sort_by_key(|li| li.position);
        Ok(items)
    }
}
