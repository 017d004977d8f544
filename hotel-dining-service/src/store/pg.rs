use std::sync::Mutex;

use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::{delete, insert_into, update, PgConnection};
use hotel_core::models::{find_user, list_users, UserAccount};
use hotel_core::{Role, ServiceError};
use uuid::Uuid;

use super::{DiningRepository, DiningStore, MenuFilter, OrderFilter, OrderSort, TableFilter};
use crate::models::{DiningTable, FoodCategory, MenuItem, Order, OrderLineItem, OrderStatus};
use crate::schema::{dining_tables, food_categories, menu_items, order_line_items, orders};

/// Dining store backed by one Postgres connection.
pub struct PgDiningStore {
    conn: Mutex<PgConnection>,
}

impl PgDiningStore {
    pub fn new(conn: PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

impl DiningStore for PgDiningStore {
    fn transaction(
        &self,
        work: &mut dyn FnMut(&mut dyn DiningRepository) -> Result<(), ServiceError>,
    ) -> Result<(), ServiceError> {
        let mut conn = self
            .conn
            .lock()
            .map_err(|_| ServiceError::internal("database connection poisoned"))?;
        conn.transaction(|conn| work(&mut PgDiningRepository { conn }))
    }
}

struct PgDiningRepository<'a> {
    conn: &'a mut PgConnection,
}

impl DiningRepository for PgDiningRepository<'_> {
    fn find_user(&mut self, id: Uuid) -> Result<Option<UserAccount>, ServiceError> {
        Ok(find_user(self.conn, id)?)
    }

    fn list_users(&mut self, role: Role, active_only: bool) -> Result<Vec<UserAccount>, ServiceError> {
        Ok(list_users(self.conn, role, active_only)?)
    }

    fn find_category(&mut self, id: Uuid) -> Result<Option<FoodCategory>, ServiceError> {
        Ok(food_categories::table
            .find(id)
            .select(FoodCategory::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn list_categories(&mut self) -> Result<Vec<FoodCategory>, ServiceError> {
        Ok(food_categories::table
            .order(food_categories::name.asc())
            .select(FoodCategory::as_select())
            .load(self.conn)?)
    }

    fn insert_category(&mut self, category: &FoodCategory) -> Result<(), ServiceError> {
        insert_into(food_categories::table)
            .values(category)
            .execute(self.conn)?;
        Ok(())
    }

    fn find_menu_item(&mut self, id: Uuid) -> Result<Option<MenuItem>, ServiceError> {
        Ok(menu_items::table
            .find(id)
            .select(MenuItem::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn list_menu_items(&mut self, filter: &MenuFilter) -> Result<Vec<MenuItem>, ServiceError> {
        let mut query = menu_items::table
            .select(MenuItem::as_select())
            .order(menu_items::name.asc())
            .into_boxed();
        if let Some(category_id) = filter.category_id {
            query = query.filter(menu_items::category_id.eq(category_id));
        }
        if filter.available_only {
            query = query.filter(menu_items::is_available.eq(true));
        }
        Ok(query.load(self.conn)?)
    }

    fn insert_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError> {
        insert_into(menu_items::table).values(item).execute(self.conn)?;
        Ok(())
    }

    fn update_menu_item(&mut self, item: &MenuItem) -> Result<(), ServiceError> {
        update(menu_items::table.find(item.id))
            .set(item)
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_menu_item(&mut self, id: Uuid) -> Result<(), ServiceError> {
        delete(menu_items::table.find(id)).execute(self.conn)?;
        Ok(())
    }

    fn count_active_orders_with_item(&mut self, menu_item_id: Uuid) -> Result<i64, ServiceError> {
        Ok(orders::table
            .inner_join(order_line_items::table)
            .filter(order_line_items::menu_item_id.eq(menu_item_id))
            .filter(orders::status.eq_any(OrderStatus::ACTIVE.to_vec()))
            .select(diesel::dsl::count_distinct(orders::id))
            .get_result(self.conn)?)
    }

    fn find_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError> {
        Ok(dining_tables::table
            .find(id)
            .select(DiningTable::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn lock_table(&mut self, id: Uuid) -> Result<Option<DiningTable>, ServiceError> {
        Ok(dining_tables::table
            .find(id)
            .select(DiningTable::as_select())
            .for_update()
            .get_result(self.conn)
            .optional()?)
    }

    fn find_table_by_number(&mut self, number: i32) -> Result<Option<DiningTable>, ServiceError> {
        Ok(dining_tables::table
            .filter(dining_tables::table_number.eq(number))
            .select(DiningTable::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn list_tables(&mut self, filter: &TableFilter) -> Result<Vec<DiningTable>, ServiceError> {
        let mut query = dining_tables::table
            .select(DiningTable::as_select())
            .order(dining_tables::table_number.asc())
            .into_boxed();
        if let Some(section) = filter.section {
            query = query.filter(dining_tables::section.eq(section));
        }
        if let Some(status) = filter.status {
            query = query.filter(dining_tables::status.eq(status));
        }
        if let Some(capacity) = filter.min_capacity {
            query = query.filter(dining_tables::capacity.ge(capacity));
        }
        if filter.active_only {
            query = query.filter(dining_tables::is_active.eq(true));
        }
        Ok(query.load(self.conn)?)
    }

    fn insert_table(&mut self, table: &DiningTable) -> Result<(), ServiceError> {
        insert_into(dining_tables::table)
            .values(table)
            .execute(self.conn)?;
        Ok(())
    }

    fn update_table(&mut self, table: &DiningTable) -> Result<(), ServiceError> {
        update(dining_tables::table.find(table.id))
            .set(table)
            .execute(self.conn)?;
        Ok(())
    }

    fn delete_table(&mut self, id: Uuid) -> Result<(), ServiceError> {
        delete(dining_tables::table.find(id)).execute(self.conn)?;
        Ok(())
    }

    fn count_active_orders_on_table(
        &mut self,
        table_id: Uuid,
        excluding: Option<Uuid>,
    ) -> Result<i64, ServiceError> {
        let mut query = orders::table
            .filter(orders::table_id.eq(table_id))
            .filter(orders::status.eq_any(OrderStatus::ACTIVE.to_vec()))
            .select(count_star())
            .into_boxed();
        if let Some(order_id) = excluding {
            query = query.filter(orders::id.ne(order_id));
        }
        Ok(query.get_result(self.conn)?)
    }

    fn insert_order(&mut self, order: &Order, items: &[OrderLineItem]) -> Result<(), ServiceError> {
        insert_into(orders::table).values(order).execute(self.conn)?;
        insert_into(order_line_items::table)
            .values(items)
            .execute(self.conn)?;
        Ok(())
    }

    fn find_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError> {
        Ok(orders::table
            .filter(orders::order_code.eq(code))
            .select(Order::as_select())
            .first(self.conn)
            .optional()?)
    }

    fn lock_order_by_code(&mut self, code: &str) -> Result<Option<Order>, ServiceError> {
        Ok(orders::table
            .filter(orders::order_code.eq(code))
            .select(Order::as_select())
            .for_update()
            .get_result(self.conn)
            .optional()?)
    }

    fn update_order(&mut self, order: &Order) -> Result<(), ServiceError> {
        update(orders::table.find(order.id))
            .set(order)
            .execute(self.conn)?;
        Ok(())
    }

    fn list_orders(&mut self, filter: &OrderFilter) -> Result<Vec<Order>, ServiceError> {
        let mut query = orders::table.select(Order::as_select()).into_boxed();
        if !filter.statuses.is_empty() {
            query = query.filter(orders::status.eq_any(filter.statuses.clone()));
        }
        if let Some(table_id) = filter.table_id {
            query = query.filter(orders::table_id.eq(table_id));
        }
        if let Some(user_id) = filter.user_id {
            query = query.filter(orders::user_id.eq(user_id));
        }
        if let Some(assignee) = filter.assigned_to {
            query = query.filter(orders::assigned_to.eq(assignee));
        }
        if filter.unassigned {
            query = query.filter(orders::assigned_to.is_null());
        }
        if let Some(since) = filter.created_since {
            query = query.filter(orders::created_at.ge(since));
        }
        query = match filter.sort {
            OrderSort::NewestFirst => query.order(orders::created_at.desc()),
            OrderSort::OldestFirst => query.order(orders::created_at.asc()),
        };
        Ok(query.load(self.conn)?)
    }

    fn line_items(&mut self, order_id: Uuid) -> Result<Vec<OrderLineItem>, ServiceError> {
        Ok(order_line_items::table
            .filter(order_line_items::order_id.eq(order_id))
            .order(order_line_items::position.asc())
            .select(OrderLineItem::as_select())
            .load(self.conn)?)
    }
}
