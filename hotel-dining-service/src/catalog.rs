use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::Utc;
use hotel_core::access::{authorize, policies};
use hotel_core::{Actor, ServiceError};
use tracing::info;
use uuid::Uuid;

use crate::models::{FoodCategory, MenuItem};
use crate::store::{atomically, DiningStore, MenuFilter};

pub const DEFAULT_PREPARATION_MINUTES: i32 = 15;

#[derive(Debug, Clone)]
pub struct NewMenuItem {
    pub name: String,
    pub description: Option<String>,
    pub price: BigDecimal,
    pub category_id: Uuid,
    pub is_available: Option<bool>,
    pub preparation_time: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct MenuItemChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<BigDecimal>,
    pub category_id: Option<Uuid>,
    pub is_available: Option<bool>,
    pub preparation_time: Option<i32>,
}

pub struct MenuCatalog {
    store: Arc<dyn DiningStore>,
}

fn validate_item(item: &MenuItem) -> Result<(), ServiceError> {
    if item.name.trim().is_empty() {
        return Err(ServiceError::validation("Menu item name is required"));
    }
    if item.price < BigDecimal::from(0) {
        return Err(ServiceError::validation("Price cannot be negative"));
    }
    if item.preparation_time < 0 {
        return Err(ServiceError::validation(
            "Preparation time cannot be negative",
        ));
    }
    Ok(())
}

impl MenuCatalog {
    pub fn new(store: Arc<dyn DiningStore>) -> Self {
        Self { store }
    }

    pub fn create_category(&self, actor: &Actor, name: &str) -> Result<FoodCategory, ServiceError> {
        authorize(actor, &policies::MANAGE_MENU)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("Category name is required"));
        }
        let category = FoodCategory {
            id: Uuid::new_v4(),
            name: name.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        atomically(self.store.as_ref(), |repo| repo.insert_category(&category))?;
        Ok(category)
    }

    pub fn list_categories(&self, actor: &Actor) -> Result<Vec<FoodCategory>, ServiceError> {
        authorize(actor, &policies::VIEW_MENU)?;
        atomically(self.store.as_ref(), |repo| repo.list_categories())
    }

    pub fn create_item(&self, actor: &Actor, input: NewMenuItem) -> Result<MenuItem, ServiceError> {
        authorize(actor, &policies::MANAGE_MENU)?;
        let now = Utc::now();
        let item = MenuItem {
            id: Uuid::new_v4(),
            name: input.name.trim().to_string(),
            description: input.description,
            price: input.price,
            category_id: input.category_id,
            is_available: input.is_available.unwrap_or(true),
            preparation_time: input
                .preparation_time
                .unwrap_or(DEFAULT_PREPARATION_MINUTES),
            created_at: now,
            updated_at: now,
        };
        validate_item(&item)?;
        atomically(self.store.as_ref(), |repo| {
            if repo.find_category(item.category_id)?.is_none() {
                return Err(ServiceError::not_found("Food category not found"));
            }
            repo.insert_menu_item(&item)
        })?;
        info!(menu_item_id = %item.id, name = %item.name, "menu item created");
        Ok(item)
    }

    pub fn update_item(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: MenuItemChanges,
    ) -> Result<MenuItem, ServiceError> {
        authorize(actor, &policies::MANAGE_MENU)?;
        atomically(self.store.as_ref(), |repo| {
            let mut item = repo
                .find_menu_item(id)?
                .ok_or_else(|| ServiceError::not_found("Menu item not found"))?;
            if let Some(name) = changes.name {
                item.name = name.trim().to_string();
            }
            if let Some(description) = changes.description {
                item.description = Some(description);
            }
            if let Some(price) = changes.price {
                item.price = price;
            }
            if let Some(category_id) = changes.category_id {
                if repo.find_category(category_id)?.is_none() {
                    return Err(ServiceError::not_found("Food category not found"));
                }
                item.category_id = category_id;
            }
            if let Some(is_available) = changes.is_available {
                item.is_available = is_available;
            }
            if let Some(minutes) = changes.preparation_time {
                item.preparation_time = minutes;
            }
            validate_item(&item)?;
            item.updated_at = Utc::now();
            repo.update_menu_item(&item)?;
            Ok(item)
        })
    }

    /// Removes a menu item unless an order that is still in progress lists it.
    pub fn delete_item(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        authorize(actor, &policies::MANAGE_MENU)?;
        atomically(self.store.as_ref(), |repo| {
            if repo.find_menu_item(id)?.is_none() {
                return Err(ServiceError::not_found("Menu item not found"));
            }
            if repo.count_active_orders_with_item(id)? > 0 {
                return Err(ServiceError::conflict(
                    "Cannot delete a menu item that is part of an active order",
                ));
            }
            repo.delete_menu_item(id)
        })?;
        info!(menu_item_id = %id, "menu item deleted");
        Ok(())
    }

    pub fn get_item(&self, actor: &Actor, id: Uuid) -> Result<MenuItem, ServiceError> {
        authorize(actor, &policies::VIEW_MENU)?;
        atomically(self.store.as_ref(), |repo| repo.find_menu_item(id))?
            .ok_or_else(|| ServiceError::not_found("Menu item not found"))
    }

    pub fn list_items(&self, actor: &Actor, filter: &MenuFilter) -> Result<Vec<MenuItem>, ServiceError> {
        authorize(actor, &policies::VIEW_MENU)?;
        atomically(self.store.as_ref(), |repo| repo.list_menu_items(filter))
    }
}
