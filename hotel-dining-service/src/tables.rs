use std::sync::Arc;

use chrono::{DateTime, Utc};
use hotel_core::access::{authorize, policies};
use hotel_core::notification::{dispatch, Notification, NotificationKind, Notifier, Recipients};
use hotel_core::state_machine::StateMachine;
use hotel_core::{Actor, Role, ServiceError};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::{DiningTable, TableSection, TableStatus};
use crate::store::{atomically, DiningRepository, DiningStore, TableFilter};

pub const MAX_TABLE_CAPACITY: i32 = 20;

/// Moves staff may make by hand. Occupying a free table goes through
/// [`TableRegistry::occupy`] or order placement instead.
pub const TABLE_TRANSITIONS: StateMachine<TableStatus> = StateMachine::new(&[
    (
        TableStatus::Available,
        &[TableStatus::Maintenance, TableStatus::OutOfService],
    ),
    (
        TableStatus::Occupied,
        &[
            TableStatus::Available,
            TableStatus::Cleaning,
            TableStatus::Maintenance,
        ],
    ),
    (
        TableStatus::Reserved,
        &[TableStatus::Available, TableStatus::Occupied],
    ),
    (
        TableStatus::Cleaning,
        &[TableStatus::Available, TableStatus::Maintenance],
    ),
    (
        TableStatus::Maintenance,
        &[TableStatus::Available, TableStatus::OutOfService],
    ),
    (
        TableStatus::OutOfService,
        &[TableStatus::Available, TableStatus::Maintenance],
    ),
]);

#[derive(Debug, Clone)]
pub struct NewTable {
    pub table_number: i32,
    pub name: Option<String>,
    pub section: Option<TableSection>,
    pub capacity: i32,
}

#[derive(Debug, Clone, Default)]
pub struct TableChanges {
    pub name: Option<String>,
    pub section: Option<TableSection>,
    pub capacity: Option<i32>,
    pub is_active: Option<bool>,
}

fn validate_capacity(capacity: i32) -> Result<(), ServiceError> {
    if !(1..=MAX_TABLE_CAPACITY).contains(&capacity) {
        return Err(ServiceError::validation(format!(
            "Capacity must be between 1 and {MAX_TABLE_CAPACITY}"
        )));
    }
    Ok(())
}

fn load_table(repo: &mut dyn DiningRepository, id: Uuid) -> Result<DiningTable, ServiceError> {
    repo.lock_table(id)?
        .ok_or_else(|| ServiceError::not_found("Table not found"))
}

/// Seats `order_id` at `table` as part of placing it. Returns whether the table
/// changed.
pub(crate) fn seat_order(table: &mut DiningTable, order_id: Uuid, now: DateTime<Utc>) -> bool {
    match table.status {
        TableStatus::Occupied if table.current_order_id.is_some() => false,
        TableStatus::Occupied => {
            table.current_order_id = Some(order_id);
            table.updated_at = now;
            true
        }
        _ => {
            table.status = TableStatus::Occupied;
            table.current_order_id = Some(order_id);
            table.last_occupied_at = Some(now);
            table.updated_at = now;
            true
        }
    }
}

/// Sends an occupied table to cleaning once `finished_order` was the last
/// active order seated at it.
pub(crate) fn release_after_order(
    repo: &mut dyn DiningRepository,
    table_id: Uuid,
    finished_order: Uuid,
    now: DateTime<Utc>,
) -> Result<Option<DiningTable>, ServiceError> {
    if repo.count_active_orders_on_table(table_id, Some(finished_order))? > 0 {
        return Ok(None);
    }
    let Some(mut table) = repo.lock_table(table_id)? else {
        return Ok(None);
    };
    if table.status != TableStatus::Occupied {
        return Ok(None);
    }
    table.status = TableStatus::Cleaning;
    table.current_order_id = None;
    table.updated_at = now;
    repo.update_table(&table)?;
    info!(table_number = table.table_number, "table released for cleaning");
    Ok(Some(table))
}

pub struct TableRegistry {
    store: Arc<dyn DiningStore>,
    notifier: Arc<dyn Notifier>,
}

impl TableRegistry {
    pub fn new(store: Arc<dyn DiningStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self { store, notifier }
    }

    pub fn create(&self, actor: &Actor, input: NewTable) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::MANAGE_TABLES)?;
        if input.table_number < 1 {
            return Err(ServiceError::validation("Table number must be at least 1"));
        }
        validate_capacity(input.capacity)?;
        let now = Utc::now();
        let table = DiningTable {
            id: Uuid::new_v4(),
            table_number: input.table_number,
            name: input
                .name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("Table {}", input.table_number)),
            section: input.section.unwrap_or(TableSection::MainHall),
            capacity: input.capacity,
            is_active: true,
            status: TableStatus::Available,
            current_order_id: None,
            last_occupied_at: None,
            last_cleaned_at: None,
            created_at: now,
            updated_at: now,
        };
        atomically(self.store.as_ref(), |repo| {
            if repo.find_table_by_number(table.table_number)?.is_some() {
                return Err(ServiceError::conflict(format!(
                    "Table number {} already exists",
                    table.table_number
                )));
            }
            repo.insert_table(&table)
        })?;
        info!(table_number = table.table_number, "table created");
        Ok(table)
    }

    pub fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        changes: TableChanges,
    ) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::MANAGE_TABLES)?;
        atomically(self.store.as_ref(), |repo| {
            let mut table = load_table(repo, id)?;
            if let Some(name) = changes.name {
                table.name = name;
            }
            if let Some(section) = changes.section {
                table.section = section;
            }
            if let Some(capacity) = changes.capacity {
                validate_capacity(capacity)?;
                table.capacity = capacity;
            }
            if let Some(is_active) = changes.is_active {
                table.is_active = is_active;
            }
            table.updated_at = Utc::now();
            repo.update_table(&table)?;
            Ok(table)
        })
    }

    pub fn get(&self, actor: &Actor, id: Uuid) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::VIEW_TABLES)?;
        atomically(self.store.as_ref(), |repo| repo.find_table(id))?
            .ok_or_else(|| ServiceError::not_found("Table not found"))
    }

    pub fn list(&self, actor: &Actor, filter: &TableFilter) -> Result<Vec<DiningTable>, ServiceError> {
        authorize(actor, &policies::VIEW_TABLES)?;
        atomically(self.store.as_ref(), |repo| repo.list_tables(filter))
    }

    /// Free, active tables ordered by capacity, then number.
    pub fn available(
        &self,
        actor: &Actor,
        min_capacity: Option<i32>,
        section: Option<TableSection>,
    ) -> Result<Vec<DiningTable>, ServiceError> {
        authorize(actor, &policies::VIEW_TABLES)?;
        let filter = TableFilter {
            section,
            status: Some(TableStatus::Available),
            min_capacity,
            active_only: true,
        };
        let mut tables = atomically(self.store.as_ref(), |repo| repo.list_tables(&filter))?;
        tables.sort_by_key(|t| (t.capacity, t.table_number));
        Ok(tables)
    }

    /// Manual status change along [`TABLE_TRANSITIONS`].
    pub fn change_status(
        &self,
        actor: &Actor,
        id: Uuid,
        to: TableStatus,
    ) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::CHANGE_TABLE_STATUS)?;
        let table = atomically(self.store.as_ref(), |repo| {
            let mut table = load_table(repo, id)?;
            TABLE_TRANSITIONS.check(table.status, to)?;
            let now = Utc::now();
            if table.status == TableStatus::Occupied {
                table.current_order_id = None;
            }
            match to {
                TableStatus::Cleaning | TableStatus::Available => table.last_cleaned_at = Some(now),
                TableStatus::Occupied => table.last_occupied_at = Some(now),
                _ => {}
            }
            table.status = to;
            table.updated_at = now;
            repo.update_table(&table)?;
            Ok(table)
        })?;
        info!(table_number = table.table_number, status = %to, "table status changed");

        let kind = match to {
            TableStatus::Maintenance => Some(NotificationKind::TableMaintenance),
            TableStatus::Cleaning => Some(NotificationKind::TableCleared),
            TableStatus::Occupied => Some(NotificationKind::TableOccupied),
            _ => None,
        };
        if let Some(kind) = kind {
            self.notify_table(kind, &table, actor);
        }
        Ok(table)
    }

    pub fn occupy(
        &self,
        actor: &Actor,
        id: Uuid,
        party_size: Option<i32>,
    ) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::CHANGE_TABLE_STATUS)?;
        let table = atomically(self.store.as_ref(), |repo| {
            let mut table = load_table(repo, id)?;
            if !table.is_active {
                return Err(ServiceError::conflict("Table is not active"));
            }
            if table.status != TableStatus::Available {
                return Err(ServiceError::conflict(format!(
                    "Table is not available (current status: {})",
                    table.status
                )));
            }
            if let Some(size) = party_size {
                if size < 1 {
                    return Err(ServiceError::validation("Party size must be at least 1"));
                }
                if size > table.capacity {
                    return Err(ServiceError::validation(format!(
                        "Party size {size} exceeds table capacity {}",
                        table.capacity
                    )));
                }
            }
            let now = Utc::now();
            table.status = TableStatus::Occupied;
            table.last_occupied_at = Some(now);
            table.updated_at = now;
            repo.update_table(&table)?;
            Ok(table)
        })?;
        info!(table_number = table.table_number, "table occupied");
        self.notify_table(NotificationKind::TableOccupied, &table, actor);
        Ok(table)
    }

    pub fn clear(&self, actor: &Actor, id: Uuid) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::CHANGE_TABLE_STATUS)?;
        let table = atomically(self.store.as_ref(), |repo| {
            let mut table = load_table(repo, id)?;
            if table.status != TableStatus::Occupied {
                return Err(ServiceError::conflict("Only occupied tables can be cleared"));
            }
            let active = repo.count_active_orders_on_table(id, None)?;
            if active > 0 {
                return Err(ServiceError::conflict(format!(
                    "Table still has {active} active order(s)"
                )));
            }
            let now = Utc::now();
            table.status = TableStatus::Cleaning;
            table.current_order_id = None;
            table.last_cleaned_at = Some(now);
            table.updated_at = now;
            repo.update_table(&table)?;
            Ok(table)
        })?;
        info!(table_number = table.table_number, "table cleared");
        self.notify_table(NotificationKind::TableCleared, &table, actor);
        Ok(table)
    }

    pub fn mark_available(&self, actor: &Actor, id: Uuid) -> Result<DiningTable, ServiceError> {
        authorize(actor, &policies::CHANGE_TABLE_STATUS)?;
        let table = atomically(self.store.as_ref(), |repo| {
            let mut table = load_table(repo, id)?;
            if table.status != TableStatus::Cleaning {
                return Err(ServiceError::conflict(
                    "Only tables being cleaned can be marked available",
                ));
            }
            let now = Utc::now();
            table.status = TableStatus::Available;
            table.last_cleaned_at = Some(now);
            table.updated_at = now;
            repo.update_table(&table)?;
            Ok(table)
        })?;
        info!(table_number = table.table_number, "table available");
        Ok(table)
    }

    pub fn delete(&self, actor: &Actor, id: Uuid) -> Result<(), ServiceError> {
        authorize(actor, &policies::MANAGE_TABLES)?;
        atomically(self.store.as_ref(), |repo| {
            let table = load_table(repo, id)?;
            if table.status == TableStatus::Occupied {
                return Err(ServiceError::conflict("Cannot delete an occupied table"));
            }
            if repo.count_active_orders_on_table(id, None)? > 0 {
                return Err(ServiceError::conflict(
                    "Cannot delete a table with active orders",
                ));
            }
            repo.delete_table(id)
        })?;
        info!(table_id = %id, "table deleted");
        Ok(())
    }

    fn notify_table(&self, kind: NotificationKind, table: &DiningTable, actor: &Actor) {
        let (recipients, title) = match kind {
            NotificationKind::TableOccupied => (
                Recipients::roles(&[Role::Admin, Role::Waiter]),
                "Table Occupied",
            ),
            NotificationKind::TableMaintenance => (
                Recipients::roles(&[Role::Admin, Role::Staff]),
                "Table Under Maintenance",
            ),
            _ => (
                Recipients::roles(&[Role::Admin, Role::Staff]),
                "Table Cleared",
            ),
        };
        let notification = Notification::new(
            kind,
            recipients,
            title,
            format!("Table {} is now {}", table.table_number, table.status),
        )
        .with_data(json!({
            "table_id": table.id,
            "table_number": table.table_number,
            "status": table.status,
        }))
        .with_sender(actor.user_id());
        dispatch(self.notifier.as_ref(), notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_occupy_is_not_allowed() {
        assert!(TABLE_TRANSITIONS
            .check(TableStatus::Available, TableStatus::Occupied)
            .is_err());
    }

    #[test]
    fn test_reserved_can_be_seated() {
        assert!(TABLE_TRANSITIONS
            .check(TableStatus::Reserved, TableStatus::Occupied)
            .is_ok());
    }

    #[test]
    fn test_cleaning_cannot_jump_to_occupied() {
        assert!(TABLE_TRANSITIONS
            .check(TableStatus::Cleaning, TableStatus::Occupied)
            .is_err());
    }

    fn table(status: TableStatus, current: Option<Uuid>) -> DiningTable {
        let now = Utc::now();
        DiningTable {
            id: Uuid::new_v4(),
            table_number: 5,
            name: "Table 5".to_string(),
            section: TableSection::MainHall,
            capacity: 4,
            is_active: true,
            status,
            current_order_id: current,
            last_occupied_at: None,
            last_cleaned_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_seat_order_on_free_table() {
        let order = Uuid::new_v4();
        let mut t = table(TableStatus::Available, None);
        assert!(seat_order(&mut t, order, Utc::now()));
        assert_eq!(t.status, TableStatus::Occupied);
        assert_eq!(t.current_order_id, Some(order));
        assert!(t.last_occupied_at.is_some());
    }

    #[test]
    fn test_seat_order_keeps_current_order() {
        let first = Uuid::new_v4();
        let mut t = table(TableStatus::Occupied, Some(first));
        assert!(!seat_order(&mut t, Uuid::new_v4(), Utc::now()));
        assert_eq!(t.current_order_id, Some(first));
    }

    #[test]
    fn test_seat_order_adopts_on_manually_occupied_table() {
        let order = Uuid::new_v4();
        let mut t = table(TableStatus::Occupied, None);
        assert!(seat_order(&mut t, order, Utc::now()));
        assert_eq!(t.current_order_id, Some(order));
    }
}
