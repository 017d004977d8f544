//! Read-only summaries for the dining floor: order volume and revenue,
//! waiter workload, table occupancy and per-table history.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Months, TimeDelta, Utc};
use hotel_core::access::{authorize, policies};
use hotel_core::models::UserAccount;
use hotel_core::{Actor, Role, ServiceError};
use tracing::debug;
use uuid::Uuid;

use crate::models::{DiningTable, Order, OrderStatus, TableSection, TableStatus};
use crate::pricing::money;
use crate::store::{atomically, DiningStore, OrderFilter, TableFilter};

/// Window used for waiter workload figures.
pub const WORKLOAD_WINDOW_DAYS: i64 = 30;
pub const DEFAULT_HISTORY_DAYS: i64 = 7;
pub const MAX_HISTORY_DAYS: i64 = 365;
/// Most recent orders returned with a table's history.
pub const HISTORY_ORDER_LIMIT: usize = 20;
const TOP_ENTRIES: usize = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReportPeriod {
    #[default]
    Today,
    Week,
    Month,
    Year,
    All,
}

impl ReportPeriod {
    /// Start of the window ending at `now`, or `None` for all time.
    pub fn since(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            ReportPeriod::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            ReportPeriod::Week => Some(now - TimeDelta::days(7)),
            ReportPeriod::Month => now.checked_sub_months(Months::new(1)),
            ReportPeriod::Year => now.checked_sub_months(Months::new(12)),
            ReportPeriod::All => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Today => "today",
            ReportPeriod::Week => "week",
            ReportPeriod::Month => "month",
            ReportPeriod::Year => "year",
            ReportPeriod::All => "all",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportPeriod {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(ReportPeriod::Today),
            "week" => Ok(ReportPeriod::Week),
            "month" => Ok(ReportPeriod::Month),
            "year" => Ok(ReportPeriod::Year),
            "all" => Ok(ReportPeriod::All),
            other => Err(ServiceError::validation(format!(
                "Unknown period: {other}, expected today, week, month, year or all"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount<S> {
    pub status: S,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PopularItem {
    pub menu_item_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: BigDecimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableActivity {
    pub table_id: Uuid,
    /// `None` once the table has been deleted.
    pub table_number: Option<i32>,
    pub section: Option<TableSection>,
    pub order_count: i64,
    pub revenue: BigDecimal,
}

/// Averages over rated orders, rounded to two decimals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RatingSummary {
    pub total_ratings: i64,
    pub food: Option<f64>,
    pub service: Option<f64>,
    pub ambiance: Option<f64>,
    pub overall: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderStats {
    pub period: ReportPeriod,
    pub since: Option<DateTime<Utc>>,
    pub total_orders: i64,
    /// One entry per order status, zeroes included.
    pub by_status: Vec<StatusCount<OrderStatus>>,
    /// Sum over orders that were not cancelled.
    pub revenue: BigDecimal,
    pub average_order_value: BigDecimal,
    pub popular_items: Vec<PopularItem>,
    /// Empty when the report is scoped to one table.
    pub busiest_tables: Vec<TableActivity>,
    pub ratings: RatingSummary,
}

impl OrderStats {
    pub fn count(&self, status: OrderStatus) -> i64 {
        self.by_status
            .iter()
            .find(|s| s.status == status)
            .map_or(0, |s| s.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WaiterWorkload {
    pub waiter: UserAccount,
    pub assigned_orders: i64,
    pub completed_orders: i64,
    pub average_rating: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SectionSummary {
    pub section: TableSection,
    pub count: i64,
    pub available: i64,
    pub occupied: i64,
    pub average_capacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CapacitySummary {
    pub capacity: i32,
    pub count: i64,
    pub available: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
    /// One entry per table status, zeroes included.
    pub by_status: Vec<StatusCount<TableStatus>>,
    pub average_capacity: f64,
    /// Largest section first.
    pub sections: Vec<SectionSummary>,
    /// Smallest capacity first.
    pub capacities: Vec<CapacitySummary>,
}

impl TableStats {
    pub fn count(&self, status: TableStatus) -> i64 {
        self.by_status
            .iter()
            .find(|s| s.status == status)
            .map_or(0, |s| s.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableHistory {
    pub table: DiningTable,
    pub days: i64,
    pub total_orders: i64,
    pub completed_orders: i64,
    /// Sum over orders that were not cancelled.
    pub revenue: BigDecimal,
    pub average_order_value: BigDecimal,
    /// Mean minutes from placement to completion over completed orders.
    pub average_duration_minutes: Option<f64>,
    /// Newest first, at most [`HISTORY_ORDER_LIMIT`].
    pub orders: Vec<Order>,
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| round_to(sum / f64::from(count), 2))
}

fn rating_mean(orders: &[&Order], pick: impl Fn(&Order) -> Option<i16>) -> Option<f64> {
    mean(orders.iter().filter_map(|&o| pick(o)).map(f64::from))
}

fn average_capacity(tables: &[&DiningTable]) -> f64 {
    mean(tables.iter().map(|t| f64::from(t.capacity)))
        .map(|avg| round_to(avg, 1))
        .unwrap_or(0.0)
}

fn billable(order: &Order) -> bool {
    order.status != OrderStatus::Cancelled
}

/// Revenue and mean value over the billable orders in `orders`.
fn revenue_of<'a>(orders: impl IntoIterator<Item = &'a Order>) -> (BigDecimal, BigDecimal) {
    let (total, count) = orders
        .into_iter()
        .filter(|o| billable(o))
        .fold((BigDecimal::from(0), 0i64), |(total, count), o| {
            (total + &o.total_price, count + 1)
        });
    let average = if count > 0 {
        money(&total / BigDecimal::from(count))
    } else {
        money(BigDecimal::from(0))
    };
    (money(total), average)
}

fn status_counts<S: Copy + PartialEq>(
    all: &[S],
    statuses: impl Iterator<Item = S> + Clone,
) -> Vec<StatusCount<S>> {
    all.iter()
        .map(|&status| StatusCount {
            status,
            count: statuses.clone().filter(|s| *s == status).count() as i64,
        })
        .collect()
}

fn summarize_ratings(orders: &[Order]) -> RatingSummary {
    let rated: Vec<&Order> = orders.iter().filter(|o| o.is_rated()).collect();
    RatingSummary {
        total_ratings: rated.len() as i64,
        food: rating_mean(&rated, |o| o.rating_food),
        service: rating_mean(&rated, |o| o.rating_service),
        ambiance: rating_mean(&rated, |o| o.rating_ambiance),
        overall: rating_mean(&rated, |o| o.rating_overall),
    }
}

pub struct DiningReports {
    store: Arc<dyn DiningStore>,
}

impl DiningReports {
    pub fn new(store: Arc<dyn DiningStore>) -> Self {
        Self { store }
    }

    /// Order volume, revenue, best sellers and ratings over `period`,
    /// optionally for a single table.
    pub fn order_stats(
        &self,
        actor: &Actor,
        period: ReportPeriod,
        table_id: Option<Uuid>,
    ) -> Result<OrderStats, ServiceError> {
        authorize(actor, &policies::VIEW_ORDER_REPORTS)?;
        let since = period.since(Utc::now());
        let filter = OrderFilter {
            table_id,
            created_since: since,
            ..Default::default()
        };

        atomically(self.store.as_ref(), |repo| {
            let orders = repo.list_orders(&filter)?;

            let mut items: HashMap<Uuid, PopularItem> = HashMap::new();
            for order in &orders {
                for line in repo.line_items(order.id)? {
                    let entry = items.entry(line.menu_item_id).or_insert_with(|| PopularItem {
                        menu_item_id: line.menu_item_id,
                        name: line.name.clone(),
                        quantity: 0,
                        revenue: BigDecimal::from(0),
                    });
                    entry.quantity += i64::from(line.quantity);
                    entry.revenue += &line.line_total;
                }
            }
            let mut popular_items: Vec<PopularItem> = items.into_values().collect();
            popular_items.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
            popular_items.truncate(TOP_ENTRIES);

            let mut busiest_tables = Vec::new();
            if table_id.is_none() {
                let mut per_table: HashMap<Uuid, Vec<&Order>> = HashMap::new();
                for order in &orders {
                    per_table.entry(order.table_id).or_default().push(order);
                }
                for (id, table_orders) in per_table {
                    let table = repo.find_table(id)?;
                    let (revenue, _) = revenue_of(table_orders.iter().copied());
                    busiest_tables.push(TableActivity {
                        table_id: id,
                        table_number: table.as_ref().map(|t| t.table_number),
                        section: table.as_ref().map(|t| t.section),
                        order_count: table_orders.len() as i64,
                        revenue,
                    });
                }
                busiest_tables.sort_by(|a, b| {
                    b.order_count
                        .cmp(&a.order_count)
                        .then_with(|| a.table_number.cmp(&b.table_number))
                });
                busiest_tables.truncate(TOP_ENTRIES);
            }

            let (revenue, average_order_value) = revenue_of(&orders);
            debug!(%period, orders = orders.len(), "order stats computed");
            Ok(OrderStats {
                period,
                since,
                total_orders: orders.len() as i64,
                by_status: status_counts(OrderStatus::ALL, orders.iter().map(|o| o.status)),
                revenue,
                average_order_value,
                popular_items,
                busiest_tables,
                ratings: summarize_ratings(&orders),
            })
        })
    }

    /// Waiters with their workload over the last [`WORKLOAD_WINDOW_DAYS`] days.
    pub fn waiters(&self, actor: &Actor, include_inactive: bool) -> Result<Vec<WaiterWorkload>, ServiceError> {
        authorize(actor, &policies::VIEW_ORDER_REPORTS)?;
        let since = Utc::now() - TimeDelta::days(WORKLOAD_WINDOW_DAYS);
        atomically(self.store.as_ref(), |repo| {
            repo.list_users(Role::Waiter, !include_inactive)?
                .into_iter()
                .map(|waiter| {
                    let orders = repo.list_orders(&OrderFilter {
                        assigned_to: Some(waiter.id),
                        created_since: Some(since),
                        ..Default::default()
                    })?;
                    let completed_orders = orders
                        .iter()
                        .filter(|o| o.status == OrderStatus::Completed)
                        .count() as i64;
                    let average_rating = mean(orders.iter().filter_map(|o| o.rating_overall).map(f64::from));
                    Ok(WaiterWorkload {
                        waiter,
                        assigned_orders: orders.len() as i64,
                        completed_orders,
                        average_rating,
                    })
                })
                .collect()
        })
    }

    /// Head counts of every table by status, section and capacity.
    pub fn table_stats(&self, actor: &Actor) -> Result<TableStats, ServiceError> {
        authorize(actor, &policies::VIEW_TABLE_REPORTS)?;
        let tables = atomically(self.store.as_ref(), |repo| repo.list_tables(&TableFilter::default()))?;

        let active = tables.iter().filter(|t| t.is_active).count() as i64;

        let mut sections: Vec<SectionSummary> = TableSection::ALL
            .iter()
            .filter_map(|&section| {
                let group: Vec<&DiningTable> = tables.iter().filter(|t| t.section == section).collect();
                (!group.is_empty()).then(|| SectionSummary {
                    section,
                    count: group.len() as i64,
                    available: group.iter().filter(|t| t.status == TableStatus::Available).count() as i64,
                    occupied: group.iter().filter(|t| t.status == TableStatus::Occupied).count() as i64,
                    average_capacity: average_capacity(&group),
                })
            })
            .collect();
        sections.sort_by(|a, b| b.count.cmp(&a.count));

        let mut capacities: Vec<CapacitySummary> = Vec::new();
        for table in &tables {
            let available = i64::from(table.status == TableStatus::Available);
            match capacities.iter_mut().find(|c| c.capacity == table.capacity) {
                Some(entry) => {
                    entry.count += 1;
                    entry.available += available;
                }
                None => capacities.push(CapacitySummary {
                    capacity: table.capacity,
                    count: 1,
                    available,
                }),
            }
        }
        capacities.sort_by_key(|c| c.capacity);

        let all: Vec<&DiningTable> = tables.iter().collect();
        Ok(TableStats {
            total: tables.len() as i64,
            active,
            inactive: tables.len() as i64 - active,
            by_status: status_counts(TableStatus::ALL, tables.iter().map(|t| t.status)),
            average_capacity: average_capacity(&all),
            sections,
            capacities,
        })
    }

    /// Orders placed at `table_id` over the last `days` days.
    pub fn table_history(&self, actor: &Actor, table_id: Uuid, days: i64) -> Result<TableHistory, ServiceError> {
        authorize(actor, &policies::VIEW_TABLE_REPORTS)?;
        if !(1..=MAX_HISTORY_DAYS).contains(&days) {
            return Err(ServiceError::validation(format!(
                "Days must be between 1 and {MAX_HISTORY_DAYS}"
            )));
        }
        let since = Utc::now() - TimeDelta::days(days);

        let (table, mut orders) = atomically(self.store.as_ref(), |repo| {
            let table = repo
                .find_table(table_id)?
                .ok_or_else(|| ServiceError::not_found("Table not found"))?;
            let orders = repo.list_orders(&OrderFilter {
                table_id: Some(table_id),
                created_since: Some(since),
                ..Default::default()
            })?;
            Ok((table, orders))
        })?;

        let (revenue, average_order_value) = revenue_of(&orders);
        let average_duration_minutes = mean(orders.iter().filter_map(|o| {
            let completed_at = o.completed_at?;
            Some((completed_at - o.created_at).num_seconds() as f64 / 60.0)
        }));
        let total_orders = orders.len() as i64;
        let completed_orders = orders
            .iter()
            .filter(|o| o.status == OrderStatus::Completed)
            .count() as i64;
        orders.truncate(HISTORY_ORDER_LIMIT);

        Ok(TableHistory {
            table,
            days,
            total_orders,
            completed_orders,
            revenue,
            average_order_value,
            average_duration_minutes,
            orders,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_period_windows() {
        let now = Utc.with_ymd_and_hms(2024, 3, 31, 15, 30, 0).unwrap();
        assert_eq!(
            ReportPeriod::Today.since(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 31, 0, 0, 0).unwrap())
        );
        assert_eq!(
            ReportPeriod::Week.since(now),
            Some(Utc.with_ymd_and_hms(2024, 3, 24, 15, 30, 0).unwrap())
        );
        // Clamped to the last day of February.
        assert_eq!(
            ReportPeriod::Month.since(now),
            Some(Utc.with_ymd_and_hms(2024, 2, 29, 15, 30, 0).unwrap())
        );
        assert_eq!(ReportPeriod::All.since(now), None);
    }

    #[test]
    fn test_period_parsing() {
        assert_eq!("year".parse::<ReportPeriod>().unwrap(), ReportPeriod::Year);
        assert!("fortnight".parse::<ReportPeriod>().is_err());
    }

    #[test]
    fn test_mean_rounds_to_cents() {
        assert_eq!(mean([4.0, 5.0, 5.0]), Some(4.67));
        assert_eq!(mean(Vec::<f64>::new()), None);
    }
}
