mod common;

use chrono::TimeDelta;
use common::{dec, setup, Fixture};
use hotel_core::{ErrorKind, Role};
use hotel_dining_service::models::{DiningTable, MenuItem, OrderStatus, TableSection, TableStatus};
use hotel_dining_service::orders::{RatingInput, StatusChange};
use hotel_dining_service::reports::ReportPeriod;
use hotel_dining_service::store::atomically;
use hotel_dining_service::tables::{NewTable, TableChanges};
use uuid::Uuid;

fn place(fx: &Fixture, table: &DiningTable, items: &[(&MenuItem, i32)]) -> String {
    fx.dining
        .orders
        .place_order(&fx.guest, fx.order_input(table, items))
        .unwrap()
        .order
        .order_code
}

fn complete(fx: &Fixture, code: &str) {
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Completed,
    ] {
        fx.dining
            .orders
            .update_status(&fx.staff, code, StatusChange::to(status))
            .unwrap();
    }
}

fn rate(fx: &Fixture, code: &str, overall: i16) {
    fx.dining
        .orders
        .rate(
            &fx.guest,
            code,
            RatingInput {
                food_quality: 4,
                service: 3,
                ambiance: 5,
                overall,
                feedback: None,
            },
        )
        .unwrap();
}

/// Moves an order's placement time into the past.
fn backdate(fx: &Fixture, code: &str, by: TimeDelta) {
    atomically(fx.store.as_ref(), |repo| {
        let mut order = repo.find_order_by_code(code)?.unwrap();
        order.created_at -= by;
        repo.update_order(&order)
    })
    .unwrap();
}

#[test]
fn test_order_stats_counts_revenue_and_ratings() {
    let fx = setup();
    let window = fx.table(1);
    let patio = fx.table(2);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let salad = fx.menu_item("Salad", "5.00", 5);

    let completed = place(&fx, &window, &[(&soup, 1)]);
    complete(&fx, &completed);
    rate(&fx, &completed, 5);
    let pending = place(&fx, &window, &[(&salad, 3)]);
    let cancelled = place(&fx, &patio, &[(&soup, 1)]);
    fx.dining
        .orders
        .update_status(&fx.waiter, &cancelled, StatusChange::to(OrderStatus::Cancelled))
        .unwrap();

    let stats = fx
        .dining
        .reports
        .order_stats(&fx.admin, ReportPeriod::All, None)
        .unwrap();
    assert_eq!(stats.total_orders, 3);
    assert_eq!(stats.count(OrderStatus::Pending), 1);
    assert_eq!(stats.count(OrderStatus::Completed), 1);
    assert_eq!(stats.count(OrderStatus::Cancelled), 1);
    assert_eq!(stats.count(OrderStatus::Ready), 0);
    assert_eq!(stats.by_status.len(), OrderStatus::ALL.len());
    // 12.60 + 18.90; the cancelled order is not revenue.
    assert_eq!(stats.revenue, dec("31.50"));
    assert_eq!(stats.average_order_value, dec("15.75"));

    assert_eq!(stats.popular_items[0].name, "Salad");
    assert_eq!(stats.popular_items[0].quantity, 3);
    assert_eq!(stats.popular_items[1].name, "Soup");
    assert_eq!(stats.popular_items[1].quantity, 2);

    assert_eq!(stats.busiest_tables[0].table_number, Some(1));
    assert_eq!(stats.busiest_tables[0].order_count, 2);
    assert_eq!(stats.busiest_tables[0].revenue, dec("31.50"));
    assert_eq!(stats.busiest_tables[1].revenue, dec("0.00"));

    assert_eq!(stats.ratings.total_ratings, 1);
    assert_eq!(stats.ratings.overall, Some(5.0));
    assert_eq!(stats.ratings.food, Some(4.0));

    let scoped = fx
        .dining
        .reports
        .order_stats(&fx.admin, ReportPeriod::All, Some(patio.id))
        .unwrap();
    assert_eq!(scoped.total_orders, 1);
    assert!(scoped.busiest_tables.is_empty());
    assert_eq!(scoped.revenue, dec("0.00"));

    backdate(&fx, &pending, TimeDelta::days(10));
    let week = fx
        .dining
        .reports
        .order_stats(&fx.admin, ReportPeriod::Week, None)
        .unwrap();
    assert_eq!(week.total_orders, 2);
    assert_eq!(week.count(OrderStatus::Pending), 0);
}

#[test]
fn test_reports_are_admin_only() {
    let fx = setup();
    let table = fx.table(1);
    for actor in [&fx.waiter, &fx.staff, &fx.guest] {
        let err = fx
            .dining
            .reports
            .order_stats(actor, ReportPeriod::Today, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
        assert!(fx.dining.reports.waiters(actor, false).is_err());
        assert!(fx.dining.reports.table_stats(actor).is_err());
        assert!(fx.dining.reports.table_history(actor, table.id, 7).is_err());
    }
}

#[test]
fn test_waiter_workload_covers_last_thirty_days() {
    let fx = setup();
    let walter = fx.waiter.user_id().unwrap();
    let wendy = fx.add_user("Wendy", Role::Waiter, true);
    fx.add_user("Retired", Role::Waiter, false);
    let table = fx.table(4);
    let soup = fx.menu_item("Soup", "10.00", 10);
    let assigned_to_walter = || {
        let code = place(&fx, &table, &[(&soup, 1)]);
        fx.dining.orders.assign(&fx.admin, &code, walter).unwrap();
        code
    };

    let served = assigned_to_walter();
    complete(&fx, &served);
    rate(&fx, &served, 4);
    assigned_to_walter();
    let old = assigned_to_walter();
    backdate(&fx, &old, TimeDelta::days(45));

    let waiters = fx.dining.reports.waiters(&fx.admin, false).unwrap();
    assert_eq!(waiters.len(), 2);
    let walter_load = waiters.iter().find(|w| w.waiter.id == walter).unwrap();
    assert_eq!(walter_load.assigned_orders, 2);
    assert_eq!(walter_load.completed_orders, 1);
    assert_eq!(walter_load.average_rating, Some(4.0));
    let wendy_load = waiters.iter().find(|w| w.waiter.id == wendy).unwrap();
    assert_eq!(wendy_load.assigned_orders, 0);
    assert_eq!(wendy_load.average_rating, None);

    let everyone = fx.dining.reports.waiters(&fx.admin, true).unwrap();
    assert_eq!(everyone.len(), 3);
    assert!(everyone.iter().all(|w| w.waiter.role == Role::Waiter));
}

#[test]
fn test_table_stats_group_by_status_section_and_capacity() {
    let fx = setup();
    let first = fx.table(1);
    let second = fx.table(2);
    fx.dining
        .tables
        .create(
            &fx.admin,
            NewTable {
                table_number: 3,
                name: None,
                section: Some(TableSection::Terrace),
                capacity: 2,
            },
        )
        .unwrap();
    let soup = fx.menu_item("Soup", "10.00", 10);
    fx.dining
        .orders
        .place_order(&fx.guest, fx.order_input(&first, &[(&soup, 1)]))
        .unwrap();
    fx.dining
        .tables
        .update(
            &fx.admin,
            second.id,
            TableChanges {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .unwrap();

    let stats = fx.dining.reports.table_stats(&fx.admin).unwrap();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.count(TableStatus::Occupied), 1);
    assert_eq!(stats.count(TableStatus::Available), 2);
    assert_eq!(stats.count(TableStatus::Maintenance), 0);
    assert_eq!(stats.average_capacity, 3.3);

    assert_eq!(stats.sections.len(), 2);
    assert_eq!(stats.sections[0].section, TableSection::MainHall);
    assert_eq!(stats.sections[0].count, 2);
    assert_eq!(stats.sections[0].available, 1);
    assert_eq!(stats.sections[0].occupied, 1);
    assert_eq!(stats.sections[0].average_capacity, 4.0);
    assert_eq!(stats.sections[1].section, TableSection::Terrace);

    let capacities: Vec<(i32, i64, i64)> = stats
        .capacities
        .iter()
        .map(|c| (c.capacity, c.count, c.available))
        .collect();
    assert_eq!(capacities, vec![(2, 1, 1), (4, 2, 1)]);
}

#[test]
fn test_table_history_window_and_averages() {
    let fx = setup();
    let table = fx.table(6);
    let soup = fx.menu_item("Soup", "10.00", 10);

    let finished = place(&fx, &table, &[(&soup, 1)]);
    complete(&fx, &finished);
    backdate(&fx, &finished, TimeDelta::minutes(45));
    place(&fx, &table, &[(&soup, 1)]);
    let last_month = place(&fx, &table, &[(&soup, 1)]);
    backdate(&fx, &last_month, TimeDelta::days(20));

    let week = fx
        .dining
        .reports
        .table_history(&fx.admin, table.id, 7)
        .unwrap();
    assert_eq!(week.table.id, table.id);
    assert_eq!(week.total_orders, 2);
    assert_eq!(week.completed_orders, 1);
    assert_eq!(week.revenue, dec("25.20"));
    assert_eq!(week.average_order_value, dec("12.60"));
    assert_eq!(week.average_duration_minutes, Some(45.0));
    assert_eq!(week.orders.len(), 2);
    assert!(week.orders[0].created_at >= week.orders[1].created_at);

    let month = fx
        .dining
        .reports
        .table_history(&fx.admin, table.id, 30)
        .unwrap();
    assert_eq!(month.total_orders, 3);

    let err = fx
        .dining
        .reports
        .table_history(&fx.admin, table.id, 0)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = fx
        .dining
        .reports
        .table_history(&fx.admin, Uuid::new_v4(), 7)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}
