use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use hotel_core::access::{authorize, policies, RoleSet};
use hotel_core::code::{generate_code, ORDER_PREFIX};
use hotel_core::notification::{dispatch, Notification, NotificationKind, Notifier, Recipients};
use hotel_core::state_machine::StateMachine;
use hotel_core::{Actor, Role, ServiceError};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    DiningTable, Order, OrderDetails, OrderLineItem, OrderPriority, OrderStatus, PaymentMethod,
    PaymentStatus, TableSection,
};
use crate::pricing::{line_total, preparation_estimate, PricingRates};
use crate::store::{atomically, DiningRepository, DiningStore, OrderFilter, OrderSort};
use crate::tables::{release_after_order, seat_order};

pub const ORDER_TRANSITIONS: StateMachine<OrderStatus> = StateMachine::new(&[
    (
        OrderStatus::Pending,
        &[OrderStatus::Confirmed, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Confirmed,
        &[OrderStatus::Preparing, OrderStatus::Cancelled],
    ),
    (
        OrderStatus::Preparing,
        &[OrderStatus::Ready, OrderStatus::Cancelled],
    ),
    (OrderStatus::Ready, &[OrderStatus::Served]),
    (OrderStatus::Served, &[OrderStatus::Completed]),
]);

pub const DEFAULT_CANCELLATION_REASON: &str = "No reason provided";

#[derive(Debug, Clone)]
pub struct LineItemRequest {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PlaceOrder {
    pub table_id: Uuid,
    pub items: Vec<LineItemRequest>,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub customer_email: Option<String>,
    pub special_requests: Option<String>,
    pub notes: Option<String>,
    pub priority: Option<OrderPriority>,
}

#[derive(Debug, Clone)]
pub struct StatusChange {
    pub status: OrderStatus,
    pub reason: Option<String>,
    pub notes: Option<String>,
}

impl StatusChange {
    pub fn to(status: OrderStatus) -> Self {
        StatusChange {
            status,
            reason: None,
            notes: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RatingInput {
    pub food_quality: i16,
    pub service: i16,
    pub ambiance: i16,
    pub overall: i16,
    pub feedback: Option<String>,
}

#[derive(Debug, Clone)]
pub struct PaymentUpdate {
    pub status: PaymentStatus,
    pub method: Option<PaymentMethod>,
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderQuery {
    pub status: Option<OrderStatus>,
    pub table_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub unassigned: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrackedItem {
    pub name: String,
    pub quantity: i32,
    pub unit_price: BigDecimal,
}

/// Public view of an order, safe to show to anyone holding its code.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderTracking {
    pub order_code: String,
    pub status: OrderStatus,
    pub table_number: Option<i32>,
    pub table_name: Option<String>,
    pub section: Option<TableSection>,
    pub items: Vec<TrackedItem>,
    pub total_price: BigDecimal,
    pub ordered_at: DateTime<Utc>,
    pub estimated_ready_at: Option<DateTime<Utc>>,
    pub assigned_to: Option<String>,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_customer(actor: &Actor, input: &PlaceOrder) -> Result<(), ServiceError> {
    let has_name = present(&input.customer_name);
    let has_phone = present(&input.customer_phone);
    match actor {
        Actor::Anonymous if !(has_name && has_phone) => Err(ServiceError::validation(
            "Customer name and phone are required for guest orders",
        )),
        Actor::User { role, .. } if *role != Role::Guest => {
            let any = has_name || has_phone || present(&input.customer_email);
            if any && !(has_name && has_phone) {
                Err(ServiceError::validation(
                    "Customer name and phone are required when ordering on behalf of a customer",
                ))
            } else {
                Ok(())
            }
        }
        _ => Ok(()),
    }
}

fn validate_score(label: &str, score: i16) -> Result<(), ServiceError> {
    if !(1..=5).contains(&score) {
        return Err(ServiceError::validation(format!(
            "{label} rating must be between 1 and 5"
        )));
    }
    Ok(())
}

fn load_order(repo: &mut dyn DiningRepository, code: &str) -> Result<Order, ServiceError> {
    repo.lock_order_by_code(code)?
        .ok_or_else(|| ServiceError::not_found("Order not found"))
}

fn with_items(repo: &mut dyn DiningRepository, order: Order) -> Result<OrderDetails, ServiceError> {
    let line_items = repo.line_items(order.id)?;
    Ok(OrderDetails { order, line_items })
}

pub struct OrderEngine {
    store: Arc<dyn DiningStore>,
    notifier: Arc<dyn Notifier>,
    rates: PricingRates,
}

impl OrderEngine {
    pub fn new(store: Arc<dyn DiningStore>, notifier: Arc<dyn Notifier>, rates: PricingRates) -> Self {
        Self {
            store,
            notifier,
            rates,
        }
    }

    pub fn place_order(&self, actor: &Actor, input: PlaceOrder) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::PLACE_ORDER)?;
        if input.items.is_empty() {
            return Err(ServiceError::validation("Order must contain at least one item"));
        }
        validate_customer(actor, &input)?;

        let details = atomically(self.store.as_ref(), |repo| {
            let mut table = repo
                .lock_table(input.table_id)?
                .ok_or_else(|| ServiceError::not_found("Table not found"))?;
            if !table.is_active {
                return Err(ServiceError::conflict("Table is not active"));
            }
            if !table.status.accepts_orders() {
                return Err(ServiceError::conflict(format!(
                    "Table is not accepting orders (current status: {})",
                    table.status
                )));
            }

            let now = Utc::now();
            let order_id = Uuid::new_v4();
            let mut line_items = Vec::with_capacity(input.items.len());
            for (position, line) in input.items.iter().enumerate() {
                let item = repo
                    .find_menu_item(line.menu_item_id)?
                    .ok_or_else(|| {
                        ServiceError::not_found(format!("Menu item {} not found", line.menu_item_id))
                    })?;
                if !item.is_available {
                    return Err(ServiceError::validation(format!(
                        "{} is currently unavailable",
                        item.name
                    )));
                }
                if line.quantity < 1 {
                    return Err(ServiceError::validation(format!(
                        "Quantity for {} must be at least 1",
                        item.name
                    )));
                }
                line_items.push(OrderLineItem {
                    id: Uuid::new_v4(),
                    order_id,
                    position: position as i32,
                    menu_item_id: item.id,
                    name: item.name,
                    quantity: line.quantity,
                    line_total: line_total(&item.price, line.quantity),
                    unit_price: item.price,
                    special_instructions: clean(line.special_instructions.clone()),
                });
            }
            let totals = self.rates.totals(line_items.iter().map(|li| &li.line_total));

            // Waiters taking an order at the table own it from the start.
            let (status, assigned_to, assigned_by, assigned_at) = match actor {
                Actor::User {
                    id,
                    role: Role::Waiter,
                } => (OrderStatus::Confirmed, Some(*id), Some(*id), Some(now)),
                _ => (OrderStatus::Pending, None, None, None),
            };

            let order = Order {
                id: order_id,
                order_code: generate_code(ORDER_PREFIX),
                user_id: actor.user_id(),
                table_id: table.id,
                subtotal: totals.subtotal,
                tax_amount: totals.tax_amount,
                service_charge: totals.service_charge,
                total_price: totals.total_price,
                status,
                priority: input.priority.unwrap_or(OrderPriority::Normal),
                payment_status: PaymentStatus::Pending,
                payment_method: None,
                payment_reference: None,
                paid_at: None,
                assigned_to,
                assigned_by,
                assigned_at,
                customer_name: clean(input.customer_name.clone()),
                customer_phone: clean(input.customer_phone.clone()),
                customer_email: clean(input.customer_email.clone()),
                notes: clean(input.notes.clone()),
                special_requests: clean(input.special_requests.clone()),
                rating_food: None,
                rating_service: None,
                rating_ambiance: None,
                rating_overall: None,
                feedback: None,
                rated_at: None,
                estimated_ready_at: None,
                completed_at: None,
                cancelled_at: None,
                cancelled_by: None,
                cancellation_reason: None,
                created_at: now,
                updated_at: now,
            };
            repo.insert_order(&order, &line_items)?;

            if seat_order(&mut table, order.id, now) {
                repo.update_table(&table)?;
            }
            Ok(OrderDetails { order, line_items })
        })?;

        let order = &details.order;
        info!(
            order_code = %order.order_code,
            table_id = %order.table_id,
            total = %order.total_price,
            status = %order.status,
            "order placed"
        );
        let notification = Notification::new(
            NotificationKind::OrderPlaced,
            Recipients::roles(&[Role::Admin, Role::Waiter]).with_user(order.user_id),
            "New Food Order",
            format!(
                "Order {} placed for {} item(s), total {}",
                order.order_code,
                details.line_items.len(),
                order.total_price
            ),
        )
        .with_data(json!({
            "order_code": order.order_code,
            "table_id": order.table_id,
            "total_price": order.total_price.to_string(),
        }))
        .with_sender(actor.user_id());
        dispatch(self.notifier.as_ref(), notification);
        Ok(details)
    }

    pub fn update_status(
        &self,
        actor: &Actor,
        code: &str,
        change: StatusChange,
    ) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::UPDATE_ORDER_STATUS)?;
        let to = change.status;
        let (details, from, released) = atomically(self.store.as_ref(), |repo| {
            let mut order = load_order(repo, code)?;
            let from = order.status;
            ORDER_TRANSITIONS.check(from, to)?;

            let now = Utc::now();
            let mut released = None;
            match to {
                OrderStatus::Preparing => {
                    let mut lines = Vec::new();
                    for li in repo.line_items(order.id)? {
                        let prep = repo
                            .find_menu_item(li.menu_item_id)?
                            .map(|m| m.preparation_time);
                        lines.push((prep, li.quantity));
                    }
                    order.estimated_ready_at = Some(now + preparation_estimate(&lines));
                }
                OrderStatus::Cancelled => {
                    order.cancellation_reason = Some(
                        clean(change.reason)
                            .unwrap_or_else(|| DEFAULT_CANCELLATION_REASON.to_string()),
                    );
                    order.cancelled_by = actor.user_id();
                    order.cancelled_at = Some(now);
                }
                OrderStatus::Completed => order.completed_at = Some(now),
                _ => {}
            }
            if let Some(notes) = change.notes {
                order.notes = Some(notes);
            }
            order.status = to;
            order.updated_at = now;
            repo.update_order(&order)?;

            if matches!(to, OrderStatus::Completed | OrderStatus::Cancelled) {
                released = release_after_order(repo, order.table_id, order.id, now)?;
            }
            Ok((with_items(repo, order)?, from, released))
        })?;

        let order = &details.order;
        info!(order_code = %order.order_code, %from, %to, "order status changed");
        if let Some(table) = released {
            info!(table_number = table.table_number, "table awaiting cleaning");
        }

        let mut recipients = Recipients::default()
            .with_user(order.assigned_to)
            .with_user(order.user_id);
        if matches!(
            to,
            OrderStatus::Cancelled | OrderStatus::Ready | OrderStatus::Served
        ) {
            recipients = recipients.with_role(Role::Admin);
        }
        let (kind, title, message) = match to {
            OrderStatus::Cancelled => (
                NotificationKind::OrderCancelled,
                "Order Cancelled",
                format!(
                    "Order {} was cancelled: {}",
                    order.order_code,
                    order
                        .cancellation_reason
                        .as_deref()
                        .unwrap_or(DEFAULT_CANCELLATION_REASON)
                ),
            ),
            _ => (
                NotificationKind::OrderStatusChanged,
                "Order Status Updated",
                format!("Order {} is now {}", order.order_code, to),
            ),
        };
        let notification = Notification::new(kind, recipients, title, message)
        .with_data(json!({
            "order_code": order.order_code,
            "from": from,
            "to": to,
        }))
        .with_sender(actor.user_id());
        dispatch(self.notifier.as_ref(), notification);
        Ok(details)
    }

    /// Claims an unassigned order for the calling staff member.
    pub fn self_assign(&self, actor: &Actor, code: &str) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::SELF_ASSIGN_ORDER)?;
        let me = actor.require_user_id()?;
        let details = atomically(self.store.as_ref(), |repo| {
            self.assign_in(repo, code, me, me)
        })?;
        self.notify_assigned(actor, &details.order);
        Ok(details)
    }

    /// Designates `assignee` as the owner of an unassigned order.
    pub fn assign(&self, actor: &Actor, code: &str, assignee: Uuid) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::ASSIGN_ORDER)?;
        let me = actor.require_user_id()?;
        let details = atomically(self.store.as_ref(), |repo| {
            let user = repo
                .find_user(assignee)?
                .ok_or_else(|| ServiceError::not_found("Assignee not found"))?;
            if !user.is_active || !RoleSet::WAITER_OR_ABOVE.contains(user.role) {
                return Err(ServiceError::validation(
                    "Orders can only be assigned to active waiters, staff or admins",
                ));
            }
            self.assign_in(repo, code, user.id, me)
        })?;
        self.notify_assigned(actor, &details.order);
        Ok(details)
    }

    fn assign_in(
        &self,
        repo: &mut dyn DiningRepository,
        code: &str,
        assignee: Uuid,
        assigned_by: Uuid,
    ) -> Result<OrderDetails, ServiceError> {
        let mut order = load_order(repo, code)?;
        if order.assigned_to.is_some() {
            return Err(ServiceError::conflict("Order is already assigned"));
        }
        if !matches!(order.status, OrderStatus::Pending | OrderStatus::Confirmed) {
            return Err(ServiceError::conflict(format!(
                "Cannot assign an order that is {}",
                order.status
            )));
        }
        let now = Utc::now();
        if order.status == OrderStatus::Pending {
            order.status = OrderStatus::Confirmed;
        }
        order.assigned_to = Some(assignee);
        order.assigned_by = Some(assigned_by);
        order.assigned_at = Some(now);
        order.updated_at = now;
        repo.update_order(&order)?;
        info!(order_code = %order.order_code, %assignee, "order assigned");
        with_items(repo, order)
    }

    fn notify_assigned(&self, actor: &Actor, order: &Order) {
        let notification = Notification::new(
            NotificationKind::OrderAssigned,
            Recipients::roles(&[Role::Admin]).with_user(order.assigned_to),
            "Order Assigned",
            format!("Order {} has been assigned", order.order_code),
        )
        .with_data(json!({
            "order_code": order.order_code,
            "assigned_to": order.assigned_to,
        }))
        .with_sender(actor.user_id());
        dispatch(self.notifier.as_ref(), notification);
    }

    pub fn rate(&self, actor: &Actor, code: &str, rating: RatingInput) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::RATE_ORDER)?;
        let me = actor.require_user_id()?;
        let details = atomically(self.store.as_ref(), |repo| {
            let mut order = load_order(repo, code)?;
            if order.user_id != Some(me) {
                return Err(ServiceError::denied("You can only rate your own orders"));
            }
            if order.status != OrderStatus::Completed {
                return Err(ServiceError::validation("Only completed orders can be rated"));
            }
            if order.is_rated() {
                return Err(ServiceError::conflict("Order has already been rated"));
            }
            validate_score("Food quality", rating.food_quality)?;
            validate_score("Service", rating.service)?;
            validate_score("Ambiance", rating.ambiance)?;
            validate_score("Overall", rating.overall)?;

            let now = Utc::now();
            order.rating_food = Some(rating.food_quality);
            order.rating_service = Some(rating.service);
            order.rating_ambiance = Some(rating.ambiance);
            order.rating_overall = Some(rating.overall);
            order.feedback = clean(rating.feedback);
            order.rated_at = Some(now);
            order.updated_at = now;
            repo.update_order(&order)?;
            with_items(repo, order)
        })?;

        let order = &details.order;
        info!(order_code = %order.order_code, overall = ?order.rating_overall, "order rated");
        let notification = Notification::new(
            NotificationKind::OrderRated,
            Recipients::roles(&[Role::Admin]),
            "Order Rated",
            format!(
                "Order {} was rated {}/5",
                order.order_code,
                order.rating_overall.unwrap_or_default()
            ),
        )
        .with_data(json!({ "order_code": order.order_code }))
        .with_sender(Some(me));
        dispatch(self.notifier.as_ref(), notification);
        Ok(details)
    }

    pub fn update_payment(
        &self,
        actor: &Actor,
        code: &str,
        payment: PaymentUpdate,
    ) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::UPDATE_ORDER_PAYMENT)?;
        let details = atomically(self.store.as_ref(), |repo| {
            let mut order = load_order(repo, code)?;
            let now = Utc::now();
            if payment.status == PaymentStatus::Paid && order.payment_status != PaymentStatus::Paid {
                order.paid_at = Some(now);
            }
            order.payment_status = payment.status;
            if let Some(method) = payment.method {
                order.payment_method = Some(method);
            }
            if let Some(reference) = clean(payment.reference) {
                order.payment_reference = Some(reference);
            }
            order.updated_at = now;
            repo.update_order(&order)?;
            with_items(repo, order)
        })?;

        let order = &details.order;
        info!(order_code = %order.order_code, payment_status = %order.payment_status, "payment updated");
        let notification = Notification::new(
            NotificationKind::OrderPaymentUpdated,
            Recipients::roles(&[Role::Admin]),
            "Payment Updated",
            format!(
                "Payment for order {} is {}",
                order.order_code, order.payment_status
            ),
        )
        .with_data(json!({
            "order_code": order.order_code,
            "payment_status": order.payment_status,
        }))
        .with_sender(actor.user_id());
        dispatch(self.notifier.as_ref(), notification);
        Ok(details)
    }

    /// Full order for its owner or any waiter, staff member or admin.
    pub fn get_order(&self, actor: &Actor, code: &str) -> Result<OrderDetails, ServiceError> {
        authorize(actor, &policies::VIEW_ORDER)?;
        let details = atomically(self.store.as_ref(), |repo| {
            let order = repo
                .find_order_by_code(code)?
                .ok_or_else(|| ServiceError::not_found("Order not found"))?;
            with_items(repo, order)
        })?;
        let is_staff = RoleSet::WAITER_OR_ABOVE.contains(actor.role());
        if !is_staff && details.order.user_id != actor.user_id() {
            return Err(ServiceError::denied("You can only view your own orders"));
        }
        Ok(details)
    }

    pub fn track(&self, actor: &Actor, code: &str) -> Result<OrderTracking, ServiceError> {
        authorize(actor, &policies::TRACK_ORDER)?;
        atomically(self.store.as_ref(), |repo| {
            let order = repo
                .find_order_by_code(code)?
                .ok_or_else(|| ServiceError::not_found("Order not found"))?;
            let table: Option<DiningTable> = repo.find_table(order.table_id)?;
            let assignee = match order.assigned_to {
                Some(id) => repo.find_user(id)?.map(|u| u.name),
                None => None,
            };
            let items = repo
                .line_items(order.id)?
                .into_iter()
                .map(|li| TrackedItem {
                    name: li.name,
                    quantity: li.quantity,
                    unit_price: li.unit_price,
                })
                .collect();
            Ok(OrderTracking {
                order_code: order.order_code,
                status: order.status,
                table_number: table.as_ref().map(|t| t.table_number),
                table_name: table.as_ref().map(|t| t.name.clone()),
                section: table.as_ref().map(|t| t.section),
                items,
                total_price: order.total_price,
                ordered_at: order.created_at,
                estimated_ready_at: order.estimated_ready_at,
                assigned_to: assignee,
            })
        })
    }

    fn load_many(&self, filter: &OrderFilter) -> Result<Vec<OrderDetails>, ServiceError> {
        atomically(self.store.as_ref(), |repo| {
            repo.list_orders(filter)?
                .into_iter()
                .map(|order| with_items(repo, order))
                .collect()
        })
    }

    pub fn list(&self, actor: &Actor, query: &OrderQuery) -> Result<Vec<OrderDetails>, ServiceError> {
        authorize(actor, &policies::VIEW_ALL_ORDERS)?;
        self.load_many(&OrderFilter {
            statuses: query.status.into_iter().collect(),
            table_id: query.table_id,
            assigned_to: query.assigned_to,
            unassigned: query.unassigned,
            ..Default::default()
        })
    }

    pub fn my_orders(&self, actor: &Actor) -> Result<Vec<OrderDetails>, ServiceError> {
        authorize(actor, &policies::VIEW_OWN_ORDERS)?;
        let me = actor.require_user_id()?;
        self.load_many(&OrderFilter {
            user_id: Some(me),
            ..Default::default()
        })
    }

    /// Active orders assigned to the caller.
    pub fn my_assigned(&self, actor: &Actor) -> Result<Vec<OrderDetails>, ServiceError> {
        authorize(actor, &policies::VIEW_ALL_ORDERS)?;
        let me = actor.require_user_id()?;
        self.load_many(&OrderFilter {
            statuses: OrderStatus::ACTIVE.to_vec(),
            assigned_to: Some(me),
            ..Default::default()
        })
    }

    /// Unassigned orders waiting for a waiter, oldest first.
    pub fn available(&self, actor: &Actor) -> Result<Vec<OrderDetails>, ServiceError> {
        authorize(actor, &policies::VIEW_ALL_ORDERS)?;
        self.load_many(&OrderFilter {
            statuses: vec![OrderStatus::Pending, OrderStatus::Confirmed],
            unassigned: true,
            sort: OrderSort::OldestFirst,
            ..Default::default()
        })
    }

    pub fn table_orders(
        &self,
        actor: &Actor,
        table_id: Uuid,
        include_finished: bool,
    ) -> Result<Vec<OrderDetails>, ServiceError> {
        authorize(actor, &policies::VIEW_ALL_ORDERS)?;
        let filter = OrderFilter {
            statuses: if include_finished {
                Vec::new()
            } else {
                OrderStatus::ACTIVE.to_vec()
            },
            table_id: Some(table_id),
            ..Default::default()
        };
        atomically(self.store.as_ref(), |repo| {
            if repo.find_table(table_id)?.is_none() {
                return Err(ServiceError::not_found("Table not found"));
            }
            repo.list_orders(&filter)?
                .into_iter()
                .map(|order| with_items(repo, order))
                .collect()
        })
    }
}
