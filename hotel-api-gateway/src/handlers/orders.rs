use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use hotel_dining_service::models::{OrderStatus, PaymentStatus};
use hotel_dining_service::orders::{
    LineItemRequest, OrderQuery, PaymentUpdate, PlaceOrder, RatingInput, StatusChange,
};
use hotel_dining_service::reports::ReportPeriod;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::*;

use super::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
    pub table_id: Option<Uuid>,
    pub assigned_to: Option<Uuid>,
    pub unassigned: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct OrderStatsQuery {
    pub period: Option<String>,
    pub table_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct WaitersQuery {
    pub include_inactive: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", post(place_order).get(list_orders))
        .route("/orders/mine", get(my_orders))
        .route("/orders/assigned", get(my_assigned_orders))
        .route("/orders/available", get(available_orders))
        .route("/orders/stats", get(order_stats))
        .route("/orders/waiters", get(list_waiters))
        .route("/orders/{code}", get(get_order))
        .route("/orders/{code}/track", get(track_order))
        .route("/orders/{code}/status", put(update_order_status))
        .route("/orders/{code}/self-assign", post(self_assign_order))
        .route("/orders/{code}/assign", post(assign_order))
        .route("/orders/{code}/rating", post(rate_order))
        .route("/orders/{code}/payment", put(update_order_payment))
}

#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 201, description = "Order placed", body = OrderResponse),
        (status = 400, description = "Invalid order", body = ApiErrorResponse),
        (status = 404, description = "Table or menu item not found", body = ApiErrorResponse),
        (status = 409, description = "Table cannot take orders", body = ApiErrorResponse),
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn place_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<PlaceOrderRequest>,
) -> Result<(StatusCode, Json<OrderResponse>), ApiError> {
    let input = PlaceOrder {
        table_id: payload.table_id,
        items: payload
            .items
            .into_iter()
            .map(|item| LineItemRequest {
                menu_item_id: item.menu_item_id,
                quantity: item.quantity,
                special_instructions: item.special_instructions,
            })
            .collect(),
        customer_name: payload.customer_name,
        customer_phone: payload.customer_phone,
        customer_email: payload.customer_email,
        special_requests: payload.special_requests,
        notes: payload.notes,
        priority: parse_label(payload.priority.as_deref())?,
    };
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.place_order(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

#[utoipa::path(
    get,
    path = "/orders",
    responses(
        (status = 200, description = "Orders, newest first", body = [OrderResponse]),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    params(
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("table_id" = Option<Uuid>, Query, description = "Filter by table"),
        ("assigned_to" = Option<Uuid>, Query, description = "Filter by assignee"),
        ("unassigned" = Option<bool>, Query, description = "Only orders without an assignee"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_orders(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<ListOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let query = OrderQuery {
        status: parse_label::<OrderStatus>(query.status.as_deref())?,
        table_id: query.table_id,
        assigned_to: query.assigned_to,
        unassigned: query.unassigned.unwrap_or(false),
    };
    let dining = state.dining.clone();
    let orders = blocking(move || dining.orders.list(&actor, &query)).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/orders/mine",
    responses(
        (status = 200, description = "Orders placed by the caller", body = [OrderResponse]),
        (status = 401, description = "Unauthorized", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn my_orders(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let dining = state.dining.clone();
    let orders = blocking(move || dining.orders.my_orders(&actor)).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/orders/assigned",
    responses(
        (status = 200, description = "Active orders assigned to the caller", body = [OrderResponse]),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn my_assigned_orders(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let dining = state.dining.clone();
    let orders = blocking(move || dining.orders.my_assigned(&actor)).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/orders/available",
    responses(
        (status = 200, description = "Unassigned orders, oldest first", body = [OrderResponse]),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn available_orders(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let dining = state.dining.clone();
    let orders = blocking(move || dining.orders.available(&actor)).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/orders/{code}",
    responses(
        (status = 200, description = "Order details", body = OrderResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code, e.g. ORD-123456789")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn get_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.get_order(&actor, &code)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    get,
    path = "/orders/{code}/track",
    responses(
        (status = 200, description = "Public order progress", body = OrderTrackingResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn track_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
) -> Result<Json<OrderTrackingResponse>, ApiError> {
    let dining = state.dining.clone();
    let tracking = blocking(move || dining.orders.track(&actor, &code)).await?;
    Ok(Json(tracking.into()))
}

#[utoipa::path(
    put,
    path = "/orders/{code}/status",
    request_body = OrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = OrderResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 409, description = "Transition not allowed", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn update_order_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<OrderStatusRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let change = StatusChange {
        status: payload.status.parse()?,
        reason: payload.reason,
        notes: payload.notes,
    };
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.update_status(&actor, &code, change)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    post,
    path = "/orders/{code}/self-assign",
    responses(
        (status = 200, description = "Order assigned to the caller", body = OrderResponse),
        (status = 409, description = "Order already assigned", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn self_assign_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
) -> Result<Json<OrderResponse>, ApiError> {
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.self_assign(&actor, &code)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    post,
    path = "/orders/{code}/assign",
    request_body = AssignOrderRequest,
    responses(
        (status = 200, description = "Order assigned", body = OrderResponse),
        (status = 400, description = "Assignee cannot take orders", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 409, description = "Order already assigned", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn assign_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<AssignOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let dining = state.dining.clone();
    let details =
        blocking(move || dining.orders.assign(&actor, &code, payload.waiter_id)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    post,
    path = "/orders/{code}/rating",
    request_body = RateOrderRequest,
    responses(
        (status = 200, description = "Rating recorded", body = OrderResponse),
        (status = 400, description = "Order not completed or score out of range", body = ApiErrorResponse),
        (status = 403, description = "Not the owner", body = ApiErrorResponse),
        (status = 409, description = "Already rated", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn rate_order(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<RateOrderRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let rating = RatingInput {
        food_quality: payload.food_quality,
        service: payload.service,
        ambiance: payload.ambiance,
        overall: payload.overall,
        feedback: payload.feedback,
    };
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.rate(&actor, &code, rating)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    put,
    path = "/orders/{code}/payment",
    request_body = PaymentRequest,
    responses(
        (status = 200, description = "Payment recorded", body = OrderResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Order not found", body = ApiErrorResponse),
    ),
    params(
        ("code" = String, Path, description = "Order code")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn update_order_payment(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(code): AppPath<String>,
    AppJson(payload): AppJson<PaymentRequest>,
) -> Result<Json<OrderResponse>, ApiError> {
    let payment = PaymentUpdate {
        status: payload.payment_status.parse::<PaymentStatus>()?,
        method: parse_label(payload.payment_method.as_deref())?,
        reference: payload.payment_reference,
    };
    let dining = state.dining.clone();
    let details = blocking(move || dining.orders.update_payment(&actor, &code, payment)).await?;
    Ok(Json(details.into()))
}

#[utoipa::path(
    get,
    path = "/orders/stats",
    responses(
        (status = 200, description = "Order volume, revenue and ratings", body = OrderStatsResponse),
        (status = 400, description = "Unknown period", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    params(
        ("period" = Option<String>, Query, description = "today, week, month, year or all; defaults to today"),
        ("table_id" = Option<Uuid>, Query, description = "Only orders at this table"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn order_stats(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<OrderStatsQuery>,
) -> Result<Json<OrderStatsResponse>, ApiError> {
    let period = parse_label::<ReportPeriod>(query.period.as_deref())?.unwrap_or_default();
    let table_id = query.table_id;
    let dining = state.dining.clone();
    let stats = blocking(move || dining.reports.order_stats(&actor, period, table_id)).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/orders/waiters",
    responses(
        (status = 200, description = "Waiters with their 30-day workload", body = [WaiterResponse]),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    params(
        ("include_inactive" = Option<bool>, Query, description = "Also list deactivated waiters"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "orders"
)]
#[instrument(skip(state))]
pub async fn list_waiters(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<WaitersQuery>,
) -> Result<Json<Vec<WaiterResponse>>, ApiError> {
    let include_inactive = query.include_inactive.unwrap_or(false);
    let dining = state.dining.clone();
    let waiters = blocking(move || dining.reports.waiters(&actor, include_inactive)).await?;
    Ok(Json(waiters.into_iter().map(Into::into).collect()))
}
