use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post, put},
};
use hotel_dining_service::models::{TableSection, TableStatus};
use hotel_dining_service::reports::DEFAULT_HISTORY_DAYS;
use hotel_dining_service::store::TableFilter;
use hotel_dining_service::tables::{NewTable, TableChanges};
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::*;

use super::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ListTablesQuery {
    pub section: Option<String>,
    pub status: Option<String>,
    pub min_capacity: Option<i32>,
    pub active_only: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct AvailableTablesQuery {
    pub min_capacity: Option<i32>,
    pub section: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TableOrdersQuery {
    pub include_finished: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct TableHistoryQuery {
    pub days: Option<i64>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/tables", get(list_tables).post(create_table))
        .route("/tables/available", get(available_tables))
        .route("/tables/stats", get(table_stats))
        .route(
            "/tables/{id}",
            get(get_table).patch(update_table).delete(delete_table),
        )
        .route("/tables/{id}/status", put(change_table_status))
        .route("/tables/{id}/occupy", post(occupy_table))
        .route("/tables/{id}/clear", post(clear_table))
        .route("/tables/{id}/available", post(mark_table_available))
        .route("/tables/{id}/orders", get(table_orders))
        .route("/tables/{id}/history", get(table_history))
}

#[utoipa::path(
    get,
    path = "/tables",
    responses(
        (status = 200, description = "Dining tables ordered by number", body = [TableResponse]),
        (status = 400, description = "Unknown section or status", body = ApiErrorResponse),
    ),
    params(
        ("section" = Option<String>, Query, description = "Filter by section"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("min_capacity" = Option<i32>, Query, description = "Minimum seats"),
        ("active_only" = Option<bool>, Query, description = "Hide inactive tables"),
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn list_tables(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<ListTablesQuery>,
) -> Result<Json<Vec<TableResponse>>, ApiError> {
    let filter = TableFilter {
        section: parse_label::<TableSection>(query.section.as_deref())?,
        status: parse_label::<TableStatus>(query.status.as_deref())?,
        min_capacity: query.min_capacity,
        active_only: query.active_only.unwrap_or(false),
    };
    let dining = state.dining.clone();
    let tables = blocking(move || dining.tables.list(&actor, &filter)).await?;
    Ok(Json(tables.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/tables/available",
    responses(
        (status = 200, description = "Free tables, smallest first", body = [TableResponse]),
    ),
    params(
        ("min_capacity" = Option<i32>, Query, description = "Party size to seat"),
        ("section" = Option<String>, Query, description = "Preferred section"),
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn available_tables(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<AvailableTablesQuery>,
) -> Result<Json<Vec<TableResponse>>, ApiError> {
    let section = parse_label::<TableSection>(query.section.as_deref())?;
    let dining = state.dining.clone();
    let tables =
        blocking(move || dining.tables.available(&actor, query.min_capacity, section)).await?;
    Ok(Json(tables.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/tables",
    request_body = CreateTableRequest,
    responses(
        (status = 201, description = "Table created", body = TableResponse),
        (status = 400, description = "Invalid table", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 409, description = "Table number taken", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn create_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<CreateTableRequest>,
) -> Result<(StatusCode, Json<TableResponse>), ApiError> {
    let input = NewTable {
        table_number: payload.table_number,
        name: payload.name,
        section: parse_label(payload.section.as_deref())?,
        capacity: payload.capacity,
    };
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.create(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(table.into())))
}

#[utoipa::path(
    get,
    path = "/tables/{id}",
    responses(
        (status = 200, description = "Dining table", body = TableResponse),
        (status = 404, description = "Table not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn get_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TableResponse>, ApiError> {
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.get(&actor, id)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    patch,
    path = "/tables/{id}",
    request_body = UpdateTableRequest,
    responses(
        (status = 200, description = "Table updated", body = TableResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Table not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn update_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTableRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let changes = TableChanges {
        name: payload.name,
        section: parse_label(payload.section.as_deref())?,
        capacity: payload.capacity,
        is_active: payload.is_active,
    };
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.update(&actor, id, changes)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    delete,
    path = "/tables/{id}",
    responses(
        (status = 204, description = "Table deleted"),
        (status = 404, description = "Table not found", body = ApiErrorResponse),
        (status = 409, description = "Table has active orders", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn delete_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let dining = state.dining.clone();
    blocking(move || dining.tables.delete(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/tables/{id}/status",
    request_body = TableStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = TableResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 409, description = "Transition not allowed", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn change_table_status(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<TableStatusRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let to: TableStatus = payload.status.parse()?;
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.change_status(&actor, id, to)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    post,
    path = "/tables/{id}/occupy",
    request_body = OccupyTableRequest,
    responses(
        (status = 200, description = "Table occupied", body = TableResponse),
        (status = 400, description = "Party too large", body = ApiErrorResponse),
        (status = 409, description = "Table not available", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn occupy_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<OccupyTableRequest>,
) -> Result<Json<TableResponse>, ApiError> {
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.occupy(&actor, id, payload.party_size)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    post,
    path = "/tables/{id}/clear",
    responses(
        (status = 200, description = "Table sent to cleaning", body = TableResponse),
        (status = 409, description = "Table still has active orders", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn clear_table(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TableResponse>, ApiError> {
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.clear(&actor, id)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    post,
    path = "/tables/{id}/available",
    responses(
        (status = 200, description = "Table available again", body = TableResponse),
        (status = 409, description = "Table cannot be freed yet", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn mark_table_available(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<TableResponse>, ApiError> {
    let dining = state.dining.clone();
    let table = blocking(move || dining.tables.mark_available(&actor, id)).await?;
    Ok(Json(table.into()))
}

#[utoipa::path(
    get,
    path = "/tables/{id}/orders",
    responses(
        (status = 200, description = "Orders seated at the table", body = [OrderResponse]),
        (status = 404, description = "Table not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID"),
        ("include_finished" = Option<bool>, Query, description = "Include completed and cancelled orders"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn table_orders(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TableOrdersQuery>,
) -> Result<Json<Vec<OrderResponse>>, ApiError> {
    let include_finished = query.include_finished.unwrap_or(false);
    let dining = state.dining.clone();
    let orders =
        blocking(move || dining.orders.table_orders(&actor, id, include_finished)).await?;
    Ok(Json(orders.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/tables/stats",
    responses(
        (status = 200, description = "Table counts by status, section and capacity", body = TableStatsResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn table_stats(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<TableStatsResponse>, ApiError> {
    let dining = state.dining.clone();
    let stats = blocking(move || dining.reports.table_stats(&actor)).await?;
    Ok(Json(stats.into()))
}

#[utoipa::path(
    get,
    path = "/tables/{id}/history",
    responses(
        (status = 200, description = "Recent orders at the table with totals", body = TableHistoryResponse),
        (status = 400, description = "Days out of range", body = ApiErrorResponse),
        (status = 404, description = "Table not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Table ID"),
        ("days" = Option<i64>, Query, description = "Look-back window in days, 1 to 365; defaults to 7"),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "tables"
)]
#[instrument(skip(state))]
pub async fn table_history(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppQuery(query): AppQuery<TableHistoryQuery>,
) -> Result<Json<TableHistoryResponse>, ApiError> {
    let days = query.days.unwrap_or(DEFAULT_HISTORY_DAYS);
    let dining = state.dining.clone();
    let history = blocking(move || dining.reports.table_history(&actor, id, days)).await?;
    Ok(Json(history.into()))
}
