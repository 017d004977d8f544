use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::get,
};
use hotel_dining_service::catalog::{MenuItemChanges, NewMenuItem};
use hotel_dining_service::store::MenuFilter;
use serde::Deserialize;
use tracing::instrument;
use uuid::Uuid;

use crate::auth::Caller;
use crate::error::ApiError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::models::*;

use super::{AppState, blocking};

#[derive(Debug, Deserialize)]
pub struct ListItemsQuery {
    pub category_id: Option<Uuid>,
    pub available_only: Option<bool>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/menu/categories", get(list_categories).post(create_category))
        .route("/menu/items", get(list_items).post(create_item))
        .route(
            "/menu/items/{id}",
            get(get_item).patch(update_item).delete(delete_item),
        )
}

#[utoipa::path(
    get,
    path = "/menu/categories",
    responses(
        (status = 200, description = "Food categories", body = [CategoryResponse]),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    Caller(actor): Caller,
) -> Result<Json<Vec<CategoryResponse>>, ApiError> {
    let dining = state.dining.clone();
    let categories = blocking(move || dining.catalog.list_categories(&actor)).await?;
    Ok(Json(categories.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/menu/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = CategoryResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 409, description = "Name already taken", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn create_category(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<CategoryResponse>), ApiError> {
    let dining = state.dining.clone();
    let category = blocking(move || dining.catalog.create_category(&actor, &payload.name)).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

#[utoipa::path(
    get,
    path = "/menu/items",
    responses(
        (status = 200, description = "Menu items", body = [MenuItemResponse]),
    ),
    params(
        ("category_id" = Option<Uuid>, Query, description = "Only items of this category"),
        ("available_only" = Option<bool>, Query, description = "Hide unavailable items"),
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppQuery(query): AppQuery<ListItemsQuery>,
) -> Result<Json<Vec<MenuItemResponse>>, ApiError> {
    let dining = state.dining.clone();
    let filter = MenuFilter {
        category_id: query.category_id,
        available_only: query.available_only.unwrap_or(false),
    };
    let items = blocking(move || dining.catalog.list_items(&actor, &filter)).await?;
    Ok(Json(items.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    post,
    path = "/menu/items",
    request_body = CreateMenuItemRequest,
    responses(
        (status = 201, description = "Menu item created", body = MenuItemResponse),
        (status = 400, description = "Invalid item", body = ApiErrorResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Category not found", body = ApiErrorResponse),
    ),
    security(
        ("bearer" = [])
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn create_item(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppJson(payload): AppJson<CreateMenuItemRequest>,
) -> Result<(StatusCode, Json<MenuItemResponse>), ApiError> {
    let input = NewMenuItem {
        price: parse_money(&payload.price, "Price")?,
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        is_available: payload.is_available,
        preparation_time: payload.preparation_time,
    };
    let dining = state.dining.clone();
    let item = blocking(move || dining.catalog.create_item(&actor, input)).await?;
    Ok((StatusCode::CREATED, Json(item.into())))
}

#[utoipa::path(
    get,
    path = "/menu/items/{id}",
    responses(
        (status = 200, description = "Menu item", body = MenuItemResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn get_item(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let dining = state.dining.clone();
    let item = blocking(move || dining.catalog.get_item(&actor, id)).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    patch,
    path = "/menu/items/{id}",
    request_body = UpdateMenuItemRequest,
    responses(
        (status = 200, description = "Menu item updated", body = MenuItemResponse),
        (status = 403, description = "Forbidden", body = ApiErrorResponse),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn update_item(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateMenuItemRequest>,
) -> Result<Json<MenuItemResponse>, ApiError> {
    let changes = MenuItemChanges {
        price: payload
            .price
            .as_deref()
            .map(|p| parse_money(p, "Price"))
            .transpose()?,
        name: payload.name,
        description: payload.description,
        category_id: payload.category_id,
        is_available: payload.is_available,
        preparation_time: payload.preparation_time,
    };
    let dining = state.dining.clone();
    let item = blocking(move || dining.catalog.update_item(&actor, id, changes)).await?;
    Ok(Json(item.into()))
}

#[utoipa::path(
    delete,
    path = "/menu/items/{id}",
    responses(
        (status = 204, description = "Menu item deleted"),
        (status = 404, description = "Menu item not found", body = ApiErrorResponse),
        (status = 409, description = "Item is part of an active order", body = ApiErrorResponse),
    ),
    params(
        ("id" = Uuid, Path, description = "Menu item ID")
    ),
    security(
        ("bearer" = [])
    ),
    tag = "menu"
)]
#[instrument(skip(state))]
pub async fn delete_item(
    State(state): State<AppState>,
    Caller(actor): Caller,
    AppPath(id): AppPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let dining = state.dining.clone();
    blocking(move || dining.catalog.delete_item(&actor, id)).await?;
    Ok(StatusCode::NO_CONTENT)
}
