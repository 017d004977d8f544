pub mod bookings;
pub mod menu;
pub mod orders;
pub mod tables;

use std::sync::Arc;

use axum::Router;
use hotel_booking_service::BookingServices;
use hotel_booking_service::store::BookingStore;
use hotel_core::ServiceError;
use hotel_core::notification::Notifier;
use hotel_dining_service::DiningServices;
use hotel_dining_service::pricing::PricingRates;
use hotel_dining_service::store::DiningStore;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::TokenKeys;
use crate::error::ApiError;
use crate::models::*;

#[derive(Clone)]
pub struct AppState {
    pub dining: Arc<DiningServices>,
    pub booking: Arc<BookingServices>,
    pub tokens: Arc<TokenKeys>,
}

/// Runs a synchronous engine call on the blocking pool.
pub(crate) async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::InternalError(format!("Worker failed: {e}")))?
        .map_err(ApiError::from)
}

impl AppState {
    pub fn new(
        dining_store: Arc<dyn DiningStore>,
        booking_store: Arc<dyn BookingStore>,
        notifier: Arc<dyn Notifier>,
        rates: PricingRates,
        tokens: TokenKeys,
    ) -> Self {
        AppState {
            dining: Arc::new(DiningServices::new(dining_store, notifier.clone(), rates)),
            booking: Arc::new(BookingServices::new(booking_store, notifier)),
            tokens: Arc::new(tokens),
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(menu::router())
        .merge(tables::router())
        .merge(orders::router())
        .merge(bookings::router())
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(CorsLayer::permissive())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        menu::list_categories,
        menu::create_category,
        menu::list_items,
        menu::create_item,
        menu::get_item,
        menu::update_item,
        menu::delete_item,
        tables::list_tables,
        tables::available_tables,
        tables::create_table,
        tables::get_table,
        tables::update_table,
        tables::delete_table,
        tables::change_table_status,
        tables::occupy_table,
        tables::clear_table,
        tables::mark_table_available,
        tables::table_orders,
        tables::table_stats,
        tables::table_history,
        orders::place_order,
        orders::list_orders,
        orders::my_orders,
        orders::my_assigned_orders,
        orders::available_orders,
        orders::get_order,
        orders::track_order,
        orders::update_order_status,
        orders::self_assign_order,
        orders::assign_order,
        orders::rate_order,
        orders::update_order_payment,
        orders::order_stats,
        orders::list_waiters,
        bookings::list_rooms,
        bookings::create_room,
        bookings::get_room,
        bookings::set_room_status,
        bookings::list_events,
        bookings::create_event,
        bookings::get_event,
        bookings::check_availability,
        bookings::create_booking,
        bookings::list_bookings,
        bookings::my_bookings,
        bookings::get_booking,
        bookings::update_booking_status,
        bookings::cancel_booking,
    ),
    components(schemas(
        ApiErrorResponse,
        CreateCategoryRequest,
        CategoryResponse,
        CreateMenuItemRequest,
        UpdateMenuItemRequest,
        MenuItemResponse,
        CreateTableRequest,
        UpdateTableRequest,
        TableStatusRequest,
        OccupyTableRequest,
        TableResponse,
        OrderItemRequest,
        PlaceOrderRequest,
        OrderStatusRequest,
        AssignOrderRequest,
        RateOrderRequest,
        PaymentRequest,
        LineItemResponse,
        RatingResponse,
        OrderResponse,
        TrackedItemResponse,
        OrderTrackingResponse,
        CreateRoomRequest,
        RoomStatusRequest,
        RoomResponse,
        CreateEventRequest,
        EventResponse,
        CreateBookingRequest,
        BookingStatusRequest,
        BookingResponse,
        BookedRangeResponse,
        AvailabilityResponse,
        StatusCountResponse,
        PopularItemResponse,
        TableActivityResponse,
        RatingSummaryResponse,
        OrderStatsResponse,
        WaiterResponse,
        SectionSummaryResponse,
        CapacitySummaryResponse,
        TableStatsResponse,
        HistoryOrderResponse,
        TableHistoryResponse,
        bookings::KindSegment,
    )),
    modifiers(&SecurityAddon),
    tags(
        (name = "menu", description = "Menu catalog"),
        (name = "tables", description = "Dining tables"),
        (name = "orders", description = "Food orders"),
        (name = "bookings", description = "Rooms, events and their bookings"),
    ),
    info(
        title = "Hotel API Gateway",
        description = "Dining, table and booking operations",
        version = "1.0.0"
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            use utoipa::openapi::security::*;
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}
