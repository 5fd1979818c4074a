use crate::transport::http::handlers::{entities, health, orders};
use crate::transport::http::types::{
    ApiResponse, CreateEntityRequest, CreateOrderRequest, OrderItemRequest, UpdateEntityRequest,
};
use axum::routing::{get, patch};
use axum::Router;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthcheck_handler,
        orders::list_orders_handler,
        orders::create_order_handler,
        orders::order_detail_handler,
        orders::advance_status_handler,
        orders::mark_payment_handler,
        entities::list_entities_handler,
        entities::get_entity_handler,
        entities::create_entity_handler,
        entities::update_entity_handler
    ),
    components(schemas(
        ApiResponse,
        CreateEntityRequest,
        CreateOrderRequest,
        OrderItemRequest,
        UpdateEntityRequest
    ))
)]
#[allow(dead_code)]
pub struct ApiDoc;

pub fn create_router(app_state: crate::transport::http::types::AppState) -> Router {
    Router::new()
        .route("/health", get(health::healthcheck_handler))
        .route(
            "/api/orders",
            get(orders::list_orders_handler).post(orders::create_order_handler),
        )
        .route("/api/orders/:order_id/detail", get(orders::order_detail_handler))
        .route("/api/orders/:order_id/status", patch(orders::advance_status_handler))
        .route("/api/orders/:order_id/payment", patch(orders::mark_payment_handler))
        .route(
            "/api/:entity",
            get(entities::list_entities_handler).post(entities::create_entity_handler),
        )
        .route(
            "/api/:entity/:id",
            get(entities::get_entity_handler).put(entities::update_entity_handler),
        )
        .with_state(app_state)
}
