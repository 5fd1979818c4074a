use crate::app::order_service::{NewOrder, NewOrderItem};
use crate::error::StoreError;
use crate::transport::http::handlers::common::{error_response, ok_json, ShopId};
use crate::transport::http::types::{json_422, ApiResponse, AppState, CreateOrderRequest};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;

#[utoipa::path(
    get,
    path = "/api/orders",
    responses(
        (status = 200, description = "Tenant order listing with customer names", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse),
        (status = 503, description = "Store unreachable", body = ApiResponse)
    )
)]
pub async fn list_orders_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
) -> impl IntoResponse {
    match state.orders.list_orders(&shop_id).await {
        Ok(summaries) => ok_json(json!(summaries)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/orders",
    request_body = CreateOrderRequest,
    responses(
        (status = 200, description = "Order created (one measurement row per item)", body = ApiResponse),
        (status = 400, description = "Invalid order payload", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 503, description = "Store failure; partial writes were compensated", body = ApiResponse)
    )
)]
pub async fn create_order_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    request: Result<Json<CreateOrderRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"customer_id\": ..., \"total_price\": ..., \"items\": [...]}"),
    };
    let items = match request
        .items
        .into_iter()
        .map(|item| {
            Ok(NewOrderItem {
                service_id: item.service_id,
                quantity: item.quantity,
                measurements: measurement_map(item.measurement_data)?,
            })
        })
        .collect::<Result<Vec<_>, StoreError>>()
    {
        Ok(items) => items,
        Err(e) => return error_response(e),
    };
    let order = NewOrder {
        customer_id: request.customer_id,
        staff_assigned_id: request.staff_assigned_id,
        total_price: request.total_price,
        discount: request.discount,
        delivery_date: request.delivery_date,
        urgent: request.urgent,
        notes: request.notes,
        images: request.images,
        items,
    };
    match state.orders.create_order(&shop_id, order).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}/detail",
    params(
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Order joined with customer, measurements and services", body = ApiResponse),
        (status = 404, description = "No such order for this tenant", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse)
    )
)]
pub async fn order_detail_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    match state.orders.order_detail(&shop_id, &order_id).await {
        Ok(detail) => ok_json(json!(detail)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    params(
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Status advanced one step", body = ApiResponse),
        (status = 404, description = "No such order for this tenant", body = ApiResponse),
        (status = 409, description = "Order changed concurrently, retry", body = ApiResponse),
        (status = 422, description = "Order is already delivered", body = ApiResponse)
    )
)]
pub async fn advance_status_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    match state.orders.advance_status(&shop_id, &order_id).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/payment",
    params(
        ("order_id" = String, Path, description = "Order id")
    ),
    responses(
        (status = 200, description = "Payment settled", body = ApiResponse),
        (status = 404, description = "No such order for this tenant", body = ApiResponse),
        (status = 409, description = "Order changed concurrently, retry", body = ApiResponse),
        (status = 422, description = "Order is already paid", body = ApiResponse)
    )
)]
pub async fn mark_payment_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path(order_id): Path<String>,
) -> impl IntoResponse {
    match state.orders.mark_paid(&shop_id, &order_id).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

fn measurement_map(data: JsonValue) -> Result<BTreeMap<String, JsonValue>, StoreError> {
    match data {
        JsonValue::Null => Ok(BTreeMap::new()),
        JsonValue::Object(map) => Ok(map
            .into_iter()
            .map(|(k, v)| (k, collapse_measurement_value(v)))
            .collect()),
        other => Err(StoreError::invalid_request(format!(
            "measurement_data must be an object, got {}",
            other
        ))),
    }
}

/// The mobile client sends `{"chest": {"value": "38"}}`; flat values pass
/// through unchanged.
fn collapse_measurement_value(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Object(mut map) if map.len() == 1 && map.contains_key("value") => {
            map.remove("value").unwrap_or(JsonValue::Null)
        }
        other => other,
    }
}
