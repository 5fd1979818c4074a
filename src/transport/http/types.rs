use crate::app::entity_store::EntityStore;
use crate::app::order_service::OrderService;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;

#[derive(Clone)]
pub struct AppState {
    pub entities: EntityStore,
    pub orders: OrderService,
}

#[derive(Serialize, Debug, ToSchema)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Object)]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateEntityRequest {
    /// Column values keyed by column name. Server-minted columns (primary
    /// key, shop_id, created_at, updated_at) are ignored if present.
    #[schema(value_type = Object)]
    pub record: JsonValue,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct UpdateEntityRequest {
    /// Changed column values keyed by column name; omitted columns keep
    /// their stored values. The primary key, `shop_id` and `created_at`
    /// are server-owned and ignored if present. An `updated_at` value is
    /// taken as the caller's read token: the write is rejected when the
    /// stored cell no longer matches it.
    #[schema(value_type = Object)]
    pub record: JsonValue,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct CreateOrderRequest {
    pub customer_id: String,
    #[serde(default)]
    pub staff_assigned_id: Option<String>,
    pub total_price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub items: Vec<OrderItemRequest>,
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct OrderItemRequest {
    pub service_id: String,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Measurement values keyed by field name, e.g. `{"chest": "38"}`.
    /// The mobile client's `{"chest": {"value": "38"}}` shape is accepted
    /// and collapsed.
    #[serde(default)]
    #[schema(value_type = Object)]
    pub measurement_data: JsonValue,
}

fn default_quantity() -> u32 {
    1
}

pub fn json_422(err: JsonRejection, expected: &str) -> (StatusCode, Json<ApiResponse>) {
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ApiResponse {
            success: false,
            data: None,
            error: Some(format!("Invalid JSON body: {} (expected: {})", err, expected)),
        }),
    )
}
