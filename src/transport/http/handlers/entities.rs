use crate::domain::codec::ordered_non_key_values;
use crate::domain::id::{mint_id, now_rfc3339};
use crate::domain::record::{CellValue, Record};
use crate::domain::registry::ORDERS;
use crate::domain::schema::{FieldDescriptor, FieldKind};
use crate::error::StoreError;
use crate::transport::http::handlers::common::{error_response, ok_json, ShopId};
use crate::transport::http::types::{
    json_422, ApiResponse, AppState, CreateEntityRequest, UpdateEntityRequest,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::{json, Value as JsonValue};

#[utoipa::path(
    get,
    path = "/api/{entity}",
    params(
        ("entity" = String, Path, description = "Entity name (e.g. customers)")
    ),
    responses(
        (status = 200, description = "Tenant-scoped records", body = ApiResponse),
        (status = 400, description = "Unknown entity", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse),
        (status = 503, description = "Store unreachable", body = ApiResponse)
    )
)]
pub async fn list_entities_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path(entity): Path<String>,
) -> impl IntoResponse {
    let entity = entity.trim().to_lowercase();
    match state.entities.list_for_shop(&entity, &shop_id).await {
        Ok(records) => ok_json(json!(records)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    get,
    path = "/api/{entity}/{id}",
    params(
        ("entity" = String, Path, description = "Entity name (e.g. customers)"),
        ("id" = String, Path, description = "Primary key value")
    ),
    responses(
        (status = 200, description = "Record found", body = ApiResponse),
        (status = 404, description = "No row carries this id for this tenant", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse)
    )
)]
pub async fn get_entity_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path((entity, id)): Path<(String, String)>,
) -> impl IntoResponse {
    let entity = entity.trim().to_lowercase();
    match state.entities.find_for_shop(&entity, &shop_id, &id).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/{entity}",
    params(
        ("entity" = String, Path, description = "Entity name (e.g. customers)")
    ),
    request_body = CreateEntityRequest,
    responses(
        (status = 200, description = "Record inserted", body = ApiResponse),
        (status = 400, description = "Unknown entity or unknown column", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn create_entity_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path(entity): Path<String>,
    request: Result<Json<CreateEntityRequest>, JsonRejection>,
) -> impl IntoResponse {
    let entity = entity.trim().to_lowercase();
    if entity == ORDERS {
        return error_response(StoreError::invalid_request(
            "orders are created through POST /api/orders",
        ));
    }
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"record\": {\"<column>\": <value>, ...}}"),
    };
    match insert_from_json(&state, &entity, &shop_id, request.record).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/{entity}/{id}",
    params(
        ("entity" = String, Path, description = "Entity name (e.g. customers)"),
        ("id" = String, Path, description = "Primary key value")
    ),
    request_body = UpdateEntityRequest,
    responses(
        (status = 200, description = "Record updated", body = ApiResponse),
        (status = 400, description = "Unknown entity or unknown column", body = ApiResponse),
        (status = 401, description = "Missing bearer credential", body = ApiResponse),
        (status = 404, description = "No row carries this id for this tenant", body = ApiResponse),
        (status = 409, description = "Record changed since it was read", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse)
    )
)]
pub async fn update_entity_handler(
    State(state): State<AppState>,
    ShopId(shop_id): ShopId,
    Path((entity, id)): Path<(String, String)>,
    request: Result<Json<UpdateEntityRequest>, JsonRejection>,
) -> impl IntoResponse {
    let entity = entity.trim().to_lowercase();
    if entity == ORDERS {
        return error_response(StoreError::invalid_request(
            "orders are updated through the order status and payment endpoints",
        ));
    }
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"record\": {\"<column>\": <value>, ...}}"),
    };
    match update_from_json(&state, &entity, &shop_id, &id, request.record).await {
        Ok(record) => ok_json(json!(record)),
        Err(e) => error_response(e),
    }
}

/// Builds the full column-ordered row for one new record: the primary key
/// and timestamps are minted here, `shop_id` comes from the credential,
/// everything else from the request body.
async fn insert_from_json(
    state: &AppState,
    entity: &str,
    shop_id: &str,
    body: JsonValue,
) -> Result<Record, StoreError> {
    let schema = state.entities.registry().schema_for(entity)?;
    let fields = match body {
        JsonValue::Object(map) => map,
        other => {
            return Err(StoreError::invalid_request(format!(
                "record must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    for name in fields.keys() {
        if schema.position_of(name).is_err() {
            return Err(StoreError::invalid_request(format!(
                "unknown column '{}' for {}",
                name, entity
            )));
        }
    }

    let id = mint_id();
    let now = now_rfc3339();
    let mut values = Vec::with_capacity(schema.column_count());
    for (position, column) in schema.columns.iter().enumerate() {
        let value = if position == 0 {
            CellValue::text(id.as_str())
        } else if column.name == "shop_id" {
            match column.kind {
                // Customers can belong to several shops; the list starts
                // with the creating one.
                FieldKind::Json => CellValue::Json(json!([shop_id])),
                FieldKind::Text => CellValue::text(shop_id),
            }
        } else if column.name == "created_at" || column.name == "updated_at" {
            CellValue::text(now.as_str())
        } else {
            match fields.get(column.name) {
                Some(v) => cell_from_json(entity, column, v)?,
                None => CellValue::Null,
            }
        };
        values.push(value);
    }

    state.entities.insert_if_absent(entity, &values).await
}

/// Merges body fields into the stored record and writes the whole row
/// back through the optimistic `updated_at` check. The primary key,
/// `shop_id` and `created_at` stay server-owned; omitted columns keep
/// their stored values.
async fn update_from_json(
    state: &AppState,
    entity: &str,
    shop_id: &str,
    id: &str,
    body: JsonValue,
) -> Result<Record, StoreError> {
    let schema = state.entities.registry().schema_for(entity)?;
    let fields = match body {
        JsonValue::Object(map) => map,
        other => {
            return Err(StoreError::invalid_request(format!(
                "record must be a JSON object, got {}",
                json_type_name(&other)
            )))
        }
    };

    for name in fields.keys() {
        if schema.position_of(name).is_err() {
            return Err(StoreError::invalid_request(format!(
                "unknown column '{}' for {}",
                name, entity
            )));
        }
    }

    let current = state.entities.find_for_shop(entity, shop_id, id).await?;
    let token = match fields.get("updated_at") {
        Some(JsonValue::String(s)) => s.clone(),
        Some(other) => {
            return Err(StoreError::invalid_request(format!(
                "updated_at must be the string read from the record, got {}",
                json_type_name(other)
            )))
        }
        None => current.text_or_empty("updated_at").to_string(),
    };

    let key_column = schema.primary_key();
    let mut merged = current;
    for (name, value) in &fields {
        let name = name.as_str();
        if name == key_column || name == "shop_id" || name == "created_at" || name == "updated_at" {
            continue;
        }
        let column = &schema.columns[schema.position_of(name)?];
        merged.set(column.name, cell_from_json(entity, column, value)?);
    }
    merged.set("updated_at", CellValue::text(now_rfc3339()));

    let values = ordered_non_key_values(schema, &merged);
    state
        .entities
        .update_by_id(entity, id, &values, Some(&token))
        .await
}

fn cell_from_json(
    entity: &str,
    column: &FieldDescriptor,
    value: &JsonValue,
) -> Result<CellValue, StoreError> {
    match (column.kind, value) {
        (_, JsonValue::Null) => Ok(CellValue::Null),
        (FieldKind::Json, v) => Ok(CellValue::Json(v.clone())),
        (FieldKind::Text, JsonValue::String(s)) => Ok(CellValue::text(s.as_str())),
        (FieldKind::Text, JsonValue::Number(n)) => Ok(CellValue::text(n.to_string())),
        (FieldKind::Text, JsonValue::Bool(b)) => {
            Ok(CellValue::text(if *b { "true" } else { "false" }))
        }
        (FieldKind::Text, other) => Err(StoreError::invalid_request(format!(
            "{}: column '{}' expects a scalar, got {}",
            entity,
            column.name,
            json_type_name(other)
        ))),
    }
}

fn json_type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}
