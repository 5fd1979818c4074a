//! Order workflows over the entity store.
//!
//! The remote store has no transactions, so order creation runs as a
//! linear saga: measurement rows first, then the order row referencing
//! them. Every insert is idempotent by client-minted id, and a failed
//! saga best-effort deletes the measurements it already wrote before
//! surfacing the original error.

use crate::app::entity_store::EntityStore;
use crate::domain::codec::ordered_non_key_values;
use crate::domain::id::{mint_id, now_rfc3339};
use crate::domain::record::{CellValue, Record};
use crate::domain::registry::{CUSTOMERS, MEASUREMENTS, ORDERS, SERVICES};
use crate::domain::status::{OrderStatus, PaymentStatus};
use crate::error::{Result, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::BTreeMap;
use tracing::{info, warn};

/// Read-modify-write attempts before a write conflict is surfaced.
const CONFLICT_ATTEMPTS: u32 = 3;

/// One line item of a new order: which service, how many pieces, and the
/// customer's measurement values for it.
#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub service_id: String,
    pub quantity: u32,
    pub measurements: BTreeMap<String, JsonValue>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: String,
    pub staff_assigned_id: Option<String>,
    pub total_price: f64,
    pub discount: f64,
    pub delivery_date: Option<String>,
    pub urgent: bool,
    pub notes: Option<String>,
    pub images: Vec<String>,
    pub items: Vec<NewOrderItem>,
}

/// Row shape of the tenant order listing.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_id: String,
    pub customer: String,
    pub status: String,
    pub total_price: String,
    pub discount: String,
    pub payment_status: String,
    pub due_amount: String,
    pub delivery_date: String,
    pub delivered_date: String,
    pub urgent: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fully joined view of one order.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order: Record,
    pub customer: Option<CustomerBrief>,
    pub items: Vec<OrderItemDetail>,
}

#[derive(Debug, Serialize)]
pub struct CustomerBrief {
    pub customer_id: String,
    pub full_name: String,
    pub phone: String,
    pub address: String,
    pub tags: JsonValue,
}

#[derive(Debug, Serialize)]
pub struct OrderItemDetail {
    pub measurement_id: String,
    pub quantity: u64,
    pub fields: JsonValue,
    pub service_id: String,
    pub service_name: String,
    pub price: String,
    pub estimated_days: String,
}

#[derive(Debug, Deserialize)]
struct MeasurementRef {
    measurement_id: String,
    #[serde(default)]
    quantity: u64,
}

#[derive(Clone)]
pub struct OrderService {
    entities: EntityStore,
}

impl OrderService {
    pub fn new(entities: EntityStore) -> Self {
        Self { entities }
    }

    pub fn entities(&self) -> &EntityStore {
        &self.entities
    }

    /// Creates one order plus one measurement row per line item.
    ///
    /// Succeeds once the order row lands. On any insert failure the
    /// measurements written so far are deleted again and the original
    /// error propagates; a caller retry re-runs the saga with fresh ids.
    pub async fn create_order(&self, shop_id: &str, order: NewOrder) -> Result<Record> {
        validate_new_order(&order)?;

        let order_id = mint_id();
        let now = now_rfc3339();
        let mut refs: Vec<JsonValue> = Vec::with_capacity(order.items.len());
        let mut written: Vec<String> = Vec::with_capacity(order.items.len());

        for item in &order.items {
            let measurement_id = mint_id();
            let fields = JsonValue::Object(item.measurements.clone().into_iter().collect());
            let values = vec![
                CellValue::text(measurement_id.as_str()),
                CellValue::text(order.customer_id.as_str()),
                CellValue::text(shop_id),
                CellValue::Json(fields),
                CellValue::text(item.service_id.as_str()),
                CellValue::text(now.as_str()),
                CellValue::text(now.as_str()),
            ];
            if let Err(e) = self.entities.insert_if_absent(MEASUREMENTS, &values).await {
                self.compensate_measurements(&written).await;
                return Err(e);
            }
            refs.push(json!({
                "measurement_id": measurement_id,
                "quantity": item.quantity,
            }));
            written.push(measurement_id);
        }

        let due_amount = order.total_price - order.discount;
        let values = vec![
            CellValue::text(order_id.as_str()),
            CellValue::text(shop_id),
            CellValue::text(order.customer_id.as_str()),
            opt_text(&order.staff_assigned_id),
            CellValue::Json(JsonValue::Array(refs)),
            CellValue::text(OrderStatus::Received.as_str()),
            CellValue::text(format_amount(order.total_price)),
            CellValue::text(format_amount(order.discount)),
            CellValue::text(PaymentStatus::Unpaid.as_str()),
            CellValue::text(format_amount(due_amount)),
            opt_text(&order.delivery_date),
            CellValue::Null,
            CellValue::Null,
            CellValue::text(if order.urgent { "true" } else { "false" }),
            opt_text(&order.notes),
            CellValue::Json(json!(order.images)),
            CellValue::text(now.as_str()),
            CellValue::text(now.as_str()),
        ];

        match self.entities.insert_if_absent(ORDERS, &values).await {
            Ok(record) => {
                info!(order_id, items = written.len(), "order created");
                Ok(record)
            }
            Err(e) => {
                self.compensate_measurements(&written).await;
                Err(e)
            }
        }
    }

    /// Moves an order one step along the production sequence. Reaching
    /// `delivered` stamps the delivery timestamp; advancing past it is
    /// rejected. Write conflicts retry the whole read-modify-write cycle
    /// a bounded number of times.
    pub async fn advance_status(&self, shop_id: &str, order_id: &str) -> Result<Record> {
        let mut attempt = 0u32;
        loop {
            let order = self.order_for_shop(shop_id, order_id).await?;
            let status = OrderStatus::parse(order.text_or_empty("status"))?;
            let next = status.advance()?;
            let token = order.text_or_empty("updated_at").to_string();
            let now = now_rfc3339();

            let mut updated = order;
            updated.set("status", CellValue::text(next.as_str()));
            if next.is_terminal() {
                updated.set("delivered_date", CellValue::text(now.as_str()));
            }
            updated.set("updated_at", CellValue::text(now.as_str()));

            let schema = self.entities.registry().schema_for(ORDERS)?;
            let values = ordered_non_key_values(schema, &updated);

            match self
                .entities
                .update_by_id(ORDERS, order_id, &values, Some(&token))
                .await
            {
                Ok(record) => {
                    info!(order_id, status = next.as_str(), "order status advanced");
                    return Ok(record);
                }
                Err(e @ StoreError::ConcurrentModification { .. })
                    if attempt + 1 < CONFLICT_ATTEMPTS =>
                {
                    attempt += 1;
                    warn!(order_id, attempt, "status write conflicted, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Settles the order's payment. One-way: an already-paid order is
    /// rejected with `InvalidTransition`. Clears `due_amount`.
    pub async fn mark_paid(&self, shop_id: &str, order_id: &str) -> Result<Record> {
        let mut attempt = 0u32;
        loop {
            let order = self.order_for_shop(shop_id, order_id).await?;
            let payment = PaymentStatus::parse(order.text_or_empty("payment_status"))?;
            let settled = payment.settle()?;
            let token = order.text_or_empty("updated_at").to_string();
            let now = now_rfc3339();

            let mut updated = order;
            updated.set("payment_status", CellValue::text(settled.as_str()));
            updated.set("due_amount", CellValue::text("0"));
            updated.set("updated_at", CellValue::text(now.as_str()));

            let schema = self.entities.registry().schema_for(ORDERS)?;
            let values = ordered_non_key_values(schema, &updated);

            match self
                .entities
                .update_by_id(ORDERS, order_id, &values, Some(&token))
                .await
            {
                Ok(record) => {
                    info!(order_id, "order marked paid");
                    return Ok(record);
                }
                Err(e @ StoreError::ConcurrentModification { .. })
                    if attempt + 1 < CONFLICT_ATTEMPTS =>
                {
                    attempt += 1;
                    warn!(order_id, attempt, "payment write conflicted, retrying: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Tenant order listing with customer names resolved.
    pub async fn list_orders(&self, shop_id: &str) -> Result<Vec<OrderSummary>> {
        let orders = self.entities.list_for_shop(ORDERS, shop_id).await?;
        let mut summaries = Vec::with_capacity(orders.len());
        for order in orders {
            let customer = match self
                .entities
                .find_by_id(CUSTOMERS, order.text_or_empty("customer_id"))
                .await
            {
                Ok(c) => c.text_or_empty("full_name").to_string(),
                Err(StoreError::NotFound { .. }) => "Unknown".to_string(),
                Err(e) => return Err(e),
            };
            summaries.push(OrderSummary {
                order_id: order.text_or_empty("order_id").to_string(),
                customer,
                status: order.text_or_empty("status").to_string(),
                total_price: order.text_or_empty("total_price").to_string(),
                discount: order.text_or_empty("discount").to_string(),
                payment_status: order.text_or_empty("payment_status").to_string(),
                due_amount: order.text_or_empty("due_amount").to_string(),
                delivery_date: order.text_or_empty("delivery_date").to_string(),
                delivered_date: order.text_or_empty("delivered_date").to_string(),
                urgent: order.text_or_empty("urgent").to_string(),
                created_at: order.text_or_empty("created_at").to_string(),
                updated_at: order.text_or_empty("updated_at").to_string(),
            });
        }
        Ok(summaries)
    }

    /// One order joined with its customer and per-item measurement and
    /// service details. Dangling references are skipped, not fatal.
    pub async fn order_detail(&self, shop_id: &str, order_id: &str) -> Result<OrderDetail> {
        let order = self.order_for_shop(shop_id, order_id).await?;

        let customer = match self
            .entities
            .find_by_id(CUSTOMERS, order.text_or_empty("customer_id"))
            .await
        {
            Ok(c) => Some(CustomerBrief {
                customer_id: c.text_or_empty("customer_id").to_string(),
                full_name: c.text_or_empty("full_name").to_string(),
                phone: c.text_or_empty("phone").to_string(),
                address: c.text_or_empty("address").to_string(),
                tags: c
                    .get("tags")
                    .and_then(CellValue::as_json)
                    .cloned()
                    .unwrap_or_else(|| json!([])),
            }),
            Err(StoreError::NotFound { .. }) => None,
            Err(e) => return Err(e),
        };

        let refs = measurement_refs_of(&order)?;
        let mut items = Vec::with_capacity(refs.len());
        for reference in refs {
            let measurement = match self
                .entities
                .find_by_id(MEASUREMENTS, &reference.measurement_id)
                .await
            {
                Ok(m) => m,
                Err(StoreError::NotFound { .. }) => {
                    warn!(
                        order_id,
                        measurement_id = %reference.measurement_id,
                        "dangling measurement reference"
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };
            let service = match self
                .entities
                .find_by_id(SERVICES, measurement.text_or_empty("service_id"))
                .await
            {
                Ok(s) => Some(s),
                Err(StoreError::NotFound { .. }) => None,
                Err(e) => return Err(e),
            };
            items.push(OrderItemDetail {
                measurement_id: reference.measurement_id,
                quantity: reference.quantity,
                fields: measurement
                    .get("fields")
                    .and_then(CellValue::as_json)
                    .cloned()
                    .unwrap_or_else(|| json!({})),
                service_id: measurement.text_or_empty("service_id").to_string(),
                service_name: service
                    .as_ref()
                    .map(|s| s.text_or_empty("name").to_string())
                    .unwrap_or_default(),
                price: service
                    .as_ref()
                    .map(|s| s.text_or_empty("price").to_string())
                    .unwrap_or_default(),
                estimated_days: service
                    .as_ref()
                    .map(|s| s.text_or_empty("estimated_days").to_string())
                    .unwrap_or_default(),
            });
        }

        Ok(OrderDetail {
            order,
            customer,
            items,
        })
    }

    async fn order_for_shop(&self, shop_id: &str, order_id: &str) -> Result<Record> {
        self.entities.find_for_shop(ORDERS, shop_id, order_id).await
    }

    async fn compensate_measurements(&self, measurement_ids: &[String]) {
        for id in measurement_ids {
            match self.entities.delete_by_id(MEASUREMENTS, id).await {
                Ok(()) => info!(measurement_id = %id, "orphaned measurement removed"),
                Err(StoreError::NotFound { .. }) => {}
                Err(e) => warn!(measurement_id = %id, "compensation failed: {}", e),
            }
        }
    }
}

fn validate_new_order(order: &NewOrder) -> Result<()> {
    if order.customer_id.trim().is_empty() {
        return Err(StoreError::invalid_request("customer_id must be set"));
    }
    if order.items.is_empty() {
        return Err(StoreError::invalid_request("order needs at least one item"));
    }
    if order.items.iter().any(|i| i.quantity == 0) {
        return Err(StoreError::invalid_request("item quantity must be at least 1"));
    }
    if !(order.total_price >= 0.0) || !(order.discount >= 0.0) {
        return Err(StoreError::invalid_request(
            "total_price and discount must be non-negative",
        ));
    }
    if order.discount > order.total_price {
        return Err(StoreError::invalid_request(
            "discount cannot exceed total_price",
        ));
    }
    Ok(())
}

fn measurement_refs_of(order: &Record) -> Result<Vec<MeasurementRef>> {
    match order.get("measurement_refs") {
        Some(CellValue::Json(v)) => Ok(serde_json::from_value(v.clone())?),
        Some(CellValue::Text(raw)) => Err(StoreError::decode(format!(
            "measurement_refs cell is not valid JSON: {}",
            raw
        ))),
        _ => Ok(Vec::new()),
    }
}

fn opt_text(value: &Option<String>) -> CellValue {
    match value {
        Some(s) if !s.is_empty() => CellValue::text(s.as_str()),
        _ => CellValue::Null,
    }
}

/// Money cells keep integer amounts free of a trailing `.0`.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
