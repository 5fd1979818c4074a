//! Shared fixtures for the integration tests: an entity store over the
//! in-memory backend, plus a fault-injecting wrapper for saga tests.

#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use stitchdesk::app::entity_store::EntityStore;
use stitchdesk::app::order_service::{NewOrder, NewOrderItem, OrderService};
use stitchdesk::domain::record::CellValue;
use stitchdesk::domain::registry::{CUSTOMERS, SERVICES};
use stitchdesk::domain::SchemaRegistry;
use stitchdesk::error::{Result, StoreError};
use stitchdesk::storage::table::{InMemoryStore, Row, TableStore};
use tokio::sync::Mutex;

pub async fn entity_store() -> EntityStore {
    let registry = Arc::new(SchemaRegistry::with_catalog().unwrap());
    let backend = Arc::new(InMemoryStore::with_tables(&registry).await);
    EntityStore::new(backend, registry)
}

pub async fn order_service() -> OrderService {
    OrderService::new(entity_store().await)
}

/// Wraps the in-memory store with a per-table append budget, so a test
/// can make appends start failing at an exact point of a workflow.
/// Tables without a budget entry never fail.
pub struct FlakyStore {
    inner: InMemoryStore,
    append_budget: Mutex<HashMap<String, u32>>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            append_budget: Mutex::new(HashMap::new()),
        }
    }

    /// Allows `remaining` more appends to `table`; every append after
    /// that fails with a transient error.
    pub async fn limit_appends(&self, table: &str, remaining: u32) {
        self.append_budget
            .lock()
            .await
            .insert(table.to_string(), remaining);
    }
}

#[async_trait]
impl TableStore for FlakyStore {
    async fn append_row(&self, table: &str, row: Row) -> Result<()> {
        {
            let mut budget = self.append_budget.lock().await;
            if let Some(remaining) = budget.get_mut(table) {
                if *remaining == 0 {
                    return Err(StoreError::transient(format!(
                        "injected append failure on {}",
                        table
                    )));
                }
                *remaining -= 1;
            }
        }
        self.inner.append_row(table, row).await
    }

    async fn read_all(&self, table: &str) -> Result<Vec<Row>> {
        self.inner.read_all(table).await
    }

    async fn update_row(&self, table: &str, row_index: u32, row: Row) -> Result<()> {
        self.inner.update_row(table, row_index, row).await
    }

    async fn delete_row(&self, table: &str, row_index: u32) -> Result<()> {
        self.inner.delete_row(table, row_index).await
    }
}

pub async fn flaky_order_service() -> (OrderService, Arc<FlakyStore>) {
    let registry = Arc::new(SchemaRegistry::with_catalog().unwrap());
    let backend = Arc::new(FlakyStore::new(InMemoryStore::with_tables(&registry).await));
    let entities = EntityStore::new(backend.clone(), registry);
    (OrderService::new(entities), backend)
}

pub async fn seed_service(entities: &EntityStore, shop_id: &str, id: &str, name: &str) {
    let values = vec![
        CellValue::text(id),
        CellValue::text(shop_id),
        CellValue::text(name),
        CellValue::Null,
        CellValue::text("500"),
        CellValue::Json(json!([])),
        CellValue::text("5"),
        CellValue::text("2026-01-01T00:00:00.000000Z"),
        CellValue::text("2026-01-01T00:00:00.000000Z"),
    ];
    entities.insert(SERVICES, &values).await.unwrap();
}

pub async fn seed_customer(entities: &EntityStore, shop_id: &str, id: &str, name: &str) {
    let values = vec![
        CellValue::text(id),
        CellValue::Json(json!([shop_id])),
        CellValue::text(name),
        CellValue::Null,
        CellValue::text("9000000000"),
        CellValue::text("male"),
        CellValue::Null,
        CellValue::Json(json!([])),
        CellValue::text("2026-01-01T00:00:00.000000Z"),
        CellValue::text("2026-01-01T00:00:00.000000Z"),
    ];
    entities.insert(CUSTOMERS, &values).await.unwrap();
}

pub fn order_item(service_id: &str, quantity: u32, fields: &[(&str, &str)]) -> NewOrderItem {
    NewOrderItem {
        service_id: service_id.to_string(),
        quantity,
        measurements: fields
            .iter()
            .map(|(k, v)| (k.to_string(), json!(v)))
            .collect(),
    }
}

pub fn order_request(customer_id: &str, items: Vec<NewOrderItem>) -> NewOrder {
    NewOrder {
        customer_id: customer_id.to_string(),
        staff_assigned_id: None,
        total_price: 500.0,
        discount: 50.0,
        delivery_date: Some("2026-09-01".to_string()),
        urgent: false,
        notes: None,
        images: vec![],
        items,
    }
}
