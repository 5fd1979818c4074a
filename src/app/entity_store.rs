//! Schema-checked CRUD over any [`TableStore`].
//!
//! This is the only layer that touches raw rows. Everything above works
//! with named records; everything below works with positional cells.

use crate::domain::codec::{decode_row, encode_row};
use crate::domain::record::{CellValue, Record};
use crate::domain::registry::SchemaRegistry;
use crate::error::{Result, StoreError};
use crate::storage::table::TableStore;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Append attempts per insert when the outcome of a try is unknown.
const INSERT_ATTEMPTS: u32 = 3;

#[derive(Clone)]
pub struct EntityStore {
    store: Arc<dyn TableStore>,
    registry: Arc<SchemaRegistry>,
}

impl EntityStore {
    pub fn new(store: Arc<dyn TableStore>, registry: Arc<SchemaRegistry>) -> Self {
        Self { store, registry }
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Appends one full row (key at position 0). The returned record is
    /// an echo of the input, not a storage-verified read-back.
    pub async fn insert(&self, entity: &str, values: &[CellValue]) -> Result<Record> {
        let schema = self.registry.schema_for(entity)?;
        if values.len() != schema.column_count() {
            return Err(StoreError::column_arity(
                entity,
                schema.column_count(),
                values.len(),
            ));
        }
        primary_key_of(entity, values)?;
        let row = encode_row(values)?;
        let echo = decode_row(schema, &row);
        self.store.append_row(schema.table_name, row).await?;
        debug!(entity, "row inserted");
        Ok(echo)
    }

    /// Insert that is safe to retry: the key is checked first, and a
    /// transient append failure triggers a re-resolve before the next
    /// attempt so a timed-out-but-landed append is not duplicated.
    pub async fn insert_if_absent(&self, entity: &str, values: &[CellValue]) -> Result<Record> {
        let schema = self.registry.schema_for(entity)?;
        if values.len() != schema.column_count() {
            return Err(StoreError::column_arity(
                entity,
                schema.column_count(),
                values.len(),
            ));
        }
        let key = primary_key_of(entity, values)?;

        if let Some((_, existing)) = self.store.resolve_row(schema.table_name, key).await? {
            debug!(entity, key, "insert skipped, key already present");
            return Ok(decode_row(schema, &existing));
        }

        let row = encode_row(values)?;
        let echo = decode_row(schema, &row);
        let mut attempt = 0u32;
        loop {
            match self.store.append_row(schema.table_name, row.clone()).await {
                Ok(()) => {
                    debug!(entity, key, "row inserted");
                    return Ok(echo);
                }
                Err(e) if e.is_transient() && attempt + 1 < INSERT_ATTEMPTS => {
                    attempt += 1;
                    warn!(entity, key, attempt, "append outcome unknown: {}", e);
                    tokio::time::sleep(Duration::from_millis(100 * attempt as u64)).await;
                    // The failed attempt may have landed anyway.
                    if let Some((_, existing)) =
                        self.store.resolve_row(schema.table_name, key).await?
                    {
                        return Ok(decode_row(schema, &existing));
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// All decoded records of an entity, reserved header row excluded.
    pub async fn read(&self, entity: &str) -> Result<Vec<Record>> {
        let schema = self.registry.schema_for(entity)?;
        let rows = self.store.read_all(schema.table_name).await?;
        Ok(rows
            .iter()
            .skip(1)
            .map(|row| decode_row(schema, row))
            .collect())
    }

    /// Tenant-scoped listing: keeps records whose `shop_id` cell equals
    /// the shop (text cell) or contains it (list cell).
    pub async fn list_for_shop(&self, entity: &str, shop_id: &str) -> Result<Vec<Record>> {
        let records = self.read(entity).await?;
        Ok(records
            .into_iter()
            .filter(|record| shop_matches(record.get("shop_id"), shop_id))
            .collect())
    }

    /// Decodes the row carrying the key, or a typed `NotFound`. Never an
    /// empty collection on a miss.
    pub async fn find_by_id(&self, entity: &str, id: &str) -> Result<Record> {
        let schema = self.registry.schema_for(entity)?;
        match self.store.resolve_row(schema.table_name, id).await? {
            Some((_, row)) => Ok(decode_row(schema, &row)),
            None => Err(StoreError::not_found(entity, id)),
        }
    }

    /// Tenant-scoped lookup: a record owned by another shop looks absent,
    /// not forbidden.
    pub async fn find_for_shop(&self, entity: &str, shop_id: &str, id: &str) -> Result<Record> {
        let record = self.find_by_id(entity, id).await?;
        if !shop_matches(record.get("shop_id"), shop_id) {
            return Err(StoreError::not_found(entity, id));
        }
        Ok(record)
    }

    /// Whole-row-minus-key overwrite.
    ///
    /// `non_key_values` must cover every column after the key; a short
    /// payload would shift later columns, so arity is rejected here,
    /// before anything reaches the network. When `expected_updated_at`
    /// is given, the stored `updated_at` cell must still match or the
    /// write fails with `ConcurrentModification`.
    pub async fn update_by_id(
        &self,
        entity: &str,
        id: &str,
        non_key_values: &[CellValue],
        expected_updated_at: Option<&str>,
    ) -> Result<Record> {
        let schema = self.registry.schema_for(entity)?;
        let expected = schema.column_count() - 1;
        if non_key_values.len() != expected {
            return Err(StoreError::column_arity(entity, expected, non_key_values.len()));
        }

        let (row_index, current) = self
            .store
            .resolve_row(schema.table_name, id)
            .await?
            .ok_or_else(|| StoreError::not_found(entity, id))?;

        if let Some(token) = expected_updated_at {
            let position = schema.position_of("updated_at")?;
            let stored = current.get(position).map(String::as_str).unwrap_or("");
            if stored != token {
                return Err(StoreError::concurrent_modification(entity, id));
            }
        }

        let mut full = Vec::with_capacity(schema.column_count());
        full.push(CellValue::text(id));
        full.extend_from_slice(non_key_values);
        let row = encode_row(&full)?;
        let echo = decode_row(schema, &row);
        self.store
            .update_row(schema.table_name, row_index, row)
            .await?;
        debug!(entity, id, row_index, "row updated");
        Ok(echo)
    }

    /// Removes the row carrying the key, or a typed `NotFound`.
    pub async fn delete_by_id(&self, entity: &str, id: &str) -> Result<()> {
        let schema = self.registry.schema_for(entity)?;
        let (row_index, _) = self
            .store
            .resolve_row(schema.table_name, id)
            .await?
            .ok_or_else(|| StoreError::not_found(entity, id))?;
        self.store.delete_row(schema.table_name, row_index).await?;
        debug!(entity, id, row_index, "row deleted");
        Ok(())
    }
}

fn primary_key_of<'a>(entity: &str, values: &'a [CellValue]) -> Result<&'a str> {
    match values.first() {
        Some(CellValue::Text(id)) if !id.is_empty() => Ok(id),
        _ => Err(StoreError::invalid_request(format!(
            "{}: primary key must be a non-empty text cell",
            entity
        ))),
    }
}

fn shop_matches(cell: Option<&CellValue>, shop_id: &str) -> bool {
    match cell {
        Some(CellValue::Text(s)) => s == shop_id,
        Some(CellValue::Json(serde_json::Value::String(s))) => s == shop_id,
        Some(CellValue::Json(serde_json::Value::Array(items))) => {
            items.iter().any(|v| v.as_str() == Some(shop_id))
        }
        _ => false,
    }
}
