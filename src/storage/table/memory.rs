//! In-memory table store (for testing and offline runs).

use crate::domain::SchemaRegistry;
use crate::error::{Result, StoreError};
use crate::storage::table::{Row, TableStore};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Thread-safe in-memory store with the same row/index semantics as the
/// remote spreadsheet, header rows included.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
}

impl InMemoryStore {
    /// Creates an empty store with no tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding one tab per registered entity, each
    /// seeded with its header row.
    pub async fn with_tables(registry: &SchemaRegistry) -> Self {
        let store = Self::new();
        {
            let mut tables = store.tables.write().await;
            for entity in registry.list_entities() {
                if let Ok(schema) = registry.schema_for(&entity) {
                    let header: Row = schema
                        .columns
                        .iter()
                        .map(|c| c.name.to_string())
                        .collect();
                    tables.insert(schema.table_name.to_string(), vec![header]);
                }
            }
        }
        debug!("in-memory table store seeded");
        store
    }

    fn missing(table: &str) -> StoreError {
        StoreError::configuration(format!("table not found: {}", table))
    }
}

#[async_trait]
impl TableStore for InMemoryStore {
    async fn append_row(&self, table: &str, row: Row) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| Self::missing(table))?;
        rows.push(row);
        Ok(())
    }

    async fn read_all(&self, table: &str) -> Result<Vec<Row>> {
        let tables = self.tables.read().await;
        let rows = tables.get(table).ok_or_else(|| Self::missing(table))?;
        Ok(rows.clone())
    }

    async fn update_row(&self, table: &str, row_index: u32, row: Row) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| Self::missing(table))?;
        let position = row_index
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < rows.len())
            .ok_or_else(|| {
                StoreError::invalid_request(format!(
                    "row {} out of range for table {}",
                    row_index, table
                ))
            })?;
        rows[position] = row;
        Ok(())
    }

    async fn delete_row(&self, table: &str, row_index: u32) -> Result<()> {
        let mut tables = self.tables.write().await;
        let rows = tables.get_mut(table).ok_or_else(|| Self::missing(table))?;
        let position = row_index
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < rows.len())
            .ok_or_else(|| {
                StoreError::invalid_request(format!(
                    "row {} out of range for table {}",
                    row_index, table
                ))
            })?;
        rows.remove(position);
        Ok(())
    }
}
