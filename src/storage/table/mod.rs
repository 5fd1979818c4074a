//! Tabular storage abstraction over the remote spreadsheet.
//!
//! Rows are addressed the way the wire addresses them: 1-indexed, with
//! the reserved header row at index 1. Key lookups are linear scans; an
//! indexed backend can replace either implementation without touching
//! callers.

pub mod memory;
pub mod sheets;

pub use memory::InMemoryStore;
pub use sheets::SheetsClient;

use crate::error::Result;
use async_trait::async_trait;

/// Raw wire row: ordered cells, all strings.
pub type Row = Vec<String>;

/// 1-indexed storage position of the reserved header row.
pub const HEADER_ROW_INDEX: u32 = 1;

/// Async contract every table backend fulfils.
///
/// `append_row` and `delete_row` are not idempotent (a retried append can
/// duplicate a key, a retried delete hits a shifted index), so backends
/// must not auto-retry them; callers handle those outcomes.
#[async_trait]
pub trait TableStore: Send + Sync {
    /// Appends one row at the logical tail. At-least-once: a timed-out
    /// call is an unknown outcome.
    async fn append_row(&self, table: &str, row: Row) -> Result<()>;

    /// Every raw row in storage order, header row included at position 0
    /// of the result.
    async fn read_all(&self, table: &str) -> Result<Vec<Row>>;

    /// Overwrites one physical row, 1-indexed.
    async fn update_row(&self, table: &str, row_index: u32, row: Row) -> Result<()>;

    /// Removes one physical row, 1-indexed. Every later row shifts up by
    /// one, invalidating previously resolved indexes after it.
    async fn delete_row(&self, table: &str, row_index: u32) -> Result<()>;

    /// Scans for the row whose column-0 cell equals `key`, skipping the
    /// reserved header row. Returns the 1-indexed position together with
    /// the raw row so callers decode exactly what a bulk read would see.
    async fn resolve_row(&self, table: &str, key: &str) -> Result<Option<(u32, Row)>> {
        let rows = self.read_all(table).await?;
        for (offset, row) in rows.iter().enumerate() {
            let row_index = offset as u32 + 1;
            if row_index == HEADER_ROW_INDEX {
                continue;
            }
            if row.first().map(String::as_str) == Some(key) {
                return Ok(Some((row_index, row.clone())));
            }
        }
        Ok(None)
    }
}
