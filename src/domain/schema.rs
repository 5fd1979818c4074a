//! Column layouts for the spreadsheet-backed entities.
//!
//! Cells on the wire are untyped strings; `FieldKind` records which cells
//! carry JSON (lists and maps packed into a single cell) so the codec can
//! decode them into structured values.

use crate::error::{Result, StoreError};

/// How a cell's text content is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Plain text (ids, names, numbers-as-text, timestamps).
    Text,
    /// JSON document packed into one cell (list or map).
    Json,
}

/// One column of a table: its header name and its cell interpretation.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    pub const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
        }
    }

    pub const fn json(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Json,
        }
    }
}

/// Ordered column layout of one entity's table.
///
/// Column 0 is always the primary key. Physical row position is never an
/// identifier; only the column-0 value is.
#[derive(Debug, Clone)]
pub struct Schema {
    /// Tab name inside the spreadsheet (e.g. `Orders`).
    pub table_name: &'static str,
    pub columns: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new(table_name: &'static str, columns: Vec<FieldDescriptor>) -> Self {
        Self {
            table_name,
            columns,
        }
    }

    /// Name of the primary key column (always column 0).
    pub fn primary_key(&self) -> &'static str {
        self.columns[0].name
    }

    /// Total column count, key included.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Position of a named column, or an error naming the table.
    pub fn position_of(&self, field: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c.name == field)
            .ok_or_else(|| {
                StoreError::decode(format!(
                    "no column '{}' in table {}",
                    field, self.table_name
                ))
            })
    }

    pub fn kind_of(&self, position: usize) -> Option<FieldKind> {
        self.columns.get(position).map(|c| c.kind)
    }
}
