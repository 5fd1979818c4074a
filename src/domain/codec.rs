//! Positional codec between wire rows and named records.
//!
//! Rows are ordered string vectors; the schema supplies column names and
//! which cells carry packed JSON. Encoding never pads or truncates: the
//! caller owns ordering and arity (the update path guards arity before
//! anything reaches the network).

use crate::domain::record::{CellValue, Record};
use crate::domain::schema::{FieldKind, Schema};
use crate::error::Result;

/// Encodes ordered cell values into a wire row.
pub fn encode_row(values: &[CellValue]) -> Result<Vec<String>> {
    let mut row = Vec::with_capacity(values.len());
    for value in values {
        row.push(encode_cell(value)?);
    }
    Ok(row)
}

fn encode_cell(value: &CellValue) -> Result<String> {
    match value {
        CellValue::Null => Ok(String::new()),
        CellValue::Text(s) => Ok(s.clone()),
        CellValue::Json(v) => Ok(serde_json::to_string(v)?),
    }
}

/// Decodes a wire row into a named record.
///
/// Cells zip with schema columns by position. A row shorter than the
/// schema yields `Null` for the missing trailing fields; extra cells
/// beyond the schema are dropped. Never panics on ragged input.
pub fn decode_row(schema: &Schema, row: &[String]) -> Record {
    let mut record = Record::new();
    for (position, column) in schema.columns.iter().enumerate() {
        let cell = row.get(position).map(String::as_str);
        record.set(column.name, decode_cell(column.kind, cell));
    }
    record
}

fn decode_cell(kind: FieldKind, cell: Option<&str>) -> CellValue {
    let raw = match cell {
        None | Some("") => return CellValue::Null,
        Some(s) => s,
    };
    match kind {
        FieldKind::Text => CellValue::text(raw),
        // Malformed JSON stays raw text so nothing is lost on re-encode.
        FieldKind::Json => match serde_json::from_str(raw) {
            Ok(v) => CellValue::Json(v),
            Err(_) => CellValue::text(raw),
        },
    }
}

/// Projects a record back into column order, key column excluded.
///
/// This is the read-modify-write primitive: take a decoded row, change
/// some fields, project, and hand the result to an update. Fields the
/// record does not carry become `Null`.
pub fn ordered_non_key_values(schema: &Schema, record: &Record) -> Vec<CellValue> {
    schema
        .columns
        .iter()
        .skip(1)
        .map(|col| record.get(col.name).cloned().unwrap_or(CellValue::Null))
        .collect()
}
