//! Decoded row values.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// One decoded cell.
///
/// The wire carries only strings; `Json` appears when the schema marks a
/// column as a packed list/map and the cell content parsed cleanly.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Json(JsonValue),
}

impl CellValue {
    pub fn text<S: Into<String>>(s: S) -> Self {
        CellValue::Text(s.into())
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&JsonValue> {
        match self {
            CellValue::Json(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }
}

impl From<JsonValue> for CellValue {
    fn from(v: JsonValue) -> Self {
        CellValue::Json(v)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::Text(s.to_string())
    }
}

/// Named-field view of one row, keyed by column name.
///
/// BTreeMap keeps serialized output in a stable field order.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Record {
    #[serde(flatten)]
    fields: BTreeMap<String, CellValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<S: Into<String>>(&mut self, field: S, value: CellValue) {
        self.fields.insert(field.into(), value);
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.fields.get(field)
    }

    /// Text content of a field, empty-string when null or absent.
    pub fn text_or_empty(&self, field: &str) -> &str {
        match self.fields.get(field) {
            Some(CellValue::Text(s)) => s,
            _ => "",
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &CellValue)> {
        self.fields.iter()
    }
}
