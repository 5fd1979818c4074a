//! Storage backends for the tabular store abstraction.

pub mod table;

pub use table::{InMemoryStore, Row, SheetsClient, TableStore};
