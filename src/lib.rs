pub mod app;
pub mod domain;
pub mod error;
pub mod infra;
pub mod storage;
pub mod transport;

// Convenience re-exports (keeps call-sites clean)
pub use app::entity_store::EntityStore;
pub use app::order_service::OrderService;
pub use domain::SchemaRegistry;
pub use error::{Result, StoreError};
pub use storage::table::{InMemoryStore, SheetsClient, TableStore};
