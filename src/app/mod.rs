//! Application services: entity CRUD and the order workflows.

pub mod entity_store;
pub mod order_service;

pub use entity_store::EntityStore;
pub use order_service::OrderService;
