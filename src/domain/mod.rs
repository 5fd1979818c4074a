//! Domain model: schemas, records, the row codec and order lifecycle.

pub mod codec;
pub mod id;
pub mod record;
pub mod registry;
pub mod schema;
pub mod status;

pub use record::{CellValue, Record};
pub use registry::SchemaRegistry;
pub use schema::{FieldDescriptor, FieldKind, Schema};
pub use status::{OrderStatus, PaymentStatus};
