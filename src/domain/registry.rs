//! SchemaRegistry for mapping entity names to their column layouts.

use crate::domain::schema::{FieldDescriptor, Schema};
use crate::error::{Result, StoreError};
use std::collections::HashMap;

pub const CUSTOMERS: &str = "customers";
pub const MEASUREMENTS: &str = "measurements";
pub const ORDERS: &str = "orders";
pub const SERVICES: &str = "services";
pub const RATINGS: &str = "ratings";

/// A registry that maps entity names to their table schemas.
///
/// Built once at startup from the declarative catalog below and never
/// mutated afterwards; lookups are infallible apart from unknown names.
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    /// Creates a new empty SchemaRegistry.
    pub fn new() -> Self {
        Self {
            schemas: HashMap::new(),
        }
    }

    /// Builds the registry holding every entity the service knows.
    pub fn with_catalog() -> Result<Self> {
        let mut reg = Self::new();
        for (name, schema) in catalog() {
            reg.register(name, schema)?;
        }
        Ok(reg)
    }

    /// Registers a schema under the given entity name, validating the
    /// layout before it becomes visible.
    pub fn register(&mut self, name: &str, schema: Schema) -> Result<()> {
        validate_layout(name, &schema)?;
        self.schemas.insert(name.to_string(), schema);
        Ok(())
    }

    /// Retrieves a schema by entity name.
    pub fn schema_for(&self, name: &str) -> Result<&Schema> {
        self.schemas
            .get(name)
            .ok_or_else(|| StoreError::unknown_entity(name))
    }

    /// Returns all registered entity names.
    pub fn list_entities(&self) -> Vec<String> {
        self.schemas.keys().cloned().collect()
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn validate_layout(name: &str, schema: &Schema) -> Result<()> {
    if schema.columns.len() < 2 {
        return Err(StoreError::configuration(format!(
            "entity '{}' needs at least a key and one data column",
            name
        )));
    }
    let mut seen = std::collections::HashSet::new();
    for col in &schema.columns {
        if !seen.insert(col.name) {
            return Err(StoreError::configuration(format!(
                "entity '{}' declares column '{}' twice",
                name, col.name
            )));
        }
    }
    if !schema.primary_key().ends_with("_id") {
        return Err(StoreError::configuration(format!(
            "entity '{}' column 0 '{}' is not an id column",
            name,
            schema.primary_key()
        )));
    }
    Ok(())
}

/// The fixed entity catalog. Column order here IS the physical column
/// order in the spreadsheet tabs; the key sits at column 0.
fn catalog() -> Vec<(&'static str, Schema)> {
    vec![
        (
            CUSTOMERS,
            Schema::new(
                "Customers",
                vec![
                    FieldDescriptor::text("customer_id"),
                    FieldDescriptor::json("shop_id"),
                    FieldDescriptor::text("full_name"),
                    FieldDescriptor::text("image_url"),
                    FieldDescriptor::text("phone"),
                    FieldDescriptor::text("gender"),
                    FieldDescriptor::text("address"),
                    FieldDescriptor::json("tags"),
                    FieldDescriptor::text("created_at"),
                    FieldDescriptor::text("updated_at"),
                ],
            ),
        ),
        (
            MEASUREMENTS,
            Schema::new(
                "Measurements",
                vec![
                    FieldDescriptor::text("measurement_id"),
                    FieldDescriptor::text("customer_id"),
                    FieldDescriptor::text("shop_id"),
                    FieldDescriptor::json("fields"),
                    FieldDescriptor::text("service_id"),
                    FieldDescriptor::text("created_at"),
                    FieldDescriptor::text("updated_at"),
                ],
            ),
        ),
        (
            ORDERS,
            Schema::new(
                "Orders",
                vec![
                    FieldDescriptor::text("order_id"),
                    FieldDescriptor::text("shop_id"),
                    FieldDescriptor::text("customer_id"),
                    FieldDescriptor::text("staff_assigned_id"),
                    FieldDescriptor::json("measurement_refs"),
                    FieldDescriptor::text("status"),
                    FieldDescriptor::text("total_price"),
                    FieldDescriptor::text("discount"),
                    FieldDescriptor::text("payment_status"),
                    FieldDescriptor::text("due_amount"),
                    FieldDescriptor::text("delivery_date"),
                    FieldDescriptor::text("delivered_date"),
                    FieldDescriptor::text("cancelled_at"),
                    FieldDescriptor::text("urgent"),
                    FieldDescriptor::text("notes"),
                    FieldDescriptor::json("images"),
                    FieldDescriptor::text("created_at"),
                    FieldDescriptor::text("updated_at"),
                ],
            ),
        ),
        (
            SERVICES,
            Schema::new(
                "Services",
                vec![
                    FieldDescriptor::text("service_id"),
                    FieldDescriptor::text("shop_id"),
                    FieldDescriptor::text("name"),
                    FieldDescriptor::text("description"),
                    FieldDescriptor::text("price"),
                    FieldDescriptor::json("images"),
                    FieldDescriptor::text("estimated_days"),
                    FieldDescriptor::text("created_at"),
                    FieldDescriptor::text("updated_at"),
                ],
            ),
        ),
        (
            RATINGS,
            Schema::new(
                "Ratings",
                vec![
                    FieldDescriptor::text("rating_id"),
                    FieldDescriptor::text("customer_id"),
                    FieldDescriptor::text("service_id"),
                    FieldDescriptor::text("shop_id"),
                    FieldDescriptor::text("rating"),
                    FieldDescriptor::text("review_text"),
                    FieldDescriptor::text("created_at"),
                    FieldDescriptor::text("updated_at"),
                ],
            ),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_builds() {
        let reg = SchemaRegistry::with_catalog().unwrap();
        let mut entities = reg.list_entities();
        entities.sort();
        assert_eq!(
            entities,
            vec!["customers", "measurements", "orders", "ratings", "services"]
        );
    }

    #[test]
    fn test_catalog_column_counts() {
        let reg = SchemaRegistry::with_catalog().unwrap();
        assert_eq!(reg.schema_for(CUSTOMERS).unwrap().column_count(), 10);
        assert_eq!(reg.schema_for(MEASUREMENTS).unwrap().column_count(), 7);
        assert_eq!(reg.schema_for(ORDERS).unwrap().column_count(), 18);
        assert_eq!(reg.schema_for(SERVICES).unwrap().column_count(), 9);
        assert_eq!(reg.schema_for(RATINGS).unwrap().column_count(), 8);
    }

    #[test]
    fn test_unknown_entity() {
        let reg = SchemaRegistry::with_catalog().unwrap();
        assert!(matches!(
            reg.schema_for("invoices"),
            Err(StoreError::UnknownEntity(_))
        ));
    }

    #[test]
    fn test_register_rejects_duplicate_column() {
        let mut reg = SchemaRegistry::new();
        let bad = Schema::new(
            "Bad",
            vec![
                FieldDescriptor::text("bad_id"),
                FieldDescriptor::text("name"),
                FieldDescriptor::text("name"),
            ],
        );
        assert!(matches!(
            reg.register("bad", bad),
            Err(StoreError::Configuration(_))
        ));
    }
}
