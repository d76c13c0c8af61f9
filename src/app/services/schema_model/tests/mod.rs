//! Shared fixtures for schema model tests

use super::*;

pub mod layout_tests;
pub mod loader_tests;

/// The embedded layout document as a mutable JSON value
pub fn builtin_layout_value() -> serde_json::Value {
    serde_json::from_str(BUILTIN_SCHEMA_DOCUMENT).unwrap()
}

/// Build a model from an edited layout document and the builtin regions
pub fn model_from_value(value: &serde_json::Value) -> Result<SchemaModel> {
    SchemaModel::from_documents(
        &value.to_string(),
        BUILTIN_REGION_CODES,
        "test-layout",
        "test-regions",
    )
}
