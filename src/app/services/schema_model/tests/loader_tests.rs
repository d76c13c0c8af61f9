//! Tests for loading and validating schema documents

use super::*;
use crate::config::SchemaConfig;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_builtin_model_is_valid() {
    let model = SchemaModel::builtin().unwrap();

    assert_eq!(model.version(), 1);
    assert_eq!(model.layouts().meet_info.row_identifier, "B1");
    assert_eq!(model.layouts().swimmer_info.row_identifier, "D1");
    assert!(!model.regions().is_empty());
    assert_eq!(model.record_code("C1NSC"), "C1");
    assert_eq!(model.record_code("C"), "C");
}

#[test]
fn test_load_without_paths_matches_builtin() {
    let loaded = SchemaModel::load(&SchemaConfig::default()).unwrap();
    assert_eq!(loaded, SchemaModel::builtin().unwrap());
}

#[test]
fn test_load_alternate_documents_from_files() {
    let temp_dir = TempDir::new().unwrap();
    let mut layout = builtin_layout_value();
    layout["meet_info"]["date_format"] = serde_json::json!("YYYYMMDD");
    let layout_path = temp_dir.path().join("layout.json");
    let regions_path = temp_dir.path().join("regions.json");
    fs::write(&layout_path, layout.to_string()).unwrap();
    fs::write(&regions_path, r#"{"Test Region": ["TR"]}"#).unwrap();

    let config = SchemaConfig {
        model_path: Some(layout_path),
        region_codes_path: Some(regions_path),
    };
    let model = SchemaModel::load(&config).unwrap();

    assert_eq!(model.layouts().meet_info.date_format, DateFormat::YearMonthDay);
    assert_eq!(model.regions().lookup("tr"), Some("Test Region"));
    assert_eq!(model.regions().len(), 1);
}

#[test]
fn test_missing_document_file_is_io_error() {
    let config = SchemaConfig {
        model_path: Some("/nonexistent/layout.json".into()),
        region_codes_path: None,
    };
    assert!(matches!(SchemaModel::load(&config), Err(Error::Io { .. })));
}

#[test]
fn test_malformed_document_is_parse_error() {
    match SchemaModel::from_documents("{ not json", BUILTIN_REGION_CODES, "broken.json", "r") {
        Err(Error::SchemaParse { path, .. }) => assert_eq!(path, "broken.json"),
        other => panic!("Expected SchemaParse, got {:?}", other),
    }
}

#[test]
fn test_rejects_unsupported_version() {
    let mut layout = builtin_layout_value();
    layout["schema_version"] = serde_json::json!(2);
    assert!(matches!(model_from_value(&layout), Err(Error::Schema { .. })));
}

#[test]
fn test_rejects_duplicate_record_codes() {
    let mut layout = builtin_layout_value();
    layout["team_info_extended"]["row_identifier"] = serde_json::json!("C1");

    match model_from_value(&layout) {
        Err(Error::Schema { message }) => assert!(message.contains("Duplicate")),
        other => panic!("Expected schema error, got {:?}", other),
    }
}

#[test]
fn test_rejects_empty_record_code() {
    let mut layout = builtin_layout_value();
    layout["swimmer_info"]["row_identifier"] = serde_json::json!("");
    assert!(matches!(model_from_value(&layout), Err(Error::Schema { .. })));
}

#[test]
fn test_rejects_zero_length_span() {
    let mut layout = builtin_layout_value();
    layout["swimmer_info"]["gender"]["length"] = serde_json::json!(0);

    match model_from_value(&layout) {
        Err(Error::Schema { message }) => assert!(message.contains("swimmer_info.gender")),
        other => panic!("Expected schema error, got {:?}", other),
    }
}

#[test]
fn test_rejects_overrides_without_fallback() {
    let mut layout = builtin_layout_value();
    layout["team_info"]["overrides"]["meet_type"]
        .as_object_mut()
        .unwrap()
        .remove("fallback");

    match model_from_value(&layout) {
        Err(Error::SchemaParse { source, .. }) => {
            assert!(source.to_string().contains("fallback"))
        }
        other => panic!("Expected parse error, got {:?}", other),
    }
}
