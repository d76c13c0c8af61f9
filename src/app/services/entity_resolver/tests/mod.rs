//! Shared fixtures for entity resolver tests

use super::*;
use crate::app::models::NewMeet;
use crate::app::services::hy3_decoder::decode_lines;
use crate::app::services::schema_model::SchemaModel;

pub mod resolver_tests;

pub use crate::app::services::hy3_decoder::tests::{
    meet_core_line, meet_extended_line, minimal_results, swimmer_line, team_line,
};

pub fn test_store() -> Store {
    Store::open_in_memory().unwrap()
}

/// Register a downloaded meet awaiting ingestion
pub fn pending_meet(store: &Store, name: &str, url: &str) -> i64 {
    store
        .register_meet(&NewMeet::new("Auckland", name, url).with_file(format!("/downloads/{}.zip", name)))
        .unwrap()
}

pub fn decode(lines: Vec<String>) -> DecodedBundle {
    decode_lines(lines, &SchemaModel::builtin().unwrap())
}

pub fn minimal_bundle() -> DecodedBundle {
    decode(minimal_results())
}

/// Resolve a bundle whose meet is present
pub fn resolve(store: &Store, meet_id: i64, bundle: &DecodedBundle) -> ResolveOutcome {
    let meet = bundle.meet.as_ref().unwrap();
    EntityResolver::new(store)
        .resolve(meet_id, meet, bundle, Some("/downloads/test.zip"))
        .unwrap()
}

pub fn count(store: &Store, sql: &str) -> i64 {
    store.conn().query_row(sql, [], |row| row.get(0)).unwrap()
}
