//! Shared fixtures for parse queue tests

use super::*;
use crate::app::models::NewMeet;
use crate::app::storage::{MeetFilter, Store};
use std::path::{Path, PathBuf};

pub mod worker_tests;

pub use crate::app::services::archive_extractor::tests::{minimal_results_text, write_archive};
pub use crate::app::services::hy3_decoder::tests::{meet_core_line, minimal_results};

pub fn test_store() -> Store {
    Store::open_in_memory().unwrap()
}

/// Register a downloaded meet pointing at `file_path`
pub fn downloaded_meet(store: &Store, region: &str, name: &str, file_path: &Path) -> i64 {
    store
        .register_meet(
            &NewMeet::new(region, name, format!("https://results.example/{}", name))
                .with_file(file_path.display().to_string()),
        )
        .unwrap()
}

/// Write a results archive with a primary and a secondary member
pub fn results_archive(dir: &Path, file_name: &str, results: &str) -> PathBuf {
    let path = dir.join(file_name);
    write_archive(
        &path,
        &[
            ("Meet Results.hy3", results.as_bytes()),
            ("Meet Results.cl2", b"A0".as_slice()),
        ],
    );
    path
}
