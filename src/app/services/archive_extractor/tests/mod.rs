//! Shared fixtures for archive extractor tests

use super::*;
use std::io::Write;
use zip::write::SimpleFileOptions;


pub use crate::app::services::hy3_decoder::tests::minimal_results;

/// Write a zip archive with the given `(member name, contents)` entries
pub fn write_archive(path: &Path, members: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);

    for (name, contents) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(contents).unwrap();
    }
    writer.finish().unwrap();
}

/// Minimal results text with CRLF line endings
pub fn minimal_results_text() -> String {
    minimal_results().join("\r\n")
}
