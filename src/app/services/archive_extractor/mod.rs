//! Archive extractor for result containers
//!
//! A result archive is a zip container holding one primary results member
//! (`.hy3`) and optionally a secondary member (`.cl2`). The extractor picks
//! the primary member, writes it into a scoped temporary directory, decodes
//! it and returns the bundle. Every problem with the archive itself is
//! reported as a warning on the bundle; extraction never returns an error.
//! The temporary directory is removed when extraction returns, whatever the
//! outcome.

pub mod members;

#[cfg(test)]
pub mod tests;

pub use members::{Member, MemberInventory};

use crate::app::models::{DecodeWarning, DecodedBundle, WarningKind};
use crate::app::services::hy3_decoder::Hy3Decoder;
use crate::app::services::schema_model::SchemaModel;
use crate::constants::DEFAULT_TEMP_PREFIX;
use crate::{Error, Result};
use members::list_members;
use serde_json::json;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

/// Extracts and decodes the primary member of result archives
#[derive(Debug, Clone)]
pub struct ArchiveExtractor<'a> {
    schema: &'a SchemaModel,
    temp_prefix: String,
    temp_root: Option<PathBuf>,
}

impl<'a> ArchiveExtractor<'a> {
    pub fn new(schema: &'a SchemaModel) -> Self {
        Self {
            schema,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            temp_root: None,
        }
    }

    /// Prefix of the scoped extraction directory name
    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Create extraction directories under `root` instead of the system temp dir
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    /// Extract and decode `archive_path`
    pub fn extract(&self, archive_path: &Path) -> DecodedBundle {
        let archive_name = archive_path.display().to_string();

        if !archive_path.exists() {
            warn!(archive = %archive_name, "Archive not found");
            return DecodedBundle::aborted(
                DecodeWarning::new(WarningKind::FileNotFound, format!("File not found: {}", archive_name))
                    .with_context(json!({ "path": archive_name })),
            );
        }

        let mut archive = match open_archive(archive_path) {
            Ok(archive) => archive,
            Err(e) => return unreadable(&archive_name, &e),
        };
        let inventory = match list_members(&mut archive) {
            Ok(members) => MemberInventory::from_members(members),
            Err(e) => return unreadable(&archive_name, &Error::archive(&archive_name, e)),
        };

        if inventory.primary.is_empty() {
            warn!(archive = %archive_name, "Archive has no primary results member");
            return DecodedBundle::aborted(
                DecodeWarning::new(
                    WarningKind::MissingPrimaryFile,
                    format!("Archive does not contain a .hy3 file: {}", archive_name),
                )
                .with_context(json!({ "files": inventory.all_names })),
            );
        }

        let mut warnings = Vec::new();
        if inventory.primary.len() > 1 {
            let names: Vec<&str> = inventory.primary.iter().map(|m| m.name.as_str()).collect();
            warnings.push(
                DecodeWarning::new(
                    WarningKind::MultiplePrimaryCandidates,
                    format!("Multiple .hy3 files found; using {}", names[0]),
                )
                .with_context(json!({ "files": names })),
            );
        }
        if inventory.secondary.is_empty() {
            warnings.push(DecodeWarning::new(
                WarningKind::MissingSecondaryFile,
                "Archive does not contain a .cl2 file",
            ));
        }

        let chosen = &inventory.primary[0];
        let Some(relative) = chosen.safe_path.as_deref() else {
            warnings.push(
                DecodeWarning::new(
                    WarningKind::UnsafeMemberName,
                    format!("Refusing to extract member with unsafe name '{}'", chosen.name),
                )
                .with_context(json!({ "member": chosen.name })),
            );
            return DecodedBundle {
                warnings,
                ..DecodedBundle::default()
            };
        };

        let text = match self.extract_member(&mut archive, chosen.index, relative, &archive_name) {
            Ok(text) => text,
            Err(e) => {
                let mut bundle = unreadable(&archive_name, &e);
                warnings.append(&mut bundle.warnings);
                bundle.warnings = warnings;
                return bundle;
            }
        };

        let mut bundle = Hy3Decoder::new(self.schema).decode_text(&text);
        warnings.append(&mut bundle.warnings);
        bundle.warnings = warnings;

        debug!(
            archive = %archive_name,
            member = %chosen.name,
            warnings = bundle.warnings.len(),
            "Extracted results member"
        );
        bundle
    }

    /// Write one member into a fresh scoped directory and read it back as text
    ///
    /// Undecodable bytes are replaced, never rejected.
    fn extract_member(
        &self,
        archive: &mut ZipArchive<File>,
        index: usize,
        relative: &Path,
        display: &str,
    ) -> Result<String> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(&self.temp_prefix);
        let scratch = match &self.temp_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| Error::io("Failed to create extraction directory", e))?;

        let target = scratch.path().join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| Error::io(format!("Failed to create {}", parent.display()), e))?;
        }

        let mut entry = archive
            .by_index(index)
            .map_err(|e| Error::archive(display, e))?;
        let mut output = File::create(&target)
            .map_err(|e| Error::io(format!("Failed to create {}", target.display()), e))?;
        io::copy(&mut entry, &mut output)
            .map_err(|e| Error::io(format!("Failed to extract {}", entry.name()), e))?;
        drop(output);

        let bytes = fs::read(&target)
            .map_err(|e| Error::io(format!("Failed to read {}", target.display()), e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Extract and decode with the default extractor settings
pub fn extract_archive(archive_path: &Path, schema: &SchemaModel, temp_prefix: &str) -> DecodedBundle {
    ArchiveExtractor::new(schema)
        .with_temp_prefix(temp_prefix)
        .extract(archive_path)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let display = path.display().to_string();
    let file = File::open(path).map_err(|e| Error::io(format!("Failed to open {}", display), e))?;
    ZipArchive::new(file).map_err(|e| Error::archive(display, e))
}

fn unreadable(archive_name: &str, error: &Error) -> DecodedBundle {
    warn!(archive = %archive_name, error = %error, "Archive could not be read");
    DecodedBundle::aborted(
        DecodeWarning::new(
            WarningKind::UnreadableArchive,
            format!("Unreadable archive {}: {}", archive_name, error),
        )
        .with_context(json!({ "path": archive_name })),
    )
}
