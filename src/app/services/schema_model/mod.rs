//! Schema model for HY3 result files
//!
//! A declarative, versioned description of the fixed-width record layouts,
//! the code lookup tables and the region code table. A model is built once
//! (from the embedded documents or from files named in configuration),
//! validated, and then passed by reference to the decoder. It is never
//! mutated after construction.

use crate::config::SchemaConfig;
use crate::constants::{BUILTIN_REGION_CODES, BUILTIN_SCHEMA_DOCUMENT, SUPPORTED_SCHEMA_VERSIONS};
use crate::{Error, Result};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, info};

pub mod layout;
pub mod lookup;

#[cfg(test)]
pub mod tests;

pub use layout::{
    DateFormat, FieldSpan, MeetCoreLayout, MeetExtendedLayout, RecordLayouts, SwimmerLayout,
    TeamCoreLayout, TeamExtendedLayout, TeamOverride,
};
pub use lookup::{CodeLabel, LookupTables, RegionTable, TeamNameRule};

/// Immutable record layouts, lookups and region table
#[derive(Debug, Clone, PartialEq)]
pub struct SchemaModel {
    layouts: RecordLayouts,
    regions: RegionTable,
}

impl SchemaModel {
    /// Model built from the documents embedded in the binary
    pub fn builtin() -> Result<Self> {
        Self::from_documents(
            BUILTIN_SCHEMA_DOCUMENT,
            BUILTIN_REGION_CODES,
            "<builtin>",
            "<builtin regions>",
        )
    }

    /// Model from configuration; each document falls back to the embedded one
    pub fn load(config: &SchemaConfig) -> Result<Self> {
        let layout_source = config.model_path.as_deref();
        let region_source = config.region_codes_path.as_deref();

        let layout_json = match layout_source {
            Some(path) => read_document(path)?,
            None => BUILTIN_SCHEMA_DOCUMENT.to_string(),
        };
        let region_json = match region_source {
            Some(path) => read_document(path)?,
            None => BUILTIN_REGION_CODES.to_string(),
        };

        let model = Self::from_documents(
            &layout_json,
            &region_json,
            &describe(layout_source, "<builtin>"),
            &describe(region_source, "<builtin regions>"),
        )?;

        info!(
            schema = %describe(layout_source, "<builtin>"),
            version = model.version(),
            region_codes = model.regions.len(),
            "Loaded schema model"
        );
        Ok(model)
    }

    /// Parse and validate a layout document and a region table
    pub fn from_documents(
        layout_json: &str,
        region_json: &str,
        layout_label: &str,
        region_label: &str,
    ) -> Result<Self> {
        let layouts: RecordLayouts = serde_json::from_str(layout_json)
            .map_err(|e| Error::schema_parse(layout_label, e))?;
        let region_names: BTreeMap<String, Vec<String>> = serde_json::from_str(region_json)
            .map_err(|e| Error::schema_parse(region_label, e))?;

        let model = Self::from_parts(layouts, RegionTable::from_names(&region_names))?;
        debug!(
            layout = layout_label,
            version = model.layouts.schema_version,
            "Schema documents parsed"
        );
        Ok(model)
    }

    /// Assemble a model from already-built parts, validating the layouts
    pub fn from_parts(layouts: RecordLayouts, regions: RegionTable) -> Result<Self> {
        let model = Self { layouts, regions };
        model.validate()?;
        Ok(model)
    }

    /// Check structural soundness of the layout document
    pub fn validate(&self) -> Result<()> {
        let layouts = &self.layouts;

        if !SUPPORTED_SCHEMA_VERSIONS.contains(&layouts.schema_version) {
            return Err(Error::schema(format!(
                "Unsupported schema_version {} (supported: {:?})",
                layouts.schema_version, SUPPORTED_SCHEMA_VERSIONS
            )));
        }
        if layouts.record_code_length == 0 {
            return Err(Error::schema("record_code_length must be at least 1"));
        }

        let mut seen = HashSet::new();
        for (record, code) in layouts.record_codes() {
            if code.trim().is_empty() {
                return Err(Error::schema(format!("{} has an empty row_identifier", record)));
            }
            if code.chars().count() != layouts.record_code_length {
                return Err(Error::schema(format!(
                    "{} row_identifier '{}' is not {} characters long",
                    record, code, layouts.record_code_length
                )));
            }
            if !seen.insert(code) {
                return Err(Error::schema(format!(
                    "Duplicate row_identifier '{}' ({})",
                    code, record
                )));
            }
        }

        if let Some((field, span)) = layouts.spans().into_iter().find(|(_, s)| !s.is_valid()) {
            return Err(Error::schema(format!(
                "Field '{}' has an invalid span (start {}, length {})",
                field, span.start, span.length
            )));
        }

        Ok(())
    }

    pub fn layouts(&self) -> &RecordLayouts {
        &self.layouts
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.layouts.lookups
    }

    pub fn regions(&self) -> &RegionTable {
        &self.regions
    }

    pub fn version(&self) -> u32 {
        self.layouts.schema_version
    }

    /// Leading record-type code of a line
    ///
    /// Lines shorter than the code length yield the whole line.
    pub fn record_code<'a>(&self, line: &'a str) -> &'a str {
        let end = line
            .char_indices()
            .nth(self.layouts.record_code_length)
            .map(|(i, _)| i)
            .unwrap_or(line.len());
        &line[..end]
    }
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        Error::io(
            format!("Failed to read schema document {}", path.display()),
            e,
        )
    })
}

fn describe(path: Option<&Path>, builtin: &str) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| builtin.to_string())
}
