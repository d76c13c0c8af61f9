//! Archive member listing and classification

use crate::constants::{PRIMARY_MEMBER_EXTENSION, SECONDARY_MEMBER_EXTENSION};
use std::io::{Read, Seek};
use std::path::{Path, PathBuf};
use zip::ZipArchive;

/// One file entry of an archive, in central directory order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub index: usize,
    pub name: String,

    /// Relative path safe to join onto the extraction directory
    pub safe_path: Option<PathBuf>,
}

impl Member {
    pub fn has_extension(&self, extension: &str) -> bool {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension))
    }

    pub fn is_primary(&self) -> bool {
        self.has_extension(PRIMARY_MEMBER_EXTENSION)
    }

    pub fn is_secondary(&self) -> bool {
        self.has_extension(SECONDARY_MEMBER_EXTENSION)
    }
}

/// List file members (directories skipped) in listing order
pub fn list_members<R: Read + Seek>(archive: &mut ZipArchive<R>) -> zip::result::ZipResult<Vec<Member>> {
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        if entry.is_dir() {
            continue;
        }
        members.push(Member {
            index,
            name: entry.name().to_string(),
            safe_path: entry.enclosed_name(),
        });
    }
    Ok(members)
}

/// Members split by role
#[derive(Debug, Default)]
pub struct MemberInventory {
    pub primary: Vec<Member>,
    pub secondary: Vec<Member>,
    pub all_names: Vec<String>,
}

impl MemberInventory {
    pub fn from_members(members: Vec<Member>) -> Self {
        let all_names = members.iter().map(|m| m.name.clone()).collect();
        let (primary, rest): (Vec<_>, Vec<_>) = members.into_iter().partition(Member::is_primary);
        let secondary = rest.into_iter().filter(Member::is_secondary).collect();
        Self {
            primary,
            secondary,
            all_names,
        }
    }
}
