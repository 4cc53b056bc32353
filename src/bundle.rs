//! Embedded-archive inspection.
//!
//! A PUISNE binary is a launcher stub with a ZIP archive appended; the ZIP
//! central directory is located from the end of the file, so the archive
//! reads the same whether or not a stub precedes it. This module walks that
//! central directory, classifies each member, and derives the bundle's
//! identity.
//!
//! ## Classification
//!
//! Rules applied in order, first match wins:
//!
//! 1. `puisne/*` - launcher metadata (help text), discarded
//! 2. `.args*` - embedded defaults, discarded
//! 3. `.cosmo*` - toolchain metadata, discarded
//! 4. `usr/share/zoneinfo/*` - timezone database, discarded
//!
//! Everything else must live under a single top-level `<name>.app/`
//! directory; any other top-level shape is a structural error. Archives
//! with no bundle at all are valid - the launcher prints guidance instead
//! of running anything.
//!
//! ## Timestamps
//!
//! ZIP members carry DOS timestamps in local time. The local offset from
//! GMT is sampled once per scan and every member timestamp is shifted by
//! it, so the extractor's `update`/`freshen` comparisons work in epoch
//! seconds like the filesystem's.

use std::fs::File;
use std::io::{self, Read, Write};
use std::path::Path;

use chrono::{Local, NaiveDate, Offset};
use tracing::debug;
use zip::ZipArchive;

use crate::constants::{
    APP_SUFFIX, DEFAULTS_MEMBER, HELP_MEMBER, RESERVED_DEFAULTS_PREFIX, RESERVED_LAUNCHER_PREFIX,
    RESERVED_TOOLCHAIN_PREFIX, RESERVED_ZONEINFO_PREFIX,
};
use crate::error::{Error, Result};

// =============================================================================
// Manifest Types
// =============================================================================

/// Whether a manifest entry is a plain file or an explicit directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One archive member belonging to the bundle.
#[derive(Debug, Clone)]
pub struct ManifestEntry {
    /// Path relative to the `<name>.app/` root (prefix stripped). Empty for
    /// the app directory's own entry; the extractor skips those.
    pub relative_path: String,
    /// Recorded unix permissions, when the archive carries them.
    pub mode: Option<u32>,
    /// Modification time in epoch seconds, local-time corrected.
    pub mtime: i64,
    pub kind: EntryKind,
}

/// The discovered bundle: its name and the members beneath its root.
///
/// Constructed once per process by [`Archive::scan`] and consumed read-only
/// by the extractor and the launcher.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// App name, from the top-level directory with the `.app` suffix shorn.
    pub name: String,
    /// Members in central-directory order.
    pub entries: Vec<ManifestEntry>,
}

impl Bundle {
    /// Full archive member name for one of this bundle's entries.
    pub fn member_name(&self, entry: &ManifestEntry) -> String {
        format!("{}{}/{}", self.name, APP_SUFFIX, entry.relative_path)
    }
}

// =============================================================================
// Archive Access
// =============================================================================

/// Read access to the ZIP archive embedded in the launcher binary.
pub struct Archive {
    zip: ZipArchive<File>,
}

impl Archive {
    /// Opens the archive appended to an arbitrary file.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let zip = ZipArchive::new(file)?;
        Ok(Self { zip })
    }

    /// Opens the archive appended to the running binary.
    pub fn open_running_binary() -> Result<Self> {
        let exe = std::env::current_exe()?;
        Self::open(&exe)
    }

    /// Walks the central directory and builds the bundle manifest.
    ///
    /// Returns `None` for an empty bundle (reserved members only). Structural
    /// violations surface as errors.
    pub fn scan(&mut self) -> Result<Option<Bundle>> {
        let offset = local_utc_offset();
        let mut name: Option<String> = None;
        let mut entries = Vec::with_capacity(self.zip.len());

        for index in 0..self.zip.len() {
            let member = self.zip.by_index_raw(index)?;
            let member_name = member.name().to_string();

            let (head, tail) = match classify(&member_name)? {
                Classification::Reserved => continue,
                Classification::Bundle {
                    name,
                    relative_path,
                } => (name, relative_path),
            };

            match &name {
                Some(existing) if *existing != head => return Err(Error::MultipleAppFolders),
                Some(_) => {}
                None => name = Some(head),
            }

            let kind = if member_name.ends_with('/') {
                EntryKind::Directory
            } else {
                EntryKind::File
            };
            let mtime = member
                .last_modified()
                .map(|stamp| dos_time_to_unix(stamp, offset))
                .unwrap_or(0);

            entries.push(ManifestEntry {
                relative_path: tail,
                mode: member.unix_mode(),
                mtime,
                kind,
            });
        }

        Ok(name.map(|name| {
            debug!(name = %name, entries = entries.len(), "scanned bundle");
            Bundle { name, entries }
        }))
    }

    /// Reads the embedded help text.
    pub fn help_text(&mut self) -> Result<String> {
        let mut member = self.zip.by_name(HELP_MEMBER).map_err(|_| Error::HelpUnreadable)?;
        let mut text = String::new();
        member
            .read_to_string(&mut text)
            .map_err(|_| Error::HelpUnreadable)?;
        Ok(text)
    }

    /// Reads the `.args` defaults, one token per line; empty when absent.
    pub fn defaults(&mut self) -> Result<Vec<String>> {
        let mut member = match self.zip.by_name(DEFAULTS_MEMBER) {
            Ok(member) => member,
            Err(zip::result::ZipError::FileNotFound) => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };
        let mut text = String::new();
        member.read_to_string(&mut text).map_err(|_| Error::MemberRead {
            name: DEFAULTS_MEMBER.to_string(),
        })?;
        Ok(crate::args::tokenize_defaults(&text))
    }

    /// Streams one member's bytes into `out` through a fixed-size buffer.
    pub fn copy_member(&mut self, name: &str, out: &mut dyn Write) -> Result<u64> {
        let mut member = self.zip.by_name(name).map_err(|_| Error::MemberRead {
            name: name.to_string(),
        })?;
        io::copy(&mut member, out).map_err(|_| Error::MemberRead {
            name: name.to_string(),
        })
    }
}

// =============================================================================
// Member Classification
// =============================================================================

enum Classification {
    Reserved,
    Bundle { name: String, relative_path: String },
}

/// Applies the ordered classification rules to one member name.
fn classify(member: &str) -> Result<Classification> {
    const RESERVED: [&str; 4] = [
        RESERVED_LAUNCHER_PREFIX,
        RESERVED_DEFAULTS_PREFIX,
        RESERVED_TOOLCHAIN_PREFIX,
        RESERVED_ZONEINFO_PREFIX,
    ];
    if RESERVED.iter().any(|prefix| member.starts_with(prefix)) {
        return Ok(Classification::Reserved);
    }

    let (head, tail) = member
        .split_once('/')
        .ok_or_else(|| Error::AdditionalTopLevelFile(member.to_string()))?;

    let name = head
        .strip_suffix(APP_SUFFIX)
        .ok_or_else(|| Error::InvalidTopLevelFolder(head.to_string()))?;
    if name.is_empty() {
        return Err(Error::EmptyAppName);
    }

    Ok(Classification::Bundle {
        name: name.to_string(),
        relative_path: tail.to_string(),
    })
}

// =============================================================================
// Timestamp Conversion
// =============================================================================

/// Local offset from GMT in seconds, per the current timezone database.
fn local_utc_offset() -> i64 {
    i64::from(Local::now().offset().fix().local_minus_utc())
}

/// Converts a DOS timestamp (local wall-clock fields) to epoch seconds.
fn dos_time_to_unix(stamp: zip::DateTime, offset_seconds: i64) -> i64 {
    NaiveDate::from_ymd_opt(
        i32::from(stamp.year()),
        u32::from(stamp.month()),
        u32::from(stamp.day()),
    )
    .and_then(|date| {
        date.and_hms_opt(
            u32::from(stamp.hour()),
            u32::from(stamp.minute()),
            u32::from(stamp.second()),
        )
    })
    .map(|naive| naive.and_utc().timestamp() - offset_seconds)
    .unwrap_or(0)
}
