//! Selective extraction of bundle members onto the destination tree.
//!
//! Each manifest entry is judged against the configured policy and the
//! state of its destination path, then either skipped or written. Member
//! bytes are streamed straight from the archive into the destination file;
//! whole files are never materialized in memory.
//!
//! The freshness comparison uses the destination's **status-change time**,
//! not its modification time. Freshly extracted files have the two in
//! lockstep, which is the case the comparison exists for; a later `chmod`
//! on a destination file will make it look newer than it is.

use std::fs::{self, File};
use std::path::Path;

use tracing::debug;

use crate::bundle::{Archive, Bundle, EntryKind, ManifestEntry};
use crate::constants::{DEFAULT_FILE_MODE, DIR_MODE};
use crate::error::{Error, Result};
use crate::options::{Config, UnzipPolicy};

/// Applies the configured extraction policy to every bundle entry.
///
/// The destination root is created first; failing to create it is fatal.
pub fn extract(archive: &mut Archive, bundle: &Bundle, config: &Config) -> Result<()> {
    make_dir_tree(&config.destination, DIR_MODE).map_err(|_| Error::DestinationDir {
        path: config.destination.clone(),
    })?;

    for entry in &bundle.entries {
        if entry.relative_path.is_empty() {
            continue;
        }
        let dest = config.destination.join(&entry.relative_path);
        if !wants_extract(config.unzip, status_change_time(&dest), entry.mtime) {
            continue;
        }
        write_entry(archive, bundle, entry, &dest)?;
    }
    Ok(())
}

/// Policy decision for a single entry.
///
/// `fs_ctime` is the destination's status-change time, or `None` when the
/// destination does not exist yet. Under `update` and `freshen` an existing
/// destination is overwritten only when the archive timestamp strictly
/// exceeds it.
pub fn wants_extract(policy: UnzipPolicy, fs_ctime: Option<i64>, archive_mtime: i64) -> bool {
    match (policy, fs_ctime) {
        (UnzipPolicy::All, _) => true,
        (UnzipPolicy::New, existing) => existing.is_none(),
        (UnzipPolicy::Existing, existing) => existing.is_some(),
        (UnzipPolicy::Update, None) => true,
        (UnzipPolicy::Update, Some(ctime)) | (UnzipPolicy::Freshen, Some(ctime)) => {
            archive_mtime > ctime
        }
        (UnzipPolicy::Freshen, None) => false,
        (UnzipPolicy::None, _) => false,
    }
}

fn write_entry(
    archive: &mut Archive,
    bundle: &Bundle,
    entry: &ManifestEntry,
    dest: &Path,
) -> Result<()> {
    debug!(path = %dest.display(), "extracting");

    if entry.kind == EntryKind::Directory {
        return make_dir_tree(dest, entry.mode.unwrap_or(DIR_MODE)).map_err(|_| {
            Error::DestinationDir {
                path: dest.to_path_buf(),
            }
        });
    }

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            make_dir_tree(parent, DIR_MODE).map_err(|_| Error::ExtractWrite {
                path: dest.to_path_buf(),
            })?;
        }
    }

    let mut out = File::create(dest).map_err(|_| Error::ExtractWrite {
        path: dest.to_path_buf(),
    })?;
    archive.copy_member(&bundle.member_name(entry), &mut out)?;
    drop(out);

    set_mode(dest, entry.mode.unwrap_or(DEFAULT_FILE_MODE))
}

/// Status-change time of `path` in epoch seconds; `None` when absent.
fn status_change_time(path: &Path) -> Option<i64> {
    let metadata = fs::metadata(path).ok()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        Some(metadata.ctime())
    }

    #[cfg(not(unix))]
    {
        metadata
            .modified()
            .ok()
            .and_then(|stamp| stamp.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|elapsed| elapsed.as_secs() as i64)
    }
}

#[cfg(unix)]
fn make_dir_tree(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(mode & 0o7777)
        .create(path)
}

#[cfg(not(unix))]
fn make_dir_tree(path: &Path, _mode: u32) -> std::io::Result<()> {
    fs::create_dir_all(path)
}

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode & 0o7777))?;
    Ok(())
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
