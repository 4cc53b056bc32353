//! Mount-namespace overlay composition (Linux only).
//!
//! Overlays the extracted destination onto the invocation directory inside
//! a private user+mount namespace, so the packaged program sees one merged
//! tree while the global namespace stays untouched.
//!
//! ## Unprivileged root trick
//!
//! An unprivileged caller unshares a user+mount namespace and maps itself
//! to UID/GID 0 there, which is what overlay mounting requires. After the
//! mounts, a second user-namespace unshare maps root back to the original
//! ids so the packaged program runs under the caller's identity view.
//!
//! ## Nested layers
//!
//! The kernel rejects overlay mounts whose upper and lower layers overlap.
//! The default layout nests the destination inside the invocation
//! directory, so whenever either layer canonically prefixes the other an
//! intermediate overlay is mounted inside the work directory first; the
//! real mount then uses that mount point as a decoupled lower layer.

use std::fs;
use std::path::{Path, PathBuf};

use nix::mount::{mount, MsFlags};
use nix::sched::{unshare, CloneFlags};
use nix::unistd::{getegid, geteuid};
use tracing::{debug, info};

use crate::constants::{
    DIR_MODE, INTERMEDIATE_MOUNT_DIR, INTERMEDIATE_WORK_DIR, OVERLAY_FSTYPE, PRIMARY_WORK_DIR,
    WORK_DIR_PREFIX,
};
use crate::error::{Error, Result};
use crate::options::{Config, Orientation};
use crate::paths::is_path_prefix;

/// Composes the overlay mount over the invocation directory.
pub fn establish(invocation_dir: &Path, config: &Config) -> Result<()> {
    let (upper, lower) = match config.orientation {
        Orientation::Over => (config.destination.clone(), invocation_dir.to_path_buf()),
        Orientation::Under => (invocation_dir.to_path_buf(), config.destination.clone()),
    };
    let work_dir = materialize_work_dir(config.work_dir.as_deref())?;

    let uid = geteuid().as_raw();
    let gid = getegid().as_raw();
    let unprivileged = uid != 0 || gid != 0;
    if unprivileged {
        become_namespace_root(uid, gid)?;
    }

    let (lower, work_dir) = if layers_overlap(&upper, &lower) {
        compose_intermediate(&lower, &work_dir)?
    } else {
        (lower, work_dir)
    };

    let data = overlay_data(&upper, &lower, &work_dir);
    mount(
        Some(OVERLAY_FSTYPE),
        invocation_dir,
        Some(OVERLAY_FSTYPE),
        MsFlags::empty(),
        Some(data.as_str()),
    )
    .map_err(|errno| Error::MountFailed {
        source: errno_io(errno),
    })?;
    info!(mount = %invocation_dir.display(), "overlay mounted");

    if unprivileged {
        redrop_privileges(uid, gid)?;
    }

    // cd .; a CWD that coincided with the mount point would otherwise keep
    // a handle to the pre-mount directory.
    let cwd = std::env::current_dir()?;
    std::env::set_current_dir(cwd)?;
    Ok(())
}

/// Creates the overlay scratch space: the explicit `-w` path as given, or a
/// fresh `puisne.`-prefixed temporary directory.
fn materialize_work_dir(explicit: Option<&Path>) -> Result<PathBuf> {
    match explicit {
        Some(path) => {
            make_scratch_dir(path)?;
            Ok(path.to_path_buf())
        }
        None => Ok(tempfile::Builder::new()
            .prefix(WORK_DIR_PREFIX)
            .tempdir()?
            .into_path()),
    }
}

/// True when the overlay layers overlap in either direction, which the
/// kernel's overlapping-layer check would reject.
fn layers_overlap(upper: &Path, lower: &Path) -> bool {
    is_path_prefix(upper, lower) || is_path_prefix(lower, upper)
}

/// Decouples the lower layer by interposing an overlay inside `work_dir`.
///
/// Returns the replacement `(lower, work_dir)` for the primary mount.
fn compose_intermediate(lower: &Path, work_dir: &Path) -> Result<(PathBuf, PathBuf)> {
    let inter_mnt = work_dir.join(INTERMEDIATE_MOUNT_DIR);
    let inter_wrk = work_dir.join(INTERMEDIATE_WORK_DIR);
    make_scratch_dir(&inter_mnt)?;
    make_scratch_dir(&inter_wrk)?;

    let data = overlay_data(&inter_mnt, lower, &inter_wrk);
    mount(
        Some(OVERLAY_FSTYPE),
        &inter_mnt,
        Some(OVERLAY_FSTYPE),
        MsFlags::empty(),
        Some(data.as_str()),
    )
    .map_err(|errno| Error::IntermediateMount {
        source: errno_io(errno),
    })?;
    debug!(mount = %inter_mnt.display(), "intermediate overlay mounted");

    let primary_work = work_dir.join(PRIMARY_WORK_DIR);
    make_scratch_dir(&primary_work)?;
    Ok((inter_mnt, primary_work))
}

/// Maps the caller to UID/GID 0 inside a fresh user+mount namespace.
fn become_namespace_root(uid: u32, gid: u32) -> Result<()> {
    unshare(CloneFlags::CLONE_NEWNS | CloneFlags::CLONE_NEWUSER).map_err(|errno| {
        Error::Unshare {
            source: errno_io(errno),
        }
    })?;
    write_proc_map("/proc/self/uid_map", &format!("0 {uid} 1\n"))?;
    write_proc_map("/proc/self/setgroups", "deny")?;
    write_proc_map("/proc/self/gid_map", &format!("0 {gid} 1\n"))?;
    Ok(())
}

/// Restores the original identity view inside yet another user namespace.
fn redrop_privileges(uid: u32, gid: u32) -> Result<()> {
    unshare(CloneFlags::CLONE_NEWUSER).map_err(|errno| Error::Unshare {
        source: errno_io(errno),
    })?;
    write_proc_map("/proc/self/uid_map", &format!("{uid} 0 1\n"))?;
    write_proc_map("/proc/self/setgroups", "deny")?;
    write_proc_map("/proc/self/gid_map", &format!("{gid} 0 1\n"))?;
    Ok(())
}

fn write_proc_map(path: &'static str, line: &str) -> Result<()> {
    fs::write(path, line).map_err(|source| Error::MapWrite { path, source })
}

fn overlay_data(upper: &Path, lower: &Path, work: &Path) -> String {
    format!(
        "upperdir={},lowerdir={},workdir={}",
        upper.display(),
        lower.display(),
        work.display()
    )
}

fn make_scratch_dir(path: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new()
        .recursive(true)
        .mode(DIR_MODE)
        .create(path)
        .map_err(|_| Error::IntermediateDir {
            path: path.to_path_buf(),
        })
}

fn errno_io(errno: nix::errno::Errno) -> std::io::Error {
    std::io::Error::from_raw_os_error(errno as i32)
}
