//! Constants for the launcher runtime.
//!
//! Reserved archive names, on-disk layout pieces, and the kernel floor are
//! defined here so the phases agree on them without magic strings.

// =============================================================================
// Archive Layout
// =============================================================================

/// Suffix the single top-level application directory must carry.
pub const APP_SUFFIX: &str = ".app";

/// Reserved prefix for launcher metadata members (help text lives here).
pub const RESERVED_LAUNCHER_PREFIX: &str = "puisne/";

/// Reserved prefix for the embedded defaults file.
pub const RESERVED_DEFAULTS_PREFIX: &str = ".args";

/// Reserved prefix for toolchain metadata baked into the stub.
pub const RESERVED_TOOLCHAIN_PREFIX: &str = ".cosmo";

/// Reserved prefix for the embedded timezone database.
pub const RESERVED_ZONEINFO_PREFIX: &str = "usr/share/zoneinfo/";

/// Member holding the help text printed by `-h` and the empty-bundle path.
pub const HELP_MEMBER: &str = "puisne/help.txt";

/// Member holding default launcher arguments, one token per line.
pub const DEFAULTS_MEMBER: &str = ".args";

/// Line in the defaults file that splices in the CLI launcher slice.
pub const ARGS_SENTINEL: &str = "...";

// =============================================================================
// Platform Floor
// =============================================================================

/// Minimum kernel for unprivileged overlay mounts in a user namespace.
/// Overlayfs in user namespaces needs 5.11; 5.12 adds the `uid_map` rule
/// that closes the associated security hole.
pub const MIN_OVERLAY_KERNEL: (u32, u32, u32) = (5, 12, 0);

// =============================================================================
// On-Disk Layout
// =============================================================================

/// Directory under the invocation dir holding default extraction trees.
pub const STATE_DIR: &str = ".puisne";

/// Basename prefix for generated overlay work directories.
pub const WORK_DIR_PREFIX: &str = "puisne.";

/// Mode for the destination root and created parent directories.
pub const DIR_MODE: u32 = 0o755;

/// Fallback mode for file members without recorded unix permissions.
pub const DEFAULT_FILE_MODE: u32 = 0o644;

// =============================================================================
// Overlay Scratch Names
// =============================================================================

/// Mount point (and upper layer) of the intermediate overlay.
pub const INTERMEDIATE_MOUNT_DIR: &str = "inter.mnt";

/// Work directory of the intermediate overlay.
pub const INTERMEDIATE_WORK_DIR: &str = "inter.wrk";

/// Work directory of the primary overlay once an intermediate exists.
pub const PRIMARY_WORK_DIR: &str = "over.wrk";

/// Filesystem type string passed to `mount(2)`.
pub const OVERLAY_FSTYPE: &str = "overlay";
