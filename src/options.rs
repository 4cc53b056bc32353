//! Launcher option grammar and resolved configuration.
//!
//! The launcher slice speaks POSIX-style short options: flags cluster
//! (`-nh`), values attach (`-uall`) or follow (`-u all`), and later
//! occurrences override earlier ones, which is what lets `.args` defaults
//! placed before the `...` sentinel stay overridable.

use std::path::{Path, PathBuf};

use crate::constants::{APP_SUFFIX, STATE_DIR};
use crate::error::{Error, Result};
use crate::paths::expand_tilde;
use crate::platform::Platform;

// =============================================================================
// Enumerated Values
// =============================================================================

/// Whether the extraction is overlaid onto the invocation directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Compose an overlay mount in a private namespace before exec.
    Mount,
    /// Plain extraction, run from the destination.
    None,
}

/// Which layer of the overlay is writable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Destination over the invocation directory (writes land in it).
    Over,
    /// Invocation directory over the destination.
    Under,
}

impl Orientation {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "over" => Some(Self::Over),
            "under" => Some(Self::Under),
            _ => None,
        }
    }
}

/// Per-entry extraction policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnzipPolicy {
    /// Overwrite existing, create missing.
    All,
    /// Create missing only; never touch existing files.
    New,
    /// Overwrite existing only; never create.
    Existing,
    /// Create missing; overwrite existing when the archive is newer.
    Update,
    /// Overwrite existing when the archive is newer; never create.
    Freshen,
    /// Do not extract at all.
    None,
}

impl UnzipPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "all" => Some(Self::All),
            "new" => Some(Self::New),
            "existing" => Some(Self::Existing),
            "update" => Some(Self::Update),
            "freshen" => Some(Self::Freshen),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Raw parse results; unset flags fall back to platform- and bundle-aware
/// defaults during [`Config::resolve`].
#[derive(Debug, Clone, Default)]
pub struct Options {
    pub mode: Option<Mode>,
    pub orientation: Option<Orientation>,
    pub unzip: Option<UnzipPolicy>,
    pub destination: Option<PathBuf>,
    pub work_dir: Option<PathBuf>,
    pub help: bool,
}

/// Parses the launcher slice.
///
/// Grammar: `-m -n -o over|under -u all|new|existing|update|freshen|none
/// -d path -w path -h`. Any non-option token is an error. `-h` stops the
/// scan on the spot: help-and-exit must win no matter what follows it.
pub fn parse(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        if arg == "--" {
            if iter.next().is_some() {
                return Err(Error::UnexpectedArgument);
            }
            break;
        }
        let flags = match arg.strip_prefix('-') {
            Some(flags) if !flags.is_empty() => flags,
            _ => return Err(Error::UnexpectedArgument),
        };

        let mut cluster = flags.char_indices();
        while let Some((pos, flag)) = cluster.next() {
            match flag {
                'm' => options.mode = Some(Mode::Mount),
                'n' => options.mode = Some(Mode::None),
                'h' => {
                    options.help = true;
                    return Ok(options);
                }
                'o' | 'u' | 'd' | 'w' => {
                    let attached = &flags[pos + flag.len_utf8()..];
                    let value = if attached.is_empty() {
                        iter.next()
                            .cloned()
                            .ok_or(Error::MissingFlagArgument(flag))?
                    } else {
                        attached.to_string()
                    };
                    match flag {
                        'o' => {
                            options.orientation = Some(
                                Orientation::parse(&value)
                                    .ok_or(Error::InvalidOrientation(value))?,
                            );
                        }
                        'u' => {
                            options.unzip = Some(
                                UnzipPolicy::parse(&value)
                                    .ok_or(Error::InvalidUnzipPolicy(value))?,
                            );
                        }
                        'd' => options.destination = Some(expand_tilde(&value)),
                        _ => options.work_dir = Some(expand_tilde(&value)),
                    }
                    break;
                }
                other => return Err(Error::UnknownFlag(other)),
            }
        }
    }

    Ok(options)
}

// =============================================================================
// Configuration
// =============================================================================

/// The resolved launcher configuration; immutable once constructed.
#[derive(Debug, Clone)]
pub struct Config {
    pub mode: Mode,
    pub orientation: Orientation,
    pub unzip: UnzipPolicy,
    /// Where extracted files land.
    pub destination: PathBuf,
    /// Overlay scratch space. `None` means a fresh temporary directory is
    /// generated when (and only when) the overlay is established. Overlay
    /// mounts require this to share a volume with the upper layer; `-w`
    /// exists for hosts where the system temp dir does not.
    pub work_dir: Option<PathBuf>,
}

impl Config {
    /// Computes defaults and validates platform constraints.
    ///
    /// `-m` on a platform without overlay support is an error; with no mode
    /// flag at all, overlay support picks the default. The default
    /// destination depends on the mode: extraction-in-place for `none`,
    /// a `.puisne/<name>.app` cache beside the binary for `mount`.
    pub fn resolve(
        options: Options,
        platform: &Platform,
        invocation_dir: &Path,
        name: &str,
    ) -> Result<Self> {
        if options.mode == Some(Mode::Mount) && !platform.supports_overlay_mount {
            return Err(Error::OverlayUnsupported);
        }
        let mode = options.mode.unwrap_or(if platform.supports_overlay_mount {
            Mode::Mount
        } else {
            Mode::None
        });

        let destination = options.destination.unwrap_or_else(|| match mode {
            Mode::None => invocation_dir.to_path_buf(),
            Mode::Mount => invocation_dir
                .join(STATE_DIR)
                .join(format!("{name}{APP_SUFFIX}")),
        });

        Ok(Self {
            mode,
            orientation: options.orientation.unwrap_or(Orientation::Over),
            unzip: options.unzip.unwrap_or(UnzipPolicy::Update),
            destination,
            work_dir: options.work_dir,
        })
    }
}
