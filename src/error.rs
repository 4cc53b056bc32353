//! Error types for the launcher runtime.

use std::path::PathBuf;

/// Result type alias for launcher operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the launcher runtime.
///
/// Every variant maps to a one-line `PUISNE:`-prefixed stderr message and a
/// nonzero exit. There is no local recovery: each phase either succeeds
/// fully or aborts the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Archive Structure Errors
    // =========================================================================
    /// A top-level member without a directory component.
    #[error("additional file `{0}` in top level!")]
    AdditionalTopLevelFile(String),

    /// A top-level directory that does not end in `.app`.
    #[error("problematic top-level folder `{0}`!")]
    InvalidTopLevelFolder(String),

    /// A lone `.app/` directory with no name before the suffix.
    #[error("invalid app folder `.app`!")]
    EmptyAppName,

    /// Two or more distinct `<name>.app/` roots.
    #[error("found multiple top level app folders!")]
    MultipleAppFolders,

    // =========================================================================
    // Argument Errors
    // =========================================================================
    /// Flag not in the launcher grammar.
    #[error("found unrecognized argument -{0}!")]
    UnknownFlag(char),

    /// Value-taking flag at the end of the launcher slice.
    #[error("missing arg for -{0}!")]
    MissingFlagArgument(char),

    /// `-o` argument outside the orientation set.
    #[error("argument to -o must be in {{over,under}}!")]
    InvalidOrientation(String),

    /// `-u` argument outside the policy set.
    #[error("argument to -u must be in {{all,new,existing,update,freshen,none}}!")]
    InvalidUnzipPolicy(String),

    /// Non-option token in the launcher slice.
    #[error("found non-option arguments!")]
    UnexpectedArgument,

    /// `-m` requested on a platform without overlay-mount support.
    #[error("need Linux kernel >= 5.12.0 to mount!")]
    OverlayUnsupported,

    // =========================================================================
    // Archive Access & I/O Errors
    // =========================================================================
    /// The embedded help text is missing or unreadable.
    #[error("zip error reading help file!")]
    HelpUnreadable,

    /// An archive member could not be located or streamed.
    #[error("zip error reading file `{name}`!")]
    MemberRead { name: String },

    /// A destination file could not be created or written.
    #[error("write error extracting `{}`.", path.display())]
    ExtractWrite { path: PathBuf },

    /// The destination root (or a parent under it) could not be created.
    #[error("couldn't make app folder `{}`!", path.display())]
    DestinationDir { path: PathBuf },

    /// An overlay scratch directory could not be created.
    #[error("could not make intermediate directory `{}`!", path.display())]
    IntermediateDir { path: PathBuf },

    /// Structural failure in the embedded archive.
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Generic I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // =========================================================================
    // Namespace & Mount Errors
    // =========================================================================
    /// `unshare(2)` refused the requested namespaces.
    #[error("could not unshare into a new namespace: {source}")]
    Unshare { source: std::io::Error },

    /// A `/proc/self/*` identity map could not be written.
    #[error("could not write `{path}`: {source}")]
    MapWrite {
        path: &'static str,
        source: std::io::Error,
    },

    /// The decoupling overlay for nested layers failed to mount.
    #[error("intermediate mount failed: {source}")]
    IntermediateMount { source: std::io::Error },

    /// The primary overlay failed to mount.
    #[error("overlay mount failed: {source}")]
    MountFailed { source: std::io::Error },

    // =========================================================================
    // Execution Errors
    // =========================================================================
    /// The entry point does not exist or cannot be resolved.
    #[error("cannot resolve entry point `{}`: {source}", path.display())]
    EntryPoint {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The exec-family call returned.
    #[error("execution error: {source}")]
    Exec { source: std::io::Error },
}

impl Error {
    /// Process exit status for this failure.
    ///
    /// A returned `exec` exits with the syscall's return value widened to an
    /// exit status, as the launcher always has; everything else exits 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Exec { .. } => 255,
            _ => 1,
        }
    }
}
