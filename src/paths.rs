//! Path helpers shared by the launcher phases.

use std::path::{Path, PathBuf};

/// Expands a leading `~` to the user's home directory.
///
/// Expansion is suppressed when a literal directory named `~` exists in the
/// current working directory, so paths the shell left untouched on purpose
/// stay untouched here too. Paths arriving from the embedded defaults file
/// never saw a shell, which is why this exists at all.
pub fn expand_tilde(path: &str) -> PathBuf {
    match home_dir() {
        Some(home) if !Path::new("~").is_dir() => expand_tilde_in(path, &home),
        _ => PathBuf::from(path),
    }
}

/// Replaces a leading `~` in `path` with `home`, by plain concatenation.
pub fn expand_tilde_in(path: &str, home: &Path) -> PathBuf {
    match path.strip_prefix('~') {
        Some(rest) => {
            let mut expanded = home.as_os_str().to_os_string();
            expanded.push(rest);
            PathBuf::from(expanded)
        }
        None => PathBuf::from(path),
    }
}

fn home_dir() -> Option<PathBuf> {
    if cfg!(windows) {
        std::env::var_os("userprofile").map(PathBuf::from)
    } else {
        dirs::home_dir()
    }
}

/// Directory containing the running binary, derived from `argv[0]`.
///
/// Resolved before any chdir; a bare program name means the binary sits in
/// the current directory.
pub fn invocation_dir(argv0: &str) -> PathBuf {
    match Path::new(argv0).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// True when canonicalized `a` equals `b` or is a path-component ancestor
/// of it. False when either path cannot be canonicalized.
pub fn is_path_prefix(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => b.starts_with(a),
        _ => false,
    }
}
