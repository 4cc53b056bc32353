//! Argv partitioning between the launcher and the packaged program.
//!
//! The launcher must behave as a drop-in replacement for the packaged
//! executable, so by default the whole command line is forwarded untouched.
//! Only a leading `--` opens a launcher slice, and a second `--` closes it:
//!
//! ```text
//! program [-- launcher-args [-- passthrough-args]]
//! ```
//!
//! After the CLI partition, the embedded `.args` defaults are merged into
//! the launcher slice. `.args` can never reach the passthrough slice; the
//! `--` partition happens first.

use crate::constants::ARGS_SENTINEL;

/// CLI argv split at the `--` sentinels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitArgs {
    /// Arguments consumed by the launcher itself.
    pub launcher: Vec<String>,
    /// Arguments forwarded verbatim to the entry point.
    pub passthrough: Vec<String>,
}

/// Splits process argv into launcher and passthrough slices.
pub fn partition(argv: &[String]) -> SplitArgs {
    let Some(first) = argv.get(1) else {
        return SplitArgs::default();
    };
    if first != "--" {
        return SplitArgs {
            launcher: Vec::new(),
            passthrough: argv[1..].to_vec(),
        };
    }

    let rest = &argv[2..];
    match rest.iter().position(|arg| arg == "--") {
        Some(stop) => SplitArgs {
            launcher: rest[..stop].to_vec(),
            passthrough: rest[stop + 1..].to_vec(),
        },
        None => SplitArgs {
            launcher: rest.to_vec(),
            passthrough: Vec::new(),
        },
    }
}

/// Tokenizes the `.args` defaults file: one whitespace-stripped token per
/// line, blank lines dropped.
pub fn tokenize_defaults(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(String::from)
        .collect()
}

/// Merges the CLI launcher slice with the embedded defaults.
///
/// Without a `...` sentinel the defaults apply only when the CLI slice is
/// empty. With it, each sentinel line is replaced by the CLI slice, so
/// defaults before `...` are overridable and tokens after it win.
pub fn merge_defaults(cli: &[String], defaults: &[String]) -> Vec<String> {
    if defaults.is_empty() {
        return cli.to_vec();
    }
    if !defaults.iter().any(|token| token == ARGS_SENTINEL) {
        return if cli.is_empty() {
            defaults.to_vec()
        } else {
            cli.to_vec()
        };
    }

    let mut merged = Vec::with_capacity(defaults.len() + cli.len());
    for token in defaults {
        if token == ARGS_SENTINEL {
            merged.extend_from_slice(cli);
        } else {
            merged.push(token.clone());
        }
    }
    merged
}
