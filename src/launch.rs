//! Entry-point resolution and the exec hand-off.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::options::{Config, Mode};

/// A fully resolved child invocation.
///
/// Building the plan is separated from executing it: the terminal exec
/// replaces the process image and cannot be observed from a test, so tests
/// assert on the plan instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecPlan {
    /// Program image to execute.
    pub program: PathBuf,
    /// Arguments after `argv[0]`.
    pub args: Vec<String>,
}

impl ExecPlan {
    /// Resolves the entry point and assembles the child argv.
    ///
    /// Without a mount the entry point runs from the destination; with one,
    /// the overlay has already arranged for it to be visible in the
    /// invocation directory.
    pub fn resolve(
        config: &Config,
        invocation_dir: &Path,
        name: &str,
        passthrough: &[String],
    ) -> Result<Self> {
        let run_dir = match config.mode {
            Mode::None => config.destination.as_path(),
            Mode::Mount => invocation_dir,
        };
        let entry = run_dir.join(name);
        let entry = entry
            .canonicalize()
            .map_err(|source| Error::EntryPoint { path: entry, source })?;
        Ok(plan_for(entry, passthrough))
    }

    /// Replaces the current process image. Returns only on failure.
    #[cfg(unix)]
    pub fn exec(self) -> Error {
        use std::os::unix::process::CommandExt;
        let source = std::process::Command::new(&self.program)
            .args(&self.args)
            .exec();
        Error::Exec { source }
    }

    /// Runs the child to completion and exits with its status; Windows has
    /// no true exec. Returns only on spawn failure.
    #[cfg(windows)]
    pub fn exec(self) -> Error {
        match std::process::Command::new(&self.program)
            .args(&self.args)
            .status()
        {
            Ok(status) => std::process::exit(status.code().unwrap_or(0)),
            Err(source) => Error::Exec { source },
        }
    }
}

#[cfg(not(windows))]
fn plan_for(entry: PathBuf, passthrough: &[String]) -> ExecPlan {
    ExecPlan {
        program: entry,
        args: passthrough.to_vec(),
    }
}

/// Dispatch through `cmd.exe /C` so entry points without an `.exe` suffix
/// still launch via the shell's file-type associations.
#[cfg(windows)]
fn plan_for(entry: PathBuf, passthrough: &[String]) -> ExecPlan {
    let system_root = std::env::var_os("SystemRoot")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(r"C:\Windows"));
    let mut args = vec!["/C".to_string(), entry.display().to_string()];
    args.extend_from_slice(passthrough);
    ExecPlan {
        program: system_root.join("System32").join("cmd.exe"),
        args,
    }
}
