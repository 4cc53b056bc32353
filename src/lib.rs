//! # puisne
//!
//! **Self-extracting, self-executing single-file application bundles.**
//!
//! A PUISNE binary is the concatenation of a launcher stub and a ZIP
//! archive. The archive holds an application directory `<name>.app/` with
//! an entry-point executable `<name>` inside, plus arbitrary resources.
//! On invocation the launcher inspects the embedded archive, selectively
//! extracts it, optionally overlays the extraction onto its own directory
//! inside a private mount namespace, and finally replaces itself with the
//! entry point, forwarding arguments so transparently that the launcher
//! behaves as a drop-in replacement for the packaged executable.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          puisne                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  argv ──► args (── partition) ──► options (-m -n -o -u ...) │
//! │                  ▲                                          │
//! │                  └── .args defaults from the archive        │
//! │                                                             │
//! │  bundle: walk central directory ──► Bundle { name, entries }│
//! │  extract: six policies against the destination tree         │
//! │  overlay: user+mount namespace, overlayfs over launcher dir │
//! │  launch:  resolve entry point, exec, never return           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Phases run strictly in order (partition, scan, defaults merge, option
//! parsing, extraction, overlay, exec), each either completing fully or
//! aborting the process with a `PUISNE:`-prefixed one-liner. The state the
//! phases share ([`Bundle`], [`Config`]) is built once and consumed
//! read-only; everything after the final exec belongs to the packaged
//! program.

pub mod args;
pub mod bundle;
pub mod constants;
pub mod error;
pub mod extract;
pub mod launch;
pub mod options;
#[cfg(target_os = "linux")]
pub mod overlay;
pub mod paths;
pub mod platform;

pub use bundle::{Archive, Bundle, EntryKind, ManifestEntry};
pub use error::{Error, Result};
pub use launch::ExecPlan;
pub use options::{Config, Mode, Options, Orientation, UnzipPolicy};
pub use platform::Platform;

use crate::constants::APP_SUFFIX;

/// Runs the launcher: on success control never comes back (the process
/// image is replaced), so an `Ok` return means an informational path was
/// taken (empty bundle, `-h`) and the process should exit 0.
pub fn run() -> Result<()> {
    let argv: Vec<String> = std::env::args().collect();
    let program = argv
        .first()
        .cloned()
        .unwrap_or_else(|| env!("CARGO_PKG_NAME").to_string());
    let invocation_dir = paths::invocation_dir(&program);

    let split = args::partition(&argv);

    let mut archive = Archive::open_running_binary()?;
    let Some(bundle) = archive.scan()? else {
        print!("{}", empty_bundle_notice(&program));
        print!("{}", archive.help_text()?);
        return Ok(());
    };

    let launcher_args = args::merge_defaults(&split.launcher, &archive.defaults()?);
    let options = options::parse(&launcher_args)?;
    if options.help {
        print!("{}", archive.help_text()?);
        return Ok(());
    }

    let platform = Platform::detect();
    let config = Config::resolve(options, &platform, &invocation_dir, &bundle.name)?;

    if config.unzip != UnzipPolicy::None {
        extract::extract(&mut archive, &bundle, &config)?;
    }
    // The extractor is done with the archive before any mount happens.
    drop(archive);

    if config.mode == Mode::Mount {
        #[cfg(target_os = "linux")]
        overlay::establish(&invocation_dir, &config)?;
    }

    let plan = ExecPlan::resolve(&config, &invocation_dir, &bundle.name, &split.passthrough)?;
    Err(plan.exec())
}

/// Guidance printed when the archive holds no application directory.
fn empty_bundle_notice(program: &str) -> String {
    format!(
        "This is an empty PUISNE.\n\
         Add an application folder to make this a self-contained bundle, eg.\n\
         \n   $ zip -r -D -g {program} app_name{APP_SUFFIX}\n\n\
         Printing help file...\n\n"
    )
}
