//! PUISNE launcher binary.
//!
//! Thin shell around [`puisne::run`]: every failure becomes one
//! `PUISNE:`-prefixed line on stderr and a nonzero exit. On the success
//! path `run` never returns; the process image has been replaced by the
//! packaged entry point.

fn main() {
    if let Err(err) = puisne::run() {
        eprintln!("PUISNE: {err}");
        std::process::exit(err.exit_code());
    }
}
