//! Stdout logging for the REPL.
//!
//! INFO+ by default; override with `RUST_LOG` (e.g. `RUST_LOG=debug`).

use tracing_subscriber::EnvFilter;

pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
