//! `verify`: check a package archive's signature before installation.

mod cli;
mod verify_cmd;

use clap::Parser;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    init_tracing();

    let cli = cli::Cli::parse();
    match verify_cmd::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            verify_cmd::report(&e);
            ExitCode::FAILURE
        }
    }
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
