// SPDX-License-Identifier: MIT OR Apache-2.0

//! rgrank - BM25-ranked search over ripgrep matches
//!
//! Re-scans the tree with ripgrep on every run, ranks matching files with
//! BM25 and prints a few representative lines from each.

mod cli;
mod query;

use clap::CommandFactory;
use cli::Cli;
use rgrank::errors::RankError;
use rgrank::output::{configure_colors, reset_terminal_colors};
use std::io;
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

/// Environment variable holding the log filter
const LOG_ENV: &str = "RGRANK_LOG";
/// Exit code after an interrupt
const INTERRUPTED_EXIT_CODE: i32 = 130;

fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse_with_passthrough();

    if let Some(shell) = cli.completions {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "rgrank", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    configure_colors(cli.color);
    install_interrupt_handler();

    match query::search::run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => exit_for_error(err),
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

/// Reset colors and exit with 130 on Ctrl-C
#[cfg(unix)]
fn install_interrupt_handler() {
    use signal_hook::consts::SIGINT;
    use signal_hook::iterator::Signals;

    match Signals::new([SIGINT]) {
        Ok(mut signals) => {
            std::thread::spawn(move || {
                if signals.forever().next().is_some() {
                    reset_terminal_colors();
                    std::process::exit(INTERRUPTED_EXIT_CODE);
                }
            });
        }
        Err(err) => tracing::debug!(error = %err, "could not install SIGINT handler"),
    }
}

#[cfg(not(unix))]
fn install_interrupt_handler() {}

fn exit_for_error(err: anyhow::Error) -> ExitCode {
    let rank_error = err.chain().find_map(|cause| cause.downcast_ref::<RankError>());
    if rank_error.is_none() && is_broken_pipe(&err) {
        return ExitCode::SUCCESS;
    }

    reset_terminal_colors();
    eprintln!("Error: {err:#}");
    let code = rank_error.map(RankError::exit_code).unwrap_or(1);
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn is_broken_pipe(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<io::Error>()
            .is_some_and(|io_err| io_err.kind() == io::ErrorKind::BrokenPipe)
    })
}
