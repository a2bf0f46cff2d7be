#![forbid(unsafe_code)]

//! Glue shared by the `itutrain` and `hamtrain` binaries.

use std::fs;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use drill_services::{
    SessionOutcome, StdioPrompter, StopReason, TrainingSession, interrupt_session, run_session,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Prefix database compiled into `itutrain`.
pub const BUNDLED_ITU_DATABASE: &str = include_str!("../data/itudb");

/// Conventional exit status after Ctrl+C.
pub const EXIT_INTERRUPTED: u8 = 130;

/// Exit status when progress could not be saved after Ctrl+C.
pub const EXIT_FAILURE: i32 = 1;

/// Install the stderr log subscriber; `RUST_LOG` overrides the `warn` default.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // Prompts own stdout.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Read a database file, naming it in the error.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn read_database(path: &Path) -> Result<String> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("cannot read database {}", path.display()))?;
    info!(path = %path.display(), bytes = text.len(), "database loaded");
    Ok(text)
}

/// Run `session` on stdin/stdout until input ends or Ctrl+C arrives.
///
/// The blocking loop runs on a blocking thread; on Ctrl+C the session is
/// finished from here, which saves progress if its policy keeps any. If that
/// save fails the error is printed and the process exits with
/// [`EXIT_FAILURE`].
///
/// # Errors
///
/// Returns an error for session, storage, or signal-handling failures.
pub async fn run_interactive(session: TrainingSession) -> Result<SessionOutcome> {
    let shared = Arc::new(Mutex::new(session));

    let worker = {
        let shared = Arc::clone(&shared);
        tokio::task::spawn_blocking(move || {
            let mut prompter = StdioPrompter::stdio();
            run_session(&shared, &mut prompter)
        })
    };

    tokio::select! {
        joined = worker => {
            let outcome = joined.context("training loop stopped unexpectedly")??;
            Ok(outcome)
        }
        signal = tokio::signal::ctrl_c() => {
            signal.context("cannot listen for Ctrl+C")?;
            warn!("interrupted");
            // Finish the prompt line before anything else is printed.
            println!();
            match interrupt_session(&shared) {
                Ok(outcome) => Ok(outcome),
                Err(e) => {
                    // Returning would wait on the input thread, still blocked on stdin.
                    error!(error = %e, "progress not saved after interrupt");
                    eprintln!("Error: {e}");
                    std::process::exit(EXIT_FAILURE);
                }
            }
        }
    }
}

/// Print the score if there is one and pick the exit status.
///
/// An interrupted session prints nothing and exits with
/// [`EXIT_INTERRUPTED`] straight away, leaving the blocked input thread
/// behind.
#[must_use]
pub fn conclude(outcome: &SessionOutcome) -> ExitCode {
    if let Some(report) = &outcome.report {
        println!("{report}");
    }
    match outcome.reason {
        StopReason::EndOfInput => ExitCode::SUCCESS,
        StopReason::Failed => ExitCode::FAILURE,
        StopReason::Interrupted => std::process::exit(i32::from(EXIT_INTERRUPTED)),
    }
}
