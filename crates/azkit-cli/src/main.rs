use azkit_core::{logging, outcome};

mod cli;

use crate::cli::CliCommand;

#[tokio::main]
async fn main() {
    // Log to the state dir; fall back to stderr when it is unwritable.
    if logging::init_logging().is_err() {
        logging::init_logging_stderr();
    }

    // Parse CLI and dispatch. Every failure is reduced to one diagnostic
    // line and a stable exit code.
    if let Err(err) = CliCommand::run_from_args().await {
        let verdict = outcome::classify(&err);
        eprintln!("azkit error: {}", verdict.message);
        std::process::exit(verdict.outcome.exit_code());
    }
}
