//! Command implementations for the TM results CLI
//!
//! Each command lives in its own module and returns once its report has
//! been printed. Library operations never print; only these modules do.

pub mod decode;
pub mod queue;
pub mod register;
pub mod shared;
pub mod status;

use crate::Result;
use crate::cli::args::{Args, Commands};

/// Dispatch to the subcommand handler
///
/// Returns `Ok(false)` when the command ran but left work in a failed
/// state (an ingest pass with errored items), so the binary can exit non-zero.
pub fn run(args: Args) -> Result<bool> {
    shared::setup_logging(&args);

    let Some(command) = args.command.clone() else {
        return Err(crate::Error::configuration("No command given"));
    };

    match command {
        Commands::Register(register_args) => register::run_register(&args, &register_args),
        Commands::Enqueue(enqueue_args) => queue::run_enqueue(&args, &enqueue_args),
        Commands::Ingest(ingest_args) => queue::run_ingest(&args, &ingest_args),
        Commands::Retry => queue::run_retry(&args),
        Commands::Status(status_args) => status::run_status(&args, &status_args),
        Commands::Decode(decode_args) => decode::run_decode(&args, &decode_args),
    }
}
