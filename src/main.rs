use anyhow::Context;
use clap::Parser;
use std::process;
use tm_results::cli::{args::Args, commands};

fn main() {
    let args = Args::parse();

    // If no subcommand was provided, show help and available commands
    if args.command.is_none() {
        show_help_and_commands();
        process::exit(0);
    }

    let result = commands::run(args).context("tm-results command failed");

    match result {
        Ok(true) => process::exit(0),
        // Command ran but left failed items behind; details already printed
        Ok(false) => process::exit(2),
        Err(error) => {
            eprintln!("Error: {:#}", error);
            process::exit(1);
        }
    }
}

/// Show help information and available commands when no subcommand is provided
fn show_help_and_commands() {
    println!("TM Results - Swim-meet HY3 result ingestion");
    println!("============================================");
    println!();
    println!("Decode HY3 results archives and load meets, teams and swimmers");
    println!("into a SQLite database through a durable parse queue.");
    println!();
    println!("USAGE:");
    println!("    tm-results [--config FILE] [--db PATH] [-v|-q] <COMMAND>");
    println!();
    println!("COMMANDS:");
    println!("    register    Register a discovered meet and its downloaded archive");
    println!("    enqueue     Add results archives to the parse queue");
    println!("    ingest      Drain the parse queue");
    println!("    retry       Move failed queue items back to retry");
    println!("    status      Show queue status and recent error log entries");
    println!("    decode      Decode an archive without writing to the database");
    println!();
    println!("EXAMPLES:");
    println!("    tm-results register Auckland \"Winter Champs\" https://... --file meet.zip --enqueue");
    println!("    tm-results enqueue --all-downloaded");
    println!("    tm-results ingest -v");
    println!("    tm-results status --errors 20");
    println!();
    println!("For detailed help on any command, use:");
    println!("    tm-results <COMMAND> --help");
}
