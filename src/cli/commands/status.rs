//! `status`: queue summary and error log

use super::shared::{open_store, print_json};
use crate::app::models::{ErrorLogEntry, QueueStatus};
use crate::cli::args::{Args, OutputFormat, StatusArgs};
use crate::Result;
use colored::*;
use serde_json::json;

pub fn run_status(args: &Args, status: &StatusArgs) -> Result<bool> {
    let (_, store) = open_store(args)?;

    let summary = store.queue_summary()?;
    let counts = store.counts()?;
    let errors = match status.meet_id {
        Some(meet_id) => store.errors_for_meet(meet_id)?,
        None => store.recent_errors(status.errors)?,
    };

    if args.output_format == OutputFormat::Json {
        print_json(&json!({
            "queue": summary,
            "store": counts,
            "error_count": store.error_count()?,
            "errors": errors,
        }))?;
        return Ok(true);
    }

    println!("{}", "Parse Queue".bold());
    for queue_status in QueueStatus::ALL {
        let count = summary.get(queue_status);
        let label = format!("{:<11}", queue_status.as_str());
        let label = match queue_status {
            QueueStatus::Error if count > 0 => label.red(),
            QueueStatus::Done => label.green(),
            _ => label.normal(),
        };
        println!("  {} {}", label, count);
    }

    println!();
    println!("{}", "Store".bold());
    println!("  meets      {}", counts.meets);
    println!("  teams      {}", counts.teams);
    println!("  swimmers   {}", counts.swimmers);

    println!();
    println!(
        "{} ({} total)",
        "Error Log".bold(),
        store.error_count()?
    );
    if errors.is_empty() {
        println!("  {}", "no entries".dimmed());
    }
    for entry in &errors {
        print_entry(entry);
    }
    Ok(true)
}

fn print_entry(entry: &ErrorLogEntry) {
    let meet = entry
        .meet_id
        .map(|id| format!("meet {}", id))
        .unwrap_or_else(|| "-".to_string());
    println!(
        "  {} {:<24} {:<10} {}",
        entry.timestamp.dimmed(),
        entry.kind.yellow(),
        meet,
        entry.message
    );
}
