//! `enqueue`, `ingest` and `retry`: parse queue commands

use super::shared::{load_schema, open_store, print_json};
use crate::app::models::QueueStatus;
use crate::app::services::parse_queue::{DrainReport, QueueWorker};
use crate::cli::args::{Args, EnqueueArgs, EnqueueSelection, IngestArgs, OutputFormat};
use crate::{Error, Result};
use colored::*;
use serde_json::json;
use tracing::info;

pub fn run_enqueue(args: &Args, enqueue: &EnqueueArgs) -> Result<bool> {
    let (_, store) = open_store(args)?;

    let ids = match enqueue.selection()? {
        EnqueueSelection::Single { meet_id, file } => {
            let file = match file {
                Some(file) => file.display().to_string(),
                None => store
                    .get_meet(meet_id)?
                    .ok_or_else(|| Error::meet_not_found(meet_id))?
                    .file_path
                    .ok_or_else(|| {
                        Error::configuration(format!(
                            "Meet {} has no downloaded file; pass --file",
                            meet_id
                        ))
                    })?,
            };
            vec![store.enqueue(meet_id, &file)?]
        }
        EnqueueSelection::Downloaded(filter) => store.enqueue_downloaded(&filter)?,
    };

    match args.output_format {
        OutputFormat::Json => print_json(&json!({ "queue_item_ids": ids }))?,
        OutputFormat::Human => println!("{} {} item(s)", "Queued".green().bold(), ids.len()),
    }
    Ok(true)
}

pub fn run_ingest(args: &Args, ingest: &IngestArgs) -> Result<bool> {
    let (config, store) = open_store(args)?;
    let schema = load_schema(&config)?;

    if ingest.retry_failed {
        let moved = store.requeue_failed()?;
        info!(items = moved, "Requeued failed items before draining");
    }

    let report = QueueWorker::from_config(&store, &schema, &config.queue)
        .with_progress(args.show_progress())
        .drain();

    match args.output_format {
        OutputFormat::Json => print_json(&report)?,
        OutputFormat::Human => print_report(&report),
    }
    Ok(report.is_clean())
}

pub fn run_retry(args: &Args) -> Result<bool> {
    let (_, store) = open_store(args)?;
    let moved = store.requeue_failed()?;

    match args.output_format {
        OutputFormat::Json => print_json(&json!({ "requeued": moved }))?,
        OutputFormat::Human => println!("{} {} failed item(s)", "Requeued".yellow().bold(), moved),
    }
    Ok(true)
}

fn print_report(report: &DrainReport) {
    if report.total == 0 {
        println!("{}", "Parse queue is empty".dimmed());
        return;
    }

    println!("{}", "Ingest Summary".bold());
    println!("  Items:   {}", report.total);
    println!("  Done:    {}", report.done.to_string().green());
    let errors = report.error.to_string();
    println!(
        "  Errors:  {}",
        if report.error > 0 { errors.red() } else { errors.normal() }
    );

    if !report.messages.is_empty() {
        println!();
        println!("{}", "Recent items".bold());
        for message in &report.messages {
            let status = match message.status {
                QueueStatus::Done => message.status.as_str().green(),
                _ => message.status.as_str().red(),
            };
            println!(
                "  #{:<5} meet {:<6} {:<6} {}",
                message.item_id, message.meet_id, status, message.message
            );
        }
    }
}
