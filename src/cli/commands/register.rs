//! `register`: record a discovered meet

use super::shared::{open_store, print_json};
use crate::app::models::NewMeet;
use crate::cli::args::{Args, OutputFormat, RegisterArgs};
use crate::Result;
use colored::*;
use serde_json::json;

pub fn run_register(args: &Args, register: &RegisterArgs) -> Result<bool> {
    let (_, store) = open_store(args)?;

    let mut meet = NewMeet::new(&register.region, &register.name, &register.url);
    if let Some(file) = &register.file {
        meet = meet.with_file(file.display().to_string());
    }
    let meet_id = store.register_meet(&meet)?;

    let item_id = match (&register.file, register.enqueue) {
        (Some(file), true) => Some(store.enqueue(meet_id, &file.display().to_string())?),
        _ => None,
    };

    match args.output_format {
        OutputFormat::Json => print_json(&json!({ "meet_id": meet_id, "queue_item_id": item_id }))?,
        OutputFormat::Human => {
            println!("{} meet {} ({})", "Registered".green().bold(), meet_id, register.name);
            if let Some(item_id) = item_id {
                println!("  queued as item {}", item_id);
            }
        }
    }
    Ok(true)
}
