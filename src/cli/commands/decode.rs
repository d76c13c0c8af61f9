//! `decode`: inspect an archive without writing to the database

use super::shared::{load_config, load_schema, print_json};
use crate::app::services::archive_extractor::ArchiveExtractor;
use crate::cli::args::{Args, DecodeArgs, OutputFormat};
use crate::Result;
use colored::*;

pub fn run_decode(args: &Args, decode: &DecodeArgs) -> Result<bool> {
    let config = load_config(args)?;
    let schema = load_schema(&config)?;

    let bundle = ArchiveExtractor::new(&schema)
        .with_temp_prefix(config.queue.temp_prefix.clone())
        .extract(&decode.archive);

    if args.output_format == OutputFormat::Json {
        print_json(&bundle)?;
        return Ok(bundle.meet.is_some());
    }

    match &bundle.meet {
        Some(meet) => {
            println!("{} {}", "Meet:".bold(), meet.name);
            if let Some(start) = meet.start_date {
                println!("  starts   {}", start);
            }
            if let Some(course) = &meet.course {
                println!("  course   {}", course);
            }
            if let Some(meet_type) = &meet.meet_type {
                println!("  type     {}", meet_type);
            }
        }
        None => println!("{}", "No meet record decoded".red()),
    }
    println!("  teams    {}", bundle.teams.len());
    println!("  swimmers {}", bundle.swimmers.len());

    if !bundle.warnings.is_empty() {
        println!();
        println!("{}", "Warnings".yellow().bold());
        for warning in &bundle.warnings {
            let line = warning
                .line
                .map(|n| format!("line {}", n))
                .unwrap_or_default();
            println!("  {:<26} {:<9} {}", warning.kind.as_str(), line, warning.message);
        }
    }
    Ok(bundle.meet.is_some())
}
