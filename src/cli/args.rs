//! Command-line argument definitions for the TM results engine
//!
//! The CLI is a thin shell over the library: every command maps onto one or
//! two library operations and owns all terminal output.

use crate::app::storage::MeetFilter;
use crate::{Error, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the swim-meet results ingestion engine
#[derive(Debug, Clone, Parser)]
#[command(
    name = "tm-results",
    version,
    about = "Ingest swim-meet HY3 result archives into a SQLite store",
    long_about = "Decodes fixed-width HY3 results files from meet archives, resolves meets, \
                  teams and swimmers against a SQLite database (merging duplicate meets), and \
                  drains a durable parse queue one archive at a time."
)]
pub struct Args {
    /// Path to a TOML configuration file
    ///
    /// Defaults to <config dir>/tm-results/config.toml when that file exists.
    #[arg(long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Database file, overriding configuration and TM_RESULTS_DB
    #[arg(long = "db", value_name = "PATH", global = true)]
    pub db: Option<PathBuf>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        global = true
    )]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output format for command results
    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        global = true
    )]
    pub output_format: OutputFormat,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Register a discovered meet (and its downloaded archive)
    Register(RegisterArgs),
    /// Add results archives to the parse queue
    Enqueue(EnqueueArgs),
    /// Drain the parse queue
    Ingest(IngestArgs),
    /// Move failed queue items back to retry
    Retry,
    /// Show queue status and recent error log entries
    Status(StatusArgs),
    /// Decode an archive and print the result without touching the database
    Decode(DecodeArgs),
}

/// Output format options for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text
    Human,
    /// JSON for scripting
    Json,
}

#[derive(Debug, Clone, Parser)]
pub struct RegisterArgs {
    /// Region the meet was listed under
    pub region: String,

    /// Meet name as listed
    pub name: String,

    /// Source link of the results archive
    pub url: String,

    /// Local path of the downloaded archive
    #[arg(long = "file", value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Queue the archive for ingestion right away
    #[arg(long = "enqueue", requires = "file")]
    pub enqueue: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct EnqueueArgs {
    /// Meet to queue
    #[arg(
        long = "meet-id",
        value_name = "ID",
        conflicts_with_all = ["all_downloaded", "region", "meet_name"]
    )]
    pub meet_id: Option<i64>,

    /// Archive to ingest for --meet-id (defaults to the meet's stored file)
    #[arg(long = "file", value_name = "PATH", requires = "meet_id")]
    pub file: Option<PathBuf>,

    /// Every downloaded meet not yet parsed
    #[arg(long = "all-downloaded", conflicts_with_all = ["region", "meet_name"])]
    pub all_downloaded: bool,

    /// Downloaded meets of one region
    #[arg(long = "region", value_name = "REGION", conflicts_with = "meet_name")]
    pub region: Option<String>,

    /// Downloaded meets with this exact name
    #[arg(long = "meet", value_name = "NAME")]
    pub meet_name: Option<String>,
}

/// What `enqueue` should add
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnqueueSelection {
    Single {
        meet_id: i64,
        file: Option<PathBuf>,
    },
    Downloaded(MeetFilter),
}

impl EnqueueArgs {
    pub fn selection(&self) -> Result<EnqueueSelection> {
        if let Some(meet_id) = self.meet_id {
            return Ok(EnqueueSelection::Single {
                meet_id,
                file: self.file.clone(),
            });
        }
        if let Some(region) = &self.region {
            return Ok(EnqueueSelection::Downloaded(MeetFilter::Region(region.clone())));
        }
        if let Some(name) = &self.meet_name {
            return Ok(EnqueueSelection::Downloaded(MeetFilter::Name(name.clone())));
        }
        if self.all_downloaded {
            return Ok(EnqueueSelection::Downloaded(MeetFilter::Unparsed));
        }
        Err(Error::configuration(
            "enqueue needs --meet-id, --all-downloaded, --region or --meet",
        ))
    }
}

#[derive(Debug, Clone, Parser)]
pub struct IngestArgs {
    /// Requeue failed items before draining
    #[arg(long = "retry-failed")]
    pub retry_failed: bool,
}

#[derive(Debug, Clone, Parser)]
pub struct StatusArgs {
    /// Number of recent error log entries to show
    #[arg(long = "errors", value_name = "N", default_value = "10")]
    pub errors: usize,

    /// Show error log entries for one meet instead of the most recent ones
    #[arg(long = "meet-id", value_name = "ID")]
    pub meet_id: Option<i64>,
}

#[derive(Debug, Clone, Parser)]
pub struct DecodeArgs {
    /// Results archive to decode
    pub archive: PathBuf,
}

impl Args {
    /// Logging level from -v / -q
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are drawn unless quiet or producing JSON
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }
}
