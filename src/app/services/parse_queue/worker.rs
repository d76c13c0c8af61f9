//! Sequential queue worker

use super::report::DrainReport;
use crate::app::models::{DecodeWarning, MeetRow, NewErrorLogEntry, ParseQueueItem};
use crate::app::services::archive_extractor::ArchiveExtractor;
use crate::app::services::entity_resolver::{EntityResolver, ResolveOutcome};
use crate::app::services::schema_model::SchemaModel;
use crate::app::storage::Store;
use crate::config::QueueConfig;
use crate::constants::{DEFAULT_RECENT_MESSAGE_LIMIT, DEFAULT_TEMP_PREFIX, log_kinds};
use crate::Error;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Why an item ended in `error`
enum ItemFailure {
    /// No meet was decoded; the warnings are already in the error log
    Aborted(String),
    /// An error raised while ingesting
    Failed {
        stage: &'static str,
        region: Option<String>,
        error: Error,
    },
}

impl ItemFailure {
    fn failed(stage: &'static str, region: Option<&str>, error: Error) -> Self {
        Self::Failed {
            stage,
            region: region.map(str::to_string),
            error,
        }
    }

    fn message(&self) -> String {
        match self {
            ItemFailure::Aborted(message) => message.clone(),
            ItemFailure::Failed { error, .. } => error_chain(error),
        }
    }
}

/// An error and its sources joined into one line
fn error_chain(error: &Error) -> String {
    let mut message = error.to_string();
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}

/// Drains pending queue items one at a time
#[derive(Debug)]
pub struct QueueWorker<'a> {
    store: &'a Store,
    schema: &'a SchemaModel,
    temp_prefix: String,
    temp_root: Option<PathBuf>,
    recent_message_limit: usize,
    show_progress: bool,
}

impl<'a> QueueWorker<'a> {
    pub fn new(store: &'a Store, schema: &'a SchemaModel) -> Self {
        Self {
            store,
            schema,
            temp_prefix: DEFAULT_TEMP_PREFIX.to_string(),
            temp_root: None,
            recent_message_limit: DEFAULT_RECENT_MESSAGE_LIMIT,
            show_progress: false,
        }
    }

    pub fn from_config(store: &'a Store, schema: &'a SchemaModel, config: &QueueConfig) -> Self {
        Self::new(store, schema)
            .with_temp_prefix(config.temp_prefix.clone())
            .with_recent_message_limit(config.recent_message_limit)
    }

    pub fn with_temp_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.temp_prefix = prefix.into();
        self
    }

    /// Extract archives under `root` instead of the system temp directory
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = Some(root.into());
        self
    }

    pub fn with_recent_message_limit(mut self, limit: usize) -> Self {
        self.recent_message_limit = limit;
        self
    }

    /// Draw a progress bar on stderr while draining
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Process every item pending at the start of the pass
    ///
    /// Items enqueued while the pass runs wait for the next one. Failures are
    /// recorded per item; this never fails as a whole.
    pub fn drain(&self) -> DrainReport {
        let snapshot = match self.store.pending_items() {
            Ok(items) => items,
            Err(e) => {
                error!("Failed to read pending queue items: {}", e);
                return DrainReport::new(0, self.recent_message_limit);
            }
        };

        let mut report = DrainReport::new(snapshot.len(), self.recent_message_limit);
        if snapshot.is_empty() {
            info!("Parse queue is empty");
            return report;
        }
        info!(items = snapshot.len(), "Draining parse queue");

        let progress = self
            .show_progress
            .then(|| create_progress_bar(snapshot.len() as u64));

        for queued in &snapshot {
            let item = self.current_item(queued);
            if let Some(pb) = &progress {
                pb.set_message(format!("meet {}", item.meet_id));
            }

            match self.process_item(&item) {
                Ok(outcome) => {
                    let message = done_message(&outcome);
                    if let Err(e) = self.store.mark_done(item.id, &message) {
                        // Resolution already committed; report the bookkeeping failure
                        error!(item_id = item.id, "Failed to mark item done: {}", e);
                        report.record_error(item.id, outcome.meet_id, e.to_string());
                    } else {
                        report.record_done(item.id, outcome.meet_id, message);
                    }
                }
                Err(failure) => {
                    let message = failure.message();
                    self.record_failure(&item, failure);
                    report.record_error(item.id, item.meet_id, message);
                }
            }

            if let Some(pb) = &progress {
                pb.inc(1);
            }
        }

        if let Some(pb) = progress {
            pb.finish_with_message(report.to_string());
        }
        info!(
            total = report.total,
            done = report.done,
            error = report.error,
            "Parse queue pass complete"
        );
        report
    }

    /// The stored row for a snapshot item
    ///
    /// A merge earlier in the pass repoints `meet_id` to the surviving meet,
    /// so the snapshot copy can name a row that no longer exists.
    fn current_item(&self, queued: &ParseQueueItem) -> ParseQueueItem {
        match self.store.get_queue_item(queued.id) {
            Ok(Some(item)) => {
                if item.meet_id != queued.meet_id {
                    debug!(
                        item_id = item.id,
                        from = queued.meet_id,
                        to = item.meet_id,
                        "Queue item follows merged meet"
                    );
                }
                item
            }
            Ok(None) => queued.clone(),
            Err(e) => {
                warn!(item_id = queued.id, "Failed to reload queue item: {}", e);
                queued.clone()
            }
        }
    }

    fn process_item(&self, item: &ParseQueueItem) -> Result<ResolveOutcome, ItemFailure> {
        self.store
            .mark_processing(item.id)
            .map_err(|e| ItemFailure::failed("claim", None, e))?;
        info!(item_id = item.id, meet_id = item.meet_id, file = %item.file_path, "Processing queue item");

        let meet = self
            .store
            .get_meet(item.meet_id)
            .map_err(|e| ItemFailure::failed("load_meet", None, e))?
            .ok_or_else(|| {
                ItemFailure::failed("load_meet", None, Error::meet_not_found(item.meet_id))
            })?;

        let bundle = self.extractor().extract(Path::new(&item.file_path));
        self.log_warnings(item, &meet, &bundle.warnings)
            .map_err(|e| ItemFailure::failed("log_warnings", Some(&meet.region), e))?;

        let Some(decoded) = bundle.meet.as_ref() else {
            let message = bundle
                .warnings
                .first()
                .map(|w| w.message.clone())
                .unwrap_or_else(|| format!("No meet record decoded from {}", item.file_path));
            return Err(ItemFailure::Aborted(message));
        };

        EntityResolver::new(self.store)
            .resolve(meet.id, decoded, &bundle, Some(&item.file_path))
            .map_err(|e| ItemFailure::failed("resolve", Some(&meet.region), e))
    }

    fn extractor(&self) -> ArchiveExtractor<'a> {
        let extractor = ArchiveExtractor::new(self.schema).with_temp_prefix(self.temp_prefix.clone());
        match &self.temp_root {
            Some(root) => extractor.with_temp_root(root.clone()),
            None => extractor,
        }
    }

    /// Every decode warning goes to the error log before resolution starts
    fn log_warnings(
        &self,
        item: &ParseQueueItem,
        meet: &MeetRow,
        warnings: &[DecodeWarning],
    ) -> crate::Result<()> {
        for warning in warnings {
            let entry = NewErrorLogEntry::from_warning(warning)
                .meet(meet.id)
                .file(item.file_path.clone())
                .region(meet.region.clone());
            self.store.log_error(&entry)?;
        }
        Ok(())
    }

    fn record_failure(&self, item: &ParseQueueItem, failure: ItemFailure) {
        let message = failure.message();

        if let ItemFailure::Failed { stage, region, error } = &failure {
            error!(item_id = item.id, meet_id = item.meet_id, stage, "Ingest failed: {}", error);
            let mut entry = NewErrorLogEntry::new(log_kinds::INGEST_ERROR, message.clone())
                .meet(item.meet_id)
                .file(item.file_path.clone())
                .context(json!({ "item_id": item.id, "stage": stage }));
            if let Some(region) = region {
                entry = entry.region(region.clone());
            }
            if let Err(e) = self.store.log_error(&entry) {
                error!(item_id = item.id, "Failed to write error log entry: {}", e);
            }
        }

        if let Err(e) = self.store.mark_error(item.id, &message) {
            warn!(item_id = item.id, "Failed to mark item as error: {}", e);
        }
    }
}

fn done_message(outcome: &ResolveOutcome) -> String {
    let mut message = format!(
        "Meet {}: {} teams, {} swimmers",
        outcome.meet_id, outcome.teams, outcome.swimmers
    );
    if let Some(source) = outcome.merged_from {
        message.push_str(&format!(" (merged from meet {})", source));
    }
    message
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb
}
