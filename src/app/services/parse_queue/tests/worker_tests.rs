//! Tests for draining the queue with per-item failure isolation

use super::*;
use crate::app::models::QueueStatus;
use crate::app::services::schema_model::SchemaModel;
use crate::app::storage::RetryPolicy;
use crate::config::DatabaseConfig;
use std::fs;
use tempfile::TempDir;

struct Fixture {
    store: Store,
    schema: SchemaModel,
    dir: TempDir,
    scratch: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            store: test_store(),
            schema: SchemaModel::builtin().unwrap(),
            dir: TempDir::new().unwrap(),
            scratch: TempDir::new().unwrap(),
        }
    }

    fn worker(&self) -> QueueWorker<'_> {
        QueueWorker::new(&self.store, &self.schema).with_temp_root(self.scratch.path())
    }

    /// Register a meet with a minimal results archive and queue it
    fn queued_meet(&self, name: &str, results: &str) -> (i64, i64) {
        let archive = results_archive(self.dir.path(), &format!("{}.zip", name), results);
        let meet_id = downloaded_meet(&self.store, "Auckland", name, &archive);
        let item_id = self
            .store
            .enqueue(meet_id, &archive.display().to_string())
            .unwrap();
        (meet_id, item_id)
    }

    fn status(&self, item_id: i64) -> QueueStatus {
        self.store.get_queue_item(item_id).unwrap().unwrap().status
    }
}

#[test]
fn test_drain_ingests_minimal_archive() {
    let fx = Fixture::new();
    let (meet_id, item_id) = fx.queued_meet("Winter Champs", &minimal_results_text());

    let report = fx.worker().drain();

    assert_eq!(report.total, 1);
    assert_eq!(report.done, 1);
    assert!(report.is_clean());
    assert_eq!(fx.status(item_id), QueueStatus::Done);
    assert_eq!(fx.store.error_count().unwrap(), 0);

    let counts = fx.store.counts().unwrap();
    assert_eq!((counts.meets, counts.teams, counts.swimmers), (1, 1, 2));
    assert!(fx.store.get_meet(meet_id).unwrap().unwrap().parsed);
    assert!(fs::read_dir(fx.scratch.path()).unwrap().next().is_none());
}

#[test]
fn test_missing_meet_marks_item_error_and_continues() {
    let fx = Fixture::new();
    let orphan = fx.store.enqueue(404, "/d/orphan.zip").unwrap();
    let (_, good) = fx.queued_meet("Winter Champs", &minimal_results_text());

    let report = fx.worker().drain();

    assert_eq!((report.total, report.done, report.error), (2, 1, 1));
    assert_eq!(fx.status(orphan), QueueStatus::Error);
    assert_eq!(fx.status(good), QueueStatus::Done);

    let logged = fx.store.errors_for_meet(404).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, "IngestError");
    assert_eq!(logged[0].context.as_ref().unwrap()["stage"], "load_meet");
}

#[test]
fn test_decode_abort_logs_warning_and_marks_error() {
    let fx = Fixture::new();
    let archive = fx.dir.path().join("empty.zip");
    write_archive(&archive, &[("readme.txt", b"nothing here".as_slice())]);
    let meet_id = downloaded_meet(&fx.store, "Auckland", "Empty", &archive);
    let item_id = fx.store.enqueue(meet_id, &archive.display().to_string()).unwrap();

    let report = fx.worker().drain();

    assert_eq!(report.error, 1);
    let item = fx.store.get_queue_item(item_id).unwrap().unwrap();
    assert_eq!(item.status, QueueStatus::Error);

    let logged = fx.store.errors_for_meet(meet_id).unwrap();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].kind, "MissingPrimaryFile");
    assert_eq!(logged[0].region.as_deref(), Some("Auckland"));
    assert_eq!(item.message.as_deref(), Some(logged[0].message.as_str()));
    assert!(!fx.store.get_meet(meet_id).unwrap().unwrap().parsed);
}

#[test]
fn test_storage_failure_is_isolated_to_one_item() {
    let fx = Fixture::new();
    fx.store
        .conn()
        .execute_batch(
            "CREATE TRIGGER fail_team BEFORE INSERT ON teams
             WHEN NEW.team_name = 'Failing Team'
             BEGIN SELECT RAISE(ABORT, 'forced failure'); END;",
        )
        .unwrap();

    let mut failing = minimal_results();
    failing[0] = meet_core_line("Failing Meet", "09012025", "09012025");
    failing[2] = crate::app::services::hy3_decoder::tests::team_line("FAIL", "Failing Team", "");

    let (_, first) = fx.queued_meet("Winter Champs", &minimal_results_text());
    let (_, second) = fx.queued_meet("Failing Meet", &failing.join("\r\n"));
    let mut third_lines = minimal_results();
    third_lines[0] = meet_core_line("Spring Open", "10012025", "10022025");
    let (_, third) = fx.queued_meet("Spring Open", &third_lines.join("\r\n"));

    let report = fx.worker().drain();

    assert_eq!((report.total, report.done, report.error), (3, 2, 1));
    assert_eq!(fx.status(first), QueueStatus::Done);
    assert_eq!(fx.status(second), QueueStatus::Error);
    assert_eq!(fx.status(third), QueueStatus::Done);

    let message = fx.store.get_queue_item(second).unwrap().unwrap().message.unwrap();
    assert!(message.contains("forced failure"), "{}", message);
    assert_eq!(fx.store.recent_errors(1).unwrap()[0].kind, "IngestError");
}

#[test]
fn test_items_follow_meet_merged_earlier_in_pass() {
    let fx = Fixture::new();
    let (survivor, first) = fx.queued_meet("Winter Champs A", &minimal_results_text());

    // A second listing of the same meet, submitted twice
    let (duplicate, second) = fx.queued_meet("Winter Champs B", &minimal_results_text());
    let again = results_archive(fx.dir.path(), "Winter Champs B-002.zip", &minimal_results_text());
    let third = fx
        .store
        .enqueue(duplicate, &again.display().to_string())
        .unwrap();

    let report = fx.worker().drain();

    assert_eq!((report.total, report.done, report.error), (3, 3, 0));
    assert!(report.messages.iter().all(|m| m.meet_id == survivor));
    for item_id in [first, second, third] {
        let item = fx.store.get_queue_item(item_id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Done);
        assert_eq!(item.meet_id, survivor);
    }

    assert!(fx.store.get_meet(duplicate).unwrap().is_none());
    assert!(fx.store.errors_for_meet(duplicate).unwrap().is_empty());
    assert_eq!(fx.store.error_count().unwrap(), 0);
    assert_eq!(fx.store.counts().unwrap().meets, 1);
}

#[test]
fn test_locked_database_fails_items_without_losing_them() {
    let dir = TempDir::new().unwrap();
    let scratch = TempDir::new().unwrap();
    let db_path = dir.path().join("meets.db");
    let database = DatabaseConfig {
        path: db_path.clone(),
        busy_timeout_ms: 10,
    };
    let store = Store::open(&db_path, &database, RetryPolicy::immediate(2)).unwrap();
    let schema = SchemaModel::builtin().unwrap();

    let mut item_ids = Vec::new();
    for name in ["Winter Champs", "Spring Open"] {
        let mut lines = minimal_results();
        lines[0] = meet_core_line(name, "08092025", "08102025");
        let archive = results_archive(dir.path(), &format!("{}.zip", name), &lines.join("\r\n"));
        let meet_id = downloaded_meet(&store, "Auckland", name, &archive);
        item_ids.push(store.enqueue(meet_id, &archive.display().to_string()).unwrap());
    }

    let locker = rusqlite::Connection::open(&db_path).unwrap();
    locker.execute_batch("BEGIN EXCLUSIVE;").unwrap();

    let worker = QueueWorker::new(&store, &schema).with_temp_root(scratch.path());
    let locked = worker.drain();

    assert_eq!((locked.total, locked.done, locked.error), (2, 0, 2));
    for message in &locked.messages {
        assert!(message.message.contains("Database locked"), "{}", message.message);
    }

    // The claim never committed, so the items are still pending
    locker.execute_batch("COMMIT;").unwrap();
    for item_id in &item_ids {
        let item = store.get_queue_item(*item_id).unwrap().unwrap();
        assert_eq!(item.status, QueueStatus::Queued);
    }

    let report = worker.drain();
    assert_eq!((report.total, report.done, report.error), (2, 2, 0));
    assert_eq!(store.counts().unwrap().meets, 2);
}

#[test]
fn test_drain_only_takes_pending_items() {
    let fx = Fixture::new();
    let (_, item_id) = fx.queued_meet("Winter Champs", &minimal_results_text());
    fx.worker().drain();

    let second = fx.worker().drain();

    assert_eq!(second.total, 0);
    assert_eq!(fx.status(item_id), QueueStatus::Done);
}

#[test]
fn test_retried_item_is_processed_again() {
    let fx = Fixture::new();
    let orphan = fx.store.enqueue(404, "/d/orphan.zip").unwrap();
    fx.worker().drain();
    fx.store.requeue_failed().unwrap();

    let report = fx.worker().drain();

    assert_eq!(report.total, 1);
    assert_eq!(report.error, 1);
    assert_eq!(fx.status(orphan), QueueStatus::Error);
    assert_eq!(fx.store.errors_for_meet(404).unwrap().len(), 2);
}

#[test]
fn test_report_keeps_most_recent_messages() {
    let fx = Fixture::new();
    for id in 1..=3 {
        fx.store.enqueue(1000 + id, "/d/missing.zip").unwrap();
    }

    let report = fx.worker().with_recent_message_limit(2).drain();

    assert_eq!(report.error, 3);
    assert_eq!(report.messages.len(), 2);
    assert_eq!(report.messages[0].meet_id, 1002);
    assert_eq!(report.messages[1].meet_id, 1003);
    assert_eq!(report.to_string(), "3 items: 0 done, 3 error");
}
