//! Tests for meet update, team/swimmer upsert and linking

use super::*;
use crate::app::storage::StoreCounts;
use crate::Error;
use chrono::NaiveDate;

#[test]
fn test_minimal_input_resolves_exact_counts() {
    let store = test_store();
    let meet_id = pending_meet(&store, "Winter Champs", "u1");

    let outcome = resolve(&store, meet_id, &minimal_bundle());

    assert_eq!(outcome.meet_id, meet_id);
    assert_eq!(outcome.merged_from, None);
    assert_eq!(
        store.counts().unwrap(),
        StoreCounts {
            meets: 1,
            teams: 1,
            swimmers: 2,
            meet_teams: 1,
            meet_swimmers: 2,
            meet_team_swimmers: 2,
        }
    );
    assert_eq!(store.error_count().unwrap(), 0);

    let row = store.get_meet(meet_id).unwrap().unwrap();
    assert!(row.parsed);
    assert!(row.parsed_timestamp.is_some());
    assert_eq!(row.start_date, NaiveDate::from_ymd_opt(2025, 8, 9));
    assert_eq!(row.year, Some(2025));
    assert_eq!(row.course.as_deref(), Some("LCM"));
    assert_eq!(row.meet_type.as_deref(), Some("Championship"));
}

#[test]
fn test_resolving_twice_is_idempotent() {
    let store = test_store();
    let meet_id = pending_meet(&store, "Winter Champs", "u1");
    let bundle = minimal_bundle();

    resolve(&store, meet_id, &bundle);
    let before = store.counts().unwrap();
    let second = resolve(&store, meet_id, &bundle);

    assert_eq!(store.counts().unwrap(), before);
    assert_eq!(second.meet_id, meet_id);
    assert_eq!(second.new_team_links, 0);
    assert_eq!(second.new_swimmer_links, 0);
    assert_eq!(second.new_team_swimmer_links, 0);
    assert_eq!(second.swimmers, 2);
}

#[test]
fn test_update_meet_keeps_flags_and_populated_fields() {
    let store = test_store();
    let meet_id = pending_meet(&store, "Winter Champs", "u1");
    store
        .conn()
        .execute(
            "UPDATE meets SET uploaded = 1, location = 'Old Pool', course = 'SCM' WHERE id = ?1",
            [meet_id],
        )
        .unwrap();

    // Meet line without location, no meet-extended record
    let line = crate::app::services::hy3_decoder::tests::LineBuilder::new("B1")
        .at(3, "Winter Championships")
        .at(93, "08092025")
        .build();
    let bundle = decode(vec![line]);
    resolve(&store, meet_id, &bundle);

    let row = store.get_meet(meet_id).unwrap().unwrap();
    assert_eq!(row.name, "Winter Championships");
    assert_eq!(row.location.as_deref(), Some("Old Pool"));
    assert_eq!(row.course.as_deref(), Some("SCM"));
    assert!(row.uploaded);
    assert!(row.downloaded);
    assert!(row.parsed);
}

#[test]
fn test_update_missing_meet_is_an_error() {
    let store = test_store();
    let bundle = minimal_bundle();
    let result = EntityResolver::new(&store).update_meet(42, bundle.meet.as_ref().unwrap());

    assert!(matches!(result, Err(Error::MeetNotFound { meet_id: 42 })));
}

#[test]
fn test_team_upsert_keeps_type_and_fills_nulls() {
    let store = test_store();
    let resolver = EntityResolver::new(&store);

    let mut first = Team::new(crate::app::models::TeamIdentity {
        code: "NSC".to_string(),
        name: "North Shore".to_string(),
        team_type: "Club".to_string(),
        region_code: None,
        region: None,
    });
    first.city = Some("Auckland".to_string());
    let id = resolver.upsert_team(&first).unwrap();

    let mut second = first.clone();
    second.identity.team_type = "Region".to_string();
    second.identity.region_code = Some("AKL".to_string());
    second.city = Some("Takapuna".to_string());
    second.postal_code = Some("0622".to_string());
    assert_eq!(resolver.upsert_team(&second).unwrap(), id);

    let (team_type, region_code, city, postal): (String, String, String, String) = store
        .conn()
        .query_row(
            "SELECT team_type, region_code, city, postal_code FROM teams WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
        )
        .unwrap();
    assert_eq!(team_type, "Club");
    assert_eq!(region_code, "AKL");
    assert_eq!(city, "Auckland");
    assert_eq!(postal, "0622");
    assert_eq!(store.counts().unwrap().teams, 1);
}

#[test]
fn test_swimmer_without_birth_date_or_id_is_not_duplicated() {
    let store = test_store();
    let meet_id = pending_meet(&store, "Winter Champs", "u1");
    let lines = vec![
        meet_core_line("Winter Champs", "08092025", "08102025"),
        team_line("NSC", "North Shore Swim Club", "AKL"),
        swimmer_line("F", "", "Smith", "Jane", ""),
    ];
    let bundle = decode(lines);

    let first = resolve(&store, meet_id, &bundle);
    let resolver = EntityResolver::new(&store);
    let team_id = resolver.upsert_team(&bundle.teams[0]).unwrap();
    let again = resolver.upsert_swimmer(&bundle.swimmers[0], team_id).unwrap();

    assert_eq!(first.swimmers, 1);
    assert_eq!(store.counts().unwrap().swimmers, 1);
    assert_eq!(again, count(&store, "SELECT id FROM swimmers"));
}

#[test]
fn test_same_swimmer_across_meets_shares_one_row() {
    let store = test_store();
    let first = pending_meet(&store, "Winter Champs", "u1");
    let second = pending_meet(&store, "Spring Open", "u2");

    resolve(&store, first, &minimal_bundle());
    let mut lines = minimal_results();
    lines[0] = meet_core_line("Spring Open", "10012025", "10022025");
    resolve(&store, second, &decode(lines));

    let counts = store.counts().unwrap();
    assert_eq!(counts.meets, 2);
    assert_eq!(counts.teams, 1);
    assert_eq!(counts.swimmers, 2);
    assert_eq!(counts.meet_swimmers, 4);
    assert_eq!(counts.meet_teams, 2);
}

#[test]
fn test_meet_without_teams_or_swimmers_logs_link_warnings() {
    let store = test_store();
    let meet_id = pending_meet(&store, "Empty Meet", "u1");
    let bundle = decode(vec![meet_core_line("Empty Meet", "08092025", "08092025")]);

    let outcome = resolve(&store, meet_id, &bundle);

    assert_eq!(outcome.link_warnings, 2);
    let entries = store.errors_for_meet(meet_id).unwrap();
    assert_eq!(entries.len(), 2);
    assert!(entries.iter().all(|e| e.kind == "LinkWarning"));
    assert_eq!(entries[0].file_path.as_deref(), Some("/downloads/test.zip"));
    assert!(store.get_meet(meet_id).unwrap().unwrap().parsed);
}
