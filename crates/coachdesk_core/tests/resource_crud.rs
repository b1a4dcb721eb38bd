use coachdesk_core::db::open_db_in_memory;
use coachdesk_core::entity::{COACH_ATHLETE_LINKS, PROGRAMS};
use coachdesk_core::{
    AccessScope, CreateOutcome, ListFilter, RecordState, RepoError, ResourceDraft,
    ResourceRepository, SqliteResourceRepository, UpdateOutcome, Visibility,
};
use rusqlite::Connection;
use uuid::Uuid;

#[test]
fn create_and_get_roundtrip() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let draft = ResourceDraft::new("Strength Block A", "strength-block-a", "en");
    let CreateOutcome::Created(id) = repo.create(&draft, owner).unwrap() else {
        panic!("expected created outcome");
    };

    let loaded = repo.get(id, false).unwrap().unwrap();
    assert_eq!(loaded.label, "Strength Block A");
    assert_eq!(loaded.slug, "strength-block-a");
    assert_eq!(loaded.owner_id, owner);
    assert_eq!(loaded.visibility, Visibility::Private);
    assert_eq!(loaded.state(), RecordState::Active);
    assert!(loaded.deleted_at.is_none());
}

#[test]
fn duplicate_slug_locale_reports_conflict_not_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let draft = ResourceDraft::new("Squat Basics", "squat-basics", "en");
    assert!(matches!(
        repo.create(&draft, owner).unwrap(),
        CreateOutcome::Created(_)
    ));
    assert_eq!(repo.create(&draft, owner).unwrap(), CreateOutcome::Conflict);

    // Same slug under a different locale is a different compound key.
    let translated = ResourceDraft::new("Squat Basics", "squat-basics", "de");
    assert!(matches!(
        repo.create(&translated, owner).unwrap(),
        CreateOutcome::Created(_)
    ));
}

#[test]
fn soft_deleted_slug_is_reusable() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let draft = ResourceDraft::new("Deload Week", "deload-week", "en");
    let CreateOutcome::Created(id) = repo.create(&draft, owner).unwrap() else {
        panic!("expected created outcome");
    };
    assert!(repo.soft_delete(id).unwrap());

    assert!(matches!(
        repo.create(&draft, owner).unwrap(),
        CreateOutcome::Created(_)
    ));
}

#[test]
fn soft_delete_is_idempotent_and_preserves_tombstone() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let draft = ResourceDraft::new("Conditioning", "conditioning", "en");
    let CreateOutcome::Created(id) = repo.create(&draft, owner).unwrap() else {
        panic!("expected created outcome");
    };

    assert!(repo.soft_delete(id).unwrap());
    let first = repo.get(id, true).unwrap().unwrap();
    assert_eq!(first.state(), RecordState::Archived);
    let tombstone = first.deleted_at.unwrap();

    assert!(!repo.soft_delete(id).unwrap());
    let second = repo.get(id, true).unwrap().unwrap();
    assert_eq!(second.deleted_at, Some(tombstone));

    // Unknown ids are a no-op as well, never an error.
    assert!(!repo.soft_delete(Uuid::new_v4()).unwrap());
}

#[test]
fn get_hides_archived_rows_unless_requested() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();

    let draft = ResourceDraft::new("Archived Plan", "archived-plan", "en");
    let CreateOutcome::Created(id) = repo.create(&draft, Uuid::new_v4()).unwrap() else {
        panic!("expected created outcome");
    };
    repo.soft_delete(id).unwrap();

    assert!(repo.get(id, false).unwrap().is_none());
    assert!(repo.get(id, true).unwrap().is_some());
}

#[test]
fn hard_delete_removes_archived_and_active_rows() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();

    let draft = ResourceDraft::new("Temp Plan", "temp-plan", "en");
    let CreateOutcome::Created(id) = repo.create(&draft, Uuid::new_v4()).unwrap() else {
        panic!("expected created outcome");
    };
    repo.soft_delete(id).unwrap();

    assert!(repo.hard_delete(id).unwrap());
    assert!(repo.get(id, true).unwrap().is_none());
    assert!(!repo.hard_delete(id).unwrap());
}

#[test]
fn update_reports_not_found_and_conflict_as_outcomes() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let CreateOutcome::Created(id_a) = repo
        .create(&ResourceDraft::new("Plan A", "plan-a", "en"), owner)
        .unwrap()
    else {
        panic!("expected created outcome");
    };
    let CreateOutcome::Created(id_b) = repo
        .create(&ResourceDraft::new("Plan B", "plan-b", "en"), owner)
        .unwrap()
    else {
        panic!("expected created outcome");
    };

    let mut record_b = repo.get(id_b, false).unwrap().unwrap();
    record_b.slug = "plan-a".to_string();
    assert_eq!(repo.update(&record_b).unwrap(), UpdateOutcome::Conflict);

    record_b.slug = "plan-b-revised".to_string();
    assert_eq!(repo.update(&record_b).unwrap(), UpdateOutcome::Updated);

    let mut missing = repo.get(id_a, false).unwrap().unwrap();
    missing.id = Uuid::new_v4();
    assert_eq!(repo.update(&missing).unwrap(), UpdateOutcome::NotFound);
}

#[test]
fn update_rejects_invalid_fields_before_sql() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();

    let CreateOutcome::Created(id) = repo
        .create(&ResourceDraft::new("Plan", "plan", "en"), Uuid::new_v4())
        .unwrap()
    else {
        panic!("expected created outcome");
    };

    let mut record = repo.get(id, false).unwrap().unwrap();
    record.slug = "Not A Slug".to_string();
    assert!(matches!(
        repo.update(&record).unwrap_err(),
        RepoError::Validation(_)
    ));
}

#[test]
fn active_pair_is_unique_for_relationship_links() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &COACH_ATHLETE_LINKS).unwrap();
    let coach = Uuid::new_v4();
    let athlete = Uuid::new_v4();

    let mut link = ResourceDraft::new("Coaching Link", "coaching-link", "en");
    link.assigned_to = Some(athlete);

    let CreateOutcome::Created(id) = repo.create(&link, coach).unwrap() else {
        panic!("expected created outcome");
    };

    let mut duplicate = ResourceDraft::new("Second Link", "second-link", "en");
    duplicate.assigned_to = Some(athlete);
    assert_eq!(repo.create(&duplicate, coach).unwrap(), CreateOutcome::Conflict);

    // Archiving the link frees the pair for re-linking.
    assert!(repo.soft_delete(id).unwrap());
    assert!(matches!(
        repo.create(&duplicate, coach).unwrap(),
        CreateOutcome::Created(_)
    ));
}

#[test]
fn list_paginates_with_stable_recency_order() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    for index in 0..5 {
        let draft = ResourceDraft::new(format!("Plan {index}"), format!("plan-{index}"), "en");
        repo.create(&draft, owner).unwrap();
    }

    let filter = ListFilter {
        page: 1,
        limit: 2,
        ..ListFilter::default()
    };
    let first = repo.list(&AccessScope::Unrestricted, &filter).unwrap();
    assert_eq!(first.items.len(), 2);
    assert_eq!(first.total, 5);
    assert_eq!(first.page, 1);
    assert_eq!(first.limit, 2);

    let filter = ListFilter {
        page: 3,
        limit: 2,
        ..ListFilter::default()
    };
    let last = repo.list(&AccessScope::Unrestricted, &filter).unwrap();
    assert_eq!(last.items.len(), 1);

    // Same timestamps resolve by id; pages never overlap.
    let mut seen = std::collections::HashSet::new();
    for page in 1..=3 {
        let filter = ListFilter {
            page,
            limit: 2,
            ..ListFilter::default()
        };
        for item in repo.list(&AccessScope::Unrestricted, &filter).unwrap().items {
            assert!(seen.insert(item.id));
        }
    }
    assert_eq!(seen.len(), 5);
}

#[test]
fn free_text_matches_case_insensitive_substrings() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    let owner = Uuid::new_v4();

    let mut squat = ResourceDraft::new("Back Squat Progression", "back-squat", "en");
    squat.description = Some("Linear progression for the back squat.".to_string());
    repo.create(&squat, owner).unwrap();
    repo.create(&ResourceDraft::new("Bench Press", "bench-press", "en"), owner)
        .unwrap();

    let filter = ListFilter {
        free_text: Some("SQUAT".to_string()),
        ..ListFilter::default()
    };
    let page = repo.list(&AccessScope::Unrestricted, &filter).unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].slug, "back-squat");
}

#[test]
fn open_db_creates_file_database_with_schema() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coachdesk.sqlite3");

    let conn = coachdesk_core::db::open_db(&path).unwrap();
    let repo = SqliteResourceRepository::try_new(&conn, &PROGRAMS).unwrap();
    repo.create(&ResourceDraft::new("File Plan", "file-plan", "en"), Uuid::new_v4())
        .unwrap();

    assert!(path.exists());
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    let err = SqliteResourceRepository::try_new(&conn, &PROGRAMS)
        .err()
        .expect("uninitialized connection must be rejected");
    assert!(matches!(
        err,
        RepoError::UninitializedConnection {
            actual_version: 0,
            ..
        }
    ));
}
