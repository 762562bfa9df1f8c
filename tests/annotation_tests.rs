use bubbly_core::annotations::{export_filename, storage_key, AnnotationStore};
use bubbly_core::db::open_store;
use bubbly_core::diagnostics::DiagnosticsLog;
use bubbly_core::models::{AnnotationPayload, AnnotationTag, MessageKey, ReportId};
use bubbly_core::storage::{MemoryStorage, StorageBackend};
use bubbly_core::CoreError;
use tempfile::tempdir;

const PREFIX: &str = "bubbly-annotations";

struct FailingStorage;

impl StorageBackend for FailingStorage {
    fn read(&self, _key: &str) -> Result<Option<String>, CoreError> {
        Ok(None)
    }

    fn write(&mut self, _key: &str, _value: &str) -> Result<(), CoreError> {
        Err(CoreError::StorageWrite("quota exceeded".to_string()))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn report() -> ReportId {
    ReportId::new("aaaa1111bbbb2222")
}

fn key(raw: &str) -> MessageKey {
    MessageKey::new(raw)
}

fn store_with_tags() -> AnnotationStore<MemoryStorage> {
    let mut store = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    store.set_tag(&key("m1"), "Important", true);
    store.set_tag(&key("m1"), "Follow-up", true);
    store.set_tag(&key("m2"), "Relevant", true);
    store
}

#[test]
fn get_tags_is_empty_for_unknown_keys() {
    let store = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    assert!(store.get_tags(&key("nope")).is_empty());
}

#[test]
fn tags_come_back_in_vocabulary_order() {
    let mut store = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    store.set_tag(&key("m1"), "Follow-up", true);
    store.set_tag(&key("m1"), "Important", true);
    assert_eq!(
        store.get_tags(&key("m1")),
        vec![AnnotationTag::Important, AnnotationTag::FollowUp]
    );
}

#[test]
fn set_then_unset_leaves_no_entry() {
    let mut store = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    assert!(store.set_tag(&key("m1"), "Important", true));
    assert!(store.set_tag(&key("m1"), "Important", false));
    assert!(store.get_tags(&key("m1")).is_empty());
    assert!(store.assignments().is_empty());
    assert!(store.export_payload().assignments.is_empty());

    let saved = store
        .backend()
        .read(store.storage_key())
        .expect("read")
        .expect("persisted");
    assert!(!saved.contains("m1"));
}

#[test]
fn tag_names_are_normalized_and_vocabulary_checked() {
    let mut store = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    assert!(store.set_tag(&key("m1"), "  Follow-up\t", true));
    assert!(!store.set_tag(&key("m1"), "Urgent", true));
    assert!(!store.set_tag(&key("m1"), "Follow-up", true));
    assert!(!store.set_tag(&key("m2"), "Important", false));
    assert_eq!(store.get_tags(&key("m1")), vec![AnnotationTag::FollowUp]);
}

#[test]
fn every_mutation_is_persisted_under_the_report_key() {
    let store = store_with_tags();
    assert_eq!(store.storage_key(), storage_key(PREFIX, &report()));
    assert_eq!(store.storage_key(), "bubbly-annotations:aaaa1111bbbb2222");

    let reopened = AnnotationStore::open(report(), PREFIX, store.backend().clone());
    assert_eq!(reopened.assignments(), store.assignments());
}

#[test]
fn other_reports_do_not_see_saved_state() {
    let store = store_with_tags();
    let other = AnnotationStore::open(ReportId::new("ffff0000ffff0000"), PREFIX, store.backend().clone());
    assert!(other.assignments().is_empty());
}

#[test]
fn foreign_or_malformed_saved_state_is_skipped() {
    let mut backend = MemoryStorage::new();
    let payload = r#"{"version":1,"report_id":"someone-else","assignments":{"m1":["Important"]}}"#;
    backend.write(&storage_key(PREFIX, &report()), payload).expect("seed");
    let store = AnnotationStore::open(report(), PREFIX, backend);
    assert!(store.assignments().is_empty());

    let mut backend = MemoryStorage::new();
    backend.write(&storage_key(PREFIX, &report()), "{broken").expect("seed");
    let store = AnnotationStore::open(report(), PREFIX, backend);
    assert!(store.assignments().is_empty());
}

#[test]
fn export_then_import_round_trips() {
    let store = store_with_tags();
    let payload = store.export_payload();
    assert_eq!(payload.version, 1);
    assert_eq!(payload.report_id, Some(report()));
    assert!(payload.updated_at.is_some());

    let mut fresh = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    let annotated = fresh.import_payload(payload, false).expect("import");
    assert_eq!(annotated, 2);
    for raw in ["m1", "m2", "m3"] {
        assert_eq!(fresh.get_tags(&key(raw)), store.get_tags(&key(raw)));
    }
}

#[test]
fn export_json_round_trips_through_import_json() {
    let store = store_with_tags();
    let json = store.export_json().expect("export");
    let mut fresh = AnnotationStore::open(report(), PREFIX, MemoryStorage::new());
    fresh.import_json(&json, false).expect("import");
    assert_eq!(fresh.assignments(), store.assignments());
    assert_eq!(store.export_filename(), export_filename(&report()));
    assert_eq!(store.export_filename(), "bubbly-annotations-aaaa1111bbbb2222.json");
}

#[test]
fn mismatched_report_is_refused_without_changes() {
    let mut store = store_with_tags();
    let before = store.assignments().clone();
    let foreign = AnnotationPayload {
        version: 1,
        report_id: Some(ReportId::new("0000000000000000")),
        updated_at: None,
        assignments: [(key("x"), vec!["Important".to_string()])].into_iter().collect(),
    };

    let err = store.import_payload(foreign.clone(), false).expect_err("mismatch");
    assert!(matches!(err, CoreError::ReportMismatch { .. }));
    assert_eq!(store.assignments(), &before);

    store.import_payload(foreign, true).expect("confirmed import");
    assert_eq!(store.get_tags(&key("x")), vec![AnnotationTag::Important]);
    assert!(store.get_tags(&key("m1")).is_empty());
}

#[test]
fn payload_without_report_id_is_accepted() {
    let mut store = store_with_tags();
    let annotated = store
        .import_json(r#"{"assignments":{"m9":["Relevant","Bogus"]}}"#, false)
        .expect("import");
    assert_eq!(annotated, 1);
    assert_eq!(store.get_tags(&key("m9")), vec![AnnotationTag::Relevant]);
    assert!(store.get_tags(&key("m1")).is_empty());
}

#[test]
fn malformed_import_leaves_state_untouched() {
    let mut store = store_with_tags();
    let before = store.assignments().clone();
    for bad in ["[1,2]", "\"text\"", "{", r#"{"assignments":[]}"#] {
        let err = store.import_json(bad, true).expect_err("format error");
        assert!(matches!(err, CoreError::ImportFormat(_)), "{bad}: {err}");
    }
    assert_eq!(store.assignments(), &before);
}

#[test]
fn write_failures_are_swallowed_and_logged() {
    init_tracing();
    let dir = tempdir().expect("temp");
    let log = DiagnosticsLog::new(dir.path());
    let mut store = AnnotationStore::open(report(), PREFIX, FailingStorage).with_diagnostics(log.clone());

    assert!(store.set_tag(&key("m1"), "Important", true));
    assert_eq!(store.get_tags(&key("m1")), vec![AnnotationTag::Important]);

    let events = log.events().expect("events");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, "storage_write_error");
    assert!(events[0].message.contains("quota exceeded"));
}

#[test]
fn sqlite_backend_persists_across_sessions() {
    let dir = tempdir().expect("temp");
    let path = dir.path().join("annotations.sqlite");
    {
        let mut store = AnnotationStore::open(report(), PREFIX, open_store(&path).expect("open"));
        store.set_tag(&key("m1"), "Relevant", true);
    }
    let store = AnnotationStore::open(report(), PREFIX, open_store(&path).expect("reopen"));
    assert_eq!(store.get_tags(&key("m1")), vec![AnnotationTag::Relevant]);
    assert_eq!(
        store.backend().list_keys(PREFIX).expect("keys"),
        vec![storage_key(PREFIX, &report())]
    );
}
