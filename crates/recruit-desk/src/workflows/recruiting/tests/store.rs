use std::sync::{Arc, Mutex};

use serde_json::{json, Value};

use super::common::*;
use crate::workflows::recruiting::domain::{StoreState, Workstation};
use crate::workflows::recruiting::migration::CURRENT_SCHEMA_VERSION;
use crate::workflows::recruiting::storage::{FileStorage, MemoryStorage, StorageMedium};
use crate::workflows::recruiting::store::{Store, DEFAULT_STORAGE_KEY};

#[test]
fn set_state_notifies_each_subscriber_once_with_committed_state() {
    let (mut store, _) = seeded_store();
    let received: Arc<Mutex<Vec<StoreState>>> = Arc::default();
    let sink = received.clone();
    store.subscribe(move |state| sink.lock().expect("listener mutex").push(state));

    store.set_state(|state| state.settings.annual_goal = 12);

    let received = received.lock().expect("listener mutex");
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], store.get_state());
    assert_eq!(received[0].settings.annual_goal, 12);
}

#[test]
fn snapshots_are_independent_of_the_store() {
    let (mut store, _) = seeded_store();
    let mut snapshot = store.get_state();
    snapshot.applicants.clear();
    snapshot.settings.annual_goal = 999;

    let current = store.get_state();
    assert_eq!(current.applicants.len(), 2);
    assert_eq!(current.settings.annual_goal, 40);

    let before = store.get_state();
    store.set_state(|state| state.applicants[0].notes = "changed".to_string());
    assert_eq!(before.applicants[0].notes, "Strong candidate.");
}

#[test]
fn commits_persist_under_the_configured_key() {
    let (mut store, medium) = seeded_store();
    store.set_state(|state| state.settings.recruiter_name = "SSG Rivera".to_string());

    let raw = medium.raw(DEFAULT_STORAGE_KEY).expect("state persisted");
    let value: Value = serde_json::from_str(&raw).expect("persisted json");
    assert_eq!(value["schemaVersion"], json!(CURRENT_SCHEMA_VERSION));
    assert_eq!(value["settings"]["recruiterName"], json!("SSG Rivera"));
}

#[test]
fn persistence_failure_keeps_the_in_memory_change() {
    let mut store = Store::load(UnavailableStorage, DEFAULT_STORAGE_KEY);
    let notified = Arc::new(Mutex::new(0usize));
    let counter = notified.clone();
    store.subscribe(move |_| *counter.lock().expect("counter mutex") += 1);

    store.set_state(|state| state.settings.annual_goal = 7);

    assert_eq!(store.get_state().settings.annual_goal, 7);
    assert_eq!(*notified.lock().expect("counter mutex"), 1);
}

#[test]
fn failed_mutation_commits_nothing() {
    let (mut store, medium) = seeded_store();
    let notified = Arc::new(Mutex::new(0usize));
    let counter = notified.clone();
    store.subscribe(move |_| *counter.lock().expect("counter mutex") += 1);
    let before = store.get_state();

    let outcome: Result<(), &str> = store.try_set_state(|state| {
        state.applicants.clear();
        Err("rejected")
    });

    assert_eq!(outcome, Err("rejected"));
    assert_eq!(store.get_state(), before);
    assert_eq!(*notified.lock().expect("counter mutex"), 0);
    assert!(medium.raw(DEFAULT_STORAGE_KEY).is_none());
}

#[test]
fn unsubscribed_listeners_stop_receiving() {
    let (mut store, _) = seeded_store();
    let notified = Arc::new(Mutex::new(0usize));
    let counter = notified.clone();
    let subscription = store.subscribe(move |_| *counter.lock().expect("counter mutex") += 1);

    store.set_state(|_| ());
    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    store.set_state(|_| ());

    assert_eq!(*notified.lock().expect("counter mutex"), 1);
    assert_eq!(store.subscriber_count(), 0);
}

#[test]
fn load_migrates_legacy_payload_and_falls_back_on_garbage() {
    let legacy = json!({ "applicants": [{ "id": "a", "name": "Kim", "stage": "Training" }] });
    let medium = MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, legacy.to_string());
    let store = Store::load(medium, DEFAULT_STORAGE_KEY);
    let state = store.get_state();
    assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(state.applicants[0].name, "Kim");
    assert_eq!(state.workstation, Workstation::default());

    let garbage = MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, "{not json");
    let store = Store::load(garbage, DEFAULT_STORAGE_KEY);
    assert_eq!(store.get_state().applicants.len(), 2);
}

#[test]
fn one_bad_value_does_not_replace_persisted_applicants() {
    let persisted = json!({
        "schemaVersion": 3,
        "applicants": [{ "id": "a", "name": "Real Person", "stage": "Medical" }],
        "settings": { "annualGoal": "50", "calendar": "fax" }
    });
    let medium = MemoryStorage::with_entry(DEFAULT_STORAGE_KEY, persisted.to_string());
    let mut store = Store::load(medium.clone(), DEFAULT_STORAGE_KEY);

    store.set_state(|state| state.settings.recruiter_name = "SSG Park".to_string());

    let written = medium
        .get(DEFAULT_STORAGE_KEY)
        .expect("read works")
        .expect("state persisted");
    let written: Value = serde_json::from_str(&written).expect("json");
    assert_eq!(written["applicants"][0]["name"], json!("Real Person"));
    assert_eq!(written["applicants"].as_array().map(Vec::len), Some(1));
    assert_eq!(written["settings"]["annualGoal"], json!(50));
    assert_eq!(written["quarantine"], json!({ "settings": [{ "calendar": "fax" }] }));
}

#[test]
fn reset_clears_persisted_key_and_notifies() {
    let (mut store, medium) = seeded_store();
    store.set_state(|state| state.applicants.clear());
    assert!(medium.raw(DEFAULT_STORAGE_KEY).is_some());

    let notified = Arc::new(Mutex::new(Vec::new()));
    let sink = notified.clone();
    store.subscribe(move |state: StoreState| {
        sink.lock().expect("listener mutex").push(state.applicants.len())
    });
    store.reset();

    assert!(medium.raw(DEFAULT_STORAGE_KEY).is_none());
    assert_eq!(store.get_state().applicants.len(), 2);
    assert_eq!(*notified.lock().expect("listener mutex"), vec![2]);
}

#[test]
fn file_backed_store_survives_reload() {
    let dir = tempfile::tempdir().expect("temp dir");
    let medium = FileStorage::new(dir.path());

    let mut store = Store::load(medium.clone(), "desk-state");
    store.set_state(|state| state.settings.annual_goal = 64);
    drop(store);

    assert!(medium.get("desk-state").expect("readable").is_some());
    let reloaded = Store::load(medium, "desk-state");
    assert_eq!(reloaded.get_state().settings.annual_goal, 64);
}
