use serde_json::{json, Value};

use crate::workflows::recruiting::domain::{Settings, Stage, StoreState, Workstation};
use crate::workflows::recruiting::migration::{migrate, CURRENT_SCHEMA_VERSION, QUARANTINE_FIELD};

fn legacy_v1() -> Value {
    json!({
        "applicants": [
            {
                "id": "a-1",
                "name": "Jordan Lee",
                "stage": "Medical",
                "height": "66",
                "weight": "168",
                "gender": "female",
                "education": "GED"
            }
        ],
        "events": [
            {
                "id": "e-1",
                "title": "MEPS ride",
                "date": "2026-10-20",
                "time": "05:45",
                "applicantId": "a-1"
            }
        ],
        "foo": { "kept": true }
    })
}

#[test]
fn absent_state_is_seeded_at_current_version() {
    for raw in [None, Some(Value::Null)] {
        let state = migrate(raw);
        assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
        let names: Vec<&str> = state
            .applicants
            .iter()
            .map(|applicant| applicant.name.as_str())
            .collect();
        assert_eq!(names, vec!["Alex Johnson", "Maria Garcia"]);
        assert_eq!(state.events.len(), 1);
        assert_eq!(
            state.applicant_for_event(&state.events[0]).map(|a| a.stage),
            Some(Stage::Interview)
        );
    }
}

#[test]
fn legacy_record_gains_defaults_and_keeps_unknown_fields() {
    let state = migrate(Some(legacy_v1()));

    assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
    assert_eq!(state.settings, Settings::default());
    assert_eq!(state.workstation, Workstation::default());
    assert!(state.checklist.is_empty());
    assert_eq!(state.extra.get("foo"), Some(&json!({ "kept": true })));

    let applicant = &state.applicants[0];
    assert_eq!(applicant.measurements.height, Some(66.0));
    assert_eq!(applicant.profile_field("education"), Some(&json!("GED")));
    assert_eq!(state.events[0].applicant_id.as_ref().map(|id| id.as_str()), Some("a-1"));
}

#[test]
fn migrate_is_idempotent() {
    let once = migrate(Some(legacy_v1()));
    let reserialized = serde_json::to_value(&once).expect("state serializes");
    let twice = migrate(Some(reserialized));
    assert_eq!(once, twice);
}

#[test]
fn partial_settings_are_merged_not_replaced() {
    let state = migrate(Some(json!({
        "schemaVersion": 1,
        "applicants": [],
        "settings": { "annualGoal": 55, "theme": "dark" }
    })));
    assert_eq!(state.settings.annual_goal, 55);
    assert_eq!(state.settings.aging_stale_days, 14);
    assert_eq!(state.settings.extra.get("theme"), Some(&json!("dark")));
}

#[test]
fn malformed_settings_are_replaced_with_defaults_and_quarantined() {
    let state = migrate(Some(json!({ "applicants": [], "settings": "oops" })));
    assert_eq!(state.settings, Settings::default());
    assert_eq!(
        state.extra.get(QUARANTINE_FIELD),
        Some(&json!({ "settings": ["oops"] }))
    );
}

#[test]
fn newer_version_is_accepted_and_restamped() {
    let state = migrate(Some(json!({
        "schemaVersion": 9,
        "applicants": [],
        "events": [],
        "futureField": [1, 2, 3]
    })));
    assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
    assert!(state.applicants.is_empty());
    assert_eq!(state.extra.get("futureField"), Some(&json!([1, 2, 3])));
}

#[test]
fn unrecoverable_input_falls_back_to_seed() {
    for raw in [json!([1, 2, 3]), json!("state")] {
        let state = migrate(Some(raw));
        assert_eq!(state.schema_version, CURRENT_SCHEMA_VERSION);
        assert_eq!(state.applicants.len(), 2);
    }
}

fn names(state: &StoreState) -> Vec<&str> {
    state
        .applicants
        .iter()
        .map(|applicant| applicant.name.as_str())
        .collect()
}

fn real_person() -> Value {
    json!({ "id": "a-9", "name": "Real Person", "stage": "Screening" })
}

#[test]
fn string_settings_counts_are_read_as_numbers() {
    let state = migrate(Some(json!({
        "schemaVersion": 3,
        "applicants": [real_person()],
        "settings": { "annualGoal": "50", "agingWarnDays": 5.0 }
    })));
    assert_eq!(names(&state), vec!["Real Person"]);
    assert_eq!(state.settings.annual_goal, 50);
    assert_eq!(state.settings.aging_warn_days, 5);
    assert!(state.extra.get(QUARANTINE_FIELD).is_none());
}

#[test]
fn unusable_settings_keys_are_quarantined_individually() {
    let state = migrate(Some(json!({
        "schemaVersion": 3,
        "applicants": [real_person()],
        "settings": { "annualGoal": "lots", "recruiterName": "SSG Park", "calendar": "fax" }
    })));
    assert_eq!(names(&state), vec!["Real Person"]);
    assert_eq!(state.settings.annual_goal, Settings::default().annual_goal);
    assert_eq!(state.settings.recruiter_name, "SSG Park");
    assert_eq!(
        state.extra.get(QUARANTINE_FIELD),
        Some(&json!({ "settings": [{ "annualGoal": "lots" }, { "calendar": "fax" }] }))
    );
}

#[test]
fn numeric_ids_are_kept_as_text() {
    let state = migrate(Some(json!({
        "schemaVersion": 3,
        "applicants": [{ "id": 1, "name": "Real Person", "stage": "Interview" }],
        "events": [{ "id": 7, "title": "Call", "date": "2026-10-20", "applicantId": 1 }]
    })));
    assert_eq!(state.applicants[0].id.as_str(), "1");
    assert_eq!(state.events[0].id.as_str(), "7");
    assert_eq!(
        state.applicant_for_event(&state.events[0]).map(|a| a.name.as_str()),
        Some("Real Person")
    );
}

#[test]
fn invalid_records_are_quarantined_and_the_rest_kept() {
    let unknown_category = json!({ "id": "e-1", "title": "MEPS", "date": "2026-10-20", "category": "meps" });
    let bad_time = json!({ "id": "e-2", "title": "Swear-in", "date": "2026-10-21", "time": "noonish" });
    let good_event = json!({ "id": "e-3", "title": "Call", "date": "2026-10-22" });
    let bad_applicant = json!({ "id": "a-2", "name": "Boot", "stage": "Boot Camp" });

    let state = migrate(Some(json!({
        "schemaVersion": 3,
        "applicants": [real_person(), bad_applicant.clone()],
        "events": [unknown_category.clone(), bad_time.clone(), good_event],
        "applicants_extra": "kept"
    })));

    assert_eq!(names(&state), vec!["Real Person"]);
    let event_ids: Vec<&str> = state.events.iter().map(|event| event.id.as_str()).collect();
    assert_eq!(event_ids, vec!["e-3"]);
    assert_eq!(state.extra.get("applicants_extra"), Some(&json!("kept")));
    assert_eq!(
        state.extra.get(QUARANTINE_FIELD),
        Some(&json!({
            "applicants": [bad_applicant],
            "events": [unknown_category, bad_time]
        }))
    );
}

#[test]
fn quarantine_survives_repeated_migration() {
    let once = migrate(Some(json!({
        "applicants": [real_person(), { "id": "a-2", "name": "Boot", "stage": "Boot Camp" }]
    })));
    let twice = migrate(Some(serde_json::to_value(&once).expect("state serializes")));
    assert_eq!(once, twice);
    assert_eq!(
        twice.extra[QUARANTINE_FIELD]["applicants"]
            .as_array()
            .map(Vec::len),
        Some(1)
    );
}

#[test]
fn non_array_collection_is_quarantined_without_seeding() {
    let state = migrate(Some(json!({ "applicants": "nope", "events": [] })));
    assert!(state.applicants.is_empty());
    assert_eq!(
        state.extra.get(QUARANTINE_FIELD),
        Some(&json!({ "applicants": ["nope"] }))
    );
}

#[test]
fn unmodelled_record_fields_survive_migration() {
    let state = migrate(Some(json!({
        "schemaVersion": 3,
        "events": [{ "id": "e", "title": "t", "date": "2026-10-20", "stage": "Medical", "event-id": "x" }],
        "checklist": [{ "id": 4, "title": "Packet", "items": [{ "label": "DD-214", "source": "scan" }], "color": "red" }],
        "workstation": {
            "drills": [{ "id": "d", "title": "Push-ups", "reps": 20 }],
            "packing": [{ "id": "p", "label": "ID", "qty": 2 }]
        },
        "notifications": {
            "reminders": { "k": { "label": "Call", "fireAt": "2026-10-20T09:00:00Z", "channel": "sms" } }
        }
    })));

    let value = serde_json::to_value(&state).expect("state serializes");
    assert_eq!(value["events"][0]["stage"], json!("Medical"));
    assert_eq!(value["events"][0]["event-id"], json!("x"));
    assert_eq!(value["checklist"][0]["id"], json!("4"));
    assert_eq!(value["checklist"][0]["color"], json!("red"));
    assert_eq!(value["checklist"][0]["items"][0]["source"], json!("scan"));
    assert_eq!(value["workstation"]["drills"][0]["reps"], json!(20));
    assert_eq!(value["workstation"]["packing"][0]["qty"], json!(2));
    assert_eq!(value["notifications"]["reminders"]["k"]["channel"], json!("sms"));
}
