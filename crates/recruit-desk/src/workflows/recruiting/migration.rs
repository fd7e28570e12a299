//! Persisted-state migration registry.
//!
//! Steps are registered in strictly increasing version order and each one only adds fields
//! that are missing, so folding them over any prior generation is lossless and re-running
//! them on current data is a no-op.
//!
//! Typed loading happens record by record. A record that no longer fits the current types is
//! moved verbatim under the top-level `quarantine` field instead of being dropped.

use std::collections::BTreeMap;
use std::fmt::Display;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::domain::{Settings, StoreState, Workstation};
use super::seed::seed_state;

pub const CURRENT_SCHEMA_VERSION: u32 = 3;

const VERSION_FIELD: &str = "schemaVersion";

/// Top-level field holding persisted values that failed typed validation, grouped by section.
pub const QUARANTINE_FIELD: &str = "quarantine";

type Record = Map<String, Value>;

#[derive(Debug, Clone, Copy)]
struct MigrationStep {
    version: u32,
    apply: fn(Record) -> Record,
}

const MIGRATIONS: &[MigrationStep] = &[
    MigrationStep {
        version: 2,
        apply: add_settings,
    },
    MigrationStep {
        version: 3,
        apply: add_workstation_and_checklist,
    },
];

/// Reads the version tag of a raw record. Missing or non-integer tags count as version 1.
pub fn detect_version(record: &Record) -> u32 {
    record
        .get(VERSION_FIELD)
        .and_then(Value::as_u64)
        .and_then(|version| u32::try_from(version).ok())
        .filter(|version| *version >= 1)
        .unwrap_or(1)
}

/// Upgrades a raw record to the current schema. Never fails: absent or non-object input
/// yields freshly seeded state, and invalid records inside an object are quarantined.
pub fn migrate(raw: Option<Value>) -> StoreState {
    let record = match raw {
        Some(Value::Object(record)) => record,
        None | Some(Value::Null) => return seed_state(Utc::now()),
        Some(other) => {
            warn!(kind = value_kind(&other), "persisted state is not an object; seeding");
            return seed_state(Utc::now());
        }
    };

    load_record(migrate_record(record))
}

/// Builds typed state from an upgraded record without discarding anything it holds.
fn load_record(mut record: Record) -> StoreState {
    let mut salvage = Salvage::new(record.remove(QUARANTINE_FIELD));

    let applicants = salvage.records("applicants", record.remove("applicants"));
    let events = salvage.records("events", record.remove("events"));
    let checklist = salvage.records("checklist", record.remove("checklist"));
    let workstation = salvage.section("workstation", record.remove("workstation"));
    let settings = salvage.section("settings", record.remove("settings"));
    let notifications = salvage.section("notifications", record.remove("notifications"));
    record.remove(VERSION_FIELD);

    let mut extra: BTreeMap<String, Value> = record.into_iter().collect();
    if let Some(quarantine) = salvage.finish() {
        extra.insert(QUARANTINE_FIELD.to_string(), quarantine);
    }

    StoreState {
        schema_version: CURRENT_SCHEMA_VERSION,
        applicants,
        events,
        checklist,
        workstation,
        settings,
        notifications,
        extra,
    }
}

struct Salvage {
    quarantine: Record,
    keep_empty: bool,
}

impl Salvage {
    fn new(existing: Option<Value>) -> Self {
        match existing {
            None => Self {
                quarantine: Record::new(),
                keep_empty: false,
            },
            Some(Value::Object(quarantine)) => Self {
                quarantine,
                keep_empty: true,
            },
            Some(other) => {
                let mut quarantine = Record::new();
                quarantine.insert(QUARANTINE_FIELD.to_string(), Value::Array(vec![other]));
                Self {
                    quarantine,
                    keep_empty: true,
                }
            }
        }
    }

    fn reject(&mut self, section: &str, value: Value, reason: &dyn Display) {
        warn!(section, error = %reason, "persisted value failed validation; quarantined");
        let slot = self
            .quarantine
            .entry(section.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        match slot {
            Value::Array(items) => items.push(value),
            other => {
                let previous = other.take();
                *other = Value::Array(vec![previous, value]);
            }
        }
    }

    /// Keeps every array entry that deserializes; the rest are quarantined.
    fn records<T: DeserializeOwned>(&mut self, section: &str, raw: Option<Value>) -> Vec<T> {
        let items = match raw {
            None | Some(Value::Null) => return Vec::new(),
            Some(Value::Array(items)) => items,
            Some(other) => {
                self.reject(section, other, &"expected an array");
                return Vec::new();
            }
        };

        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            match serde_json::from_value::<T>(item.clone()) {
                Ok(record) => kept.push(record),
                Err(err) => self.reject(section, item, &err),
            }
        }
        kept
    }

    /// Deserializes an object section, quarantining only the keys that do not fit.
    fn section<T: DeserializeOwned + Default>(&mut self, section: &str, raw: Option<Value>) -> T {
        let fields = match raw {
            None | Some(Value::Null) => return T::default(),
            Some(Value::Object(fields)) => fields,
            Some(other) => {
                self.reject(section, other, &"expected an object");
                return T::default();
            }
        };
        if let Ok(value) = serde_json::from_value::<T>(Value::Object(fields.clone())) {
            return value;
        }

        let mut accepted = Record::new();
        for (key, value) in fields {
            let mut candidate = accepted.clone();
            candidate.insert(key.clone(), value.clone());
            match serde_json::from_value::<T>(Value::Object(candidate)) {
                Ok(_) => {
                    accepted.insert(key, value);
                }
                Err(err) => {
                    let mut rejected = Record::new();
                    rejected.insert(key, value);
                    self.reject(section, Value::Object(rejected), &err);
                }
            }
        }
        serde_json::from_value(Value::Object(accepted)).unwrap_or_default()
    }

    fn finish(self) -> Option<Value> {
        (self.keep_empty || !self.quarantine.is_empty()).then(|| Value::Object(self.quarantine))
    }
}

/// Applies every pending step to the untyped record and stamps the current version.
/// Records tagged with a newer version pass through untouched apart from the stamp.
pub fn migrate_record(record: Record) -> Record {
    let from = detect_version(&record);
    let mut record = MIGRATIONS
        .iter()
        .filter(|step| step.version > from)
        .fold(record, |record, step| {
            debug!(version = step.version, "applying state migration");
            let mut next = (step.apply)(record);
            next.insert(VERSION_FIELD.to_string(), Value::from(step.version));
            next
        });

    record.insert(VERSION_FIELD.to_string(), Value::from(CURRENT_SCHEMA_VERSION));
    record
}

fn add_settings(mut record: Record) -> Record {
    let defaults = defaults_object::<Settings>();
    match record.get_mut("settings") {
        Some(Value::Object(existing)) => {
            for (key, value) in defaults {
                existing.entry(key).or_insert(value);
            }
        }
        Some(Value::Null) | None => {
            record.insert("settings".to_string(), Value::Object(defaults));
        }
        // Left in place so loading can quarantine it.
        Some(_) => {}
    }
    record
}

fn add_workstation_and_checklist(mut record: Record) -> Record {
    record
        .entry("workstation")
        .or_insert_with(|| Value::Object(defaults_object::<Workstation>()));
    record
        .entry("checklist")
        .or_insert_with(|| Value::Array(Vec::new()));
    record
}

fn defaults_object<T: Default + Serialize>() -> Record {
    match serde_json::to_value(T::default()) {
        Ok(Value::Object(map)) => map,
        _ => Record::new(),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
