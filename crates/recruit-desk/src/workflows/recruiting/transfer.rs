use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::bodycomp::BodyCompEvaluator;
use super::domain::{
    id_text, ApplicantRecord, ChecklistDocument, EventRecord, Measurements, Settings, StageEntry,
    StoreState,
};

/// Which part of the aggregate an export carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    #[default]
    Full,
    /// Applicants, events and checklist documents only.
    Weekly,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WeeklyExport<'a> {
    schema_version: u32,
    applicants: &'a [ApplicantRecord],
    events: &'a [EventRecord],
    checklist: &'a [ChecklistDocument],
}

/// Serializes a snapshot in the persisted JSON shape.
pub fn export_state(state: &StoreState, scope: ExportScope) -> Result<String, serde_json::Error> {
    match scope {
        ExportScope::Full => serde_json::to_string_pretty(state),
        ExportScope::Weekly => serde_json::to_string_pretty(&WeeklyExport {
            schema_version: state.schema_version,
            applicants: &state.applicants,
            events: &state.events,
            checklist: &state.checklist,
        }),
    }
}

/// Validation errors raised while merging an import payload.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("import payload is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("import payload must be a JSON object")]
    NotAnObject,
    #[error("`{collection}` must be an array of records")]
    NotAnArray { collection: &'static str },
    #[error("`{collection}` entry {index} needs a string or numeric `id`")]
    MissingId {
        collection: &'static str,
        index: usize,
    },
    #[error("`{collection}` record `{id}` is invalid: {source}")]
    InvalidRecord {
        collection: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("`settings` is invalid: {0}")]
    InvalidSettings(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeCounts {
    pub updated: usize,
    pub added: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub applicants: MergeCounts,
    pub events: MergeCounts,
    pub checklist: MergeCounts,
    pub settings_updated: bool,
}

/// Merges an untrusted payload into `state`, collection by collection, keyed by `id`.
///
/// Incoming fields overwrite the fields of an existing record with the same id, unseen ids
/// are appended in payload order, and records missing from the payload are kept. Numeric ids
/// are read as their digits. Stage history only grows, and applicants whose measurements
/// changed are screened again. `state` is only written once every collection has validated.
pub fn import_into(
    state: &mut StoreState,
    payload: &str,
    evaluator: &BodyCompEvaluator,
    now: DateTime<Utc>,
) -> Result<ImportSummary, ImportError> {
    let value: Value = serde_json::from_str(payload).map_err(ImportError::Malformed)?;
    let Value::Object(object) = value else {
        return Err(ImportError::NotAnObject);
    };

    let mut summary = ImportSummary::default();

    let applicants = match records(&object, "applicants")? {
        Some(incoming) => {
            let (mut merged, counts) = merge_by_id(&state.applicants, incoming, "applicants")?;
            let in_payload: BTreeSet<String> = incoming_ids(incoming).collect();
            for applicant in merged
                .iter_mut()
                .filter(|applicant| in_payload.contains(applicant.id.as_str()))
            {
                let existing = state.applicant(&applicant.id);
                if let Some(existing) = existing {
                    keep_history(applicant, &existing.stage_history);
                }
                let remeasured = match existing {
                    Some(existing) => existing.measurements != applicant.measurements,
                    None => applicant.measurements != Measurements::default(),
                };
                if remeasured {
                    applicant.body_comp = Some(evaluator.evaluate(&applicant.measurements));
                }
                if !applicant.advance_to(applicant.stage, now) {
                    applicant.touch(now);
                }
            }
            summary.applicants = counts;
            Some(merged)
        }
        None => None,
    };

    let events = match records(&object, "events")? {
        Some(incoming) => {
            let (merged, counts) = merge_by_id(&state.events, incoming, "events")?;
            summary.events = counts;
            Some(merged)
        }
        None => None,
    };

    let checklist = match records(&object, "checklist")? {
        Some(incoming) => {
            let (merged, counts) = merge_by_id(&state.checklist, incoming, "checklist")?;
            summary.checklist = counts;
            Some(merged)
        }
        None => None,
    };

    let settings = match object.get("settings") {
        Some(Value::Object(patch)) => Some(merge_settings(&state.settings, patch)?),
        Some(Value::Null) | None => None,
        Some(other) => {
            return Err(ImportError::InvalidSettings(serde::de::Error::custom(
                format!("expected an object, found {other}"),
            )))
        }
    };

    if let Some(applicants) = applicants {
        state.applicants = applicants;
    }
    if let Some(events) = events {
        state.events = events;
    }
    if let Some(checklist) = checklist {
        state.checklist = checklist;
    }
    if let Some(settings) = settings {
        state.settings = settings;
        summary.settings_updated = true;
    }

    Ok(summary)
}

fn records<'a>(
    object: &'a Map<String, Value>,
    collection: &'static str,
) -> Result<Option<&'a [Value]>, ImportError> {
    match object.get(collection) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) => Ok(Some(items.as_slice())),
        Some(_) => Err(ImportError::NotAnArray { collection }),
    }
}

fn incoming_ids(incoming: &[Value]) -> impl Iterator<Item = String> + '_ {
    incoming
        .iter()
        .filter_map(|item| item.get("id").and_then(id_text))
}

/// Keeps the existing history as a prefix and appends incoming entries it lacks.
fn keep_history(applicant: &mut ApplicantRecord, existing: &[StageEntry]) {
    let incoming = std::mem::replace(&mut applicant.stage_history, existing.to_vec());
    for entry in incoming {
        if !applicant.stage_history.contains(&entry) {
            applicant.stage_history.push(entry);
        }
    }
}

fn merge_by_id<T>(
    existing: &[T],
    incoming: &[Value],
    collection: &'static str,
) -> Result<(Vec<T>, MergeCounts), ImportError>
where
    T: Serialize + DeserializeOwned,
{
    let mut merged: Vec<(String, Map<String, Value>)> = Vec::with_capacity(existing.len());
    for record in existing {
        let fields = match serde_json::to_value(record) {
            Ok(Value::Object(fields)) => fields,
            Ok(_) => Map::new(),
            Err(source) => {
                return Err(ImportError::InvalidRecord {
                    collection,
                    id: String::new(),
                    source,
                })
            }
        };
        let id = fields
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        merged.push((id, fields));
    }

    let mut counts = MergeCounts::default();
    for (index, item) in incoming.iter().enumerate() {
        let Some(fields) = item.as_object() else {
            return Err(ImportError::MissingId { collection, index });
        };
        let Some(id) = fields.get("id").and_then(id_text) else {
            return Err(ImportError::MissingId { collection, index });
        };
        let mut fields = fields.clone();
        fields.insert("id".to_string(), Value::String(id.clone()));

        match merged.iter_mut().find(|(existing_id, _)| *existing_id == id) {
            Some((_, existing_fields)) => {
                existing_fields.extend(fields);
                counts.updated += 1;
            }
            None => {
                merged.push((id, fields));
                counts.added += 1;
            }
        }
    }

    let records = merged
        .into_iter()
        .map(|(id, fields)| {
            serde_json::from_value(Value::Object(fields)).map_err(|source| {
                ImportError::InvalidRecord {
                    collection,
                    id,
                    source,
                }
            })
        })
        .collect::<Result<Vec<T>, ImportError>>()?;

    Ok((records, counts))
}

fn merge_settings(current: &Settings, patch: &Map<String, Value>) -> Result<Settings, ImportError> {
    let mut fields = match serde_json::to_value(current).map_err(ImportError::InvalidSettings)? {
        Value::Object(fields) => fields,
        _ => Map::new(),
    };
    fields.extend(patch.clone());
    serde_json::from_value(Value::Object(fields)).map_err(ImportError::InvalidSettings)
}
