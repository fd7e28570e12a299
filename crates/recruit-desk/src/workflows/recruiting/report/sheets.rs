use super::super::domain::{ApplicantId, Gender, StoreState};
use serde::Serialize;
use serde_json::Value;

/// Renders a downloadable document from a state snapshot.
pub trait ReportGenerator {
    fn content_type(&self) -> &'static str;
    fn file_name(&self, state: &StoreState) -> String;
    fn render(&self, state: &StoreState) -> Result<Vec<u8>, ReportError>;
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("applicant `{0}` not found")]
    ApplicantNotFound(String),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error("failed to flush report: {0}")]
    Flush(String),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

/// One CSV row per applicant, in roster order.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvRosterReport;

#[derive(Serialize)]
struct RosterRow<'a> {
    id: &'a str,
    name: &'a str,
    stage: &'static str,
    height: Option<f64>,
    weight: Option<f64>,
    age: Option<f64>,
    gender: Option<&'static str>,
    body_composition: &'static str,
    checklist: String,
    last_activity: String,
    notes: &'a str,
}

impl ReportGenerator for CsvRosterReport {
    fn content_type(&self) -> &'static str {
        "text/csv; charset=utf-8"
    }

    fn file_name(&self, _state: &StoreState) -> String {
        "applicant-roster.csv".to_string()
    }

    fn render(&self, state: &StoreState) -> Result<Vec<u8>, ReportError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        for applicant in &state.applicants {
            let measurements = &applicant.measurements;
            writer.serialize(RosterRow {
                id: applicant.id.as_str(),
                name: &applicant.name,
                stage: applicant.stage.label(),
                height: measurements.height,
                weight: measurements.weight,
                age: measurements.age,
                gender: measurements.gender.map(Gender::as_str),
                body_composition: applicant
                    .body_comp
                    .as_ref()
                    .map(|result| result.status.label())
                    .unwrap_or(""),
                checklist: applicant
                    .checklist
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join("; "),
                last_activity: applicant
                    .touched_at
                    .map(|at| at.to_rfc3339())
                    .unwrap_or_default(),
                notes: &applicant.notes,
            })?;
        }
        writer
            .into_inner()
            .map_err(|err| ReportError::Flush(err.to_string()))
    }
}

/// Plain-text sheet: a title line followed by `key: value` for every stored field but `id`.
#[derive(Debug, Clone)]
pub struct ApplicantSheetReport {
    applicant_id: ApplicantId,
}

impl ApplicantSheetReport {
    pub fn new(applicant_id: ApplicantId) -> Self {
        Self { applicant_id }
    }
}

impl ReportGenerator for ApplicantSheetReport {
    fn content_type(&self) -> &'static str {
        "text/plain; charset=utf-8"
    }

    fn file_name(&self, state: &StoreState) -> String {
        let name = state
            .applicant(&self.applicant_id)
            .map(|applicant| applicant.name.as_str())
            .unwrap_or("applicant");
        let slug: String = name
            .chars()
            .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '_' })
            .collect();
        format!("{slug}_report.txt")
    }

    fn render(&self, state: &StoreState) -> Result<Vec<u8>, ReportError> {
        let applicant = state
            .applicant(&self.applicant_id)
            .ok_or_else(|| ReportError::ApplicantNotFound(self.applicant_id.0.clone()))?;

        let mut lines = vec![format!("Applicant Report: {}", applicant.name)];
        if let Value::Object(fields) = serde_json::to_value(applicant)? {
            for (key, value) in fields.iter().filter(|(key, _)| key.as_str() != "id") {
                lines.push(format!("{key}: {}", display_value(value)));
            }
        }

        let mut body = lines.join("\n");
        body.push('\n');
        Ok(body.into_bytes())
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
