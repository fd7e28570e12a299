use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use super::bodycomp::BodyCompResult;

/// Identifier wrapper for applicants. Immutable once assigned; numeric ids read as text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ApplicantId(#[serde(deserialize_with = "id_string")] pub String);

impl ApplicantId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier wrapper for calendar events.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(#[serde(deserialize_with = "id_string")] pub String);

impl EventId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Ordered recruiting pipeline, intake first.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Stage {
    #[default]
    #[serde(rename = "Application Received")]
    ApplicationReceived,
    #[serde(rename = "Screening")]
    Screening,
    #[serde(rename = "Interview")]
    Interview,
    #[serde(rename = "Background Check")]
    BackgroundCheck,
    #[serde(rename = "Medical")]
    Medical,
    #[serde(rename = "Training")]
    Training,
    #[serde(rename = "Enlisted")]
    Enlisted,
}

impl Stage {
    pub const fn ordered() -> [Self; 7] {
        [
            Self::ApplicationReceived,
            Self::Screening,
            Self::Interview,
            Self::BackgroundCheck,
            Self::Medical,
            Self::Training,
            Self::Enlisted,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::ApplicationReceived => "Application Received",
            Self::Screening => "Screening",
            Self::Interview => "Interview",
            Self::BackgroundCheck => "Background Check",
            Self::Medical => "Medical",
            Self::Training => "Training",
            Self::Enlisted => "Enlisted",
        }
    }

    pub fn from_label(raw: &str) -> Option<Self> {
        let wanted = raw.trim();
        Self::ordered()
            .into_iter()
            .find(|stage| stage.label().eq_ignore_ascii_case(wanted))
    }
}

/// Table selector for the body-composition charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Some(Self::Male),
            "female" | "f" => Some(Self::Female),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
        }
    }
}

/// Physical measurements. Inches, pounds and years; every value is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Measurements {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub age: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_gender")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub neck: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub waist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_number")]
    pub hip: Option<f64>,
}

/// One entry of an applicant's append-only stage history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageEntry {
    pub stage: Stage,
    pub at: DateTime<Utc>,
}

/// Free-form profile attributes carried over from intake forms.
pub const PROFILE_FIELDS: [&str; 7] = [
    "health",
    "priorService",
    "legalIssues",
    "education",
    "maritalStatus",
    "dependents",
    "tattoos",
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantRecord {
    pub id: ApplicantId,
    pub name: String,
    #[serde(default)]
    pub stage: Stage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touched_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stage_changed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub measurements: Measurements,
    #[serde(default)]
    pub notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_comp: Option<BodyCompResult>,
    #[serde(default)]
    pub stage_history: Vec<StageEntry>,
    #[serde(default)]
    pub checklist: BTreeSet<String>,
    /// Profile attributes and any fields this build does not model.
    #[serde(flatten)]
    pub attributes: BTreeMap<String, Value>,
}

impl ApplicantRecord {
    pub fn new(name: impl Into<String>, now: DateTime<Utc>) -> Self {
        let stage = Stage::ApplicationReceived;
        Self {
            id: ApplicantId::generate(),
            name: name.into(),
            stage,
            created_at: Some(now),
            touched_at: Some(now),
            stage_changed_at: Some(now),
            measurements: Measurements::default(),
            notes: String::new(),
            body_comp: None,
            stage_history: vec![StageEntry { stage, at: now }],
            checklist: BTreeSet::new(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.touched_at = Some(now);
    }

    /// Moves the applicant to `stage`. Returns `false` when already there.
    pub fn advance_to(&mut self, stage: Stage, now: DateTime<Utc>) -> bool {
        let history_current = self.stage_history.last().map(|entry| entry.stage) == Some(stage);
        if self.stage == stage && history_current {
            return false;
        }
        self.stage = stage;
        self.stage_changed_at = Some(now);
        self.stage_history.push(StageEntry { stage, at: now });
        self.touch(now);
        true
    }

    /// Adds `label` when absent and removes it otherwise. Returns whether it is now present.
    pub fn toggle_checklist(&mut self, label: &str, now: DateTime<Utc>) -> bool {
        let label = label.trim();
        let present = if self.checklist.remove(label) {
            false
        } else {
            self.checklist.insert(label.to_string());
            true
        };
        self.touch(now);
        present
    }

    pub fn profile_field(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventCategory {
    ScreeningCall,
    Interview,
    Processing,
    Ceremony,
    FollowUp,
    #[default]
    Other,
}

impl EventCategory {
    pub const fn label(self) -> &'static str {
        match self {
            Self::ScreeningCall => "Screening Call",
            Self::Interview => "Interview",
            Self::Processing => "Processing",
            Self::Ceremony => "Ceremony",
            Self::FollowUp => "Follow-up",
            Self::Other => "Other",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "time_of_day")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub category: EventCategory,
    /// Weak reference; resolve through [`StoreState::applicant`].
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub applicant_id: Option<ApplicantId>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub template_id: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub label: String,
    #[serde(default)]
    pub done: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

/// Requirement checklist tracked per applicant or as a general packet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistDocument {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "blank_as_none"
    )]
    pub applicant_id: Option<ApplicantId>,
    #[serde(default)]
    pub items: Vec<ChecklistItem>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drill {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub done: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSnippet {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub label: String,
    pub body: String,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackingItem {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub packed: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Workstation {
    pub drills: Vec<Drill>,
    pub snippets: Vec<MessageSnippet>,
    pub packing: Vec<PackingItem>,
}

impl Default for Workstation {
    fn default() -> Self {
        Self {
            drills: Vec::new(),
            snippets: default_snippets(),
            packing: Vec::new(),
        }
    }
}

fn default_snippets() -> Vec<MessageSnippet> {
    [
        (
            "intro",
            "Introduction",
            "Thanks for your interest in serving. When is a good time to talk this week?",
        ),
        (
            "documents",
            "Document reminder",
            "Please bring your ID, Social Security card, and birth certificate to our next meeting.",
        ),
        (
            "follow-up",
            "Follow-up",
            "Checking in on your next steps. Let me know if anything is holding you up.",
        ),
    ]
    .into_iter()
    .map(|(id, label, body)| MessageSnippet {
        id: id.to_string(),
        label: label.to_string(),
        body: body.to_string(),
        extra: BTreeMap::new(),
    })
    .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarChoice {
    #[default]
    Google,
    Outlook,
    Apple,
    Ics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub recruiter_name: String,
    pub accent: String,
    #[serde(deserialize_with = "lenient_count")]
    pub annual_goal: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub aging_warn_days: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub aging_stale_days: u32,
    #[serde(deserialize_with = "lenient_count")]
    pub reminder_lead_minutes: u32,
    pub calendar: CalendarChoice,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            recruiter_name: String::new(),
            accent: "navy".to_string(),
            annual_goal: 40,
            aging_warn_days: 7,
            aging_stale_days: 14,
            reminder_lead_minutes: 30,
            calendar: CalendarChoice::default(),
            extra: BTreeMap::new(),
        }
    }
}

/// A reminder slot. Keys are stable, so rescheduling replaces the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledReminder {
    pub label: String,
    pub fire_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<EventId>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationState {
    pub enabled: bool,
    pub reminders: BTreeMap<String, ScheduledReminder>,
}

/// Schema-versioned aggregate root persisted under a single key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreState {
    pub schema_version: u32,
    #[serde(default)]
    pub applicants: Vec<ApplicantRecord>,
    #[serde(default)]
    pub events: Vec<EventRecord>,
    #[serde(default)]
    pub checklist: Vec<ChecklistDocument>,
    #[serde(default)]
    pub workstation: Workstation,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub notifications: NotificationState,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl StoreState {
    pub fn applicant(&self, id: &ApplicantId) -> Option<&ApplicantRecord> {
        self.applicants.iter().find(|applicant| &applicant.id == id)
    }

    pub fn applicant_mut(&mut self, id: &ApplicantId) -> Option<&mut ApplicantRecord> {
        self.applicants.iter_mut().find(|applicant| &applicant.id == id)
    }

    pub fn event(&self, id: &EventId) -> Option<&EventRecord> {
        self.events.iter().find(|event| &event.id == id)
    }

    /// Resolves an event's applicant reference, tolerating removed applicants.
    pub fn applicant_for_event(&self, event: &EventRecord) -> Option<&ApplicantRecord> {
        event
            .applicant_id
            .as_ref()
            .and_then(|applicant_id| self.applicant(applicant_id))
    }

    pub fn enlisted_count(&self) -> usize {
        self.applicants
            .iter()
            .filter(|applicant| applicant.stage == Stage::Enlisted)
            .count()
    }
}

/// Accepts numbers, numeric strings and blanks; anything unparseable becomes `None`.
fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::Number(number)) => number.as_f64().filter(|value| value.is_finite()),
        Some(Value::String(text)) => text
            .trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite()),
        _ => None,
    })
}

/// Whole, non-negative counts; numeric strings are accepted.
fn lenient_count<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    let parsed = match &raw {
        Value::Number(number) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| *value >= 0.0 && value.fract() == 0.0)
                .map(|value| value as u64)
        }),
        Value::String(text) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed
        .and_then(|value| u32::try_from(value).ok())
        .ok_or_else(|| {
            serde::de::Error::custom(format!("expected a whole non-negative number, found {raw}"))
        })
}

/// Text form of a record id. Numeric ids from older exports are kept as their digits.
pub(crate) fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    match raw {
        Value::String(text) => Ok(text),
        Value::Number(number) => Ok(number.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or numeric id, found {other}"
        ))),
    }
}

fn lenient_gender<'de, D>(deserializer: D) -> Result<Option<Gender>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(match raw {
        Some(Value::String(text)) => Gender::parse(&text),
        _ => None,
    })
}

fn blank_as_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: From<String>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    match raw {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(text)) if text.trim().is_empty() => Ok(None),
        Some(value) => id_text(&value).map(T::from).map(Some).ok_or_else(|| {
            serde::de::Error::custom(format!("expected a string or numeric id, found {value}"))
        }),
    }
}

impl From<String> for ApplicantId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<String> for EventId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// `HH:MM` on the wire; `HH:MM:SS` is accepted on read.
pub(crate) mod time_of_day {
    use super::*;

    pub(crate) fn serialize<S>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(time) => serializer.serialize_str(&time.format("%H:%M").to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub(crate) fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveTime>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        let Some(raw) = raw.filter(|value| !value.trim().is_empty()) else {
            return Ok(None);
        };
        parse_time(&raw).map(Some).map_err(serde::de::Error::custom)
    }
}

pub fn parse_time(raw: &str) -> Result<NaiveTime, String> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map_err(|err| format!("failed to parse '{raw}' as HH:MM ({err})"))
}
