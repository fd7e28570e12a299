use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use super::bodycomp::{BodyCompEvaluator, BodyCompResult};
use super::checklist::suggest_labels;
use super::domain::{
    ApplicantId, ApplicantRecord, CalendarChoice, EventCategory, EventId, EventRecord,
    Measurements, ScheduledReminder, Stage, StoreState, PROFILE_FIELDS,
};
use super::storage::StorageMedium;
use super::store::Store;
use super::transfer::{export_state, import_into, ExportScope, ImportError, ImportSummary};

/// Form payload for creating or editing an event. `id: None` creates a new event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default)]
    pub id: Option<EventId>,
    pub title: String,
    pub date: Option<NaiveDate>,
    #[serde(default, with = "super::domain::time_of_day")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub category: EventCategory,
    #[serde(default)]
    pub applicant_id: Option<ApplicantId>,
    #[serde(default)]
    pub template_id: Option<String>,
    #[serde(default)]
    pub notes: String,
}

/// Partial settings update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsPatch {
    pub recruiter_name: Option<String>,
    pub accent: Option<String>,
    pub annual_goal: Option<u32>,
    pub aging_warn_days: Option<u32>,
    pub aging_stale_days: Option<u32>,
    pub reminder_lead_minutes: Option<u32>,
    pub calendar: Option<CalendarChoice>,
}

/// Error raised by the recruiting service.
#[derive(Debug, thiserror::Error)]
pub enum RecruitingServiceError {
    #[error("applicant `{0}` not found")]
    ApplicantNotFound(String),
    #[error("event `{0}` not found")]
    EventNotFound(String),
    #[error("`{0}` is not a profile field")]
    UnknownProfileField(String),
    #[error("{0} cannot be blank")]
    Blank(&'static str),
    #[error("reminder for event `{0}` falls outside the supported calendar range")]
    ReminderOutOfRange(String),
    #[error("aging warning threshold ({warn}) must not exceed the stale threshold ({stale})")]
    AgingThresholds { warn: u32, stale: u32 },
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error("export failed: {0}")]
    Export(#[from] serde_json::Error),
}

/// Recruiting operations, each funneled through a single store mutation.
#[derive(Debug)]
pub struct RecruitingService<M> {
    store: Store<M>,
    evaluator: BodyCompEvaluator,
}

impl<M: StorageMedium> RecruitingService<M> {
    pub fn new(store: Store<M>) -> Self {
        Self::with_evaluator(store, BodyCompEvaluator::default())
    }

    pub fn with_evaluator(store: Store<M>, evaluator: BodyCompEvaluator) -> Self {
        Self { store, evaluator }
    }

    pub fn store(&self) -> &Store<M> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut Store<M> {
        &mut self.store
    }

    pub fn evaluator(&self) -> &BodyCompEvaluator {
        &self.evaluator
    }

    pub fn snapshot(&self) -> StoreState {
        self.store.get_state()
    }

    pub fn add_applicant(
        &mut self,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<ApplicantRecord, RecruitingServiceError> {
        let name = non_blank(name, "applicant name")?;
        let applicant = ApplicantRecord::new(name, now);
        let created = applicant.clone();
        self.store.set_state(|state| state.applicants.push(applicant));
        Ok(created)
    }

    pub fn rename_applicant(
        &mut self,
        id: &ApplicantId,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<ApplicantRecord, RecruitingServiceError> {
        let name = non_blank(name, "applicant name")?;
        self.with_applicant(id, |applicant| {
            applicant.name = name;
            applicant.touch(now);
            applicant.clone()
        })
    }

    pub fn update_notes(
        &mut self,
        id: &ApplicantId,
        notes: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RecruitingServiceError> {
        self.with_applicant(id, |applicant| {
            applicant.notes = notes.to_string();
            applicant.touch(now);
        })
    }

    /// Sets one of [`PROFILE_FIELDS`]; a blank value clears it.
    pub fn update_profile_field(
        &mut self,
        id: &ApplicantId,
        key: &str,
        value: &str,
        now: DateTime<Utc>,
    ) -> Result<(), RecruitingServiceError> {
        if !PROFILE_FIELDS.contains(&key) {
            return Err(RecruitingServiceError::UnknownProfileField(key.to_string()));
        }
        self.with_applicant(id, |applicant| {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                applicant.attributes.remove(key);
            } else {
                applicant
                    .attributes
                    .insert(key.to_string(), trimmed.to_string().into());
            }
            applicant.touch(now);
        })
    }

    /// Stores new measurements and the body-composition result derived from them.
    pub fn update_measurements(
        &mut self,
        id: &ApplicantId,
        measurements: Measurements,
        now: DateTime<Utc>,
    ) -> Result<BodyCompResult, RecruitingServiceError> {
        let result = self.evaluator.evaluate(&measurements);
        let stored = result.clone();
        self.with_applicant(id, |applicant| {
            applicant.measurements = measurements;
            applicant.body_comp = Some(stored);
            applicant.touch(now);
        })?;
        Ok(result)
    }

    /// Returns `false` when the applicant was already at `stage`.
    pub fn change_stage(
        &mut self,
        id: &ApplicantId,
        stage: Stage,
        now: DateTime<Utc>,
    ) -> Result<bool, RecruitingServiceError> {
        self.with_applicant(id, |applicant| applicant.advance_to(stage, now))
    }

    pub fn toggle_checklist_label(
        &mut self,
        id: &ApplicantId,
        label: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, RecruitingServiceError> {
        let label = non_blank(label, "checklist label")?;
        self.with_applicant(id, |applicant| applicant.toggle_checklist(&label, now))
    }

    /// Adds the labels suggested by recognized document text. Returns only newly added labels.
    pub fn apply_checklist_suggestions(
        &mut self,
        id: &ApplicantId,
        recognized_text: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, RecruitingServiceError> {
        let suggestions = suggest_labels(recognized_text);
        self.with_applicant(id, |applicant| {
            let added: Vec<String> = suggestions
                .into_iter()
                .filter(|label| applicant.checklist.insert((*label).to_string()))
                .map(str::to_string)
                .collect();
            if !added.is_empty() {
                applicant.touch(now);
            }
            added
        })
    }

    /// Removes an applicant. Events that referenced it keep the dangling id.
    pub fn remove_applicant(
        &mut self,
        id: &ApplicantId,
    ) -> Result<ApplicantRecord, RecruitingServiceError> {
        self.store.try_set_state(|state| {
            let position = state
                .applicants
                .iter()
                .position(|applicant| &applicant.id == id)
                .ok_or_else(|| RecruitingServiceError::ApplicantNotFound(id.0.clone()))?;
            Ok(state.applicants.remove(position))
        })
    }

    /// Creates an event, or merges the draft into the event with the same id. An edited event
    /// that already has a reminder gets it rescheduled in the same mutation.
    pub fn save_event(&mut self, draft: EventDraft) -> Result<EventRecord, RecruitingServiceError> {
        let title = non_blank(&draft.title, "event title")?;
        let date = draft.date.ok_or(RecruitingServiceError::Blank("event date"))?;
        let applicant_id = draft
            .applicant_id
            .filter(|applicant_id| !applicant_id.0.trim().is_empty());

        self.store.try_set_state(|state| match draft.id {
            Some(event_id) => {
                let event = state
                    .events
                    .iter_mut()
                    .find(|event| event.id == event_id)
                    .ok_or_else(|| RecruitingServiceError::EventNotFound(event_id.0.clone()))?;
                event.title = title;
                event.date = date;
                event.time = draft.time;
                event.category = draft.category;
                event.applicant_id = applicant_id;
                event.template_id = draft.template_id;
                event.notes = draft.notes;
                let event = event.clone();

                let key = event_reminder_key(&event.id);
                if let Some(previous) = state.notifications.reminders.get(&key) {
                    let lead = state.settings.reminder_lead_minutes;
                    let mut rescheduled = event_reminder(&event, lead)?;
                    rescheduled.extra = previous.extra.clone();
                    state.notifications.reminders.insert(key, rescheduled);
                }
                Ok(event)
            }
            None => {
                let event = EventRecord {
                    id: EventId::generate(),
                    title,
                    date,
                    time: draft.time,
                    category: draft.category,
                    applicant_id,
                    template_id: draft.template_id,
                    notes: draft.notes,
                    extra: Default::default(),
                };
                state.events.push(event.clone());
                Ok(event)
            }
        })
    }

    /// Deletes an event and any reminder scheduled for it.
    pub fn delete_event(&mut self, id: &EventId) -> Result<EventRecord, RecruitingServiceError> {
        self.store.try_set_state(|state| {
            let position = state
                .events
                .iter()
                .position(|event| &event.id == id)
                .ok_or_else(|| RecruitingServiceError::EventNotFound(id.0.clone()))?;
            state.notifications.reminders.remove(&event_reminder_key(id));
            Ok(state.events.remove(position))
        })
    }

    pub fn set_annual_goal(&mut self, goal: u32) {
        self.store.set_state(|state| state.settings.annual_goal = goal);
    }

    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<(), RecruitingServiceError> {
        self.store.try_set_state(|state| {
            let settings = &mut state.settings;
            if let Some(name) = patch.recruiter_name {
                settings.recruiter_name = name.trim().to_string();
            }
            if let Some(accent) = patch.accent {
                settings.accent = non_blank(&accent, "accent")?;
            }
            if let Some(goal) = patch.annual_goal {
                settings.annual_goal = goal;
            }
            if let Some(days) = patch.aging_warn_days {
                settings.aging_warn_days = days;
            }
            if let Some(days) = patch.aging_stale_days {
                settings.aging_stale_days = days;
            }
            if let Some(minutes) = patch.reminder_lead_minutes {
                settings.reminder_lead_minutes = minutes;
            }
            if let Some(calendar) = patch.calendar {
                settings.calendar = calendar;
            }
            if settings.aging_warn_days > settings.aging_stale_days {
                return Err(RecruitingServiceError::AgingThresholds {
                    warn: settings.aging_warn_days,
                    stale: settings.aging_stale_days,
                });
            }
            Ok(())
        })
    }

    /// Stores a reminder under `key`, replacing any reminder already held there.
    pub fn schedule_reminder(&mut self, key: &str, reminder: ScheduledReminder) {
        self.store.set_state(|state| {
            state
                .notifications
                .reminders
                .insert(key.to_string(), reminder);
        });
    }

    pub fn clear_reminder(&mut self, key: &str) -> bool {
        self.store
            .set_state(|state| state.notifications.reminders.remove(key).is_some())
    }

    /// Schedules the reminder for an event using the configured lead time.
    pub fn schedule_event_reminder(
        &mut self,
        id: &EventId,
    ) -> Result<ScheduledReminder, RecruitingServiceError> {
        self.store.try_set_state(|state| {
            let event = state
                .event(id)
                .ok_or_else(|| RecruitingServiceError::EventNotFound(id.0.clone()))?;
            let reminder = event_reminder(event, state.settings.reminder_lead_minutes)?;
            state.notifications.enabled = true;
            state
                .notifications
                .reminders
                .insert(event_reminder_key(id), reminder.clone());
            Ok(reminder)
        })
    }

    /// Merges an untrusted import payload; on error the store is left untouched.
    pub fn import(
        &mut self,
        payload: &str,
        now: DateTime<Utc>,
    ) -> Result<ImportSummary, RecruitingServiceError> {
        let evaluator = &self.evaluator;
        let summary = self
            .store
            .try_set_state(|state| import_into(state, payload, evaluator, now))?;
        tracing::info!(
            applicants_added = summary.applicants.added,
            applicants_updated = summary.applicants.updated,
            events_added = summary.events.added,
            events_updated = summary.events.updated,
            "import merged"
        );
        Ok(summary)
    }

    pub fn export(&self, scope: ExportScope) -> Result<String, RecruitingServiceError> {
        Ok(self.store.read(|state| export_state(state, scope))?)
    }

    pub fn reset(&mut self) {
        self.store.reset();
    }

    fn with_applicant<T>(
        &mut self,
        id: &ApplicantId,
        apply: impl FnOnce(&mut ApplicantRecord) -> T,
    ) -> Result<T, RecruitingServiceError> {
        self.store.try_set_state(|state| {
            let applicant = state
                .applicant_mut(id)
                .ok_or_else(|| RecruitingServiceError::ApplicantNotFound(id.0.clone()))?;
            Ok(apply(applicant))
        })
    }
}

pub fn event_reminder_key(id: &EventId) -> String {
    format!("event:{}", id.0)
}

/// Reminder firing `lead_minutes` before the event starts. Dates and times are read as UTC
/// and an event without a time starts at midnight.
fn event_reminder(
    event: &EventRecord,
    lead_minutes: u32,
) -> Result<ScheduledReminder, RecruitingServiceError> {
    let starts_at = event
        .date
        .and_time(event.time.unwrap_or(NaiveTime::MIN))
        .and_utc();
    let fire_at = starts_at
        .checked_sub_signed(Duration::minutes(i64::from(lead_minutes)))
        .ok_or_else(|| RecruitingServiceError::ReminderOutOfRange(event.id.0.clone()))?;
    Ok(ScheduledReminder {
        label: event.title.clone(),
        fire_at,
        event_id: Some(event.id.clone()),
        extra: Default::default(),
    })
}

fn non_blank(value: &str, what: &'static str) -> Result<String, RecruitingServiceError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(RecruitingServiceError::Blank(what))
    } else {
        Ok(trimmed.to_string())
    }
}
