use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use super::domain::{
    ApplicantRecord, EventCategory, EventId, EventRecord, NotificationState, Settings, Stage,
    StoreState, Workstation,
};
use super::migration::CURRENT_SCHEMA_VERSION;

/// Fresh state used on first launch and whenever persisted data cannot be recovered.
pub fn seed_state(now: DateTime<Utc>) -> StoreState {
    let mut alex = ApplicantRecord::new("Alex Johnson", now);
    alex.advance_to(Stage::Interview, now);
    alex.notes = "Strong candidate.".to_string();

    let mut maria = ApplicantRecord::new("Maria Garcia", now);
    maria.advance_to(Stage::Screening, now);
    maria.notes = "Follow up on references.".to_string();

    let screening_call = EventRecord {
        id: EventId::generate(),
        title: "Initial Screening Call".to_string(),
        date: now.date_naive(),
        time: None,
        category: EventCategory::ScreeningCall,
        applicant_id: Some(alex.id.clone()),
        template_id: None,
        notes: String::new(),
        extra: BTreeMap::new(),
    };

    StoreState {
        schema_version: CURRENT_SCHEMA_VERSION,
        applicants: vec![alex, maria],
        events: vec![screening_call],
        checklist: Vec::new(),
        workstation: Workstation::default(),
        settings: Settings::default(),
        notifications: NotificationState::default(),
        extra: BTreeMap::new(),
    }
}
