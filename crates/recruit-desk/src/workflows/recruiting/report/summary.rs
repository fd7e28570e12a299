use super::super::domain::{ApplicantRecord, EventRecord, Settings, Stage, StoreState};
use super::views::{
    AgingEntry, AgingLevel, BodyCompEntry, DashboardSummary, EventView, GoalProgress,
    StageCountEntry,
};
use chrono::{Duration, NaiveDate};

/// Events dated within this many days of today count as upcoming.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

impl DashboardSummary {
    pub fn build(state: &StoreState, today: NaiveDate) -> Self {
        let enlisted = state.enlisted_count();
        let horizon = today + Duration::days(UPCOMING_WINDOW_DAYS);

        let mut sorted: Vec<&EventRecord> = state.events.iter().collect();
        sorted.sort_by_key(|event| (event.date, event.time));

        let events: Vec<EventView> = sorted
            .iter()
            .map(|event| EventView::from_record(state, event))
            .collect();
        let upcoming_events: Vec<EventView> = events
            .iter()
            .filter(|view| view.date >= today && view.date <= horizon)
            .cloned()
            .collect();
        let todays_events = events
            .iter()
            .filter(|view| view.date == today)
            .cloned()
            .collect();

        let stage_breakdown = Stage::ordered()
            .into_iter()
            .map(|stage| StageCountEntry {
                stage,
                stage_label: stage.label(),
                count: state
                    .applicants
                    .iter()
                    .filter(|applicant| applicant.stage == stage)
                    .count(),
            })
            .collect();

        let aging = state
            .applicants
            .iter()
            .filter(|applicant| applicant.stage != Stage::Enlisted)
            .map(|applicant| aging_entry(applicant, &state.settings, today))
            .collect();

        let body_composition = state
            .applicants
            .iter()
            .filter_map(|applicant| {
                applicant.body_comp.as_ref().map(|result| BodyCompEntry {
                    applicant_id: applicant.id.clone(),
                    name: applicant.name.clone(),
                    status: result.status,
                    status_label: result.status.label(),
                })
            })
            .collect();

        Self {
            as_of: today,
            total_applicants: state.applicants.len(),
            enlisted,
            goal: GoalProgress::new(state.settings.annual_goal, enlisted),
            upcoming_count: upcoming_events.len(),
            upcoming_events,
            todays_events,
            events,
            stage_breakdown,
            aging,
            body_composition,
        }
    }
}

impl GoalProgress {
    pub fn new(goal: u32, enlisted: usize) -> Self {
        let target = goal as usize;
        let remaining = target.saturating_sub(enlisted);
        let percent = if goal > 0 {
            (enlisted as f64 / f64::from(goal) * 100.0).min(100.0)
        } else {
            0.0
        };
        let remaining_label = if remaining > 0 {
            format!("{remaining} remaining")
        } else {
            "Goal reached!".to_string()
        };

        Self {
            goal,
            enlisted,
            remaining,
            percent,
            remaining_label,
        }
    }
}

impl EventView {
    pub fn from_record(state: &StoreState, event: &EventRecord) -> Self {
        let applicant_name = state
            .applicant_for_event(event)
            .map(|applicant| applicant.name.clone());
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            date: event.date,
            time: event.time,
            category: event.category,
            category_label: event.category.label(),
            applicant_id: event.applicant_id.clone(),
            meta: event_meta(event, applicant_name.as_deref()),
            applicant_name,
        }
    }
}

/// `October 18, 2026 at 09:30 • Alex Johnson`, omitting the parts an event lacks.
pub fn event_meta(event: &EventRecord, applicant_name: Option<&str>) -> String {
    let mut meta = event.date.format("%B %-d, %Y").to_string();
    if let Some(time) = event.time {
        meta.push_str(&format!(" at {}", time.format("%H:%M")));
    }
    if let Some(name) = applicant_name {
        meta.push_str(&format!(" • {name}"));
    }
    meta
}

fn aging_entry(applicant: &ApplicantRecord, settings: &Settings, today: NaiveDate) -> AgingEntry {
    let last_activity = applicant
        .touched_at
        .or(applicant.stage_changed_at)
        .or(applicant.created_at);
    let days_idle = last_activity.map(|at| (today - at.date_naive()).num_days().max(0));

    let level = match days_idle {
        None => AgingLevel::Stale,
        Some(days) if days >= i64::from(settings.aging_stale_days) => AgingLevel::Stale,
        Some(days) if days >= i64::from(settings.aging_warn_days) => AgingLevel::Aging,
        Some(_) => AgingLevel::Fresh,
    };

    AgingEntry {
        applicant_id: applicant.id.clone(),
        name: applicant.name.clone(),
        stage: applicant.stage,
        days_idle,
        level,
        level_label: level.label(),
    }
}
