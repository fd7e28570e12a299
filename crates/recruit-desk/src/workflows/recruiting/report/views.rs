use super::super::bodycomp::BodyCompStatus;
use super::super::domain::{ApplicantId, EventCategory, EventId, Stage};
use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalProgress {
    pub goal: u32,
    pub enlisted: usize,
    pub remaining: usize,
    pub percent: f64,
    pub remaining_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventView {
    pub id: EventId,
    pub title: String,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub category: EventCategory,
    pub category_label: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_id: Option<ApplicantId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicant_name: Option<String>,
    pub meta: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCountEntry {
    pub stage: Stage,
    pub stage_label: &'static str,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingLevel {
    Fresh,
    Aging,
    Stale,
}

impl AgingLevel {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Fresh => "Fresh",
            Self::Aging => "Aging",
            Self::Stale => "Stale",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingEntry {
    pub applicant_id: ApplicantId,
    pub name: String,
    pub stage: Stage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_idle: Option<i64>,
    pub level: AgingLevel,
    pub level_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BodyCompEntry {
    pub applicant_id: ApplicantId,
    pub name: String,
    pub status: BodyCompStatus,
    pub status_label: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSummary {
    pub as_of: NaiveDate,
    pub total_applicants: usize,
    pub enlisted: usize,
    pub goal: GoalProgress,
    pub upcoming_count: usize,
    pub upcoming_events: Vec<EventView>,
    pub todays_events: Vec<EventView>,
    pub events: Vec<EventView>,
    pub stage_breakdown: Vec<StageCountEntry>,
    pub aging: Vec<AgingEntry>,
    pub body_composition: Vec<BodyCompEntry>,
}
