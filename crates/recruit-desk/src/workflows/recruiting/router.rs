use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;

use super::bodycomp::BodyCompEvaluator;
use super::domain::{ApplicantId, EventId, Measurements, Stage, StoreState};
use super::report::{
    ApplicantSheetReport, CsvRosterReport, DashboardSummary, ReportError, ReportGenerator,
};
use super::service::{EventDraft, RecruitingService, RecruitingServiceError, SettingsPatch};
use super::storage::StorageMedium;
use super::transfer::{ExportScope, ImportError};

/// Service handle shared across request handlers.
pub type SharedRecruitingService<M> = Arc<Mutex<RecruitingService<M>>>;

/// Router builder exposing the recruiting desk over HTTP.
pub fn recruiting_router<M>(service: SharedRecruitingService<M>) -> Router
where
    M: StorageMedium + 'static,
{
    Router::new()
        .route("/api/v1/state", get(state_handler::<M>))
        .route("/api/v1/state/reset", post(reset_handler::<M>))
        .route("/api/v1/export", get(export_handler::<M>))
        .route("/api/v1/import", post(import_handler::<M>))
        .route("/api/v1/dashboard", get(dashboard_handler::<M>))
        .route("/api/v1/settings", patch(settings_handler::<M>))
        .route("/api/v1/applicants", post(add_applicant_handler::<M>))
        .route(
            "/api/v1/applicants/:applicant_id",
            patch(rename_applicant_handler::<M>).delete(remove_applicant_handler::<M>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/stage",
            put(stage_handler::<M>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/measurements",
            put(measurements_handler::<M>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/body-composition",
            get(body_composition_handler::<M>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/checklist/suggestions",
            post(checklist_suggestions_handler::<M>),
        )
        .route(
            "/api/v1/applicants/:applicant_id/report",
            get(applicant_report_handler::<M>),
        )
        .route("/api/v1/events", post(save_event_handler::<M>))
        .route("/api/v1/events/:event_id", delete(delete_event_handler::<M>))
        .route("/api/v1/body-composition/evaluate", post(evaluate_handler))
        .route("/api/v1/reports/roster.csv", get(roster_handler::<M>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExportQuery {
    #[serde(default)]
    scope: ExportScope,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DashboardQuery {
    date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NewApplicant {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Rename {
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StageChange {
    stage: Stage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecognizedText {
    text: String,
}

fn lock<M>(service: &SharedRecruitingService<M>) -> MutexGuard<'_, RecruitingService<M>> {
    service.lock().unwrap_or_else(PoisonError::into_inner)
}

pub(crate) async fn state_handler<M>(State(service): State<SharedRecruitingService<M>>) -> Response
where
    M: StorageMedium + 'static,
{
    let snapshot = lock(&service).snapshot();
    (StatusCode::OK, Json(snapshot)).into_response()
}

pub(crate) async fn reset_handler<M>(State(service): State<SharedRecruitingService<M>>) -> Response
where
    M: StorageMedium + 'static,
{
    let mut guard = lock(&service);
    guard.reset();
    (StatusCode::OK, Json(guard.snapshot())).into_response()
}

pub(crate) async fn export_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Query(query): Query<ExportQuery>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).export(query.scope) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn import_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    body: String,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).import(&body, Utc::now()) {
        Ok(summary) => (StatusCode::OK, Json(summary)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn dashboard_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Query(query): Query<DashboardQuery>,
) -> Response
where
    M: StorageMedium + 'static,
{
    let today = query.date.unwrap_or_else(|| Utc::now().date_naive());
    let summary = lock(&service)
        .store()
        .read(|state| DashboardSummary::build(state, today));
    (StatusCode::OK, Json(summary)).into_response()
}

pub(crate) async fn settings_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Json(patch): Json<SettingsPatch>,
) -> Response
where
    M: StorageMedium + 'static,
{
    let mut guard = lock(&service);
    match guard.update_settings(patch) {
        Ok(()) => {
            let settings = guard.store().read(|state| state.settings.clone());
            (StatusCode::OK, Json(settings)).into_response()
        }
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn add_applicant_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Json(request): Json<NewApplicant>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).add_applicant(&request.name, Utc::now()) {
        Ok(applicant) => (StatusCode::CREATED, Json(applicant)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn rename_applicant_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
    Json(request): Json<Rename>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).rename_applicant(&ApplicantId(applicant_id), &request.name, Utc::now()) {
        Ok(applicant) => (StatusCode::OK, Json(applicant)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn remove_applicant_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).remove_applicant(&ApplicantId(applicant_id)) {
        Ok(removed) => (StatusCode::OK, Json(removed)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn stage_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
    Json(request): Json<StageChange>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).change_stage(&ApplicantId(applicant_id), request.stage, Utc::now()) {
        Ok(changed) => (
            StatusCode::OK,
            Json(json!({ "stage": request.stage, "changed": changed })),
        )
            .into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn measurements_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
    Json(measurements): Json<Measurements>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).update_measurements(&ApplicantId(applicant_id), measurements, Utc::now())
    {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn body_composition_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    M: StorageMedium + 'static,
{
    let guard = lock(&service);
    let id = ApplicantId(applicant_id);
    let result = guard.store().read(|state| {
        state
            .applicant(&id)
            .map(|applicant| guard.evaluator().evaluate(&applicant.measurements))
    });
    match result {
        Some(result) => (StatusCode::OK, Json(result)).into_response(),
        None => service_error_response(RecruitingServiceError::ApplicantNotFound(id.0)),
    }
}

pub(crate) async fn checklist_suggestions_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
    Json(request): Json<RecognizedText>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).apply_checklist_suggestions(
        &ApplicantId(applicant_id),
        &request.text,
        Utc::now(),
    ) {
        Ok(added) => (StatusCode::OK, Json(json!({ "added": added }))).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn applicant_report_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(applicant_id): Path<String>,
) -> Response
where
    M: StorageMedium + 'static,
{
    let report = ApplicantSheetReport::new(ApplicantId(applicant_id));
    let guard = lock(&service);
    guard.store().read(|state| render_report(&report, state))
}

pub(crate) async fn roster_handler<M>(State(service): State<SharedRecruitingService<M>>) -> Response
where
    M: StorageMedium + 'static,
{
    let guard = lock(&service);
    guard
        .store()
        .read(|state| render_report(&CsvRosterReport, state))
}

pub(crate) async fn save_event_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Json(draft): Json<EventDraft>,
) -> Response
where
    M: StorageMedium + 'static,
{
    let status = if draft.id.is_some() {
        StatusCode::OK
    } else {
        StatusCode::CREATED
    };
    match lock(&service).save_event(draft) {
        Ok(event) => (status, Json(event)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn delete_event_handler<M>(
    State(service): State<SharedRecruitingService<M>>,
    Path(event_id): Path<String>,
) -> Response
where
    M: StorageMedium + 'static,
{
    match lock(&service).delete_event(&EventId(event_id)) {
        Ok(event) => (StatusCode::OK, Json(event)).into_response(),
        Err(err) => service_error_response(err),
    }
}

pub(crate) async fn evaluate_handler(Json(measurements): Json<Measurements>) -> Response {
    let result = BodyCompEvaluator::default().evaluate(&measurements);
    (StatusCode::OK, Json(result)).into_response()
}

fn render_report(report: &dyn ReportGenerator, state: &StoreState) -> Response {
    match report.render(state) {
        Ok(body) => {
            let disposition = format!("attachment; filename=\"{}\"", report.file_name(state));
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, report.content_type().to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(ReportError::ApplicantNotFound(id)) => error_response(
            StatusCode::NOT_FOUND,
            format!("applicant `{id}` not found"),
        ),
        Err(other) => error_response(StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
    }
}

fn service_error_response(err: RecruitingServiceError) -> Response {
    let status = match &err {
        RecruitingServiceError::ApplicantNotFound(_) | RecruitingServiceError::EventNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        RecruitingServiceError::Import(ImportError::Malformed(_) | ImportError::NotAnObject) => {
            StatusCode::BAD_REQUEST
        }
        RecruitingServiceError::Import(_)
        | RecruitingServiceError::UnknownProfileField(_)
        | RecruitingServiceError::Blank(_)
        | RecruitingServiceError::ReminderOutOfRange(_)
        | RecruitingServiceError::AgingThresholds { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RecruitingServiceError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, err.to_string())
}

fn error_response(status: StatusCode, message: String) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
