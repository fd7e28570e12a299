//! End-to-end scenarios for the recruiting desk, driven through the public service facade and
//! HTTP router with a file-backed store.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{TimeZone, Utc};
use serde_json::{json, Value};
use tower::ServiceExt;

use recruit_desk::workflows::recruiting::{
    recruiting_router, BodyCompStatus, DashboardSummary, ExportScope, FileStorage, Gender,
    Measurements, RecruitingService, Stage, Store, DEFAULT_STORAGE_KEY,
};

fn at(day: u32, hour: u32) -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

#[test]
fn applicant_lifecycle_survives_restart() {
    let dir = tempfile::tempdir().expect("temp dir");

    let applicant_id = {
        let store = Store::load(FileStorage::new(dir.path()), DEFAULT_STORAGE_KEY);
        let mut service = RecruitingService::new(store);

        let applicant = service
            .add_applicant("Riley Chen", at(1, 9))
            .expect("applicant added");
        service
            .update_measurements(
                &applicant.id,
                Measurements {
                    height: Some(68.0),
                    weight: Some(175.0),
                    gender: Some(Gender::Male),
                    ..Measurements::default()
                },
                at(2, 9),
            )
            .expect("measured");
        service
            .change_stage(&applicant.id, Stage::Screening, at(3, 9))
            .expect("stage changed");
        applicant.id
    };

    let reloaded = RecruitingService::new(Store::load(
        FileStorage::new(dir.path()),
        DEFAULT_STORAGE_KEY,
    ));
    let state = reloaded.snapshot();
    let applicant = state.applicant(&applicant_id).expect("applicant persisted");

    assert_eq!(applicant.stage, Stage::Screening);
    assert_eq!(
        applicant.body_comp.as_ref().map(|result| result.status),
        Some(BodyCompStatus::Within)
    );
    assert_eq!(applicant.stage_history.len(), 2);

    let summary = DashboardSummary::build(&state, at(3, 12).date_naive());
    assert_eq!(summary.total_applicants, 3);
}

#[test]
fn export_from_one_desk_imports_into_another() {
    let source_dir = tempfile::tempdir().expect("temp dir");
    let target_dir = tempfile::tempdir().expect("temp dir");

    let mut source = RecruitingService::new(Store::load(
        FileStorage::new(source_dir.path()),
        DEFAULT_STORAGE_KEY,
    ));
    source
        .add_applicant("Morgan Blake", at(5, 10))
        .expect("applicant added");
    let exported = source.export(ExportScope::Weekly).expect("export succeeds");

    let mut target = RecruitingService::new(Store::load(
        FileStorage::new(target_dir.path()),
        DEFAULT_STORAGE_KEY,
    ));
    target.reset();
    let summary = target.import(&exported, at(6, 10)).expect("import succeeds");

    // Seed applicants carry fresh ids on each desk, so everything lands as new.
    assert_eq!(summary.applicants.added, 3);
    assert_eq!(target.snapshot().applicants.len(), 5);
}

#[tokio::test]
async fn http_surface_screens_and_reports() {
    let dir = tempfile::tempdir().expect("temp dir");
    let service = RecruitingService::new(Store::load(
        FileStorage::new(dir.path()),
        DEFAULT_STORAGE_KEY,
    ));
    let router = recruiting_router(Arc::new(Mutex::new(service)));

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/body-composition/evaluate")
                .header("content-type", "application/json")
                .body(Body::from(
                    json!({
                        "height": 70, "weight": 210, "age": 22,
                        "gender": "male", "neck": 16, "waist": 34
                    })
                    .to_string(),
                ))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let payload: Value = serde_json::from_slice(&body).expect("json payload");
    assert_eq!(payload["status"], json!("tape"));

    let response = router
        .oneshot(
            Request::get("/api/v1/reports/roster.csv")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    let csv = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(csv.contains("Alex Johnson"));
    assert_eq!(csv.lines().count(), 3);
}
