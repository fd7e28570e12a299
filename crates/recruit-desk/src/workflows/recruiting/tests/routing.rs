use axum::body::Body;
use axum::extract::State;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use super::common::*;
use crate::workflows::recruiting::router::{evaluate_handler, state_handler};
use crate::workflows::recruiting::storage::MemoryStorage;

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).expect("request builds")
}

#[tokio::test]
async fn state_handler_returns_snapshot() {
    let (service, _) = build_service();
    let response = state_handler::<MemoryStorage>(State(Arc::new(Mutex::new(service)))).await;

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["schemaVersion"], json!(3));
    assert_eq!(payload["applicants"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn evaluate_handler_classifies_measurements() {
    let response = evaluate_handler(axum::Json(male(68.0, 175.0))).await;
    let payload = read_json_body(response).await;
    assert_eq!(payload["status"], json!("within"));
}

#[tokio::test]
async fn measurements_route_stores_result_and_body_composition_reads_it() {
    let (router, shared) = shared_router();
    let id = shared
        .lock()
        .expect("service mutex")
        .snapshot()
        .applicants[0]
        .id
        .clone();

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/api/v1/applicants/{}/measurements", id.as_str()),
            json!({
                "height": "70", "weight": 210, "age": 22, "gender": "male",
                "neck": 16, "waist": 34
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json_body(response).await["status"], json!("tape"));

    let response = router
        .oneshot(get(&format!(
            "/api/v1/applicants/{}/body-composition",
            id.as_str()
        )))
        .await
        .expect("route executes");
    assert_eq!(read_json_body(response).await["status"], json!("tape"));

    let stored = shared.lock().expect("service mutex").snapshot();
    assert!(stored.applicants[0].body_comp.is_some());
}

#[tokio::test]
async fn unknown_applicant_is_not_found() {
    let (router, _) = shared_router();
    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/applicants/ghost/stage",
            json!({ "stage": "Medical" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let payload = read_json_body(response).await;
    assert!(payload["error"].as_str().expect("message").contains("ghost"));
}

#[tokio::test]
async fn import_route_rejects_malformed_payloads() {
    let (router, shared) = shared_router();
    let before = shared.lock().expect("service mutex").snapshot();

    let response = router
        .clone()
        .oneshot(
            Request::post("/api/v1/import")
                .body(Body::from("{\"applicants\": ["))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = router
        .oneshot(
            Request::post("/api/v1/import")
                .body(Body::from(r#"{"applicants": [{"name": "no id"}]}"#))
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(shared.lock().expect("service mutex").snapshot(), before);
}

#[tokio::test]
async fn export_and_dashboard_routes_render() {
    let (router, _) = shared_router();

    let response = router
        .clone()
        .oneshot(get("/api/v1/export?scope=weekly"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert!(payload.get("settings").is_none());
    assert!(payload.get("applicants").is_some());

    let response = router
        .oneshot(get("/api/v1/dashboard?date=2026-10-18"))
        .await
        .expect("route executes");
    let payload = read_json_body(response).await;
    assert_eq!(payload["as_of"], json!("2026-10-18"));
    assert_eq!(payload["todays_events"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn applicant_and_event_routes_create_records() {
    let (router, shared) = shared_router();

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/applicants",
            json!({ "name": "Dana Brooks" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let applicant = read_json_body(response).await;
    assert_eq!(applicant["stage"], json!("Application Received"));

    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/events",
            json!({
                "title": "Home visit",
                "date": "2026-10-21",
                "time": "18:00",
                "category": "follow-up",
                "applicantId": applicant["id"]
            }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = router
        .oneshot(json_request("POST", "/api/v1/applicants", json!({ "name": " " })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let state = shared.lock().expect("service mutex").snapshot();
    assert_eq!(state.applicants.len(), 3);
    assert_eq!(state.events.len(), 2);
}

#[tokio::test]
async fn report_routes_set_download_headers() {
    let (router, shared) = shared_router();
    let id = shared
        .lock()
        .expect("service mutex")
        .snapshot()
        .applicants[1]
        .id
        .clone();

    let response = router
        .clone()
        .oneshot(get(&format!("/api/v1/applicants/{}/report", id.as_str())))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"Maria_Garcia_report.txt\"")
    );
    let body = String::from_utf8(read_body(response).await).expect("utf8");
    assert!(body.starts_with("Applicant Report: Maria Garcia\n"));

    let response = router
        .clone()
        .oneshot(get("/api/v1/reports/roster.csv"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);

    let response = router
        .oneshot(get("/api/v1/applicants/ghost/report"))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn rename_route_updates_name_and_rejects_blank_or_unknown() {
    let (router, shared) = shared_router();
    let id = shared
        .lock()
        .expect("service mutex")
        .snapshot()
        .applicants[1]
        .id
        .clone();
    let uri = format!("/api/v1/applicants/{}", id.as_str());

    let response = router
        .clone()
        .oneshot(json_request("PATCH", &uri, json!({ "name": "  Maria G. Lopez " })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload["name"], json!("Maria G. Lopez"));

    let response = router
        .clone()
        .oneshot(json_request("PATCH", &uri, json!({ "name": "   " })))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = router
        .oneshot(json_request(
            "PATCH",
            "/api/v1/applicants/nobody",
            json!({ "name": "Ghost" }),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let state = shared.lock().expect("service mutex").snapshot();
    assert_eq!(
        state.applicant(&id).map(|applicant| applicant.name.as_str()),
        Some("Maria G. Lopez")
    );
}
