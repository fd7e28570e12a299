use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::workflows::recruiting::domain::{Gender, Measurements};
use crate::workflows::recruiting::seed::seed_state;
use crate::workflows::recruiting::storage::{MemoryStorage, StorageError, StorageMedium};
use crate::workflows::recruiting::store::{Store, DEFAULT_STORAGE_KEY};
use crate::workflows::recruiting::{recruiting_router, RecruitingService};

pub(super) fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 18, 15, 30, 0)
        .single()
        .expect("valid timestamp")
}

pub(super) fn seeded_store() -> (Store<MemoryStorage>, MemoryStorage) {
    let medium = MemoryStorage::default();
    let store = Store::with_state(medium.clone(), DEFAULT_STORAGE_KEY, seed_state(now()));
    (store, medium)
}

pub(super) fn build_service() -> (RecruitingService<MemoryStorage>, MemoryStorage) {
    let (store, medium) = seeded_store();
    (RecruitingService::new(store), medium)
}

pub(super) fn shared_router() -> (axum::Router, Arc<Mutex<RecruitingService<MemoryStorage>>>) {
    let (service, _) = build_service();
    let shared = Arc::new(Mutex::new(service));
    (recruiting_router(shared.clone()), shared)
}

pub(super) fn male(height: f64, weight: f64) -> Measurements {
    Measurements {
        height: Some(height),
        weight: Some(weight),
        gender: Some(Gender::Male),
        ..Measurements::default()
    }
}

/// Medium whose writes always fail; reads behave like an empty store.
#[derive(Debug, Default)]
pub(super) struct UnavailableStorage;

impl StorageMedium for UnavailableStorage {
    fn get(&self, _key: &str) -> Result<Option<String>, StorageError> {
        Ok(None)
    }

    fn set(&self, _key: &str, _value: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }

    fn remove(&self, _key: &str) -> Result<(), StorageError> {
        Err(StorageError::Unavailable("quota exceeded".to_string()))
    }
}

pub(super) async fn read_body(response: Response) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .expect("read body")
        .to_vec()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = read_body(response).await;
    serde_json::from_slice(&body).expect("json payload")
}
