use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use recruit_desk::config::StorageConfig;
use recruit_desk::workflows::recruiting::{
    ExportScope, FileStorage, Gender, RecruitingService, SharedRecruitingService, Store,
};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Opens the file-backed store, letting a command-line directory override the configured one.
pub(crate) fn open_service(
    storage: &StorageConfig,
    data_dir: Option<PathBuf>,
) -> RecruitingService<FileStorage> {
    let root = data_dir.unwrap_or_else(|| storage.data_dir.clone());
    RecruitingService::new(Store::load(FileStorage::new(root), storage.key.clone()))
}

pub(crate) fn shared_service(
    service: RecruitingService<FileStorage>,
) -> SharedRecruitingService<FileStorage> {
    Arc::new(Mutex::new(service))
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}

pub(crate) fn parse_gender(raw: &str) -> Result<Gender, String> {
    Gender::parse(raw).ok_or_else(|| format!("'{raw}' is not one of male, female, m, f"))
}

pub(crate) fn parse_scope(raw: &str) -> Result<ExportScope, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "full" => Ok(ExportScope::Full),
        "weekly" => Ok(ExportScope::Weekly),
        _ => Err(format!("'{raw}' is not an export scope (full, weekly)")),
    }
}
