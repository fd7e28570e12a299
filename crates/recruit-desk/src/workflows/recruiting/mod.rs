//! Recruiting pipeline tracking: the versioned state store, schema migration, body-composition
//! screening, import/export, and the dashboard views derived from a snapshot.

pub mod bodycomp;
pub mod checklist;
pub mod domain;
pub mod migration;
pub mod report;
pub mod router;
pub mod seed;
pub mod service;
pub mod storage;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod tests;

pub use bodycomp::{evaluate, BodyCompEvaluator, BodyCompResult, BodyCompStatus, BodyCompTables};
pub use domain::{
    ApplicantId, ApplicantRecord, EventCategory, EventId, EventRecord, Gender, Measurements,
    ScheduledReminder, Settings, Stage, StoreState,
};
pub use migration::{migrate, CURRENT_SCHEMA_VERSION};
pub use report::{
    ApplicantSheetReport, CsvRosterReport, DashboardSummary, ReportError, ReportGenerator,
};
pub use router::{recruiting_router, SharedRecruitingService};
pub use seed::seed_state;
pub use service::{EventDraft, RecruitingService, RecruitingServiceError, SettingsPatch};
pub use storage::{FileStorage, MemoryStorage, StorageError, StorageMedium};
pub use store::{Store, Subscription, DEFAULT_STORAGE_KEY};
pub use transfer::{ExportScope, ImportError, ImportSummary, MergeCounts};
