mod sheets;
mod summary;
pub mod views;

pub use sheets::{ApplicantSheetReport, CsvRosterReport, ReportError, ReportGenerator};
pub use summary::{event_meta, UPCOMING_WINDOW_DAYS};
pub use views::DashboardSummary;
