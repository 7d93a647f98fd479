pub mod dashboard;
pub mod reload;
pub mod telemetry;
pub mod version;

pub use dashboard::DashboardService;
pub use reload::ReloadNotifier;
pub use telemetry::TelemetryStore;
pub use version::{DiscardOutcome, VersionStateController};
