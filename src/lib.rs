pub mod analyzer;
pub mod calculations;
pub mod config;
pub mod error;
pub mod graph;
#[cfg(feature = "http_api")]
pub mod http_api;
#[cfg(any(feature = "cli", feature = "http_api"))]
pub mod logging;
pub mod persistence;
pub mod plan;
pub mod progress;
pub mod resource;
pub mod resource_load;
pub mod schedule;
pub mod task;
pub(crate) mod task_validation;

pub use analyzer::{PlanAnalyzer, ServiceError, ServiceResult};
pub use config::{AnalyzerConfig, ConfigError, ServiceConfig, StoreLocation};
pub use error::{AnalysisError, AnalysisResult};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqlitePlanStore;
pub use persistence::{
    DependencyDirection, InMemoryPlanStore, PersistenceError, PersistenceResult, PlanSnapshot,
    PlanStore, load_allocations_from_csv, load_snapshot_from_json, save_allocations_to_csv,
    save_snapshot_to_json,
};
pub use plan::{Kit, KitId, KitStatus, PlanId, ReleasePlan, ReleaseStatus};
pub use progress::{OwnerProgress, ProgressDetails, ReleaseProgress, compute_release_progress};
pub use resource::{DateRange, ResourceAllocation};
pub use resource_load::{
    ResourceLoad, WindowPolicy, compute_resource_load, compute_resource_load_with,
};
pub use schedule::{
    CriticalPathReport, Schedule, ScheduleAnalysis, ScheduleSummary, ScheduledTask, TaskSummary,
    analyze_schedule, compute_critical_path,
};
pub use task::{Dependency, DependencyType, Task, TaskId, parse_datetime};
