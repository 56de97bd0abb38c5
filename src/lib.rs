pub mod baseline;
pub mod calculations;
pub mod graph;
pub mod persistence;
pub mod pipeline;
pub mod report;
pub mod task;
pub mod task_validation;

pub use baseline::{
    BaselineComparison, BaselineManager, BaselineSnapshot, ComparisonTolerance, CostVarianceEntry,
    OverallHealth, ScheduleVarianceEntry, ScopeChanges, compare_with_baseline,
};
pub use calculations::cpm::CpmResult;
pub use calculations::earned_value::{
    EacMethod, EvmAnalysis, EvmMetrics, MetricHealth, ScheduleForecast, VarianceReportEntry,
};
pub use calculations::monte_carlo::{
    SimulationConfig, SimulationHandle, SimulationOutcome, SimulationRunner, simulate,
};
pub use calculations::resource_leveling::{
    ResourceAnalysis, ResourceUtilization, analyze_resources,
};
pub use graph::{GraphError, TaskGraph};
#[cfg(feature = "sqlite")]
pub use persistence::sqlite::SqliteBaselineStore;
pub use persistence::{
    BaselineStore, MemoryBaselineStore, PersistenceError, load_tasks_from_csv,
    load_tasks_from_json, save_tasks_to_csv, save_tasks_to_json,
};
pub use pipeline::{AnalyticsConfig, AnalyticsEngine, AnalyticsError, AnalyticsResult};
pub use task::{DurationEstimate, ResourceAssignment, Task, TaskStatus};
pub use task_validation::{TaskValidationError, validate_task, validate_task_collection};
