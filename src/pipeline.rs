use crate::baseline::{
    BaselineComparison, BaselineSnapshot, ComparisonTolerance, compare_with_baseline,
};
use crate::calculations::cpm::CpmResult;
use crate::calculations::earned_value::{EacMethod, EvmAnalysis};
use crate::calculations::monte_carlo::{
    SimulationConfig, SimulationHandle, SimulationOutcome, SimulationRunner,
};
use crate::calculations::resource_leveling::{ResourceAnalysis, analyze_resources};
use crate::graph::{GraphError, TaskGraph};
use crate::task::Task;
use crate::task_validation::{self, TaskValidationError};
use chrono::NaiveDate;
use log::{debug, info};
use std::fmt;

#[derive(Debug)]
pub enum AnalyticsError {
    Validation(TaskValidationError),
    Graph(GraphError),
}

impl fmt::Display for AnalyticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnalyticsError::Validation(err) => write!(f, "invalid task set: {err}"),
            AnalyticsError::Graph(err) => write!(f, "invalid dependency graph: {err}"),
        }
    }
}

impl std::error::Error for AnalyticsError {}

impl From<TaskValidationError> for AnalyticsError {
    fn from(value: TaskValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<GraphError> for AnalyticsError {
    fn from(value: GraphError) -> Self {
        Self::Graph(value)
    }
}

#[derive(Debug, Clone, Default)]
pub struct AnalyticsConfig {
    pub eac_method: EacMethod,
    pub simulation: SimulationConfig,
    pub tolerance: ComparisonTolerance,
}

/// Everything one recomputation produces. The simulation is still running
/// when this is returned; poll or wait on the handle, then fold the outcome
/// back in with [`AnalyticsResult::attach_simulation`].
#[derive(Debug)]
pub struct AnalyticsResult {
    pub cpm: CpmResult,
    pub evm: EvmAnalysis,
    pub resources: ResourceAnalysis,
    pub baseline: Option<BaselineComparison>,
    pub simulation: SimulationHandle,
}

impl AnalyticsResult {
    /// Sets the EVM forecast's on-time probability from the simulated
    /// duration distribution: the fraction of samples finishing within the
    /// deterministic plan.
    pub fn attach_simulation(&mut self, outcome: &SimulationOutcome) {
        self.evm.forecast.on_time_probability =
            Some(outcome.probability_not_exceeding(self.cpm.total_project_duration as f64));
    }
}

/// Explicit on-demand recomputation pipeline: graph validation, then CPM,
/// then the CPM-dependent stages, with resource leveling running alongside
/// and the simulator handed off to a background run.
pub struct AnalyticsEngine {
    config: AnalyticsConfig,
    runner: SimulationRunner,
}

impl AnalyticsEngine {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            config,
            runner: SimulationRunner::new(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    pub fn recompute(
        &self,
        tasks: &[Task],
        today: NaiveDate,
        baseline: Option<&BaselineSnapshot>,
    ) -> Result<AnalyticsResult, AnalyticsError> {
        // A cycle or bad record aborts here; no downstream stage runs.
        task_validation::validate_task_collection(tasks)?;
        let graph = TaskGraph::build(tasks)?;
        debug!("task graph validated ({} tasks)", graph.task_count());

        // Resource leveling has no CPM dependency; EVM must wait for CPM.
        let ((cpm, evm), resources) = rayon::join(
            || {
                let cpm = CpmResult::compute(&graph);
                let evm = EvmAnalysis::calculate(tasks, today, &cpm, self.config.eac_method);
                (cpm, evm)
            },
            || analyze_resources(tasks),
        );

        let baseline = baseline.map(|snapshot| {
            compare_with_baseline(
                tasks,
                &snapshot.tasks,
                &cpm.critical_task_ids,
                &self.config.tolerance,
            )
        });

        let simulation = self
            .runner
            .submit(tasks, &graph, self.config.simulation.clone());

        info!(
            "recompute complete: {} day span, {} of {} tasks critical",
            cpm.total_project_duration,
            cpm.critical_task_ids.len(),
            tasks.len()
        );

        Ok(AnalyticsResult {
            cpm,
            evm,
            resources,
            baseline,
            simulation,
        })
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}
