use crate::persistence::{BaselineStore, PersistenceError, PersistenceResult};
use crate::task::Task;
use crate::task_validation;
use chrono::{DateTime, Utc};
use log::info;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Immutable, timestamped copy of a project's task set. Snapshots are never
/// mutated after creation, only superseded or deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaselineSnapshot {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub version: u32,
    pub created_at: DateTime<Utc>,
    pub created_by: String,
    pub total_budget: f64,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallHealth {
    Green,
    Yellow,
    Red,
}

impl OverallHealth {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverallHealth::Green => "green",
            OverallHealth::Yellow => "yellow",
            OverallHealth::Red => "red",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleVarianceEntry {
    pub task_id: i32,
    pub task_name: String,
    /// (current span) - (baseline span) in days; positive means the task
    /// grew.
    pub variance_days: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CostVarianceEntry {
    pub task_id: i32,
    pub task_name: String,
    pub variance: f64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ScopeChanges {
    /// Present now, absent from the baseline.
    pub added: Vec<i32>,
    /// Present in the baseline, gone now.
    pub removed: Vec<i32>,
}

impl ScopeChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BaselineComparison {
    pub schedule_variances: Vec<ScheduleVarianceEntry>,
    pub cost_variances: Vec<CostVarianceEntry>,
    pub scope_changes: ScopeChanges,
    pub overall_health: OverallHealth,
}

/// Thresholds under which a task's drift still counts as on-plan.
#[derive(Debug, Clone)]
pub struct ComparisonTolerance {
    pub schedule_days: i64,
    /// Cost drift allowance as a fraction of the baseline cost.
    pub cost_fraction: f64,
}

impl Default for ComparisonTolerance {
    fn default() -> Self {
        Self {
            schedule_days: 2,
            cost_fraction: 0.05,
        }
    }
}

const COST_EPSILON: f64 = 1e-9;

/// Diffs the current task set against a baseline copy, matching tasks by
/// id. Only non-zero variances are reported. `critical_ids` is the current
/// critical set from the CPM engine; a scope change touching it forces
/// health to red.
pub fn compare_with_baseline(
    current: &[Task],
    baseline: &[Task],
    critical_ids: &HashSet<i32>,
    tolerance: &ComparisonTolerance,
) -> BaselineComparison {
    let baseline_by_id: HashMap<i32, &Task> = baseline.iter().map(|t| (t.id, t)).collect();
    let current_ids: HashSet<i32> = current.iter().map(|t| t.id).collect();

    let mut schedule_variances = Vec::new();
    let mut cost_variances = Vec::new();
    let mut matched_count = 0usize;
    let mut exceeding_count = 0usize;

    for task in current {
        let Some(base) = baseline_by_id.get(&task.id) else {
            continue;
        };
        matched_count += 1;

        let current_span = (task.end_date - task.start_date).num_days();
        let baseline_span = (base.end_date - base.start_date).num_days();
        let schedule_variance = current_span - baseline_span;
        if schedule_variance != 0 {
            schedule_variances.push(ScheduleVarianceEntry {
                task_id: task.id,
                task_name: task.name.clone(),
                variance_days: schedule_variance,
            });
        }

        let cost_variance = task.cost - base.cost;
        if cost_variance.abs() > COST_EPSILON {
            cost_variances.push(CostVarianceEntry {
                task_id: task.id,
                task_name: task.name.clone(),
                variance: cost_variance,
            });
        }

        let schedule_exceeds = schedule_variance.abs() > tolerance.schedule_days;
        let cost_exceeds = cost_variance.abs() > tolerance.cost_fraction * base.cost.abs();
        if schedule_exceeds || (cost_variance.abs() > COST_EPSILON && cost_exceeds) {
            exceeding_count += 1;
        }
    }

    let mut added: Vec<i32> = current_ids
        .iter()
        .filter(|id| !baseline_by_id.contains_key(*id))
        .copied()
        .collect();
    let mut removed: Vec<i32> = baseline_by_id
        .keys()
        .filter(|id| !current_ids.contains(*id))
        .copied()
        .collect();
    added.sort_unstable();
    removed.sort_unstable();
    let scope_changes = ScopeChanges { added, removed };

    let scope_touches_critical = scope_changes
        .added
        .iter()
        .chain(scope_changes.removed.iter())
        .any(|id| critical_ids.contains(id));

    let overall_health = if scope_touches_critical || exceeding_count * 2 > matched_count.max(1) {
        OverallHealth::Red
    } else if exceeding_count == 0 {
        OverallHealth::Green
    } else {
        OverallHealth::Yellow
    };

    BaselineComparison {
        schedule_variances,
        cost_variances,
        scope_changes,
        overall_health,
    }
}

/// Snapshot lifecycle over an injected store: saving marks the new snapshot
/// active and supersedes the previous one, which stays retrievable by id.
pub struct BaselineManager<S: BaselineStore> {
    store: S,
    // Serializes version allocation across concurrent saves; the store
    // only guarantees each individual write is atomic.
    save_lock: Mutex<()>,
}

impl<S: BaselineStore> BaselineManager<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            save_lock: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn save_baseline(
        &self,
        project_id: &str,
        name: &str,
        description: &str,
        tasks: &[Task],
        total_budget: f64,
        created_by: &str,
    ) -> PersistenceResult<BaselineSnapshot> {
        task_validation::validate_task_collection(tasks)
            .map_err(|err| PersistenceError::InvalidData(err.to_string()))?;

        let _guard = self.save_lock.lock();
        let version = self
            .store
            .active(project_id)?
            .map(|snapshot| snapshot.version + 1)
            .unwrap_or(1);
        let snapshot = BaselineSnapshot {
            id: format!("{project_id}-v{version}"),
            project_id: project_id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            version,
            created_at: Utc::now(),
            created_by: created_by.to_string(),
            total_budget,
            tasks: tasks.to_vec(),
        };
        self.store.save(&snapshot)?;
        info!(
            "saved baseline {} for project {} ({} tasks)",
            snapshot.id,
            project_id,
            snapshot.tasks.len()
        );
        Ok(snapshot)
    }

    pub fn active_baseline(&self, project_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        self.store.active(project_id)
    }

    pub fn baseline_by_id(&self, snapshot_id: &str) -> PersistenceResult<Option<BaselineSnapshot>> {
        self.store.snapshot(snapshot_id)
    }

    /// Compares the current task set against the project's active baseline.
    /// `None` when no baseline was ever saved.
    pub fn compare(
        &self,
        project_id: &str,
        current: &[Task],
        critical_ids: &HashSet<i32>,
        tolerance: &ComparisonTolerance,
    ) -> PersistenceResult<Option<BaselineComparison>> {
        let Some(baseline) = self.store.active(project_id)? else {
            return Ok(None);
        };
        Ok(Some(compare_with_baseline(
            current,
            &baseline.tasks,
            critical_ids,
            tolerance,
        )))
    }
}
