use crate::calculations::backward_pass::BackwardPass;
use crate::calculations::forward_pass::ForwardPass;
use crate::graph::TaskGraph;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Critical-path analysis of a validated task graph.
///
/// Day offsets are relative to project start (day 0); criticality is the
/// union of all zero-float chains, not a single path.
#[derive(Debug, Clone, Serialize)]
pub struct CpmResult {
    pub critical_task_ids: HashSet<i32>,
    pub total_project_duration: i64,
    pub float: HashMap<i32, i64>,
    pub early: HashMap<i32, (i64, i64)>,
    pub late: HashMap<i32, (i64, i64)>,
}

impl CpmResult {
    pub fn compute(graph: &TaskGraph) -> Self {
        let early = ForwardPass::new(graph).execute();
        let total_project_duration = early.values().map(|(_, ef)| *ef).max().unwrap_or(0);
        let late = BackwardPass::new(graph).execute(total_project_duration);

        let mut float: HashMap<i32, i64> = HashMap::with_capacity(early.len());
        let mut critical_task_ids: HashSet<i32> = HashSet::new();
        for (&task_id, &(early_start, _)) in &early {
            let late_start = late.get(&task_id).map(|(ls, _)| *ls).unwrap_or(early_start);
            let slack = late_start - early_start;
            float.insert(task_id, slack);
            if slack == 0 {
                critical_task_ids.insert(task_id);
            }
        }

        Self {
            critical_task_ids,
            total_project_duration,
            float,
            early,
            late,
        }
    }

    pub fn is_critical(&self, task_id: i32) -> bool {
        self.critical_task_ids.contains(&task_id)
    }

    pub fn float_days(&self, task_id: i32) -> i64 {
        self.float.get(&task_id).copied().unwrap_or(0)
    }

    /// Critical task ids ordered by early start, then id, for display as a
    /// chain.
    pub fn critical_path(&self) -> Vec<i32> {
        let mut path: Vec<(i64, i32)> = self
            .critical_task_ids
            .iter()
            .map(|&id| (self.early.get(&id).map(|(es, _)| *es).unwrap_or(0), id))
            .collect();
        path.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        path.into_iter().map(|(_, id)| id).collect()
    }
}
