use crate::graph::TaskGraph;
use std::collections::HashMap;

/// Forward pass over the validated graph in day offsets from project start.
pub struct ForwardPass<'a> {
    graph: &'a TaskGraph,
}

impl<'a> ForwardPass<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self { graph }
    }

    /// Computes (early_start, early_finish) per task id. Tasks without
    /// predecessors start at day 0, so every disconnected component spans
    /// from the project start.
    pub fn execute(&self) -> HashMap<i32, (i64, i64)> {
        let mut results: HashMap<i32, (i64, i64)> = HashMap::with_capacity(self.graph.task_count());

        for &task_id in &self.graph.topo_order {
            let early_start = self.graph.predecessors[&task_id]
                .iter()
                .filter_map(|pred| results.get(pred).map(|(_, ef)| *ef))
                .max()
                .unwrap_or(0);
            let early_finish = early_start + self.graph.duration(task_id);
            results.insert(task_id, (early_start, early_finish));
        }

        results
    }

    /// Forward pass with sampled durations, keeping only the project span.
    /// Used per simulation iteration, where float and criticality are
    /// irrelevant and only the finish of the longest chain matters.
    pub fn total_duration_with(&self, durations: &HashMap<i32, f64>) -> f64 {
        let mut finishes: HashMap<i32, f64> = HashMap::with_capacity(self.graph.task_count());
        let mut total: f64 = 0.0;

        for &task_id in &self.graph.topo_order {
            let early_start = self.graph.predecessors[&task_id]
                .iter()
                .filter_map(|pred| finishes.get(pred).copied())
                .fold(0.0, f64::max);
            let duration = durations
                .get(&task_id)
                .copied()
                .unwrap_or_else(|| self.graph.duration(task_id) as f64);
            let early_finish = early_start + duration;
            finishes.insert(task_id, early_finish);
            if early_finish > total {
                total = early_finish;
            }
        }

        total
    }
}
