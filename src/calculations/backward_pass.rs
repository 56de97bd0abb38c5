use crate::graph::TaskGraph;
use std::collections::HashMap;

/// Backward pass in reverse topological order, anchored to the project span
/// computed by the forward pass.
pub struct BackwardPass<'a> {
    graph: &'a TaskGraph,
}

impl<'a> BackwardPass<'a> {
    pub fn new(graph: &'a TaskGraph) -> Self {
        Self { graph }
    }

    /// Computes (late_start, late_finish) per task id. Tasks without
    /// successors may finish as late as the total project duration.
    pub fn execute(&self, total_project_duration: i64) -> HashMap<i32, (i64, i64)> {
        let mut results: HashMap<i32, (i64, i64)> = HashMap::with_capacity(self.graph.task_count());

        for &task_id in self.graph.topo_order.iter().rev() {
            let late_finish = self.graph.successors[&task_id]
                .iter()
                .filter_map(|succ| results.get(succ).map(|(ls, _)| *ls))
                .min()
                .unwrap_or(total_project_duration);
            let late_start = late_finish - self.graph.duration(task_id);
            results.insert(task_id, (late_start, late_finish));
        }

        results
    }
}
