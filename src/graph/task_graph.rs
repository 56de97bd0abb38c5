use crate::task::Task;
use chrono::NaiveDate;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    CyclicDependency {
        task_id: i32,
    },
    UnknownDependency {
        task_id: i32,
        dependency_id: i32,
    },
    InvalidDateRange {
        task_id: i32,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::CyclicDependency { task_id } => {
                write!(f, "dependency cycle detected through task {task_id}")
            }
            GraphError::UnknownDependency {
                task_id,
                dependency_id,
            } => write!(
                f,
                "task {task_id} depends on unknown task {dependency_id}"
            ),
            GraphError::InvalidDateRange { task_id, start, end } => write!(
                f,
                "task {task_id} ends {end} before it starts {start}"
            ),
        }
    }
}

impl std::error::Error for GraphError {}

/// Validated dependency graph over a task set: a DAG with a topological
/// order and adjacency maps for O(V+E) traversal by the downstream engines.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub graph: DiGraph<i32, ()>,
    pub id_to_index: HashMap<i32, NodeIndex>,
    pub durations: HashMap<i32, i64>,
    /// Task ids in topological order (predecessors before successors).
    pub topo_order: Vec<i32>,
    pub predecessors: HashMap<i32, Vec<i32>>,
    pub successors: HashMap<i32, Vec<i32>>,
}

impl TaskGraph {
    pub fn build(tasks: &[Task]) -> Result<Self, GraphError> {
        for task in tasks {
            if !task.milestone && task.end_date < task.start_date {
                return Err(GraphError::InvalidDateRange {
                    task_id: task.id,
                    start: task.start_date,
                    end: task.end_date,
                });
            }
        }

        let mut graph: DiGraph<i32, ()> = DiGraph::new();
        let mut id_to_index: HashMap<i32, NodeIndex> = HashMap::new();
        let mut durations: HashMap<i32, i64> = HashMap::new();

        // Add nodes first
        for task in tasks {
            let node_ix = graph.add_node(task.id);
            id_to_index.insert(task.id, node_ix);
            durations.insert(task.id, task.duration_days);
        }

        // Add edges: pred -> task
        let mut predecessors: HashMap<i32, Vec<i32>> = HashMap::new();
        let mut successors: HashMap<i32, Vec<i32>> = HashMap::new();
        for task in tasks {
            predecessors.entry(task.id).or_default();
            successors.entry(task.id).or_default();
        }
        for task in tasks {
            for &dep_id in &task.dependencies {
                let (Some(&u), Some(&v)) = (id_to_index.get(&dep_id), id_to_index.get(&task.id))
                else {
                    return Err(GraphError::UnknownDependency {
                        task_id: task.id,
                        dependency_id: dep_id,
                    });
                };
                graph.add_edge(u, v, ());
                predecessors.entry(task.id).or_default().push(dep_id);
                successors.entry(dep_id).or_default().push(task.id);
            }
        }
        for list in predecessors.values_mut().chain(successors.values_mut()) {
            list.sort_unstable();
            list.dedup();
        }

        let topo_order = match toposort(&graph, None) {
            Ok(order) => order.into_iter().map(|ix| graph[ix]).collect(),
            Err(cycle) => {
                return Err(GraphError::CyclicDependency {
                    task_id: graph[cycle.node_id()],
                });
            }
        };

        Ok(Self {
            graph,
            id_to_index,
            durations,
            topo_order,
            predecessors,
            successors,
        })
    }

    pub fn task_count(&self) -> usize {
        self.topo_order.len()
    }

    pub fn duration(&self, task_id: i32) -> i64 {
        self.durations.get(&task_id).copied().unwrap_or(0)
    }
}
