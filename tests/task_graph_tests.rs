use chrono::{Duration, NaiveDate};
use schedule_analytics::{GraphError, Task, TaskGraph};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(id: i32, duration: i64) -> Task {
    let start = d(2025, 1, 1);
    Task::new(id, format!("T{id}"), start, start + Duration::days(duration))
}

#[test]
fn builds_topological_order_with_adjacency() {
    let tasks = vec![
        task(3, 2).with_dependencies(vec![1, 2]),
        task(1, 5),
        task(2, 3).with_dependencies(vec![1]),
    ];
    let graph = TaskGraph::build(&tasks).unwrap();

    assert_eq!(graph.task_count(), 3);
    let position = |id: i32| graph.topo_order.iter().position(|&t| t == id).unwrap();
    assert!(position(1) < position(2));
    assert!(position(2) < position(3));
    assert!(position(1) < position(3));

    assert_eq!(graph.predecessors[&3], vec![1, 2]);
    assert_eq!(graph.successors[&1], vec![2, 3]);
    assert_eq!(graph.duration(2), 3);
}

#[test]
fn two_task_cycle_is_rejected() {
    let tasks = vec![
        task(1, 2).with_dependencies(vec![2]),
        task(2, 2).with_dependencies(vec![1]),
    ];
    let err = TaskGraph::build(&tasks).unwrap_err();
    assert!(matches!(err, GraphError::CyclicDependency { .. }));
}

#[test]
fn longer_cycle_is_rejected() {
    let tasks = vec![
        task(1, 1).with_dependencies(vec![3]),
        task(2, 1).with_dependencies(vec![1]),
        task(3, 1).with_dependencies(vec![2]),
    ];
    let err = TaskGraph::build(&tasks).unwrap_err();
    assert!(matches!(err, GraphError::CyclicDependency { .. }));
}

#[test]
fn unknown_dependency_names_both_tasks() {
    let tasks = vec![task(1, 2), task(2, 2).with_dependencies(vec![99])];
    let err = TaskGraph::build(&tasks).unwrap_err();
    assert_eq!(
        err,
        GraphError::UnknownDependency {
            task_id: 2,
            dependency_id: 99,
        }
    );
}

#[test]
fn reversed_dates_are_rejected_for_regular_tasks() {
    let mut bad = task(1, 3);
    bad.start_date = d(2025, 2, 10);
    bad.end_date = d(2025, 2, 5);
    let err = TaskGraph::build(&[bad]).unwrap_err();
    assert!(matches!(err, GraphError::InvalidDateRange { task_id: 1, .. }));
}

#[test]
fn milestones_pass_date_validation() {
    let tasks = vec![
        task(1, 4),
        Task::milestone(2, "Design freeze", d(2025, 1, 5)).with_dependencies(vec![1]),
    ];
    let graph = TaskGraph::build(&tasks).unwrap();
    assert_eq!(graph.duration(2), 0);
}
