use chrono::{Duration, NaiveDate};
use schedule_analytics::{
    CpmResult, DurationEstimate, SimulationConfig, SimulationRunner, Task, TaskGraph, simulate,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn task(id: i32, duration: i64) -> Task {
    let start = d(2025, 1, 1);
    Task::new(id, format!("T{id}"), start, start + Duration::days(duration))
}

fn chain_with_estimates() -> Vec<Task> {
    vec![
        task(1, 4).with_estimate(DurationEstimate::new(2.0, 4.0, 8.0)),
        task(2, 6)
            .with_dependencies(vec![1])
            .with_estimate(DurationEstimate::new(5.0, 6.0, 9.0)),
        task(3, 3)
            .with_dependencies(vec![2])
            .with_estimate(DurationEstimate::new(1.0, 3.0, 4.0)),
    ]
}

#[test]
fn zero_variance_collapses_to_the_deterministic_duration() {
    let tasks = vec![
        task(1, 4).with_estimate(DurationEstimate::fixed(4.0)),
        task(2, 6)
            .with_dependencies(vec![1])
            .with_estimate(DurationEstimate::fixed(6.0)),
        task(3, 3)
            .with_dependencies(vec![2])
            .with_estimate(DurationEstimate::fixed(3.0)),
    ];
    let graph = TaskGraph::build(&tasks).unwrap();
    let deterministic = CpmResult::compute(&graph).total_project_duration as f64;

    let config = SimulationConfig {
        iterations: 500,
        seed: Some(7),
        ..SimulationConfig::default()
    };
    let outcome = simulate(&tasks, &graph, &config);

    assert_eq!(outcome.iterations, 500);
    assert_eq!(outcome.p10, deterministic);
    assert_eq!(outcome.p50, deterministic);
    assert_eq!(outcome.p90, deterministic);
    assert_eq!(outcome.mean_duration, deterministic);
    assert_eq!(outcome.std_dev, 0.0);
}

#[test]
fn fixed_seed_reproduces_the_distribution() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let config = SimulationConfig {
        iterations: 1000,
        seed: Some(42),
        ..SimulationConfig::default()
    };

    let first = simulate(&tasks, &graph, &config);
    let second = simulate(&tasks, &graph, &config);

    assert_eq!(first.mean_duration, second.mean_duration);
    assert_eq!(first.std_dev, second.std_dev);
    assert_eq!(first.p10, second.p10);
    assert_eq!(first.p50, second.p50);
    assert_eq!(first.p90, second.p90);
    assert_eq!(first.samples(), second.samples());
}

#[test]
fn sampled_durations_stay_inside_the_estimate_bounds() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let config = SimulationConfig {
        iterations: 2000,
        seed: Some(3),
        ..SimulationConfig::default()
    };
    let outcome = simulate(&tasks, &graph, &config);

    // Chain of triangular samples: total within [8, 21], spread around the
    // deterministic 13.
    for &sample in outcome.samples() {
        assert!(sample >= 8.0 && sample <= 21.0, "sample {sample} out of bounds");
    }
    assert!(outcome.p10 <= outcome.p50 && outcome.p50 <= outcome.p90);
    assert!(outcome.std_dev > 0.0);
}

#[test]
fn probability_not_exceeding_matches_the_percentiles() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let config = SimulationConfig {
        iterations: 1000,
        seed: Some(11),
        ..SimulationConfig::default()
    };
    let outcome = simulate(&tasks, &graph, &config);

    assert_eq!(outcome.probability_not_exceeding(0.0), 0.0);
    assert_eq!(outcome.probability_not_exceeding(1000.0), 1.0);
    let at_p50 = outcome.probability_not_exceeding(outcome.p50);
    assert!(at_p50 >= 0.45 && at_p50 <= 0.55);
}

#[test]
fn runner_delivers_a_completed_outcome() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let runner = SimulationRunner::new();
    let config = SimulationConfig {
        iterations: 200,
        seed: Some(5),
        ..SimulationConfig::default()
    };

    let handle = runner.submit(&tasks, &graph, config);
    let outcome = handle.wait().expect("run should complete");
    assert_eq!(outcome.iterations, 200);
}

#[test]
fn explicit_cancellation_yields_no_outcome() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let runner = SimulationRunner::new();
    let config = SimulationConfig {
        iterations: 2_000_000,
        seed: Some(5),
        ..SimulationConfig::default()
    };

    let handle = runner.submit(&tasks, &graph, config);
    handle.cancel();
    assert!(handle.is_cancelled());
    assert!(handle.wait().is_none());
}

#[test]
fn new_submission_supersedes_the_inflight_run() {
    let tasks = chain_with_estimates();
    let graph = TaskGraph::build(&tasks).unwrap();
    let runner = SimulationRunner::new();

    let slow = SimulationConfig {
        iterations: 2_000_000,
        seed: Some(5),
        ..SimulationConfig::default()
    };
    let fast = SimulationConfig {
        iterations: 100,
        seed: Some(5),
        ..SimulationConfig::default()
    };

    let stale = runner.submit(&tasks, &graph, slow);
    let fresh = runner.submit(&tasks, &graph, fast);

    // The superseded run is cancelled and must not deliver a stale result.
    assert!(stale.wait().is_none());
    let outcome = fresh.wait().expect("superseding run should complete");
    assert_eq!(outcome.iterations, 100);
}
