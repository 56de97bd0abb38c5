use chrono::{Duration, NaiveDate};
use schedule_analytics::{
    AnalyticsConfig, AnalyticsEngine, AnalyticsError, BaselineManager, DurationEstimate,
    GraphError, MemoryBaselineStore, OverallHealth, ResourceAssignment, SimulationConfig, Task,
};

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn sample_project() -> Vec<Task> {
    let start = d(2025, 1, 1);
    vec![
        Task::new(1, "Design", start, start + Duration::days(5))
            .with_progress(100.0)
            .with_cost(5_000.0, 4_800.0)
            .with_resources(vec![ResourceAssignment::full_time("alice")])
            .with_estimate(DurationEstimate::new(4.0, 5.0, 7.0)),
        Task::new(2, "Build", start + Duration::days(5), start + Duration::days(15))
            .with_dependencies(vec![1])
            .with_progress(40.0)
            .with_cost(10_000.0, 4_500.0)
            .with_resources(vec![ResourceAssignment::full_time("bob")])
            .with_estimate(DurationEstimate::new(8.0, 10.0, 15.0)),
        Task::new(3, "Docs", start + Duration::days(5), start + Duration::days(9))
            .with_dependencies(vec![1])
            .with_progress(20.0)
            .with_cost(2_000.0, 400.0)
            .with_resources(vec![ResourceAssignment::partial("alice", 0.5)])
            .with_estimate(DurationEstimate::new(3.0, 4.0, 6.0)),
        Task::new(4, "Handover", start + Duration::days(15), start + Duration::days(16))
            .with_dependencies(vec![2, 3])
            .with_cost(1_000.0, 0.0),
    ]
}

fn engine_with_seed(seed: u64) -> AnalyticsEngine {
    let mut config = AnalyticsConfig::default();
    config.simulation = SimulationConfig {
        iterations: 300,
        seed: Some(seed),
        ..SimulationConfig::default()
    };
    AnalyticsEngine::new(config)
}

#[test]
fn recompute_runs_every_stage() {
    let engine = engine_with_seed(17);
    let tasks = sample_project();
    let result = engine.recompute(&tasks, d(2025, 1, 10), None).unwrap();

    // CPM: 1 -> 2 -> 4 is the 16-day spine; Docs floats.
    assert_eq!(result.cpm.total_project_duration, 16);
    assert_eq!(result.cpm.critical_path(), vec![1, 2, 4]);
    assert!(!result.cpm.is_critical(3));
    assert_eq!(result.cpm.float_days(3), 6);

    assert!(result.evm.metrics.budget_at_completion > 0.0);
    assert_eq!(result.evm.variance_report.len(), tasks.len());

    assert!(!result.resources.utilization.by_resource.is_empty());
    assert!(result.baseline.is_none());
}

#[test]
fn simulation_outcome_feeds_the_forecast() {
    let engine = engine_with_seed(23);
    let tasks = sample_project();
    let mut result = engine.recompute(&tasks, d(2025, 1, 10), None).unwrap();

    let outcome = result.simulation.wait().expect("simulation should complete");
    assert_eq!(outcome.iterations, 300);

    result.attach_simulation(&outcome);
    let probability = result.evm.forecast.on_time_probability.unwrap();
    assert!((0.0..=1.0).contains(&probability));
}

#[test]
fn a_cycle_aborts_before_any_stage_runs() {
    let start = d(2025, 1, 1);
    let tasks = vec![
        Task::new(1, "A", start, start + Duration::days(3)).with_dependencies(vec![2]),
        Task::new(2, "B", start, start + Duration::days(3)).with_dependencies(vec![1]),
    ];
    let engine = AnalyticsEngine::default();
    let err = engine.recompute(&tasks, d(2025, 1, 2), None).unwrap_err();
    assert!(matches!(
        err,
        AnalyticsError::Graph(GraphError::CyclicDependency { .. })
    ));
}

#[test]
fn invalid_records_abort_with_a_validation_error() {
    let start = d(2025, 1, 1);
    let tasks =
        vec![Task::new(1, "A", start, start + Duration::days(3)).with_progress(140.0)];
    let engine = AnalyticsEngine::default();
    let err = engine.recompute(&tasks, d(2025, 1, 2), None).unwrap_err();
    assert!(matches!(err, AnalyticsError::Validation(_)));
}

#[test]
fn recompute_diffs_against_a_saved_baseline() {
    let engine = engine_with_seed(31);
    let manager = BaselineManager::new(MemoryBaselineStore::new());
    let tasks = sample_project();
    let snapshot = manager
        .save_baseline("site", "Plan of record", "", &tasks, 18_000.0, "pm")
        .unwrap();

    let mut slipped = sample_project();
    slipped[1].end_date += Duration::days(8);

    let result = engine
        .recompute(&slipped, d(2025, 1, 10), Some(&snapshot))
        .unwrap();
    let comparison = result.baseline.unwrap();
    assert_eq!(comparison.schedule_variances.len(), 1);
    assert_eq!(comparison.schedule_variances[0].task_id, 2);
    assert_eq!(comparison.schedule_variances[0].variance_days, 8);
    assert_ne!(comparison.overall_health, OverallHealth::Green);
}

#[test]
fn identical_inputs_produce_identical_outputs() {
    let engine = engine_with_seed(47);
    let tasks = sample_project();

    // Let each run finish before submitting the next so neither is
    // superseded.
    let first = engine.recompute(&tasks, d(2025, 1, 10), None).unwrap();
    let first_outcome = first.simulation.wait().expect("first run completes");
    let second = engine.recompute(&tasks, d(2025, 1, 10), None).unwrap();
    let second_outcome = second.simulation.wait().expect("second run completes");

    assert_eq!(
        first.cpm.total_project_duration,
        second.cpm.total_project_duration
    );
    assert_eq!(first.cpm.critical_task_ids, second.cpm.critical_task_ids);
    assert_eq!(
        first.evm.metrics.earned_value,
        second.evm.metrics.earned_value
    );
    assert_eq!(
        first.evm.metrics.estimate_at_completion,
        second.evm.metrics.estimate_at_completion
    );

    // The seeded simulator reproduces its distribution bit for bit.
    assert_eq!(first_outcome.samples(), second_outcome.samples());
}
