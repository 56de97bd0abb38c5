use chrono::NaiveDate;
use schedule_analytics::{
    DurationEstimate, PersistenceError, ResourceAssignment, Task, load_tasks_from_csv,
    load_tasks_from_json, save_tasks_to_csv, save_tasks_to_json,
};
use tempfile::NamedTempFile;

fn d(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn build_sample_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "Design", d(2025, 1, 6), d(2025, 1, 11))
            .with_progress(50.0)
            .with_cost(5_000.0, 2_400.0)
            .with_resources(vec![ResourceAssignment::full_time("alice")])
            .with_estimate(DurationEstimate::new(4.0, 5.0, 8.0)),
        Task::new(2, "Build", d(2025, 1, 11), d(2025, 1, 21))
            .with_dependencies(vec![1])
            .with_cost(10_000.0, 0.0)
            .with_resources(vec![
                ResourceAssignment::full_time("bob"),
                ResourceAssignment::partial("alice", 0.25),
            ]),
        Task::milestone(3, "Kickoff review", d(2025, 1, 11)).with_dependencies(vec![1]),
    ]
}

#[test]
fn json_round_trip_preserves_tasks() {
    let tasks = build_sample_tasks();
    let file = NamedTempFile::new().unwrap();
    save_tasks_to_json(&tasks, file.path()).expect("save json");

    let loaded = load_tasks_from_json(file.path()).expect("load json");
    assert_eq!(loaded, tasks);
}

#[test]
fn csv_round_trip_preserves_tasks() {
    let tasks = build_sample_tasks();
    let file = NamedTempFile::new().unwrap();
    save_tasks_to_csv(&tasks, file.path()).expect("save csv");

    let loaded = load_tasks_from_csv(file.path()).expect("load csv");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded, tasks);

    let milestone = &loaded[2];
    assert!(milestone.milestone);
    assert_eq!(milestone.duration_days, 0);
    assert_eq!(milestone.dependencies, vec![1]);
}

#[test]
fn empty_csv_is_rejected() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "id,name,start_date,end_date,duration_days,progress_percent,dependencies,resources,milestone,cost,actual_cost,level,estimate\n",
    )
    .unwrap();

    let err = load_tasks_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn malformed_dates_are_rejected() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "id,name,start_date,end_date,duration_days,progress_percent,dependencies,resources,milestone,cost,actual_cost,level,estimate\n\
         1,Design,not-a-date,2025-01-11,5,0.0,,,false,0.0,0.0,0,\n",
    )
    .unwrap();

    let err = load_tasks_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn duplicate_ids_fail_validation_on_save() {
    let tasks = vec![
        Task::new(1, "One", d(2025, 1, 6), d(2025, 1, 8)),
        Task::new(1, "Again", d(2025, 1, 6), d(2025, 1, 8)),
    ];
    let file = NamedTempFile::new().unwrap();
    let err = save_tasks_to_json(&tasks, file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}

#[test]
fn out_of_range_progress_fails_validation_on_load() {
    let file = NamedTempFile::new().unwrap();
    std::fs::write(
        file.path(),
        "id,name,start_date,end_date,duration_days,progress_percent,dependencies,resources,milestone,cost,actual_cost,level,estimate\n\
         1,Design,2025-01-06,2025-01-11,5,150.0,,,false,0.0,0.0,0,\n",
    )
    .unwrap();

    let err = load_tasks_from_csv(file.path()).unwrap_err();
    assert!(matches!(err, PersistenceError::InvalidData(_)));
}
