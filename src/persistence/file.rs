use super::{PersistenceError, PersistenceResult};
use crate::task::{DurationEstimate, ResourceAssignment, Task};
use crate::task_validation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;

fn validate(tasks: &[Task]) -> PersistenceResult<()> {
    task_validation::validate_task_collection(tasks)
        .map_err(|err| PersistenceError::InvalidData(err.to_string()))
}

/// Writes the task list as a pretty-printed JSON document, the form in
/// which the surrounding record layer hands the engine its input.
pub fn save_tasks_to_json<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    validate(tasks)?;
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, tasks)?;
    Ok(())
}

pub fn load_tasks_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let tasks: Vec<Task> = serde_json::from_reader(file)?;
    validate(&tasks)?;
    Ok(tasks)
}

#[derive(Default, Serialize, Deserialize)]
struct TaskCsvRecord {
    id: i32,
    name: String,
    start_date: String,
    end_date: String,
    duration_days: i64,
    progress_percent: f64,
    dependencies: String,
    resources: String,
    milestone: String,
    cost: f64,
    actual_cost: f64,
    level: u32,
    estimate: String,
}

impl From<&Task> for TaskCsvRecord {
    fn from(task: &Task) -> Self {
        let mut record = TaskCsvRecord::default();
        record.id = task.id;
        record.name = task.name.clone();
        record.start_date = format_date(task.start_date);
        record.end_date = format_date(task.end_date);
        record.duration_days = task.duration_days;
        record.progress_percent = task.progress_percent;
        record.dependencies = join_i32(&task.dependencies);
        record.resources =
            serde_json::to_string(&task.resources).unwrap_or_else(|_| "[]".to_string());
        record.milestone = task.milestone.to_string();
        record.cost = task.cost;
        record.actual_cost = task.actual_cost;
        record.level = task.level;
        record.estimate = task
            .estimate
            .as_ref()
            .and_then(|estimate| serde_json::to_string(estimate).ok())
            .unwrap_or_default();
        record
    }
}

impl TaskCsvRecord {
    fn into_task(self) -> PersistenceResult<Task> {
        let start_date = parse_date(&self.start_date)?;
        let end_date = parse_date(&self.end_date)?;
        let mut task = Task::new(self.id, self.name, start_date, end_date);
        task.duration_days = self.duration_days;
        task.progress_percent = self.progress_percent;
        task.dependencies = split_i32(&self.dependencies)?;
        task.milestone = parse_bool(&self.milestone)?;
        task.cost = self.cost;
        task.actual_cost = self.actual_cost;
        task.level = self.level;
        task.resources = if self.resources.trim().is_empty() {
            Vec::new()
        } else {
            serde_json::from_str::<Vec<ResourceAssignment>>(&self.resources)
                .map_err(|err| PersistenceError::InvalidData(format!("invalid resources: {err}")))?
        };
        task.estimate = if self.estimate.trim().is_empty() {
            None
        } else {
            Some(
                serde_json::from_str::<DurationEstimate>(&self.estimate).map_err(|err| {
                    PersistenceError::InvalidData(format!("invalid estimate: {err}"))
                })?,
            )
        };
        Ok(task)
    }
}

pub fn save_tasks_to_csv<P: AsRef<Path>>(tasks: &[Task], path: P) -> PersistenceResult<()> {
    validate(tasks)?;
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for task in tasks {
        writer.serialize(TaskCsvRecord::from(task))?;
    }
    writer.flush()?;
    Ok(())
}

pub fn load_tasks_from_csv<P: AsRef<Path>>(path: P) -> PersistenceResult<Vec<Task>> {
    let file = File::open(path)?;
    let mut reader = csv::Reader::from_reader(file);
    let mut tasks = Vec::new();
    for record in reader.deserialize::<TaskCsvRecord>() {
        tasks.push(record?.into_task()?);
    }

    if tasks.is_empty() {
        return Err(PersistenceError::InvalidData(
            "CSV file contained no tasks".into(),
        ));
    }

    validate(&tasks)?;
    Ok(tasks)
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_date(input: &str) -> PersistenceResult<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| PersistenceError::InvalidData(format!("invalid date '{input}': {e}")))
}

fn parse_bool(input: &str) -> PersistenceResult<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "" | "false" => Ok(false),
        "true" => Ok(true),
        other => Err(PersistenceError::InvalidData(format!(
            "invalid boolean '{other}'"
        ))),
    }
}

fn join_i32(values: &[i32]) -> String {
    values
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn split_i32(input: &str) -> PersistenceResult<Vec<i32>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    input
        .split(',')
        .map(|part| {
            part.trim().parse::<i32>().map_err(|e| {
                PersistenceError::InvalidData(format!("invalid integer '{part}': {e}"))
            })
        })
        .collect()
}
