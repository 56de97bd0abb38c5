use crate::task::Task;
use std::collections::HashSet;
use std::fmt;

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone)]
pub struct TaskValidationError {
    message: String,
}

impl TaskValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for TaskValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for TaskValidationError {}

pub fn validate_task(task: &Task) -> Result<(), TaskValidationError> {
    if task.duration_days < 0 {
        return Err(TaskValidationError::new(format!(
            "task {} has negative duration {}",
            task.id, task.duration_days
        )));
    }

    if task.milestone && task.duration_days != 0 {
        return Err(TaskValidationError::new(format!(
            "task {} is a milestone but has duration {} (milestones must have duration 0)",
            task.id, task.duration_days
        )));
    }

    if !task.progress_percent.is_finite()
        || task.progress_percent < -EPSILON
        || task.progress_percent > 100.0 + EPSILON
    {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid progress_percent {} (must be between 0 and 100)",
            task.id, task.progress_percent
        )));
    }

    if task.dependencies.contains(&task.id) {
        return Err(TaskValidationError::new(format!(
            "task {} lists itself as a dependency",
            task.id
        )));
    }

    if !task.cost.is_finite() || task.cost < -EPSILON {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid cost {}",
            task.id, task.cost
        )));
    }

    if !task.actual_cost.is_finite() || task.actual_cost < -EPSILON {
        return Err(TaskValidationError::new(format!(
            "task {} has invalid actual_cost {}",
            task.id, task.actual_cost
        )));
    }

    for (idx, assignment) in task.resources.iter().enumerate() {
        if assignment.resource_id.trim().is_empty() {
            return Err(TaskValidationError::new(format!(
                "task {} resource assignment #{} requires a non-empty resource_id",
                task.id, idx
            )));
        }
        if !assignment.allocation_fraction.is_finite()
            || assignment.allocation_fraction < -EPSILON
        {
            return Err(TaskValidationError::new(format!(
                "task {} assignment for '{}' has invalid allocation_fraction {}",
                task.id, assignment.resource_id, assignment.allocation_fraction
            )));
        }
    }

    if let Some(estimate) = &task.estimate {
        let values = [
            estimate.optimistic,
            estimate.most_likely,
            estimate.pessimistic,
        ];
        if values.iter().any(|v| !v.is_finite() || *v < -EPSILON) {
            return Err(TaskValidationError::new(format!(
                "task {} has a non-finite or negative duration estimate",
                task.id
            )));
        }
        if estimate.optimistic > estimate.most_likely + EPSILON
            || estimate.most_likely > estimate.pessimistic + EPSILON
        {
            return Err(TaskValidationError::new(format!(
                "task {} estimate must satisfy optimistic <= most_likely <= pessimistic (got {}/{}/{})",
                task.id, estimate.optimistic, estimate.most_likely, estimate.pessimistic
            )));
        }
    }

    Ok(())
}

pub fn validate_task_collection(tasks: &[Task]) -> Result<(), TaskValidationError> {
    let mut seen_ids = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen_ids.insert(task.id) {
            return Err(TaskValidationError::new(format!(
                "duplicate task id {}",
                task.id
            )));
        }
        validate_task(task)?;
    }
    Ok(())
}
