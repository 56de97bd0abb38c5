use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Lifecycle state derived from progress and dates. Never supplied as input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskStatus {
    NotStarted,
    InProgress,
    Completed,
    Delayed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NotStarted => "not-started",
            TaskStatus::InProgress => "in-progress",
            TaskStatus::Completed => "completed",
            TaskStatus::Delayed => "delayed",
        }
    }
}

/// Three-point duration estimate in days, used by the duration simulator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DurationEstimate {
    pub optimistic: f64,
    pub most_likely: f64,
    pub pessimistic: f64,
}

impl DurationEstimate {
    pub fn new(optimistic: f64, most_likely: f64, pessimistic: f64) -> Self {
        Self {
            optimistic,
            most_likely,
            pessimistic,
        }
    }

    /// Estimate with no spread: every sample equals the given duration.
    pub fn fixed(duration: f64) -> Self {
        Self::new(duration, duration, duration)
    }

    pub fn spread(&self) -> f64 {
        self.pessimistic - self.optimistic
    }
}

/// Assignment of a resource (person, crew, equipment tag) to a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceAssignment {
    /// Identifier for the resource. This can be a person id, crew name, or equipment tag.
    pub resource_id: String,
    /// Fraction of the resource consumed per calendar day the task spans.
    /// 1.0 is one full-time equivalent.
    #[serde(default = "default_allocation_fraction")]
    pub allocation_fraction: f64,
}

fn default_allocation_fraction() -> f64 {
    1.0
}

impl ResourceAssignment {
    /// Full-time assignment for every day the task spans.
    pub fn full_time(resource_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            allocation_fraction: 1.0,
        }
    }

    pub fn partial(resource_id: impl Into<String>, allocation_fraction: f64) -> Self {
        Self {
            resource_id: resource_id.into(),
            allocation_fraction,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: i32,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration_days: i64,
    #[serde(default)]
    pub progress_percent: f64,
    #[serde(default)]
    pub dependencies: Vec<i32>,
    #[serde(default)]
    pub resources: Vec<ResourceAssignment>,
    #[serde(default)]
    pub milestone: bool,
    #[serde(default)]
    pub cost: f64,
    #[serde(default)]
    pub actual_cost: f64,
    /// Hierarchy depth for outline rendering. Not used by any calculation.
    #[serde(default)]
    pub level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimate: Option<DurationEstimate>,
}

impl Task {
    pub fn new(
        id: i32,
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Self {
        let duration_days = (end_date - start_date).num_days().max(0);
        Self {
            id,
            name: name.into(),
            start_date,
            end_date,
            duration_days,
            progress_percent: 0.0,
            dependencies: Vec::new(),
            resources: Vec::new(),
            milestone: false,
            cost: 0.0,
            actual_cost: 0.0,
            level: 0,
            estimate: None,
        }
    }

    /// Zero-duration marker task pinned to a single date.
    pub fn milestone(id: i32, name: impl Into<String>, date: NaiveDate) -> Self {
        let mut task = Self::new(id, name, date, date);
        task.milestone = true;
        task
    }

    pub fn with_dependencies(mut self, dependencies: Vec<i32>) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub fn with_progress(mut self, progress_percent: f64) -> Self {
        self.progress_percent = progress_percent;
        self
    }

    pub fn with_cost(mut self, cost: f64, actual_cost: f64) -> Self {
        self.cost = cost;
        self.actual_cost = actual_cost;
        self
    }

    pub fn with_resources(mut self, resources: Vec<ResourceAssignment>) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_estimate(mut self, estimate: DurationEstimate) -> Self {
        self.estimate = Some(estimate);
        self
    }

    /// Derives the lifecycle state from progress and dates relative to `today`.
    pub fn status(&self, today: NaiveDate) -> TaskStatus {
        if self.progress_percent >= 100.0 {
            TaskStatus::Completed
        } else if today > self.end_date {
            TaskStatus::Delayed
        } else if self.progress_percent > 0.0 || today >= self.start_date {
            TaskStatus::InProgress
        } else {
            TaskStatus::NotStarted
        }
    }

    /// Whether the task occupies the given calendar day. Span is inclusive,
    /// so a milestone occupies exactly its pinned date.
    pub fn spans(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }
}
