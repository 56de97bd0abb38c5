use crate::calculations::cpm::CpmResult;
use crate::task::Task;
use chrono::{Duration, NaiveDate};
use serde::Serialize;

const EPSILON: f64 = 1e-9;

/// Estimate-at-completion convention. The formula differs between shops, so
/// it is a strategy choice rather than a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EacMethod {
    /// EAC = BAC / CPI: the whole budget drifts with the observed cost rate.
    BudgetRate,
    /// EAC = AC + (BAC - EV) / CPI: sunk costs stay, remaining work drifts.
    RemainingWorkAtCpi,
}

impl Default for EacMethod {
    fn default() -> Self {
        EacMethod::BudgetRate
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricHealth {
    Excellent,
    Satisfactory,
    Critical,
}

impl MetricHealth {
    pub fn classify(index: f64) -> Self {
        if index >= 1.1 {
            MetricHealth::Excellent
        } else if index >= 0.9 {
            MetricHealth::Satisfactory
        } else {
            MetricHealth::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricHealth::Excellent => "excellent",
            MetricHealth::Satisfactory => "satisfactory",
            MetricHealth::Critical => "critical",
        }
    }
}

/// Aggregate earned-value metrics for one recomputation. Not persisted.
#[derive(Debug, Clone, Serialize)]
pub struct EvmMetrics {
    pub planned_value: f64,
    pub earned_value: f64,
    pub actual_cost: f64,
    pub budget_at_completion: f64,
    pub schedule_performance_index: f64,
    pub cost_performance_index: f64,
    pub schedule_variance: f64,
    pub cost_variance: f64,
    pub estimate_at_completion: f64,
    pub estimate_to_complete: f64,
    pub variance_at_completion: f64,
    /// None when BAC = AC: the index divides by zero and is not computable.
    pub to_complete_performance_index: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VarianceReportEntry {
    pub task_id: i32,
    pub task_name: String,
    pub schedule_performance_index: f64,
    pub cost_performance_index: f64,
    /// Flagged when either per-task index drops below 0.8.
    pub critical: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleForecast {
    /// Deterministic critical-path duration in days.
    pub planned_duration: i64,
    /// Days of critical-path work not yet elapsed, before SPI adjustment.
    pub remaining_duration: i64,
    pub estimated_completion: NaiveDate,
    /// Fraction of simulated project durations finishing within plan.
    /// Populated from the Monte Carlo outcome once it completes.
    pub on_time_probability: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvmAnalysis {
    pub metrics: EvmMetrics,
    pub schedule_health: MetricHealth,
    pub cost_health: MetricHealth,
    pub variance_report: Vec<VarianceReportEntry>,
    pub forecast: ScheduleForecast,
    pub recommendations: Vec<String>,
}

/// Planned value of a single task at the reference date: nothing before the
/// task starts, the full cost once it should have finished, linear in
/// between.
pub fn planned_value(task: &Task, today: NaiveDate) -> f64 {
    if today < task.start_date {
        0.0
    } else if today >= task.end_date {
        task.cost
    } else {
        let span = (task.end_date - task.start_date).num_days() as f64;
        task.cost * (today - task.start_date).num_days() as f64 / span
    }
}

pub fn earned_value(task: &Task) -> f64 {
    task.cost * task.progress_percent / 100.0
}

fn index_or_one(numerator: f64, denominator: f64) -> f64 {
    if denominator.abs() <= EPSILON {
        1.0
    } else {
        numerator / denominator
    }
}

impl EvmAnalysis {
    pub fn calculate(
        tasks: &[Task],
        today: NaiveDate,
        cpm: &CpmResult,
        method: EacMethod,
    ) -> Self {
        let mut pv = 0.0;
        let mut ev = 0.0;
        let mut ac = 0.0;
        let mut bac = 0.0;
        let mut variance_report = Vec::with_capacity(tasks.len());

        for task in tasks {
            let task_pv = planned_value(task, today);
            let task_ev = earned_value(task);
            pv += task_pv;
            ev += task_ev;
            ac += task.actual_cost;
            bac += task.cost;

            let task_spi = index_or_one(task_ev, task_pv);
            let task_cpi = index_or_one(task_ev, task.actual_cost);
            variance_report.push(VarianceReportEntry {
                task_id: task.id,
                task_name: task.name.clone(),
                schedule_performance_index: task_spi,
                cost_performance_index: task_cpi,
                critical: task_spi < 0.8 || task_cpi < 0.8,
            });
        }

        let spi = index_or_one(ev, pv);
        let cpi = index_or_one(ev, ac);

        let estimate_at_completion = match method {
            EacMethod::BudgetRate if cpi > EPSILON => bac / cpi,
            EacMethod::RemainingWorkAtCpi if cpi > EPSILON => ac + (bac - ev) / cpi,
            // No cost efficiency signal yet: remaining work at planned cost.
            _ => ac + (bac - ev),
        };
        let to_complete_performance_index = if (bac - ac).abs() <= EPSILON {
            None
        } else {
            Some((bac - ev) / (bac - ac))
        };

        let metrics = EvmMetrics {
            planned_value: pv,
            earned_value: ev,
            actual_cost: ac,
            budget_at_completion: bac,
            schedule_performance_index: spi,
            cost_performance_index: cpi,
            schedule_variance: ev - pv,
            cost_variance: ev - ac,
            estimate_at_completion,
            estimate_to_complete: estimate_at_completion - ac,
            variance_at_completion: bac - estimate_at_completion,
            to_complete_performance_index,
        };

        let forecast = Self::forecast(tasks, today, cpm, spi);
        let recommendations = Self::recommendations(&metrics);

        Self {
            schedule_health: MetricHealth::classify(spi),
            cost_health: MetricHealth::classify(cpi),
            metrics,
            variance_report,
            forecast,
            recommendations,
        }
    }

    fn forecast(tasks: &[Task], today: NaiveDate, cpm: &CpmResult, spi: f64) -> ScheduleForecast {
        let planned_duration = cpm.total_project_duration;
        let project_start = tasks.iter().map(|t| t.start_date).min().unwrap_or(today);
        let elapsed = (today - project_start).num_days().clamp(0, planned_duration);
        let remaining_duration = planned_duration - elapsed;

        // A stalled schedule (SPI 0) has no meaningful rate to extrapolate;
        // fall back to the unadjusted remainder and let the recommendation
        // thresholds flag it.
        let adjusted = if spi > EPSILON {
            (remaining_duration as f64 / spi).round() as i64
        } else {
            remaining_duration
        };

        ScheduleForecast {
            planned_duration,
            remaining_duration,
            estimated_completion: today + Duration::days(adjusted),
            on_time_probability: None,
        }
    }

    fn recommendations(metrics: &EvmMetrics) -> Vec<String> {
        let mut recommendations = Vec::new();
        if metrics.schedule_performance_index < 0.9 {
            recommendations.push(format!(
                "schedule performance index {:.2} is below 0.9: accelerate the schedule or re-baseline",
                metrics.schedule_performance_index
            ));
        }
        if metrics.cost_performance_index < 0.9 {
            recommendations.push(format!(
                "cost performance index {:.2} is below 0.9: review cost overruns",
                metrics.cost_performance_index
            ));
        }
        if let Some(tcpi) = metrics.to_complete_performance_index {
            if tcpi > 1.2 {
                recommendations.push(format!(
                    "to-complete performance index {tcpi:.2} exceeds 1.2: remaining work requires unrealistic efficiency"
                ));
            }
        }
        recommendations
    }

    /// Tasks flagged critical in the per-task variance report.
    pub fn critical_report_entries(&self) -> impl Iterator<Item = &VarianceReportEntry> {
        self.variance_report.iter().filter(|entry| entry.critical)
    }
}
