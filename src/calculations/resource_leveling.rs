use crate::task::Task;
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

const FULL_TIME_PERCENT: f64 = 100.0;
const EPSILON: f64 = 1e-9;

/// Per-resource, per-date utilization in percent of one full-time
/// equivalent. Values above 100 mean the resource is overbooked that day.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResourceUtilization {
    pub by_resource: HashMap<String, BTreeMap<NaiveDate, f64>>,
}

impl ResourceUtilization {
    pub fn utilization(&self, resource_id: &str, date: NaiveDate) -> f64 {
        self.by_resource
            .get(resource_id)
            .and_then(|days| days.get(&date))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn resource_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_resource.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResourceAnalysis {
    pub utilization: ResourceUtilization,
    pub recommendations: Vec<String>,
}

/// Sums allocation fractions per resource over every calendar day each
/// assigned task spans. Independent of the CPM stage.
pub fn analyze_resources(tasks: &[Task]) -> ResourceAnalysis {
    let mut utilization = ResourceUtilization::default();

    for task in tasks {
        if task.resources.is_empty() || task.end_date < task.start_date {
            continue;
        }
        for assignment in &task.resources {
            let days = utilization
                .by_resource
                .entry(assignment.resource_id.clone())
                .or_default();
            let mut date = task.start_date;
            while date <= task.end_date {
                *days.entry(date).or_insert(0.0) += assignment.allocation_fraction * 100.0;
                date += Duration::days(1);
            }
        }
    }

    let recommendations = overallocation_warnings(&utilization);
    ResourceAnalysis {
        utilization,
        recommendations,
    }
}

fn overallocation_warnings(utilization: &ResourceUtilization) -> Vec<String> {
    let mut warnings = Vec::new();
    for resource_id in utilization.resource_ids() {
        let days = &utilization.by_resource[resource_id];
        let overbooked: Vec<(NaiveDate, f64)> = days
            .iter()
            .filter(|&(_, &percent)| percent > FULL_TIME_PERCENT + EPSILON)
            .map(|(&date, &percent)| (date, percent))
            .collect();
        if overbooked.is_empty() {
            continue;
        }
        let peak = overbooked
            .iter()
            .map(|(_, percent)| *percent)
            .fold(0.0, f64::max);
        let ranges = compress_date_ranges(overbooked.iter().map(|(date, _)| *date));
        warnings.push(format!(
            "resource '{}' is overallocated (peak {:.0}%) on {}; redistribute work or shift task dates",
            resource_id,
            peak,
            ranges.join(", ")
        ));
    }
    warnings
}

/// Collapses sorted dates into `start..end` spans for readable warnings.
fn compress_date_ranges(dates: impl IntoIterator<Item = NaiveDate>) -> Vec<String> {
    let mut ranges = Vec::new();
    let mut current: Option<(NaiveDate, NaiveDate)> = None;

    for date in dates {
        current = match current {
            None => Some((date, date)),
            Some((start, end)) if date == end + Duration::days(1) => Some((start, date)),
            Some(span) => {
                ranges.push(format_range(span));
                Some((date, date))
            }
        };
    }
    if let Some(span) = current {
        ranges.push(format_range(span));
    }
    ranges
}

fn format_range((start, end): (NaiveDate, NaiveDate)) -> String {
    if start == end {
        start.to_string()
    } else {
        format!("{start}..{end}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn date_ranges_compress_consecutive_runs() {
        let ranges = compress_date_ranges(vec![
            d(2025, 3, 1),
            d(2025, 3, 2),
            d(2025, 3, 3),
            d(2025, 3, 7),
        ]);
        assert_eq!(ranges, vec!["2025-03-01..2025-03-03", "2025-03-07"]);
    }
}
