use crate::calculations::cpm::CpmResult;
use crate::calculations::earned_value::VarianceReportEntry;
use crate::calculations::resource_leveling::ResourceUtilization;
use crate::persistence::PersistenceResult;
use crate::task::Task;
use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use polars::prelude::*;
use std::fs::File;
use std::path::Path;

/// Convert NaiveDate to Polars i32 date
fn date_to_i32(date: NaiveDate) -> i32 {
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
    (date - epoch).num_days() as i32
}

/// Per-task CPM table for the schedule dashboard: float and criticality
/// alongside the task identity columns.
pub fn cpm_frame(tasks: &[Task], cpm: &CpmResult) -> PolarsResult<DataFrame> {
    let ids: Vec<i32> = tasks.iter().map(|t| t.id).collect();
    let names: Vec<&str> = tasks.iter().map(|t| t.name.as_str()).collect();
    let durations: Vec<i64> = tasks.iter().map(|t| t.duration_days).collect();
    let floats: Vec<i64> = tasks.iter().map(|t| cpm.float_days(t.id)).collect();
    let critical: Vec<bool> = tasks.iter().map(|t| cpm.is_critical(t.id)).collect();

    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("name"), names).into_column(),
        Series::new(PlSmallStr::from_static("duration_days"), durations).into_column(),
        Series::new(PlSmallStr::from_static("total_float"), floats).into_column(),
        Series::new(PlSmallStr::from_static("is_critical"), critical).into_column(),
    ];
    DataFrame::new(columns)
}

/// Per-task SPI/CPI variance table.
pub fn variance_report_frame(entries: &[VarianceReportEntry]) -> PolarsResult<DataFrame> {
    let ids: Vec<i32> = entries.iter().map(|e| e.task_id).collect();
    let names: Vec<&str> = entries.iter().map(|e| e.task_name.as_str()).collect();
    let spi: Vec<f64> = entries
        .iter()
        .map(|e| e.schedule_performance_index)
        .collect();
    let cpi: Vec<f64> = entries.iter().map(|e| e.cost_performance_index).collect();
    let critical: Vec<bool> = entries.iter().map(|e| e.critical).collect();

    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("task_id"), ids).into_column(),
        Series::new(PlSmallStr::from_static("task_name"), names).into_column(),
        Series::new(PlSmallStr::from_static("schedule_performance_index"), spi).into_column(),
        Series::new(PlSmallStr::from_static("cost_performance_index"), cpi).into_column(),
        Series::new(PlSmallStr::from_static("critical"), critical).into_column(),
    ];
    DataFrame::new(columns)
}

/// Utilization matrix in long form (resource, date, percent), ordered by
/// resource then date for stable rendering.
pub fn utilization_frame(utilization: &ResourceUtilization) -> PolarsResult<DataFrame> {
    let mut resources: Vec<&str> = Vec::new();
    let mut dates: Vec<i32> = Vec::new();
    let mut percents: Vec<f64> = Vec::new();

    for resource_id in utilization.resource_ids() {
        for (&date, &percent) in &utilization.by_resource[resource_id] {
            resources.push(resource_id);
            dates.push(date_to_i32(date));
            percents.push(percent);
        }
    }

    let date_series =
        Series::new(PlSmallStr::from_static("date"), dates).cast(&DataType::Date)?;
    let columns: Vec<Column> = vec![
        Series::new(PlSmallStr::from_static("resource"), resources).into_column(),
        date_series.into_column(),
        Series::new(PlSmallStr::from_static("utilization_percent"), percents).into_column(),
    ];
    DataFrame::new(columns)
}

/// CSV form of the variance report for export from the dashboard.
pub fn save_variance_report_to_csv<P: AsRef<Path>>(
    entries: &[VarianceReportEntry],
    path: P,
) -> PersistenceResult<()> {
    let file = File::create(path)?;
    let mut writer = csv::Writer::from_writer(file);
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}
