//! Display module for CLI output
//!
//! Renders cached records and live summaries as a comparison table or as
//! JSON for machine consumption.

pub mod table;

pub use table::TableBuilder;

use crate::model::{RepoInfoRecord, RepoSummary};
use anyhow::Result;
use serde::Serialize;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Invalid output format: {}. Valid options: table, json", s)),
        }
    }
}

/// Latest value of a stored series, for the at-a-glance trend column.
fn latest_value(series: &[crate::model::TimeseriesDataPoint]) -> String {
    series
        .last()
        .map(|point| point.value.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn format_oldest(record: &RepoInfoRecord) -> String {
    match (record.oldest_pr, record.days_since_oldest_pr()) {
        (Some(date), Some(days)) => format!("{} ({}d ago)", date.format("%Y-%m-%d"), days),
        _ => "-".to_string(),
    }
}

/// Render cached records as a comparison table, one row per repository.
pub fn render_records_table(records: &[RepoInfoRecord], use_colour: bool) -> String {
    let mut builder = TableBuilder::new().headers(vec![
        "Repository".to_string(),
        "Provider".to_string(),
        "Open PRs".to_string(),
        "Closed PRs".to_string(),
        "Contributors".to_string(),
        "Oldest PR".to_string(),
        "Trend (open)".to_string(),
        "Cached".to_string(),
    ]);

    for record in records {
        builder = builder.add_row(vec![
            record.full_name(),
            record.provider.clone(),
            record.open_prs_count.to_string(),
            record.closed_prs_count.to_string(),
            record.users_count.to_string(),
            format_oldest(record),
            latest_value(&record.open_prs),
            record.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }

    builder.build(use_colour)
}

/// Render live summaries as a comparison table.
pub fn render_summaries_table(summaries: &[RepoSummary], use_colour: bool) -> String {
    let mut builder = TableBuilder::new().headers(vec![
        "Repository".to_string(),
        "Provider".to_string(),
        "Open PRs".to_string(),
        "Closed PRs".to_string(),
        "Contributors".to_string(),
        "Oldest PR".to_string(),
    ]);

    for summary in summaries {
        builder = builder.add_row(vec![
            format!("{}/{}", summary.owner, summary.repo),
            summary.provider.clone(),
            summary.open_prs_count.to_string(),
            summary.closed_prs_count.to_string(),
            summary.users_count.to_string(),
            summary
                .oldest_pr
                .map(|date| date.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string()),
        ]);
    }

    builder.build(use_colour)
}

/// Render any serializable item list as pretty JSON.
pub fn render_json<T: Serialize>(items: &[T]) -> Result<String> {
    Ok(serde_json::to_string_pretty(items)?)
}
