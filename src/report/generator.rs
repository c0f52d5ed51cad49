//! Summary report generation.
//!
//! This module renders the statistics computed from a persisted
//! aggregate either as plain text or as a JSON document.

use crate::models::DataSummary;
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Summary statistics together with where and when they were computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryReport {
    /// File the statistics were read from.
    pub source_file: String,
    /// Time the report was generated.
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: DataSummary,
}

impl SummaryReport {
    pub fn new(source: &Path, summary: DataSummary) -> Self {
        Self {
            source_file: source.display().to_string(),
            generated_at: Utc::now(),
            summary,
        }
    }
}

/// Generate the plain-text summary.
pub fn generate_text_summary(report: &SummaryReport) -> String {
    let summary = &report.summary;
    let mut lines = Vec::new();

    lines.push(format!("Summary of data for file {:?}:", report.source_file));
    lines.push(format!("Total users: {}", summary.total_users));
    lines.push(format!("Total posts: {}", summary.total_posts));
    lines.push(format!("Total comments: {}", summary.total_comments));
    lines.push(format!(
        "User with most posts: {} ({} posts)",
        summary.most_posts_user, summary.most_posts
    ));

    lines.join("\n")
}

/// Generate a JSON summary.
pub fn generate_json_summary(report: &SummaryReport) -> Result<String> {
    serde_json::to_string_pretty(report).map_err(Into::into)
}
