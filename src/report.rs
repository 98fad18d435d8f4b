use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use indexmap::IndexMap;
use serde::Serialize;
use tracing::info;

use crate::errors::AnalyticsError;
use crate::metrics::SummaryStatistics;
use crate::types::{CategoryLabel, Distribution, TaskName};

/// Merged output of a comprehensive analysis run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AnalysisReport {
    /// RFC 3339 timestamp of report creation.
    pub generated_at: String,
    /// Whole-collection summary.
    pub summary: SummaryStatistics,
    /// Result per aggregation task; `null` marks a failed task.
    pub detailed_analysis: IndexMap<TaskName, Option<Distribution>>,
    /// At most five nationalities, count descending.
    pub top_nationalities: IndexMap<CategoryLabel, usize>,
}

/// Write `report` to `path` as pretty-printed UTF-8 JSON.
///
/// Non-ASCII labels are written as-is, not escaped. Missing parent
/// directories are created.
pub fn export_report(report: &AnalysisReport, path: impl AsRef<Path>) -> Result<(), AnalyticsError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, report)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    info!(path = %path.display(), "report exported");
    Ok(())
}
