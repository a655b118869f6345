use std::fmt::Display;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const REPORT_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Converted,
    /// Output already existed and `--skip-existing` was given.
    Skipped,
    /// Header accepted during a dry run.
    Probed,
    /// Header rejected by the parser.
    Unsupported,
    Failed,
}

impl FileStatus {
    pub fn is_failure(self) -> bool {
        matches!(self, FileStatus::Unsupported | FileStatus::Failed)
    }
}

impl Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileStatus::Converted => write!(f, "converted"),
            FileStatus::Skipped => write!(f, "skipped"),
            FileStatus::Probed => write!(f, "probed"),
            FileStatus::Unsupported => write!(f, "unsupported"),
            FileStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Result of one input file.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    pub file_name: String,
    pub status: FileStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default)]
    pub frames: u64,
    #[serde(default)]
    pub bytes_written: u64,
    /// Audio duration in seconds.
    #[serde(default)]
    pub duration: f64,
    /// Wall time spent on the file in seconds.
    #[serde(default)]
    pub elapsed: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn new(file_name: impl Into<String>, status: FileStatus) -> Self {
        Self {
            file_name: file_name.into(),
            status,
            format: None,
            frames: 0,
            bytes_written: 0,
            duration: 0.0,
            elapsed: 0.0,
            error: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub found: usize,
    pub converted: usize,
    pub skipped: usize,
    pub probed: usize,
    /// Failures of any kind, unsupported inputs included.
    pub failed: usize,
    pub unsupported: usize,
}

impl BatchSummary {
    pub fn from_outcomes(outcomes: &[FileOutcome]) -> Self {
        let mut summary = Self {
            found: outcomes.len(),
            ..Default::default()
        };

        for outcome in outcomes {
            match outcome.status {
                FileStatus::Converted => summary.converted += 1,
                FileStatus::Skipped => summary.skipped += 1,
                FileStatus::Probed => summary.probed += 1,
                FileStatus::Unsupported => {
                    summary.unsupported += 1;
                    summary.failed += 1;
                }
                FileStatus::Failed => summary.failed += 1,
            }
        }
        summary
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    pub version: u32,
    pub directory: String,
    pub threads: usize,
    pub dry_run: bool,
    /// Wall time of the whole batch in seconds.
    pub elapsed: f64,
    pub summary: BatchSummary,
    pub files: Vec<FileOutcome>,
}

impl BatchReport {
    pub fn serialize_report(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    pub fn write_to(&self, path: &Path) -> Result<()> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create report {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writer.write_all(self.serialize_report()?.as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}
