//! Per-run summary manifest.
//!
//! After each pipeline run a `run-report.json` is written under the
//! distribution's store directory, recording what was built, skipped, and
//! why, so unattended runs leave an auditable trail.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use time::OffsetDateTime;

use crate::error::Result;

const REPORT_FILENAME: &str = "run-report.json";

#[derive(Debug, Serialize)]
pub struct FailedKernel {
    pub kernel: String,
    pub reason: String,
}

/// Outcome summary of one pipeline run.
#[derive(Debug, Default, Serialize)]
pub struct RunReport {
    pub os: String,
    pub started_at_utc: String,
    pub finished_at_utc: String,
    pub built: Vec<String>,
    pub skipped_existing: Vec<String>,
    pub invalid: Vec<String>,
    pub missing_member: Vec<String>,
    pub failed: Vec<FailedKernel>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn new(os: &str) -> Self {
        Self {
            os: os.to_owned(),
            started_at_utc: now_utc_compact(),
            ..Self::default()
        }
    }

    /// One-line summary for the terminal.
    pub fn summary(&self) -> String {
        format!(
            "{} built, {} already present, {} invalid, {} missing members, {} failed",
            self.built.len(),
            self.skipped_existing.len(),
            self.invalid.len(),
            self.missing_member.len(),
            self.failed.len()
        )
    }
}

/// Compact UTC timestamp, e.g. `20260806T192144Z`.
pub fn now_utc_compact() -> String {
    let now = OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}T{:02}{:02}{:02}Z",
        now.year(),
        now.month() as u8,
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Write the report under the distribution's store directory.
pub fn write_report(os_dir: &Path, report: &RunReport) -> Result<PathBuf> {
    fs::create_dir_all(os_dir)?;
    let path = os_dir.join(REPORT_FILENAME);
    let bytes = serde_json::to_vec_pretty(report)
        .map_err(|e| crate::error::BuilderError::Io(std::io::Error::other(e)))?;
    fs::write(&path, bytes)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn timestamp_is_compact_utc() {
        let stamp = now_utc_compact();
        assert_eq!(stamp.len(), 16);
        assert!(stamp.ends_with('Z'));
        assert_eq!(stamp.as_bytes()[8], b'T');
    }

    #[test]
    fn report_round_trips_to_disk() {
        let temp = TempDir::new().unwrap();
        let mut report = RunReport::new("ubuntu");
        report.built.push("5.15.0-91-generic".into());
        report.failed.push(FailedKernel {
            kernel: "5.15.0-92-generic".into(),
            reason: "fetch failed".into(),
        });
        report.finished_at_utc = now_utc_compact();

        let path = write_report(temp.path(), &report).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap();
        assert_eq!(value["os"], "ubuntu");
        assert_eq!(value["built"][0], "5.15.0-91-generic");
        assert_eq!(value["failed"][0]["reason"], "fetch failed");
    }
}
