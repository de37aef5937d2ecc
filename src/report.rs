use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::Result;

/// Pipeline step a failure happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Fetch,
    Extract,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub stage: Stage,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success {
        bytes: u64,
        remote_name: Option<String>,
    },
    Failure {
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DownloadResult {
    pub source_url: String,
    pub destination: PathBuf,
    pub outcome: Outcome,
}

impl DownloadResult {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, Outcome::Success { .. })
    }
}

/// Everything a run did. Page and attachment failures end up here instead of aborting the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Report {
    pub pages_succeeded: usize,
    pub pages_failed: usize,
    pub attachments_succeeded: usize,
    pub attachments_failed: usize,
    /// Set when the run was stopped before every page was processed.
    pub cancelled: bool,
    pub failures: Vec<FailureRecord>,
    pub downloads: Vec<DownloadResult>,
}

impl Report {
    pub(crate) fn page_succeeded(&mut self) {
        self.pages_succeeded += 1;
    }

    pub(crate) fn page_failed(&mut self, stage: Stage, url: &str, reason: impl ToString) {
        self.pages_failed += 1;
        self.failures.push(FailureRecord {
            stage,
            url: url.to_string(),
            destination: None,
            reason: reason.to_string(),
        });
    }

    pub(crate) fn record_download(&mut self, result: DownloadResult) {
        match &result.outcome {
            Outcome::Success { .. } => self.attachments_succeeded += 1,
            Outcome::Failure { reason } => {
                self.attachments_failed += 1;
                self.failures.push(FailureRecord {
                    stage: Stage::Download,
                    url: result.source_url.clone(),
                    destination: Some(result.destination.clone()),
                    reason: reason.clone(),
                });
            }
        }
        self.downloads.push(result);
    }

    pub fn pages_attempted(&self) -> usize {
        self.pages_succeeded + self.pages_failed
    }

    /// No failures of any kind and not cancelled.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }

    pub fn failures_in(&self, stage: Stage) -> impl Iterator<Item = &FailureRecord> {
        self.failures.iter().filter(move |f| f.stage == stage)
    }

    pub fn write_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pages: {} ok / {} failed, attachments: {} ok / {} failed",
            self.pages_succeeded,
            self.pages_failed,
            self.attachments_succeeded,
            self.attachments_failed
        )?;
        if self.cancelled {
            write!(f, " (cancelled)")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn download(outcome: Outcome) -> DownloadResult {
        DownloadResult {
            source_url: "https://www.ancpi.ro/download.php?id=7".into(),
            destination: PathBuf::from("data/statistica-mai-2024/ipoteci.xlsx"),
            outcome,
        }
    }

    #[test]
    fn counts_and_failure_records() {
        let mut report = Report::default();
        report.page_succeeded();
        report.page_failed(
            Stage::Fetch,
            "https://www.ancpi.ro/statistica-iunie-2024",
            "HTTP 404",
        );
        report.record_download(download(Outcome::Success {
            bytes: 10,
            remote_name: None,
        }));
        report.record_download(download(Outcome::Failure {
            reason: "timed out".into(),
        }));

        assert_eq!(report.pages_attempted(), 2);
        assert_eq!(report.attachments_succeeded, 1);
        assert_eq!(report.attachments_failed, 1);
        assert_eq!(report.failures.len(), 2);
        assert_eq!(report.failures_in(Stage::Download).count(), 1);
        assert!(!report.is_clean());
        assert_eq!(
            report.to_string(),
            "pages: 1 ok / 1 failed, attachments: 1 ok / 1 failed"
        );
    }

    #[test]
    fn json_shape() {
        let mut report = Report::default();
        report.record_download(download(Outcome::Failure {
            reason: "HTTP 500".into(),
        }));
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["attachments_failed"], 1);
        assert_eq!(value["failures"][0]["stage"], "download");
        assert_eq!(value["downloads"][0]["outcome"]["status"], "failure");
        assert_eq!(value["downloads"][0]["outcome"]["reason"], "HTTP 500");
    }
}
