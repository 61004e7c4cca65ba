//! Whole-store sync.
//!
//! Documents are synced one after another in path order. A failing document
//! is recorded and skipped; it never stops the run.

use crate::orchestrator::{SyncOrchestrator, SyncOutcome, SyncStage, SyncStatus};
use hexosync_core::{Document, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::instrument;

/// One failed document in a batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub document: PathBuf,
    /// Last stage reached before the failure
    pub stage: SyncStage,
    pub error: String,
}

/// Result of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    /// Unique run ID
    pub run_id: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub failures: Vec<FailureRecord>,
    /// Per-document outcomes, in sync order
    pub outcomes: Vec<SyncOutcome>,
    /// Execution duration in milliseconds
    pub duration_ms: u64,
}

impl BatchReport {
    fn from_outcomes(run_id: String, outcomes: Vec<SyncOutcome>, started: Instant) -> Self {
        let count = |status: SyncStatus| outcomes.iter().filter(|o| o.status == status).count();
        let failures = outcomes
            .iter()
            .filter(|o| o.status == SyncStatus::Failed)
            .map(|o| FailureRecord {
                document: o.document.clone(),
                stage: o.stage,
                error: o.error.clone().unwrap_or_default(),
            })
            .collect();

        Self {
            run_id,
            total: outcomes.len(),
            succeeded: count(SyncStatus::Ok),
            failed: count(SyncStatus::Failed),
            skipped: count(SyncStatus::Skipped),
            failures,
            outcomes,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }

    /// Every document synced (skips count as success)
    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    /// One-line status for interactive output
    pub fn summary(&self) -> String {
        format!(
            "{} of {} synced, {} failed, {} skipped in {} ms",
            self.succeeded, self.total, self.failed, self.skipped, self.duration_ms
        )
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| {
            hexosync_core::Error::other(format!("Failed to serialize batch report: {}", e))
        })
    }
}

/// Runs [`SyncOrchestrator`] over every eligible document
pub struct BatchSyncOrchestrator {
    orchestrator: SyncOrchestrator,
}

impl BatchSyncOrchestrator {
    pub fn new(orchestrator: SyncOrchestrator) -> Self {
        Self { orchestrator }
    }

    pub fn orchestrator(&self) -> &SyncOrchestrator {
        &self.orchestrator
    }

    /// Enumerate the store and sync each document.
    ///
    /// Fails only when enumeration itself fails.
    #[instrument(skip(self), name = "sync_all")]
    pub fn sync_all(&self) -> Result<BatchReport> {
        let documents = self.orchestrator.store().documents()?;
        Ok(self.sync_documents(&documents))
    }

    /// Sync `documents` in order, isolating failures
    pub fn sync_documents(&self, documents: &[Document]) -> BatchReport {
        let started = Instant::now();
        let run_id = uuid::Uuid::new_v4().to_string();
        log::info!("[Batch] run {} over {} documents", run_id, documents.len());

        let outcomes: Vec<SyncOutcome> = documents
            .iter()
            .map(|document| self.orchestrator.sync(document))
            .collect();

        let report = BatchReport::from_outcomes(run_id, outcomes, started);
        if report.is_success() {
            log::info!("[Batch] {}", report.summary());
        } else {
            log::warn!("[Batch] {}", report.summary());
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hexosync_core::SyncConfig;
    use std::fs;
    use tempfile::TempDir;

    fn batch(dir: &TempDir) -> BatchSyncOrchestrator {
        let config = SyncConfig::builder(dir.path().join("vault"))
            .dest_project_root(dir.path().join("blog"))
            .build_unchecked();
        BatchSyncOrchestrator::new(SyncOrchestrator::new(config))
    }

    #[test]
    fn test_failure_does_not_stop_batch() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("vault")).unwrap();
        fs::write(dir.path().join("vault/a.md"), "A").unwrap();
        fs::write(dir.path().join("vault/c.md"), "C").unwrap();

        let docs = vec![
            Document::new("a.md").unwrap(),
            Document::new("b.md").unwrap(),
            Document::new("c.md").unwrap(),
        ];
        let report = batch(&dir).sync_documents(&docs);

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.failures[0].document, PathBuf::from("b.md"));
        assert_eq!(report.failures[0].stage, SyncStage::Pending);
        assert!(!report.is_success());
        assert!(dir.path().join("blog/source/_posts/c.md").is_file());
    }

    #[test]
    fn test_empty_batch() {
        let dir = TempDir::new().unwrap();
        let report = batch(&dir).sync_documents(&[]);
        assert_eq!(report.total, 0);
        assert!(report.is_success());
        assert!(report.summary().starts_with("0 of 0 synced, 0 failed, 0 skipped"));
    }

    #[test]
    fn test_report_json_shape() {
        let dir = TempDir::new().unwrap();
        let report = batch(&dir).sync_documents(&[Document::new("gone.md").unwrap()]);
        let json: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

        assert_eq!(json["failed"], 1);
        assert_eq!(json["failures"][0]["document"], "gone.md");
        assert_eq!(json["outcomes"][0]["status"], "failed");
        assert_eq!(json["run_id"].as_str().unwrap().len(), 36);
    }

    #[test]
    fn test_sync_all_missing_root_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(batch(&dir).sync_all().is_err());
    }
}
