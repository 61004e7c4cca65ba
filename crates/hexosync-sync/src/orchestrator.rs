//! Single-document sync pipeline.
//!
//! ```text
//! Pending → Resolved → MetadataDone → AttachmentsDone → TransformDone → Written → Success
//!                          any stage may end in Failed
//! ```
//!
//! Attachments are copied before the destination note is written, so a note
//! never appears synced while its images are still missing.

use crate::guard::InFlightGuard;
use crate::ledger::WriteBackLedger;
use hexosync_core::{Clock, Document, Error, PathResolver, Result, SyncConfig, SystemClock};
use hexosync_parser::{DialectTransform, MetadataService};
use hexosync_vault::{AttachmentReport, AttachmentResolver, ContentStore};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::instrument;

/// Furthest point a sync reached
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    Pending,
    Resolved,
    MetadataDone,
    AttachmentsDone,
    TransformDone,
    Written,
    Success,
}

impl fmt::Display for SyncStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Resolved => "resolved",
            Self::MetadataDone => "metadata",
            Self::AttachmentsDone => "attachments",
            Self::TransformDone => "transform",
            Self::Written => "written",
            Self::Success => "success",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStatus {
    Ok,
    Failed,
    Skipped,
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        })
    }
}

/// Result of syncing one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncOutcome {
    /// Logical path of the document
    pub document: PathBuf,
    pub status: SyncStatus,
    pub stage: SyncStage,
    /// Some stage rewrote the note's text
    pub changed: bool,
    /// Normalized front matter was written back to the source note
    pub wrote_back: bool,
    /// Failure message, or the reason for a skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<AttachmentReport>,
}

impl SyncOutcome {
    fn skipped(document: &Document, reason: impl Into<String>) -> Self {
        Self {
            document: document.logical_path().to_path_buf(),
            status: SyncStatus::Skipped,
            stage: SyncStage::Pending,
            changed: false,
            wrote_back: false,
            error: Some(reason.into()),
            attachments: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == SyncStatus::Ok
    }

    /// Short status line for interactive output
    pub fn summary(&self) -> String {
        match &self.error {
            Some(reason) => format!("{} {} ({})", self.status, self.document.display(), reason),
            None => format!("{} {}", self.status, self.document.display()),
        }
    }
}

/// Mutable state carried through the stages of one sync
#[derive(Debug)]
struct SyncContext {
    document: Document,
    stage: SyncStage,
    changed: bool,
    wrote_back: bool,
    attachments: Vec<AttachmentReport>,
}

impl SyncContext {
    fn new(document: &Document) -> Self {
        Self {
            document: document.clone(),
            stage: SyncStage::Pending,
            changed: false,
            wrote_back: false,
            attachments: Vec::new(),
        }
    }

    fn advance(&mut self, stage: SyncStage) {
        log::debug!("[Sync] {} -> {}", self.document, stage);
        self.stage = stage;
    }

    fn finish(self, error: Option<Error>) -> SyncOutcome {
        let (status, error) = match error {
            Some(e) => (SyncStatus::Failed, Some(e.to_string())),
            None => (SyncStatus::Ok, None),
        };

        SyncOutcome {
            document: self.document.logical_path().to_path_buf(),
            status,
            stage: self.stage,
            changed: self.changed,
            wrote_back: self.wrote_back,
            error,
            attachments: self.attachments,
        }
    }
}

/// Runs the full pipeline for one document.
///
/// Built from one configuration snapshot; every stage component is owned
/// here, nothing is global.
pub struct SyncOrchestrator {
    config: SyncConfig,
    store: ContentStore,
    metadata: MetadataService,
    attachments: AttachmentResolver,
    dialect: DialectTransform,
    guard: InFlightGuard,
    ledger: Arc<WriteBackLedger>,
}

impl SyncOrchestrator {
    pub fn new(config: SyncConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Orchestrator stamping front matter from `clock`
    pub fn with_clock(config: SyncConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: ContentStore::from_config(&config),
            metadata: MetadataService::with_clock(clock),
            attachments: AttachmentResolver::new(),
            dialect: DialectTransform::new(config.attachment_subfolder_name.clone()),
            guard: InFlightGuard::new(),
            ledger: Arc::new(WriteBackLedger::new()),
            config,
        }
    }

    /// Share an in-flight guard with other orchestrators
    pub fn with_guard(mut self, guard: InFlightGuard) -> Self {
        self.guard = guard;
        self
    }

    /// Share a write-back ledger with other orchestrators
    pub fn with_ledger(mut self, ledger: Arc<WriteBackLedger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn store(&self) -> &ContentStore {
        &self.store
    }

    pub fn guard(&self) -> &InFlightGuard {
        &self.guard
    }

    pub fn ledger(&self) -> &Arc<WriteBackLedger> {
        &self.ledger
    }

    /// Sync `document` unconditionally.
    ///
    /// Never returns an error: failures are logged and reported in the
    /// outcome. Skips only when another sync of the same document is running.
    #[instrument(skip(self, document), fields(document = %document), name = "sync_document")]
    pub fn sync(&self, document: &Document) -> SyncOutcome {
        let Some(_token) = self.guard.try_acquire(document) else {
            log::info!("[Sync] {} already in flight, skipping", document);
            return SyncOutcome::skipped(document, "sync already in progress");
        };

        log::info!("[Sync] start {}", document);
        let mut ctx = SyncContext::new(document);

        match self.run(&mut ctx) {
            Ok(()) => {
                log::info!("[Sync] done {}", document);
                ctx.finish(None)
            }
            Err(e) => {
                log::error!("[Sync] failed {} at {}: {}", document, ctx.stage, e);
                ctx.finish(Some(e))
            }
        }
    }

    /// Sync triggered by a change event.
    ///
    /// Skips the document when its current text is exactly what the last
    /// write-back produced, so a sync does not retrigger itself.
    pub fn sync_on_change(&self, document: &Document) -> SyncOutcome {
        if let Ok(paths) = PathResolver::resolve(document, &self.config)
            && let Ok(current) = self.store.read_text(&paths.source_content_path)
            && self.ledger.is_echo(&paths.source_content_path, &current)
        {
            log::debug!("[Sync] {} unchanged since write-back, skipping", document);
            return SyncOutcome::skipped(document, "unchanged since last write-back");
        }

        self.sync(document)
    }

    fn run(&self, ctx: &mut SyncContext) -> Result<()> {
        let document = ctx.document.clone();

        let paths = PathResolver::resolve(&document, &self.config)?;
        if paths.dest_content_path.as_os_str().is_empty() {
            return Err(Error::config_error(format!(
                "No destination content path for {}",
                document
            )));
        }
        let raw = self.store.read_text(&paths.source_content_path)?;
        ctx.advance(SyncStage::Resolved);

        let metadata = self.metadata.ensure_and_normalize(&document, &raw);
        ctx.changed |= metadata.changed;
        ctx.advance(SyncStage::MetadataDone);

        let attachments = self
            .attachments
            .process(&document, &metadata.content, &paths)?;
        ctx.changed |= attachments.changed;
        ctx.attachments = attachments.reports;
        ctx.advance(SyncStage::AttachmentsDone);

        let transformed = self.dialect.transform(&document, &attachments.content);
        ctx.changed |= transformed.changed;
        ctx.advance(SyncStage::TransformDone);

        self.store
            .write_text(&paths.dest_content_path, &transformed.content)?;
        ctx.advance(SyncStage::Written);

        if metadata.changed {
            self.store
                .write_text(&paths.source_content_path, &metadata.content)?;
            self.ledger
                .record(&paths.source_content_path, &metadata.content);
            ctx.wrote_back = true;
            log::debug!("[Sync] front matter written back to {}", document);
        }

        ctx.advance(SyncStage::Success);
        Ok(())
    }
}
