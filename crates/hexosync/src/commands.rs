//! Command implementations behind the CLI.
//!
//! Everything except [`watch`] is synchronous; the binary runs these on the
//! tokio runtime's blocking pool.

use anyhow::{Context, Result, bail};
use hexosync_core::{Document, SyncConfig, SystemClock};
use hexosync_sync::{BatchReport, BatchSyncOrchestrator, SyncOrchestrator, SyncOutcome};
use hexosync_vault::{
    DeletionPlan, SiteContent, SourceEvent, SourceWatcher, WatcherConfig, next_batch,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Config with its source root made absolute, so watcher and CLI paths can
/// be matched against it
pub fn canonical_config(mut config: SyncConfig) -> Result<SyncConfig> {
    config.source_content_root = std::fs::canonicalize(&config.source_content_root)
        .with_context(|| {
            format!(
                "Cannot access source content root {}",
                config.source_content_root.display()
            )
        })?;
    Ok(config)
}

/// Map a note argument to a document.
///
/// Relative paths are taken relative to the source content root. Absolute
/// paths must point inside it.
pub fn document_for_note(config: &SyncConfig, note: &Path) -> Result<Document> {
    if note.is_relative() {
        return Ok(Document::new(note)?);
    }

    let absolute = std::fs::canonicalize(note)
        .with_context(|| format!("Cannot access note {}", note.display()))?;
    let relative = absolute
        .strip_prefix(&config.source_content_root)
        .with_context(|| {
            format!(
                "{} is not under the source content root {}",
                note.display(),
                config.source_content_root.display()
            )
        })?;
    Ok(Document::new(relative)?)
}

/// Sync the given notes one by one.
///
/// A note that cannot be mapped to a document fails the whole command before
/// anything is synced.
pub fn sync_notes(config: SyncConfig, notes: &[PathBuf]) -> Result<Vec<SyncOutcome>> {
    let config = canonical_config(config)?;
    let documents = notes
        .iter()
        .map(|note| document_for_note(&config, note))
        .collect::<Result<Vec<_>>>()?;

    let orchestrator = SyncOrchestrator::new(config);
    Ok(documents
        .iter()
        .map(|document| orchestrator.sync(document))
        .collect())
}

/// Sync every eligible note in the store
pub fn sync_all(config: SyncConfig) -> Result<BatchReport> {
    let batch = BatchSyncOrchestrator::new(SyncOrchestrator::new(config));
    Ok(batch.sync_all()?)
}

/// Result of [`rebuild`]
#[derive(Debug)]
pub struct RebuildReport {
    pub backup: PathBuf,
    pub batch: BatchReport,
}

/// Back up and clear the site's generated trees, then sync everything.
///
/// Refuses to run unless `confirmed`.
pub fn rebuild(config: SyncConfig, confirmed: bool) -> Result<RebuildReport> {
    if !confirmed {
        bail!("Rebuild deletes source/_posts and source/images; pass --yes to confirm");
    }

    let site = SiteContent::from_config(&config, Arc::new(SystemClock))?;
    let backup = site
        .prepare_for_full_rebuild()
        .context("Failed to prepare site for rebuild")?;
    log::info!("Site backed up to {}", backup.display());

    let batch = sync_all(config)?;
    Ok(RebuildReport { backup, batch })
}

/// Files a rebuild would delete
pub fn clean_plan(config: &SyncConfig) -> Result<DeletionPlan> {
    let site = SiteContent::from_config(config, Arc::new(SystemClock))?;
    Ok(site.files_to_be_deleted()?)
}

/// Write a starter config file.
///
/// An existing file is kept unless `force` is set.
pub fn init_config(path: &Path, source: &Path, dest: &Path, force: bool) -> Result<SyncConfig> {
    if path.exists() && !force {
        bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }

    let config = SyncConfig::builder(source)
        .dest_project_root(dest)
        .build_unchecked();
    config.save(path)?;
    log::info!("Wrote configuration to {}", path.display());
    Ok(config)
}

/// Sync notes as they change until Ctrl-C.
///
/// Bursts of events are collapsed into one batch per quiet window. Each
/// batch goes through [`SyncOrchestrator::sync_on_change`] so the header
/// write-back of a sync does not trigger another sync.
pub async fn watch(config: SyncConfig, debounce_ms: u64) -> Result<()> {
    let config = canonical_config(config)?;
    let root = config.source_content_root.clone();
    let watcher_config = WatcherConfig {
        debounce_ms,
        ..WatcherConfig::from_config(&config)
    };
    let window = watcher_config.debounce();

    let (mut watcher, mut events) = SourceWatcher::new(root.clone(), watcher_config)?;
    watcher.start().await?;
    log::info!("Watching {} (Ctrl-C to stop)", root.display());

    let orchestrator = Arc::new(SyncOrchestrator::new(config));

    loop {
        tokio::select! {
            batch = next_batch(&mut events, window) => {
                let Some(batch) = batch else {
                    log::warn!("Watcher event stream closed");
                    break;
                };
                sync_changed(&orchestrator, batch).await;
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("Stopping watcher");
                break;
            }
        }
    }

    watcher.stop().await?;
    Ok(())
}

async fn sync_changed(orchestrator: &Arc<SyncOrchestrator>, batch: Vec<SourceEvent>) {
    for event in batch {
        if !event.wants_sync() {
            log::debug!("Ignoring {:?}", event);
            continue;
        }
        let Some(document) = orchestrator.store().document_for(event.path()) else {
            continue;
        };

        let worker = Arc::clone(orchestrator);
        let name = document.to_string();
        match tokio::task::spawn_blocking(move || worker.sync_on_change(&document)).await {
            Ok(outcome) => log::info!("{}", outcome.summary()),
            Err(e) => log::error!("Sync task for {} panicked: {}", name, e),
        }
    }
}
