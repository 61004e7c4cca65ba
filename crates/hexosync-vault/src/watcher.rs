//! File system watcher for the note store.
//!
//! Emits [`SourceEvent`]s for markdown files under the source content root.
//! Built on the notify crate with events streamed over a tokio channel;
//! [`next_batch`] turns the raw stream into debounced, per-path batches.

use hexosync_core::{Error, Result, SyncConfig};
use notify::event::{ModifyKind, RenameMode};
use notify::{
    Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher,
};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Default quiet window before a batch of events is released
pub const DEFAULT_DEBOUNCE_MS: u64 = 300;

/// File system event types relevant to syncing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceEvent {
    Created(PathBuf),
    Modified(PathBuf),
    Deleted(PathBuf),
    /// A file was renamed (from, to)
    Renamed(PathBuf, PathBuf),
}

impl SourceEvent {
    /// Primary path affected; the new name for renames
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) | Self::Renamed(_, p) => p,
        }
    }

    /// Check if event is for a markdown file
    pub fn is_markdown(&self) -> bool {
        self.path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("md"))
    }

    /// Whether the file at [`SourceEvent::path`] should be (re)synced
    pub fn wants_sync(&self) -> bool {
        !matches!(self, Self::Deleted(_))
    }
}

/// Configuration for the file watcher
#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Watch recursively
    pub recursive: bool,
    /// Only report events for markdown files
    pub markdown_only: bool,
    /// Ignore paths with a component starting with `.`
    pub ignore_hidden: bool,
    /// Path components whose events are dropped
    pub excluded: BTreeSet<String>,
    /// Quiet window for [`next_batch`] in milliseconds
    pub debounce_ms: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            recursive: true,
            markdown_only: true,
            ignore_hidden: true,
            excluded: BTreeSet::new(),
            debounce_ms: DEFAULT_DEBOUNCE_MS,
        }
    }
}

impl WatcherConfig {
    /// Defaults plus the sync configuration's excluded paths
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            excluded: config.excluded_paths.clone(),
            ..Self::default()
        }
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

/// Watches the note store for changes
pub struct SourceWatcher {
    config: WatcherConfig,
    watch_path: PathBuf,
    watcher: Arc<RwLock<Option<RecommendedWatcher>>>,
    event_tx: UnboundedSender<SourceEvent>,
}

impl SourceWatcher {
    /// Create a watcher for `path` and the receiving end of its event stream
    pub fn new(
        path: PathBuf,
        config: WatcherConfig,
    ) -> Result<(Self, UnboundedReceiver<SourceEvent>)> {
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let watcher = Self {
            config,
            watch_path: path,
            watcher: Arc::new(RwLock::new(None)),
            event_tx,
        };

        Ok((watcher, event_rx))
    }

    pub fn config(&self) -> &WatcherConfig {
        &self.config
    }

    /// Start watching the source content root
    pub async fn start(&mut self) -> Result<()> {
        if self.watcher.read().await.is_some() {
            return Err(Error::invalid_path("Watcher already started"));
        }

        let event_tx = self.event_tx.clone();
        let config = self.config.clone();
        let root = self.watch_path.clone();

        let mut notify_watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    for source_event in Self::convert_event(event) {
                        if !Self::should_emit_event(&source_event, &root, &config) {
                            continue;
                        }
                        // Receiver may already be gone during shutdown
                        let _ = event_tx.send(source_event);
                    }
                }
                Err(e) => log::warn!("Watcher error: {}", e),
            },
            Config::default(),
        )
        .map_err(|e| Error::io(&self.watch_path, std::io::Error::other(e)))?;

        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };

        notify_watcher
            .watch(&self.watch_path, mode)
            .map_err(|e| Error::io(&self.watch_path, std::io::Error::other(e)))?;

        *self.watcher.write().await = Some(notify_watcher);
        log::info!("Watching {}", self.watch_path.display());

        Ok(())
    }

    /// Stop watching; dropping the notify watcher ends its event thread
    pub async fn stop(&mut self) -> Result<()> {
        if self.watcher.write().await.take().is_some() {
            log::info!("Stopped watching {}", self.watch_path.display());
        }
        Ok(())
    }

    pub async fn is_running(&self) -> bool {
        self.watcher.read().await.is_some()
    }

    fn convert_event(event: Event) -> Vec<SourceEvent> {
        match event.kind {
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if event.paths.len() == 2 => {
                let mut paths = event.paths.into_iter();
                match (paths.next(), paths.next()) {
                    (Some(from), Some(to)) => vec![SourceEvent::Renamed(from, to)],
                    _ => Vec::new(),
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                event.paths.into_iter().map(SourceEvent::Deleted).collect()
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) | EventKind::Create(_) => {
                event.paths.into_iter().map(SourceEvent::Created).collect()
            }
            // Generic events are treated as modifications
            EventKind::Modify(_) | EventKind::Any => {
                event.paths.into_iter().map(SourceEvent::Modified).collect()
            }
            EventKind::Remove(_) => event.paths.into_iter().map(SourceEvent::Deleted).collect(),
            _ => Vec::new(),
        }
    }

    fn should_emit_event(event: &SourceEvent, root: &Path, config: &WatcherConfig) -> bool {
        let path = event.path();

        if config.markdown_only && !event.is_markdown() {
            return false;
        }

        // Fall back to the file name when notify reports a differently-rooted path
        let relative = match path.strip_prefix(root) {
            Ok(relative) => relative,
            Err(_) => match path.file_name() {
                Some(name) => Path::new(name),
                None => return false,
            },
        };

        !relative.components().any(|component| {
            let name = component.as_os_str().to_string_lossy();
            (config.ignore_hidden && name.starts_with('.')) || config.excluded.contains(&*name)
        })
    }
}

/// Wait for the next event, then keep collecting until `window` passes
/// without a new one.
///
/// Events are de-duplicated per path, the latest kind winning. Returns `None`
/// once the channel is closed and drained.
pub async fn next_batch(
    rx: &mut UnboundedReceiver<SourceEvent>,
    window: Duration,
) -> Option<Vec<SourceEvent>> {
    let first = rx.recv().await?;

    let mut pending = BTreeMap::new();
    pending.insert(first.path().to_path_buf(), first);

    while let Ok(Some(event)) = tokio::time::timeout(window, rx.recv()).await {
        pending.insert(event.path().to_path_buf(), event);
    }

    Some(pending.into_values().collect())
}
