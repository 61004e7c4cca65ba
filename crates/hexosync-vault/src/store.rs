//! Note store access: enumeration, reads and writes.

use hexosync_core::{Document, Error, Result, SyncConfig};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::instrument;
use walkdir::{DirEntry, WalkDir};

/// Extension of syncable notes
pub const NOTE_EXTENSION: &str = "md";

/// Reads and writes notes under one source content root
#[derive(Debug, Clone)]
pub struct ContentStore {
    root: PathBuf,
    excluded: BTreeSet<String>,
}

impl ContentStore {
    /// Store over `root`, skipping any path with a component in `excluded`
    pub fn new(root: impl Into<PathBuf>, excluded: BTreeSet<String>) -> Self {
        Self {
            root: root.into(),
            excluded,
        }
    }

    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            config.source_content_root.clone(),
            config.excluded_paths.clone(),
        )
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every eligible note under the root, sorted by logical path
    #[instrument(skip(self), fields(root = ?self.root), name = "store_documents")]
    pub fn documents(&self) -> Result<Vec<Document>> {
        if !self.root.is_dir() {
            return Err(Error::file_not_found(&self.root));
        }

        let mut documents = Vec::new();
        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_skipped_entry(entry));

        for entry in walker {
            let entry = entry.map_err(|e| walk_error(&self.root, e))?;

            if !entry.file_type().is_file() || !has_note_extension(entry.path()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };
            documents.push(Document::new(relative)?);
        }

        documents.sort_by(|a, b| a.logical_path().cmp(b.logical_path()));
        log::info!("Found {} notes under {}", documents.len(), self.root.display());
        Ok(documents)
    }

    /// Map an absolute path reported by the watcher back to a document.
    ///
    /// `None` for paths outside the root, non-notes, hidden or excluded paths.
    pub fn document_for(&self, path: &Path) -> Option<Document> {
        let relative = path.strip_prefix(&self.root).ok()?;
        if !has_note_extension(relative) || !self.is_eligible(relative) {
            return None;
        }
        Document::new(relative).ok()
    }

    /// Relative path has no hidden or excluded component
    pub fn is_eligible(&self, relative: &Path) -> bool {
        relative.components().all(|component| {
            let name = component.as_os_str().to_string_lossy();
            !self.is_skipped_name(&name)
        })
    }

    /// UTF-8 text of the file at `path`
    pub fn read_text(&self, path: &Path) -> Result<String> {
        std::fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    /// Overwrite `path` with `content`, creating parent folders.
    ///
    /// Written to a hidden sibling first and renamed into place, so a reader
    /// never observes a half-written note.
    pub fn write_text(&self, path: &Path, content: &str) -> Result<()> {
        let parent = path
            .parent()
            .ok_or_else(|| Error::invalid_path(format!("No parent folder: {}", path.display())))?;
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let file_name = path
            .file_name()
            .ok_or_else(|| Error::invalid_path(format!("No file name: {}", path.display())))?;
        let temp_path = parent.join(format!(".{}.tmp", file_name.to_string_lossy()));

        std::fs::write(&temp_path, content).map_err(|e| Error::io(&temp_path, e))?;
        std::fs::rename(&temp_path, path).map_err(|e| Error::io(path, e))?;

        log::debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(())
    }

    fn is_skipped_entry(&self, entry: &DirEntry) -> bool {
        self.is_skipped_name(&entry.file_name().to_string_lossy())
    }

    fn is_skipped_name(&self, name: &str) -> bool {
        name.starts_with('.') || self.excluded.contains(name)
    }
}

/// Convert a `walkdir` failure, falling back to `root` when it carries no path
pub(crate) fn walk_error(root: &Path, e: walkdir::Error) -> Error {
    let path = e.path().map_or_else(|| root.to_path_buf(), Path::to_path_buf);
    match e.into_io_error() {
        Some(source) => Error::io(path, source),
        None => Error::other(format!("Filesystem loop at {}", path.display())),
    }
}

fn has_note_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(NOTE_EXTENSION))
}
