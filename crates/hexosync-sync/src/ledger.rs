//! Write-back echo suppression for watch mode.
//!
//! Writing normalized front matter back into a note makes the watcher report
//! that note as modified again. The ledger remembers a SHA-256 of every
//! write-back so the watch loop can recognise its own echo and skip it.

use dashmap::DashMap;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Hex-encoded SHA-256 of `content`
pub fn content_hash(content: &str) -> String {
    format!("{:x}", Sha256::digest(content.as_bytes()))
}

/// Hashes of source files as last written back by a sync
#[derive(Debug, Default)]
pub struct WriteBackLedger {
    entries: DashMap<PathBuf, String>,
}

impl WriteBackLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `path` now holds `content`
    pub fn record(&self, path: &Path, content: &str) {
        self.entries.insert(path.to_path_buf(), content_hash(content));
    }

    /// Whether `content` is exactly what a sync last wrote to `path`.
    ///
    /// A mismatch means the note was edited since; the stale entry is dropped.
    pub fn is_echo(&self, path: &Path, content: &str) -> bool {
        let hash = content_hash(content);
        let matches = self
            .entries
            .get(path)
            .is_some_and(|recorded| *recorded == hash);

        if !matches {
            self.entries.remove(path);
        }
        matches
    }

    pub fn forget(&self, path: &Path) {
        self.entries.remove(path);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash_known_value() {
        assert_eq!(
            content_hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_echo_recognised_repeatedly() {
        let ledger = WriteBackLedger::new();
        let path = Path::new("/vault/post.md");
        ledger.record(path, "---\ntitle: a\n---\n\nbody");

        assert!(ledger.is_echo(path, "---\ntitle: a\n---\n\nbody"));
        assert!(ledger.is_echo(path, "---\ntitle: a\n---\n\nbody"));
    }

    #[test]
    fn test_edit_clears_entry() {
        let ledger = WriteBackLedger::new();
        let path = Path::new("/vault/post.md");
        ledger.record(path, "old");

        assert!(!ledger.is_echo(path, "edited"));
        assert!(ledger.is_empty());
        assert!(!ledger.is_echo(path, "old"));
    }

    #[test]
    fn test_unknown_path_is_not_echo() {
        let ledger = WriteBackLedger::new();
        assert!(!ledger.is_echo(Path::new("/vault/x.md"), "x"));
    }
}
