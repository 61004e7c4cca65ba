//! Per-document in-flight guard.
//!
//! Two syncs of the same note must not overlap: both would copy the same
//! attachments and race on the same destination file. The second caller is
//! told to skip instead of waiting.

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use hexosync_core::Document;
use std::path::PathBuf;
use std::sync::Arc;

/// Set of documents currently being synced, shared between clones
#[derive(Debug, Clone, Default)]
pub struct InFlightGuard {
    active: Arc<DashMap<PathBuf, ()>>,
}

impl InFlightGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim `document`, or `None` when another sync already holds it.
    ///
    /// The claim is released when the returned token is dropped.
    pub fn try_acquire(&self, document: &Document) -> Option<InFlightToken> {
        let key = document.logical_path().to_path_buf();
        match self.active.entry(key.clone()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(InFlightToken {
                    active: Arc::clone(&self.active),
                    key,
                })
            }
        }
    }

    pub fn is_active(&self, document: &Document) -> bool {
        self.active.contains_key(document.logical_path())
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}

/// Proof of a claim on one document
#[derive(Debug)]
pub struct InFlightToken {
    active: Arc<DashMap<PathBuf, ()>>,
    key: PathBuf,
}

impl Drop for InFlightToken {
    fn drop(&mut self) {
        self.active.remove(&self.key);
    }
}
