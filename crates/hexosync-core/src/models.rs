//! Core data types shared by every pipeline stage.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};

/// A note to be synced, identified by its path relative to the content root.
///
/// Owned by the host note store; the pipeline only borrows it for one sync.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    logical_path: PathBuf,
    name: String,
    base_name: String,
}

impl Document {
    /// Create a document from its path relative to the content root.
    ///
    /// Rejects absolute paths, `..` components and paths without a file name.
    pub fn new(logical_path: impl Into<PathBuf>) -> Result<Self> {
        let logical_path = logical_path.into();

        if logical_path.is_absolute()
            || logical_path
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(Error::invalid_path(format!(
                "Document path must be relative to the content root: {}",
                logical_path.display()
            )));
        }

        let name = logical_path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .ok_or_else(|| {
                Error::invalid_path(format!(
                    "Document path has no file name: {}",
                    logical_path.display()
                ))
            })?;

        let base_name = name
            .strip_suffix(".md")
            .map(str::to_string)
            .unwrap_or_else(|| {
                Path::new(&name)
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .unwrap_or(&name)
                    .to_string()
            });

        if base_name.is_empty() {
            return Err(Error::invalid_path(format!(
                "Document has an empty name: {}",
                logical_path.display()
            )));
        }

        Ok(Self {
            logical_path,
            name,
            base_name,
        })
    }

    /// Path relative to the content root
    pub fn logical_path(&self) -> &Path {
        &self.logical_path
    }

    /// File name including extension (`Hello World.md`)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// File name without the markdown extension (`Hello World`)
    pub fn base_name(&self) -> &str {
        &self.base_name
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.logical_path.display())
    }
}

/// Every filesystem location one document sync touches.
///
/// Computed fresh per sync by [`crate::PathResolver`], never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedPaths {
    /// Absolute path of the note in the source store
    pub source_content_path: PathBuf,
    /// Attachment folder beside the note
    pub source_attachment_dir: PathBuf,
    /// `<dest>/source/images/<base name>`
    pub dest_attachment_dir: PathBuf,
    /// `<dest>/source/_posts/<file name>`
    pub dest_content_path: PathBuf,
}

/// A front matter value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
}

impl MetaValue {
    pub fn scalar(value: impl Into<String>) -> Self {
        MetaValue::Scalar(value.into())
    }

    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            MetaValue::Scalar(s) => Some(s),
            MetaValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            MetaValue::List(items) => Some(items),
            MetaValue::Scalar(_) => None,
        }
    }
}

impl From<&str> for MetaValue {
    fn from(value: &str) -> Self {
        MetaValue::Scalar(value.to_string())
    }
}

impl From<Vec<String>> for MetaValue {
    fn from(items: Vec<String>) -> Self {
        MetaValue::List(items)
    }
}

/// Insertion-ordered front matter mapping.
///
/// Re-inserting an existing key replaces its value in place, so original keys
/// keep their relative order and new keys are appended.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut MetaValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, returning the previous value
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) -> Option<MetaValue> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Scalar value of a key, if present as a scalar
    pub fn scalar(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_scalar)
    }
}

impl<K: Into<String>> FromIterator<(K, MetaValue)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, MetaValue)>>(iter: I) -> Self {
        let mut metadata = Metadata::new();
        for (k, v) in iter {
            metadata.insert(k, v);
        }
        metadata
    }
}
