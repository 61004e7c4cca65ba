//! Path derivation for one document sync.
//!
//! Pure: no directories are created and nothing is read. Resolving the same
//! document against the same configuration always yields identical paths,
//! which is what keeps attachment copies idempotent across runs.

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::models::{Document, ResolvedPaths};
use std::path::{Component, Path, PathBuf};

/// Hexo `source` folder under the project root
pub const SITE_SOURCE_DIR: &str = "source";
/// Posts folder under `source`
pub const SITE_POSTS_DIR: &str = "_posts";
/// Images folder under `source`
pub const SITE_IMAGES_DIR: &str = "images";
/// Site-relative prefix images are served from
pub const SITE_IMAGES_PREFIX: &str = "/images";

/// Derives every location a sync of one document touches
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl PathResolver {
    /// Resolve source and destination paths for `document`.
    ///
    /// Fails with a configuration error when the destination root is unset or
    /// cannot be made absolute.
    pub fn resolve(document: &Document, config: &SyncConfig) -> Result<ResolvedPaths> {
        let dest_root = Self::dest_root(config)?;
        let source_root = normalize_absolute(&config.source_content_root).map_err(|e| {
            Error::config_error(format!(
                "Cannot normalize source content root {}: {}",
                config.source_content_root.display(),
                e
            ))
        })?;

        let logical = document.logical_path();
        let source_content_path = source_root.join(logical);

        let parent = logical.parent().unwrap_or_else(|| Path::new(""));
        let source_attachment_dir = source_root
            .join(parent)
            .join(&config.attachment_subfolder_name);

        let dest_attachment_dir = Self::images_root(&dest_root).join(document.base_name());
        let dest_content_path = Self::posts_root(&dest_root).join(document.name());

        Ok(ResolvedPaths {
            source_content_path,
            source_attachment_dir,
            dest_attachment_dir,
            dest_content_path,
        })
    }

    /// Absolute, lexically normalized destination root
    pub fn dest_root(config: &SyncConfig) -> Result<PathBuf> {
        let raw = config
            .dest_root()
            .ok_or_else(|| Error::config_error("Destination project root is not set"))?;

        normalize_absolute(raw).map_err(|e| {
            Error::config_error(format!(
                "Cannot normalize destination root {}: {}",
                raw.display(),
                e
            ))
        })
    }

    /// `<dest>/source/_posts`
    pub fn posts_root(dest_root: &Path) -> PathBuf {
        dest_root.join(SITE_SOURCE_DIR).join(SITE_POSTS_DIR)
    }

    /// `<dest>/source/images`
    pub fn images_root(dest_root: &Path) -> PathBuf {
        dest_root.join(SITE_SOURCE_DIR).join(SITE_IMAGES_DIR)
    }
}

/// Site-relative URL of a relocated attachment: `/images/<base>/<file>`
pub fn site_image_url(base_name: &str, file_name: &str) -> String {
    format!("{}/{}/{}", SITE_IMAGES_PREFIX, base_name, file_name)
}

/// Make `path` absolute against the working directory and fold `.`/`..`
fn normalize_absolute(path: &Path) -> std::io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;

    let mut normalized = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                normalized.pop();
            }
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    Ok(normalized)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(dest: &str) -> SyncConfig {
        SyncConfig::builder("/vault")
            .dest_project_root(dest)
            .build_unchecked()
    }

    #[test]
    fn test_resolve_layout() {
        let doc = Document::new("blog/rust/Hello World.md").unwrap();
        let paths = PathResolver::resolve(&doc, &config("/srv/hexo")).unwrap();

        assert_eq!(
            paths.source_content_path,
            PathBuf::from("/vault/blog/rust/Hello World.md")
        );
        assert_eq!(
            paths.source_attachment_dir,
            PathBuf::from("/vault/blog/rust/attachment")
        );
        assert_eq!(
            paths.dest_attachment_dir,
            PathBuf::from("/srv/hexo/source/images/Hello World")
        );
        assert_eq!(
            paths.dest_content_path,
            PathBuf::from("/srv/hexo/source/_posts/Hello World.md")
        );
    }

    #[test]
    fn test_resolve_top_level_document() {
        let doc = Document::new("note.md").unwrap();
        let paths = PathResolver::resolve(&doc, &config("/srv/hexo")).unwrap();
        assert_eq!(paths.source_attachment_dir, PathBuf::from("/vault/attachment"));
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let doc = Document::new("a/b.md").unwrap();
        let cfg = config("/srv/hexo/../hexo/./");
        let first = PathResolver::resolve(&doc, &cfg).unwrap();
        let second = PathResolver::resolve(&doc, &cfg).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.dest_content_path,
            PathBuf::from("/srv/hexo/source/_posts/b.md")
        );
    }

    #[test]
    fn test_unset_destination_fails() {
        let doc = Document::new("a.md").unwrap();
        let cfg = SyncConfig::builder("/vault").build_unchecked();
        let err = PathResolver::resolve(&doc, &cfg).unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_relative_destination_is_made_absolute() {
        let doc = Document::new("a.md").unwrap();
        let paths = PathResolver::resolve(&doc, &config("site")).unwrap();
        assert!(paths.dest_content_path.is_absolute());
        assert!(paths.dest_content_path.ends_with("site/source/_posts/a.md"));
    }

    #[test]
    fn test_site_image_url() {
        assert_eq!(site_image_url("Post", "pic.png"), "/images/Post/pic.png");
    }
}
