//! Maintenance of the Hexo project's generated content.
//!
//! Only `source/_posts` and `source/images` are ever touched; both are owned
//! by the sync and can be rebuilt from the note store at any time.

use crate::store::walk_error;
use chrono::NaiveDateTime;
use hexosync_core::{Clock, Error, PathResolver, Result, SyncConfig};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;
use walkdir::WalkDir;

/// Files a clear would remove, grouped by tree
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeletionPlan {
    pub posts: Vec<PathBuf>,
    pub images: Vec<PathBuf>,
}

impl DeletionPlan {
    pub fn len(&self) -> usize {
        self.posts.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Backup, clear and inspection of the site's posts and images trees
pub struct SiteContent {
    dest_root: PathBuf,
    backup_dir_name: String,
    clock: Arc<dyn Clock>,
}

impl SiteContent {
    /// Fails with a configuration error when the destination root is unset
    pub fn from_config(config: &SyncConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        Ok(Self {
            dest_root: PathResolver::dest_root(config)?,
            backup_dir_name: config.backup_dir_name.clone(),
            clock,
        })
    }

    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    pub fn posts_dir(&self) -> PathBuf {
        PathResolver::posts_root(&self.dest_root)
    }

    pub fn images_dir(&self) -> PathBuf {
        PathResolver::images_root(&self.dest_root)
    }

    pub fn backup_root(&self) -> PathBuf {
        self.dest_root.join(&self.backup_dir_name)
    }

    /// Both managed trees must already exist
    pub fn ensure_structure(&self) -> Result<()> {
        for dir in [self.posts_dir(), self.images_dir()] {
            if !dir.is_dir() {
                return Err(Error::file_not_found(dir));
            }
        }
        Ok(())
    }

    /// Copy both trees into a fresh timestamped folder under the backup root
    pub fn backup(&self) -> Result<PathBuf> {
        self.ensure_structure()?;

        let backup_dir = self.next_backup_dir(self.clock.now());
        copy_tree(&self.posts_dir(), &backup_dir.join("_posts"))?;
        copy_tree(&self.images_dir(), &backup_dir.join("images"))?;

        log::info!("[Backup] site content backed up to {}", backup_dir.display());
        Ok(backup_dir)
    }

    /// Remove and recreate both trees
    pub fn clear(&self) -> Result<()> {
        self.ensure_structure()?;

        for dir in [self.posts_dir(), self.images_dir()] {
            self.remove_managed_dir(&dir)?;
            std::fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        }

        log::warn!("[Clean] source/_posts and source/images cleared");
        Ok(())
    }

    /// Backup then clear; returns the backup folder
    #[instrument(skip(self), fields(dest = ?self.dest_root), name = "site_prepare_rebuild")]
    pub fn prepare_for_full_rebuild(&self) -> Result<PathBuf> {
        log::info!("Preparing full rebuild of {}", self.dest_root.display());
        let backup = self.backup()?;
        self.clear()?;
        Ok(backup)
    }

    /// Every file [`SiteContent::clear`] would remove, without removing anything
    pub fn files_to_be_deleted(&self) -> Result<DeletionPlan> {
        Ok(DeletionPlan {
            posts: list_files(&self.posts_dir())?,
            images: list_files(&self.images_dir())?,
        })
    }

    fn next_backup_dir(&self, at: NaiveDateTime) -> PathBuf {
        let stamp = at.format("%Y-%m-%dT%H-%M-%S").to_string();
        let root = self.backup_root();

        let mut candidate = root.join(&stamp);
        let mut n = 1;
        while candidate.exists() {
            candidate = root.join(format!("{}-{}", stamp, n));
            n += 1;
        }
        candidate
    }

    fn remove_managed_dir(&self, dir: &Path) -> Result<()> {
        if !dir.starts_with(&self.dest_root) || dir == self.dest_root {
            return Err(Error::invalid_path(format!(
                "Refusing to remove {} outside {}",
                dir.display(),
                self.dest_root.display()
            )));
        }

        match std::fs::remove_dir_all(dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::io(dir, e)),
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<()> {
    for entry in WalkDir::new(from) {
        let entry = entry.map_err(|e| walk_error(from, e))?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let target = to.join(relative);

        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target).map_err(|e| Error::io(&target, e))?;
        } else {
            std::fs::copy(entry.path(), &target).map_err(|e| Error::io(&target, e))?;
        }
    }
    Ok(())
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.map_err(|e| walk_error(dir, e))?;
        if !entry.file_type().is_dir() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};
    use hexosync_core::FixedClock;
    use std::fs;
    use tempfile::TempDir;

    fn at() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn site(dir: &TempDir) -> (SiteContent, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(at()));
        let config = SyncConfig::builder(dir.path().join("vault"))
            .dest_project_root(dir.path().join("blog"))
            .build_unchecked();
        let site = SiteContent::from_config(&config, clock.clone()).unwrap();
        (site, clock)
    }

    fn populate(site: &SiteContent) {
        fs::create_dir_all(site.posts_dir()).unwrap();
        fs::create_dir_all(site.images_dir().join("Post")).unwrap();
        fs::write(site.posts_dir().join("Post.md"), "post").unwrap();
        fs::write(site.images_dir().join("Post/pic.png"), "png").unwrap();
    }

    #[test]
    fn test_ensure_structure_requires_both_trees() {
        let dir = TempDir::new().unwrap();
        let (site, _) = site(&dir);
        assert!(site.ensure_structure().unwrap_err().is_not_found());

        fs::create_dir_all(site.posts_dir()).unwrap();
        assert!(site.ensure_structure().is_err());

        fs::create_dir_all(site.images_dir()).unwrap();
        site.ensure_structure().unwrap();
    }

    #[test]
    fn test_backup_copies_both_trees() {
        let dir = TempDir::new().unwrap();
        let (site, _) = site(&dir);
        populate(&site);

        let backup = site.backup().unwrap();
        assert_eq!(backup, site.backup_root().join("2024-05-01T09-30-00"));
        assert_eq!(fs::read_to_string(backup.join("_posts/Post.md")).unwrap(), "post");
        assert_eq!(fs::read_to_string(backup.join("images/Post/pic.png")).unwrap(), "png");
    }

    #[test]
    fn test_backups_in_same_second_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let (site, clock) = site(&dir);
        populate(&site);

        let first = site.backup().unwrap();
        let second = site.backup().unwrap();
        assert_ne!(first, second);

        clock.advance(TimeDelta::seconds(1));
        let third = site.backup().unwrap();
        assert!(third.ends_with("2024-05-01T09-30-01"));
    }

    #[test]
    fn test_plan_then_clear() {
        let dir = TempDir::new().unwrap();
        let (site, _) = site(&dir);
        populate(&site);

        let plan = site.files_to_be_deleted().unwrap();
        assert_eq!(plan.posts, vec![site.posts_dir().join("Post.md")]);
        assert_eq!(plan.images, vec![site.images_dir().join("Post/pic.png")]);
        assert!(site.posts_dir().join("Post.md").exists());

        site.clear().unwrap();
        assert!(site.files_to_be_deleted().unwrap().is_empty());
        site.ensure_structure().unwrap();
    }

    #[test]
    fn test_prepare_for_full_rebuild() {
        let dir = TempDir::new().unwrap();
        let (site, _) = site(&dir);
        populate(&site);

        let backup = site.prepare_for_full_rebuild().unwrap();
        assert!(backup.join("_posts/Post.md").is_file());
        assert!(!site.posts_dir().join("Post.md").exists());
        assert!(site.images_dir().is_dir());
    }

    #[test]
    fn test_plan_for_missing_trees_is_empty() {
        let dir = TempDir::new().unwrap();
        let (site, _) = site(&dir);
        assert!(site.files_to_be_deleted().unwrap().is_empty());
    }

    #[test]
    fn test_unset_destination_is_config_error() {
        let config = SyncConfig::builder("/vault").build_unchecked();
        let clock = Arc::new(FixedClock::new(at()));
        let err = SiteContent::from_config(&config, clock).err().unwrap();
        assert!(err.is_config());
    }
}
