//! Configuration record for a sync run.
//!
//! Follows a builder pattern with validation. A [`SyncConfig`] is treated as an
//! immutable snapshot: every sync builds its components from one.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Default attachment folder name, relative to each note's directory
pub const DEFAULT_ATTACHMENT_SUBFOLDER: &str = "attachment";

/// Default backup folder name, relative to the destination project root
pub const DEFAULT_BACKUP_DIR_NAME: &str = ".hexo-sync-backup";

fn default_attachment_subfolder() -> String {
    DEFAULT_ATTACHMENT_SUBFOLDER.to_string()
}

fn default_backup_dir_name() -> String {
    DEFAULT_BACKUP_DIR_NAME.to_string()
}

fn default_true() -> bool {
    true
}

fn default_excluded_paths() -> BTreeSet<String> {
    [".obsidian", ".git", ".trash", "node_modules"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Settings consumed by the path resolver and the pipeline stages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Root of the note store; document logical paths are relative to it
    pub source_content_root: PathBuf,
    /// Root of the Hexo project receiving synced output
    #[serde(default)]
    pub dest_project_root: Option<PathBuf>,
    /// Name of the attachment folder that sits beside each note
    #[serde(default = "default_attachment_subfolder")]
    pub attachment_subfolder_name: String,
    /// Emit debug-level log entries
    #[serde(default = "default_true")]
    pub debug_logging_enabled: bool,
    /// Path components never enumerated for batch sync
    #[serde(default = "default_excluded_paths")]
    pub excluded_paths: BTreeSet<String>,
    /// Backup folder created under the destination root by full rebuilds
    #[serde(default = "default_backup_dir_name")]
    pub backup_dir_name: String,
}

impl SyncConfig {
    /// Create a new config with builder
    pub fn builder(source_content_root: impl Into<PathBuf>) -> SyncConfigBuilder {
        SyncConfigBuilder::new(source_content_root)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.source_content_root.as_os_str().is_empty() {
            return Err(Error::config_error("Source content root cannot be empty"));
        }

        if !self.source_content_root.is_dir() {
            return Err(Error::config_error(format!(
                "Source content root is not a directory: {}",
                self.source_content_root.display()
            )));
        }

        if self.dest_root().is_none() {
            return Err(Error::config_error("Destination project root is not set"));
        }

        let name = self.attachment_subfolder_name.trim();
        if name.is_empty() || name.contains(['/', '\\']) {
            return Err(Error::config_error(format!(
                "Attachment subfolder must be a single folder name, got '{}'",
                self.attachment_subfolder_name
            )));
        }

        if self.backup_dir_name.trim().is_empty() {
            return Err(Error::config_error("Backup folder name cannot be empty"));
        }

        Ok(())
    }

    /// Destination root, treating an empty path as unset
    pub fn dest_root(&self) -> Option<&Path> {
        self.dest_project_root
            .as_deref()
            .filter(|p| !p.as_os_str().is_empty())
    }

    /// Expand `~` and `$VAR` in every path field
    pub fn expand_paths(mut self) -> Result<Self> {
        self.source_content_root = expand_path(&self.source_content_root)?;
        if let Some(dest) = self.dest_project_root.take() {
            self.dest_project_root = Some(expand_path(&dest)?);
        }
        Ok(self)
    }

    /// Save configuration as YAML
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)
            .map_err(|e| Error::config_error(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, yaml).map_err(|e| Error::io(path, e))
    }

    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::config_error(format!(
                "Failed to load config from {}: {}",
                path.display(),
                e
            ))
        })?;

        serde_yaml::from_str(&content)
            .map_err(|e| Error::config_error(format!("Invalid configuration: {}", e)))
    }
}

fn expand_path(path: &Path) -> Result<PathBuf> {
    let raw = path.to_string_lossy();
    let expanded = shellexpand::full(&raw).map_err(|e| {
        Error::config_error(format!("Cannot expand path '{}': {}", raw, e))
    })?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Builder for SyncConfig
pub struct SyncConfigBuilder {
    source_content_root: PathBuf,
    dest_project_root: Option<PathBuf>,
    attachment_subfolder_name: String,
    debug_logging_enabled: bool,
    excluded_paths: BTreeSet<String>,
    backup_dir_name: String,
}

impl SyncConfigBuilder {
    /// Create a new builder
    pub fn new(source_content_root: impl Into<PathBuf>) -> Self {
        Self {
            source_content_root: source_content_root.into(),
            dest_project_root: None,
            attachment_subfolder_name: default_attachment_subfolder(),
            debug_logging_enabled: true,
            excluded_paths: default_excluded_paths(),
            backup_dir_name: default_backup_dir_name(),
        }
    }

    /// Set the Hexo project root
    pub fn dest_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.dest_project_root = Some(root.into());
        self
    }

    /// Set the attachment subfolder name
    pub fn attachment_subfolder_name(mut self, name: impl Into<String>) -> Self {
        self.attachment_subfolder_name = name.into();
        self
    }

    /// Toggle debug logging
    pub fn debug_logging(mut self, enabled: bool) -> Self {
        self.debug_logging_enabled = enabled;
        self
    }

    /// Add a path component to skip during enumeration
    pub fn exclude(mut self, name: impl Into<String>) -> Self {
        self.excluded_paths.insert(name.into());
        self
    }

    /// Set the backup folder name
    pub fn backup_dir_name(mut self, name: impl Into<String>) -> Self {
        self.backup_dir_name = name.into();
        self
    }

    /// Build without validation (destination may still be unset)
    pub fn build_unchecked(self) -> SyncConfig {
        SyncConfig {
            source_content_root: self.source_content_root,
            dest_project_root: self.dest_project_root,
            attachment_subfolder_name: self.attachment_subfolder_name,
            debug_logging_enabled: self.debug_logging_enabled,
            excluded_paths: self.excluded_paths,
            backup_dir_name: self.backup_dir_name,
        }
    }

    /// Build and validate
    pub fn build(self) -> Result<SyncConfig> {
        let config = self.build_unchecked();
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builder_defaults() {
        let vault = TempDir::new().unwrap();
        let blog = TempDir::new().unwrap();
        let config = SyncConfig::builder(vault.path())
            .dest_project_root(blog.path())
            .build()
            .unwrap();

        assert_eq!(config.attachment_subfolder_name, "attachment");
        assert!(config.debug_logging_enabled);
        assert!(config.excluded_paths.contains(".obsidian"));
        assert_eq!(config.backup_dir_name, ".hexo-sync-backup");
    }

    #[test]
    fn test_missing_destination_is_config_error() {
        let vault = TempDir::new().unwrap();
        let err = SyncConfig::builder(vault.path()).build().unwrap_err();
        assert!(err.is_config());

        let err = SyncConfig::builder(vault.path())
            .dest_project_root("")
            .build()
            .unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn test_attachment_subfolder_must_be_single_name() {
        let vault = TempDir::new().unwrap();
        let result = SyncConfig::builder(vault.path())
            .dest_project_root("/blog")
            .attachment_subfolder_name("assets/img")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let vault = TempDir::new().unwrap();
        let config = SyncConfig::builder(vault.path())
            .dest_project_root("/srv/blog")
            .debug_logging(false)
            .exclude("drafts")
            .build_unchecked();

        let file = vault.path().join("hexosync.yaml");
        config.save(&file).unwrap();
        let loaded = SyncConfig::load(&file).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_applies_serde_defaults() {
        let vault = TempDir::new().unwrap();
        let file = vault.path().join("hexosync.yaml");
        std::fs::write(&file, "source_content_root: /notes\n").unwrap();

        let loaded = SyncConfig::load(&file).unwrap();
        assert_eq!(loaded.source_content_root, PathBuf::from("/notes"));
        assert!(loaded.dest_project_root.is_none());
        assert_eq!(loaded.attachment_subfolder_name, "attachment");
        assert!(loaded.debug_logging_enabled);
    }

    #[test]
    fn test_expand_paths_env_var() {
        // SAFETY: test-local variable name, no other test reads it
        unsafe { std::env::set_var("HEXOSYNC_TEST_BLOG", "/srv/site") };
        let config = SyncConfig::builder("/notes")
            .dest_project_root("$HEXOSYNC_TEST_BLOG/hexo")
            .build_unchecked()
            .expand_paths()
            .unwrap();
        assert_eq!(config.dest_project_root, Some(PathBuf::from("/srv/site/hexo")));
    }
}
