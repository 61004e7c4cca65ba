//! Layered configuration loading.
//!
//! Sources, lowest precedence first:
//!
//! 1. YAML file (`hexosync.yaml` unless `--config` names another)
//! 2. `HEXOSYNC_*` environment variables, e.g. `HEXOSYNC_DEST_PROJECT_ROOT`
//! 3. Command line flags
//!
//! Missing fields fall back to the [`SyncConfig`] serde defaults.

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use hexosync_core::SyncConfig;
use std::path::{Path, PathBuf};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "hexosync.yaml";

/// Prefix of environment variables overriding config fields
pub const ENV_PREFIX: &str = "HEXOSYNC";

/// Values given on the command line; `None` leaves lower layers alone
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub source_content_root: Option<PathBuf>,
    pub dest_project_root: Option<PathBuf>,
    pub attachment_subfolder_name: Option<String>,
    pub debug_logging_enabled: Option<bool>,
}

/// Merge every layer into an expanded, unvalidated [`SyncConfig`].
///
/// An explicitly named config file must exist; the default one is optional.
pub fn load_unchecked(config_file: Option<&Path>, overrides: &Overrides) -> Result<SyncConfig> {
    let (path, required) = match config_file {
        Some(path) => (path, true),
        None => (Path::new(DEFAULT_CONFIG_FILE), false),
    };

    let merged = Config::builder()
        .add_source(
            File::from(path)
                .format(FileFormat::Yaml)
                .required(required),
        )
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("excluded_paths"),
        )
        .set_override_option("source_content_root", path_value(&overrides.source_content_root))?
        .set_override_option("dest_project_root", path_value(&overrides.dest_project_root))?
        .set_override_option(
            "attachment_subfolder_name",
            overrides.attachment_subfolder_name.clone(),
        )?
        .set_override_option("debug_logging_enabled", overrides.debug_logging_enabled)?
        .build()
        .with_context(|| format!("Failed to read configuration from {}", path.display()))?;

    let config: SyncConfig = merged
        .try_deserialize()
        .context("Invalid configuration: is source_content_root set?")?;

    Ok(config.expand_paths()?)
}

/// [`load_unchecked`] followed by [`SyncConfig::validate`]
pub fn load(config_file: Option<&Path>, overrides: &Overrides) -> Result<SyncConfig> {
    let config = load_unchecked(config_file, overrides)?;
    config.validate()?;
    Ok(config)
}

fn path_value(path: &Option<PathBuf>) -> Option<String> {
    path.as_ref().map(|p| p.to_string_lossy().into_owned())
}
