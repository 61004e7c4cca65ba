//! Configuration loading and command tests

use hexosync::commands;
use hexosync::settings::{self, Overrides};
use hexosync_core::SyncConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir_all(dir.path().join("vault")).unwrap();
        fs::create_dir_all(dir.path().join("blog/source/_posts")).unwrap();
        fs::create_dir_all(dir.path().join("blog/source/images")).unwrap();
        Self { dir }
    }

    fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.path(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    fn config(&self) -> SyncConfig {
        SyncConfig::builder(self.path("vault"))
            .dest_project_root(self.path("blog"))
            .build()
            .unwrap()
    }
}

fn yaml_path(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_load_from_yaml_file_with_defaults() {
    let ws = Workspace::new();
    let file = ws.write(
        "hexosync.yaml",
        &format!(
            "source_content_root: {}\ndest_project_root: {}\n",
            yaml_path(&ws.path("vault")),
            yaml_path(&ws.path("blog"))
        ),
    );

    let config = settings::load(Some(&file), &Overrides::default()).unwrap();

    assert_eq!(config.source_content_root, ws.path("vault"));
    assert_eq!(config.dest_root(), Some(ws.path("blog").as_path()));
    assert_eq!(config.attachment_subfolder_name, "attachment");
    assert_eq!(config.backup_dir_name, ".hexo-sync-backup");
    assert!(config.excluded_paths.contains(".obsidian"));
}

#[test]
fn test_flags_override_file() {
    let ws = Workspace::new();
    fs::create_dir_all(ws.path("other-vault")).unwrap();
    let file = ws.write(
        "hexosync.yaml",
        &format!(
            "source_content_root: {}\ndest_project_root: {}\nattachment_subfolder_name: assets\ndebug_logging_enabled: true\n",
            yaml_path(&ws.path("vault")),
            yaml_path(&ws.path("blog"))
        ),
    );

    let overrides = Overrides {
        source_content_root: Some(ws.path("other-vault")),
        attachment_subfolder_name: Some("files".to_string()),
        debug_logging_enabled: Some(false),
        ..Overrides::default()
    };
    let config = settings::load(Some(&file), &overrides).unwrap();

    assert_eq!(config.source_content_root, ws.path("other-vault"));
    assert_eq!(config.dest_root(), Some(ws.path("blog").as_path()));
    assert_eq!(config.attachment_subfolder_name, "files");
    assert!(!config.debug_logging_enabled);
}

#[test]
fn test_explicit_config_file_must_exist() {
    let ws = Workspace::new();
    let missing = ws.path("nope.yaml");
    assert!(settings::load(Some(&missing), &Overrides::default()).is_err());
}

#[test]
fn test_missing_destination_fails_validation() {
    let ws = Workspace::new();
    let file = ws.write(
        "hexosync.yaml",
        &format!("source_content_root: {}\n", yaml_path(&ws.path("vault"))),
    );

    let unchecked = settings::load_unchecked(Some(&file), &Overrides::default()).unwrap();
    assert!(unchecked.dest_root().is_none());

    let err = settings::load(Some(&file), &Overrides::default()).unwrap_err();
    assert!(err.to_string().contains("Destination project root is not set"));
}

#[test]
fn test_init_config_round_trips_and_refuses_overwrite() {
    let ws = Workspace::new();
    let file = ws.path("hexosync.yaml");

    commands::init_config(&file, &ws.path("vault"), &ws.path("blog"), false).unwrap();
    let loaded = settings::load(Some(&file), &Overrides::default()).unwrap();
    assert_eq!(loaded, ws.config());

    let err = commands::init_config(&file, &ws.path("vault"), &ws.path("blog"), false)
        .unwrap_err();
    assert!(err.to_string().contains("--force"));

    commands::init_config(&file, &ws.path("other"), &ws.path("blog"), true).unwrap();
    assert!(fs::read_to_string(&file).unwrap().contains("other"));
}

#[test]
fn test_sync_notes_by_relative_and_absolute_path() {
    let ws = Workspace::new();
    ws.write("vault/a.md", "A");
    let absolute = ws.write("vault/nested/b.md", "B");

    let outcomes =
        commands::sync_notes(ws.config(), &[PathBuf::from("a.md"), absolute]).unwrap();

    assert!(outcomes.iter().all(|o| o.is_ok()));
    assert!(ws.path("blog/source/_posts/a.md").is_file());
    assert!(ws.path("blog/source/_posts/b.md").is_file());
}

#[test]
fn test_sync_all_reports_counts() {
    let ws = Workspace::new();
    ws.write("vault/a.md", "A");
    ws.write("vault/b.md", "B");

    let report = commands::sync_all(ws.config()).unwrap();
    assert_eq!(report.total, 2);
    assert!(report.is_success());
}

#[test]
fn test_rebuild_backs_up_then_resyncs() {
    let ws = Workspace::new();
    ws.write("vault/a.md", "A");
    ws.write("blog/source/_posts/stale.md", "old");

    let plan = commands::clean_plan(&ws.config()).unwrap();
    assert_eq!(plan.posts, vec![ws.path("blog/source/_posts/stale.md")]);

    let rebuild = commands::rebuild(ws.config(), true).unwrap();

    assert!(rebuild.backup.join("_posts/stale.md").is_file());
    assert!(!ws.path("blog/source/_posts/stale.md").exists());
    assert!(ws.path("blog/source/_posts/a.md").is_file());
    assert_eq!(rebuild.batch.succeeded, 1);
}
