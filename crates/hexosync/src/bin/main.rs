//! Hexo Sync CLI

use anyhow::{Result, anyhow, bail};
use clap::{Parser, Subcommand};
use hexosync::{Overrides, commands, logging, settings};
use hexosync_sync::{BatchReport, SyncOutcome};
use hexosync_vault::watcher::DEFAULT_DEBOUNCE_MS;
use serde_json::json;
use std::path::PathBuf;

/// Hexo Sync - publish Obsidian notes as Hexo posts
#[derive(Parser, Debug)]
#[command(name = "hexosync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// YAML config file (default: hexosync.yaml, if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Root of the note store
    #[arg(short, long, global = true, env = "HEXOSYNC_SOURCE_CONTENT_ROOT")]
    source: Option<PathBuf>,

    /// Root of the Hexo project
    #[arg(short, long, global = true, env = "HEXOSYNC_DEST_PROJECT_ROOT")]
    dest: Option<PathBuf>,

    /// Attachment folder name beside each note
    #[arg(long, global = true)]
    attachment_folder: Option<String>,

    /// Debug-level logging (overrides the config file)
    #[arg(long, global = true)]
    debug: Option<bool>,

    /// Also write daily-rotated log files to this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Print reports as JSON on stdout
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Write a config file from --source and --dest
    InitConfig {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    #[command(flatten)]
    Site(SiteCommand),
}

/// Commands that need a complete configuration
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum SiteCommand {
    /// Sync the given notes (paths relative to the source root, or absolute)
    Sync {
        #[arg(required = true)]
        notes: Vec<PathBuf>,
    },

    /// Sync every note in the store
    SyncAll,

    /// Sync notes as they change until Ctrl-C
    Watch {
        /// Quiet window before a burst of changes is synced
        #[arg(long, default_value_t = DEFAULT_DEBOUNCE_MS)]
        debounce_ms: u64,
    },

    /// Back up and clear the site's posts and images, then sync everything
    Rebuild {
        /// Confirm deletion of source/_posts and source/images
        #[arg(long)]
        yes: bool,
    },

    /// List the files a rebuild would delete
    CleanPlan,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            source_content_root: self.source.clone(),
            dest_project_root: self.dest.clone(),
            attachment_subfolder_name: self.attachment_folder.clone(),
            debug_logging_enabled: self.debug,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.clone() {
        Command::InitConfig { force } => {
            let _guard = logging::init(cli.debug.unwrap_or(false), cli.log_dir.as_deref())?;
            init_config(&cli, force)
        }
        Command::Site(command) => run(&cli, command).await,
    }
}

async fn run(cli: &Cli, command: SiteCommand) -> Result<()> {
    let config = settings::load(cli.config.as_deref(), &cli.overrides())?;
    let _guard = logging::init(config.debug_logging_enabled, cli.log_dir.as_deref())?;
    log::debug!("Configuration: {:?}", config);

    match command {
        SiteCommand::Sync { notes } => {
            let outcomes =
                tokio::task::spawn_blocking(move || commands::sync_notes(config, &notes)).await??;
            print_outcomes(&outcomes, cli.json)
        }
        SiteCommand::SyncAll => {
            let report = tokio::task::spawn_blocking(move || commands::sync_all(config)).await??;
            print_report(&report, cli.json)?;
            check_report(&report)
        }
        SiteCommand::Rebuild { yes } => {
            let rebuild =
                tokio::task::spawn_blocking(move || commands::rebuild(config, yes)).await??;
            if cli.json {
                let value = json!({ "backup": rebuild.backup, "report": rebuild.batch });
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("Backup: {}", rebuild.backup.display());
                print_report(&rebuild.batch, false)?;
            }
            check_report(&rebuild.batch)
        }
        SiteCommand::CleanPlan => {
            let plan = commands::clean_plan(&config)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                for path in plan.posts.iter().chain(&plan.images) {
                    println!("{}", path.display());
                }
                println!("{} file(s) would be deleted", plan.len());
            }
            Ok(())
        }
        SiteCommand::Watch { debounce_ms } => commands::watch(config, debounce_ms).await,
    }
}

fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let (Some(source), Some(dest)) = (&cli.source, &cli.dest) else {
        bail!("init-config needs --source and --dest");
    };
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(settings::DEFAULT_CONFIG_FILE));

    commands::init_config(&path, source, dest, force)?;
    println!("Wrote {}", path.display());
    Ok(())
}

fn print_outcomes(outcomes: &[SyncOutcome], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcomes)?);
    } else {
        for outcome in outcomes {
            println!("{}", outcome.summary());
        }
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    if failed > 0 {
        return Err(anyhow!("{} of {} note(s) not synced", failed, outcomes.len()));
    }
    Ok(())
}

fn print_report(report: &BatchReport, json: bool) -> Result<()> {
    if json {
        println!("{}", report.to_json()?);
    } else {
        for failure in &report.failures {
            println!(
                "failed {} at {}: {}",
                failure.document.display(),
                failure.stage,
                failure.error
            );
        }
        println!("{}", report.summary());
    }
    Ok(())
}

fn check_report(report: &BatchReport) -> Result<()> {
    if !report.is_success() {
        return Err(anyhow!("{} note(s) failed to sync", report.failed));
    }
    Ok(())
}
