//! # Hexo Sync Orchestration
//!
//! Wires the pipeline stages together for one document
//! ([`SyncOrchestrator`]) or for the whole note store
//! ([`BatchSyncOrchestrator`]).
//!
//! Order of side effects for one document: attachments are copied, the
//! destination note is written, then normalized front matter is written back
//! to the source note when it changed.
//!
//! ```no_run
//! use hexosync_core::SyncConfig;
//! use hexosync_sync::{BatchSyncOrchestrator, SyncOrchestrator};
//!
//! # fn example() -> hexosync_core::Result<()> {
//! let config = SyncConfig::builder("~/notes")
//!     .dest_project_root("~/blog")
//!     .build_unchecked()
//!     .expand_paths()?;
//!
//! let report = BatchSyncOrchestrator::new(SyncOrchestrator::new(config)).sync_all()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! Watch mode shares one [`InFlightGuard`] and one [`WriteBackLedger`] across
//! syncs and calls [`SyncOrchestrator::sync_on_change`], which skips a note
//! whose text is still exactly what the last write-back produced.

pub mod batch;
pub mod guard;
pub mod ledger;
pub mod orchestrator;

pub use batch::{BatchReport, BatchSyncOrchestrator, FailureRecord};
pub use guard::{InFlightGuard, InFlightToken};
pub use ledger::{WriteBackLedger, content_hash};
pub use orchestrator::{SyncOrchestrator, SyncOutcome, SyncStage, SyncStatus};
