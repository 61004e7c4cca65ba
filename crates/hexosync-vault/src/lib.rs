//! # Hexo Sync Vault
//!
//! Filesystem collaborators of the sync pipeline.
//!
//! - [`store::ContentStore`] enumerates eligible notes and reads/writes text
//! - [`attachments::AttachmentResolver`] copies referenced attachments into the
//!   site and rewrites their references
//! - [`site::SiteContent`] backs up, clears and inspects the site's generated trees
//! - [`watcher::SourceWatcher`] streams note changes for watch mode
//!
//! ## Quick Start
//!
//! ```no_run
//! use hexosync_vault::prelude::*;
//!
//! # fn example() -> Result<()> {
//! let config = SyncConfig::builder("/path/to/vault")
//!     .dest_project_root("/path/to/blog")
//!     .build()?;
//!
//! let store = ContentStore::from_config(&config);
//! for doc in store.documents()? {
//!     let paths = PathResolver::resolve(&doc, &config)?;
//!     let text = store.read_text(&paths.source_content_path)?;
//!     let outcome = AttachmentResolver::new().process(&doc, &text, &paths)?;
//!     println!("{}: {} attachment(s)", doc, outcome.reports.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! All operations return [`hexosync_core::Result<T>`]. A missing attachment is
//! not an error; it is reported as [`AttachmentStatus::Missing`] and the
//! reference is left alone.

pub mod attachments;
pub mod site;
pub mod store;
pub mod watcher;

pub use attachments::{AttachmentOutcome, AttachmentReport, AttachmentResolver, AttachmentStatus};
pub use site::{DeletionPlan, SiteContent};
pub use store::ContentStore;
pub use watcher::{SourceEvent, SourceWatcher, WatcherConfig, next_batch};

pub mod prelude {
    pub use crate::attachments::*;
    pub use crate::site::*;
    pub use crate::store::*;
    pub use crate::watcher::*;
    pub use hexosync_core::prelude::*;
}
