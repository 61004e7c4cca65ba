//! # Hexo Sync Core
//!
//! Core data models, error types, configuration and path resolution for the
//! note-to-Hexo sync pipeline. This crate defines the canonical types that all
//! other crates depend on, and performs no file I/O beyond config persistence.
//!
//! ## Core Modules
//!
//! - [`models`] - [`Document`], [`ResolvedPaths`], and the ordered [`Metadata`] record
//! - [`error`] - Error taxonomy and Result alias
//! - [`config`] - [`SyncConfig`] with builder and YAML persistence
//! - [`paths`] - [`PathResolver`], the pure path derivation for one sync
//! - [`clock`] - Time source seam used by front matter normalization
//!
//! ## Usage
//!
//! ```
//! use hexosync_core::prelude::*;
//!
//! let config = SyncConfig::builder("/vault")
//!     .dest_project_root("/srv/blog")
//!     .build_unchecked();
//! let doc = Document::new("posts/Hello.md")?;
//! let paths = PathResolver::resolve(&doc, &config)?;
//! assert!(paths.dest_content_path.ends_with("source/_posts/Hello.md"));
//! # Ok::<(), hexosync_core::Error>(())
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod models;
pub mod paths;

pub use clock::{Clock, FixedClock, SystemClock, format_timestamp};
pub use config::*;
pub use error::{Error, Result};
pub use models::*;
pub use paths::{PathResolver, SITE_IMAGES_PREFIX, site_image_url};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::clock::{Clock, SystemClock};
    pub use crate::config::SyncConfig;
    pub use crate::error::{Error, Result};
    pub use crate::models::{Document, MetaValue, Metadata, ResolvedPaths};
    pub use crate::paths::PathResolver;
}
