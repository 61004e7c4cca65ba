//! # Hexo Sync Parser
//!
//! Text-level stages of the sync pipeline. Nothing in this crate touches the
//! filesystem: every function takes a string and returns a new one.
//!
//! - [`frontmatter`] - [`MetadataService`]: parse, normalize and serialize the
//!   `---` header block
//! - [`dialect`] - [`DialectTransform`]: rewrite Obsidian syntax into plain
//!   markdown Hexo can render
//! - [`naming`] - attachment file name rules shared with the attachment resolver
//!
//! ## Quick Start
//!
//! ```
//! use hexosync_core::Document;
//! use hexosync_parser::{DialectTransform, MetadataService};
//!
//! let doc = Document::new("notes/Hello.md")?;
//! let raw = "---\ntitle: Hello\n---\nSee [[Other|this]] ![[attachment/a b.png]]";
//!
//! let header = MetadataService::new().ensure_and_normalize(&doc, raw);
//! assert!(header.metadata.contains_key("hexo_id"));
//!
//! let body = DialectTransform::new("attachment").transform(&doc, &header.content);
//! assert!(body.content.contains("[this](Other)"));
//! assert!(body.content.contains("![](/images/Hello/a_b.png)"));
//! # Ok::<(), hexosync_core::Error>(())
//! ```

pub mod dialect;
pub mod frontmatter;
pub mod naming;

pub use dialect::{DialectTransform, TransformOutcome};
pub use frontmatter::{
    CATEGORIES_KEY, DATE_KEY, HEADER_DELIMITER, ID_KEY, MetadataOutcome, MetadataService,
    ParsedHeader, TAGS_KEY, TITLE_KEY, UPDATED_KEY,
};
pub use naming::{attachment_base_name, is_remote_reference, normalize_file_name};
