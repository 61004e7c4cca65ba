//! # Hexo Sync
//!
//! Command line front end for the note-to-Hexo sync pipeline: layered
//! configuration loading, log subscriber setup and the command
//! implementations behind the `hexosync` binary.

pub mod commands;
pub mod logging;
pub mod settings;

pub use hexosync_core::prelude::*;
pub use settings::Overrides;
