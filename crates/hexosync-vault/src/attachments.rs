//! Attachment relocation.
//!
//! Finds image references in a note body, copies the referenced files from
//! the note's attachment folder into the site's images folder, and points the
//! references at their new site-relative location.
//!
//! A missing source file is expected (notes are often synced while an
//! attachment is still being written) and leaves the reference untouched.
//! An existing destination file is never overwritten.

use hexosync_core::{Document, Error, ResolvedPaths, Result, site_image_url};
use hexosync_parser::{attachment_base_name, is_remote_reference, normalize_file_name};
use regex::{Captures, Regex};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

/// `![[target]]` or `![alt](path)`, one pattern for both syntaxes
static ATTACHMENT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[\[(.+?)\]\]|!\[([^\]]*)\]\((.+?)\)").unwrap());

/// What happened to one referenced attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttachmentStatus {
    /// Copied into the destination folder by this run
    Copied,
    /// Destination already held a file of that name; left alone
    AlreadyPresent,
    /// Source file not found; reference left unmodified
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttachmentReport {
    /// Reference text as written in the note
    pub reference: String,
    pub source: PathBuf,
    pub destination: PathBuf,
    pub status: AttachmentStatus,
}

/// Result of [`AttachmentResolver::process`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentOutcome {
    pub content: String,
    /// At least one reference was rewritten
    pub changed: bool,
    pub reports: Vec<AttachmentReport>,
}

impl AttachmentOutcome {
    fn unchanged(content: &str) -> Self {
        Self {
            content: content.to_string(),
            changed: false,
            reports: Vec::new(),
        }
    }

    pub fn count(&self, status: AttachmentStatus) -> usize {
        self.reports.iter().filter(|r| r.status == status).count()
    }
}

/// Copies referenced attachments and rewrites their references
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentResolver;

impl AttachmentResolver {
    pub fn new() -> Self {
        Self
    }

    /// Relocate every local attachment referenced from `content`.
    ///
    /// Returns the input unchanged (and logs an error) when no destination
    /// attachment folder was resolved. Fails only on I/O errors while
    /// creating the destination folder or copying.
    pub fn process(
        &self,
        document: &Document,
        content: &str,
        paths: &ResolvedPaths,
    ) -> Result<AttachmentOutcome> {
        if paths.dest_attachment_dir.as_os_str().is_empty() {
            log::error!("[AR] no destination attachment folder for {}", document);
            return Ok(AttachmentOutcome::unchanged(content));
        }

        let mut changed = false;
        let mut reports = Vec::new();
        let mut failure: Option<Error> = None;

        let rewritten = ATTACHMENT_PATTERN.replace_all(content, |caps: &Captures| {
            let original = caps[0].to_string();
            if failure.is_some() {
                return original;
            }

            match self.resolve_reference(document, caps, paths) {
                Ok(Some((replacement, report))) => {
                    if report.status != AttachmentStatus::Missing {
                        changed = true;
                    }
                    reports.push(report);
                    replacement.unwrap_or(original)
                }
                Ok(None) => original,
                Err(e) => {
                    failure = Some(e);
                    original
                }
            }
        });

        if let Some(e) = failure {
            return Err(e);
        }

        log::info!(
            "[AR] {}: {} reference(s), {} rewritten",
            document,
            reports.len(),
            reports
                .iter()
                .filter(|r| r.status != AttachmentStatus::Missing)
                .count()
        );

        Ok(AttachmentOutcome {
            content: rewritten.into_owned(),
            changed,
            reports,
        })
    }

    /// Resolve one match.
    ///
    /// `Ok(None)` means the match is not a local attachment at all. A missing
    /// source yields a report with no replacement text.
    fn resolve_reference(
        &self,
        document: &Document,
        caps: &Captures,
        paths: &ResolvedPaths,
    ) -> Result<Option<(Option<String>, AttachmentReport)>> {
        let (reference, alt) = match caps.get(1) {
            Some(embed) => (embed.as_str(), ""),
            None => (
                caps.get(3).map_or("", |m| m.as_str()),
                caps.get(2).map_or("", |m| m.as_str()),
            ),
        };

        let reference = reference.trim();
        if reference.is_empty() || is_remote_reference(reference) {
            return Ok(None);
        }

        let base_name = attachment_base_name(reference);
        if base_name.is_empty() {
            return Ok(None);
        }
        let safe_name = normalize_file_name(base_name);

        let source = paths.source_attachment_dir.join(base_name);
        let destination = paths.dest_attachment_dir.join(&safe_name);

        let mut report = AttachmentReport {
            reference: reference.to_string(),
            source,
            destination,
            status: AttachmentStatus::Missing,
        };

        if safe_name.is_empty() {
            log::warn!(
                "[AR] no web-safe name for attachment '{}' in {}, leaving it as is",
                base_name,
                document
            );
            return Ok(Some((None, report)));
        }

        if !report.source.is_file() {
            log::warn!(
                "[AR] attachment not found for {}: {}",
                document,
                report.source.display()
            );
            return Ok(Some((None, report)));
        }

        report.status = copy_if_absent(&report.source, &report.destination)?;
        let replacement = format!(
            "![{}]({})",
            alt,
            site_image_url(document.base_name(), &safe_name)
        );
        Ok(Some((Some(replacement), report)))
    }
}

fn copy_if_absent(source: &Path, destination: &Path) -> Result<AttachmentStatus> {
    if let Some(dir) = destination.parent() {
        std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    }

    if destination.is_file() {
        log::debug!("[AR] already present: {}", destination.display());
        return Ok(AttachmentStatus::AlreadyPresent);
    }

    std::fs::copy(source, destination).map_err(|e| Error::io(destination, e))?;
    log::debug!(
        "[AR] copied {} -> {}",
        source.display(),
        destination.display()
    );
    Ok(AttachmentStatus::Copied)
}
