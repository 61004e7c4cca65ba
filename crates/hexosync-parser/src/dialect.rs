//! Obsidian → Hexo markdown rewriting.
//!
//! Stages run in a fixed order, each feeding the next:
//!
//! 1. `![[path]]` → `![](path)`
//! 2. `[[target]]` / `[[target|alias]]` → `[alias](target)`
//! 3. `![alt](<attachment folder>/name)` → `![alt](/images/<note>/<safe name>)`
//! 4. trailing `^block-id` markers and `%% comments %%` are removed
//!
//! Stage 3 matches the standard image form, so it must follow stage 1.

use crate::naming::{attachment_base_name, normalize_file_name};
use hexosync_core::{Document, site_image_url};
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::sync::LazyLock;

/// `![[...]]`
static EMBED_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[\[(.+?)\]\]").unwrap());

/// `[[target]]` or `[[target|alias]]`
static WIKILINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]|]+)(?:\|([^\]]+))?\]\]").unwrap());

/// `![alt](path)`
static IMAGE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)]+)\)").unwrap());

/// Whitespace, caret, identifier, at end of line
static BLOCK_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?mR)\s\^[A-Za-z0-9-]+[ \t]*$").unwrap());

/// `%% ... %%`, across lines
static COMMENT_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)%%.*?%%").unwrap());

/// Result of [`DialectTransform::transform`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformOutcome {
    pub content: String,
    pub changed: bool,
}

impl TransformOutcome {
    /// Feed this outcome's content through `stage`, keeping the changed flag sticky
    fn merge_with(self, stage: impl FnOnce(&str) -> TransformOutcome) -> TransformOutcome {
        let next = stage(&self.content);
        TransformOutcome {
            content: next.content,
            changed: self.changed || next.changed,
        }
    }
}

/// Pure text rewriter from Obsidian markdown to Hexo markdown
#[derive(Debug, Clone)]
pub struct DialectTransform {
    attachment_subfolder: String,
}

impl DialectTransform {
    /// `attachment_subfolder` is the folder name image paths are rewritten from
    pub fn new(attachment_subfolder: impl Into<String>) -> Self {
        Self {
            attachment_subfolder: attachment_subfolder.into(),
        }
    }

    /// Run every stage over `content`
    pub fn transform(&self, document: &Document, content: &str) -> TransformOutcome {
        let outcome = Self::convert_embeds(content);
        let outcome = outcome.merge_with(Self::convert_wikilinks);
        let outcome = outcome.merge_with(|c| self.rewrite_attachment_paths(document, c));
        let outcome = outcome.merge_with(Self::strip_source_annotations);

        log::info!("[MT] markdown transformed (obsidian -> hexo): {}", document.name());
        outcome
    }

    /// `![[path]]` → `![](path)`, dropping any `|size` suffix
    pub fn convert_embeds(input: &str) -> TransformOutcome {
        let result = EMBED_PATTERN.replace_all(input, |caps: &Captures| {
            let target = caps[1].split('|').next().unwrap_or(&caps[1]).trim();
            format!("![]({})", target)
        });
        outcome_from(result)
    }

    /// `[[Note]]` → `[Note](Note)`, `[[Note|Alias]]` → `[Alias](Note)`
    pub fn convert_wikilinks(input: &str) -> TransformOutcome {
        let result = WIKILINK_PATTERN.replace_all(input, |caps: &Captures| {
            let target = &caps[1];
            let text = caps.get(2).map_or(target, |alias| alias.as_str());
            format!("[{}]({})", text, target)
        });
        outcome_from(result)
    }

    /// Point attachment-folder image paths at the site images folder
    pub fn rewrite_attachment_paths(&self, document: &Document, input: &str) -> TransformOutcome {
        let mut changed = false;
        let result = IMAGE_PATTERN.replace_all(input, |caps: &Captures| {
            let path = caps[2].trim();
            if !self.is_attachment_path(path) {
                return caps[0].to_string();
            }

            let name = normalize_file_name(attachment_base_name(path));
            if name.is_empty() {
                log::warn!("[MT] no web-safe name for '{}' in {}", path, document);
                return caps[0].to_string();
            }

            changed = true;
            format!("![{}]({})", &caps[1], site_image_url(document.base_name(), &name))
        });

        TransformOutcome {
            content: result.into_owned(),
            changed,
        }
    }

    /// Remove trailing block ids and `%%` comments
    pub fn strip_source_annotations(input: &str) -> TransformOutcome {
        let without_ids = outcome_from(BLOCK_ID_PATTERN.replace_all(input, ""));
        without_ids.merge_with(|c| outcome_from(COMMENT_PATTERN.replace_all(c, "")))
    }

    fn is_attachment_path(&self, path: &str) -> bool {
        let path = path.trim_start_matches("./");
        path.strip_prefix(self.attachment_subfolder.as_str())
            .is_some_and(|rest| rest.starts_with(['/', '\\']))
    }
}

fn outcome_from(result: Cow<'_, str>) -> TransformOutcome {
    match result {
        Cow::Borrowed(unchanged) => TransformOutcome {
            content: unchanged.to_string(),
            changed: false,
        },
        Cow::Owned(content) => TransformOutcome {
            content,
            changed: true,
        },
    }
}
