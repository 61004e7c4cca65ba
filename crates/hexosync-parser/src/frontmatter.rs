//! Front matter handling: `---\nkey: value\n---`
//!
//! The header is read line by line rather than as YAML. Hexo only needs flat
//! `key: value` pairs and dash lists, and notes written in Obsidian are often
//! not valid YAML anyway. Nothing here fails: a header that cannot be read is
//! treated as absent and the whole text becomes the body.
//!
//! Known limitation: a note whose first line is `---` used as a thematic break
//! is read as a header up to the next `---` line.

use hexosync_core::{Clock, Document, MetaValue, Metadata, SystemClock, format_timestamp};
use std::sync::Arc;

/// Line that opens and closes the header block
pub const HEADER_DELIMITER: &str = "---";

/// Keys the normalizer manages
pub const TITLE_KEY: &str = "title";
pub const DATE_KEY: &str = "date";
pub const UPDATED_KEY: &str = "updated";
pub const TAGS_KEY: &str = "tags";
pub const CATEGORIES_KEY: &str = "categories";
/// Permanent identifier, generated once and never replaced
pub const ID_KEY: &str = "hexo_id";

/// Result of [`MetadataService::parse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedHeader {
    pub metadata: Metadata,
    pub body: String,
}

/// Result of [`MetadataService::ensure_and_normalize`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataOutcome {
    /// Serialized header followed by the body
    pub content: String,
    /// The normalized mapping
    pub metadata: Metadata,
    /// Parsed and normalized mappings differ
    pub changed: bool,
}

/// Parses, normalizes and re-serializes note front matter
#[derive(Clone)]
pub struct MetadataService {
    clock: Arc<dyn Clock>,
}

impl Default for MetadataService {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataService {
    /// Service stamping timestamps from the local wall clock
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Service with an explicit time source
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    /// Parse, normalize and re-serialize the header of `raw`.
    ///
    /// `changed` compares the parsed mapping with the normalized one as a
    /// whole, so it is true on every run: `updated` always moves.
    pub fn ensure_and_normalize(&self, document: &Document, raw: &str) -> MetadataOutcome {
        log::info!("[FM] start {}", document);

        let ParsedHeader { metadata, body } = Self::parse(raw);
        let normalized = self.normalize(document, &metadata);
        let changed = metadata != normalized;

        log::debug!(
            "[FM] front matter {}: {}",
            if changed { "updated" } else { "unchanged" },
            document.name()
        );

        MetadataOutcome {
            content: Self::serialize(&normalized, &body),
            metadata: normalized,
            changed,
        }
    }

    /// Split `text` into its header mapping and body
    pub fn parse(text: &str) -> ParsedHeader {
        let no_header = || ParsedHeader {
            metadata: Metadata::new(),
            body: text.to_string(),
        };

        let lines: Vec<&str> = text.split('\n').collect();

        if lines.first().map(|l| l.trim()) != Some(HEADER_DELIMITER) {
            return no_header();
        }

        let Some(end) = lines
            .iter()
            .skip(1)
            .position(|l| l.trim() == HEADER_DELIMITER)
            .map(|i| i + 1)
        else {
            return no_header();
        };

        let metadata = parse_header_lines(&lines[1..end]);

        let body_start = lines[end + 1..]
            .iter()
            .position(|l| !l.trim().is_empty())
            .map(|i| end + 1 + i)
            .unwrap_or(lines.len());
        let body = lines[body_start..].join("\n");

        ParsedHeader { metadata, body }
    }

    /// Apply the Hexo policy to a parsed mapping. The input is left untouched.
    pub fn normalize(&self, document: &Document, metadata: &Metadata) -> Metadata {
        let mut result = metadata.clone();
        let now = format_timestamp(self.clock.now());

        if !result.contains_key(TITLE_KEY) {
            result.insert(TITLE_KEY, MetaValue::scalar(document.base_name()));
            log::debug!("[FM] title {}", document);
        }

        // date is the creation stamp, set once
        if !result.contains_key(DATE_KEY) {
            result.insert(DATE_KEY, MetaValue::scalar(now.clone()));
            log::debug!("[FM] date {}", document);
        }

        result.insert(UPDATED_KEY, MetaValue::scalar(now));

        for key in [TAGS_KEY, CATEGORIES_KEY] {
            let Some(MetaValue::Scalar(s)) = result.get(key) else {
                continue;
            };
            let items = split_flow_sequence(s).unwrap_or_else(|| vec![s.clone()]);
            result.insert(key, MetaValue::List(items));
            log::debug!("[FM] {} {}", key, document);
        }

        if !result.contains_key(ID_KEY) {
            result.insert(ID_KEY, MetaValue::scalar(uuid::Uuid::new_v4().to_string()));
            log::debug!("[FM] {} {}", ID_KEY, document);
        }

        result
    }

    /// Render `metadata` as a header block followed by a blank line and `body`
    pub fn serialize(metadata: &Metadata, body: &str) -> String {
        let mut lines: Vec<String> = vec![HEADER_DELIMITER.to_string()];

        for (key, value) in metadata.iter() {
            match value {
                MetaValue::List(items) => {
                    lines.push(format!("{}:", key));
                    lines.extend(items.iter().map(|item| format!("  - {}", item)));
                }
                MetaValue::Scalar(s) => lines.push(format!("{}: {}", key, s)),
            }
        }

        lines.push(HEADER_DELIMITER.to_string());
        lines.push(String::new());
        lines.push(body.to_string());
        lines.join("\n")
    }
}

fn parse_header_lines(lines: &[&str]) -> Metadata {
    let mut metadata = Metadata::new();
    let mut current_key: Option<String> = None;

    for line in lines {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(item) = trimmed.strip_prefix('-')
            && let Some(key) = current_key.as_deref()
        {
            push_list_item(&mut metadata, key, item.trim());
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }

        let value = value.trim();
        let value = if value.is_empty() {
            MetaValue::List(Vec::new())
        } else {
            MetaValue::scalar(value)
        };
        metadata.insert(key, value);
        current_key = Some(key.to_string());
    }

    metadata
}

/// Append a dash item to `key`, promoting a scalar to the list's first element
fn push_list_item(metadata: &mut Metadata, key: &str, item: &str) {
    match metadata.get_mut(key) {
        Some(MetaValue::List(items)) => items.push(item.to_string()),
        Some(MetaValue::Scalar(first)) => {
            let first = std::mem::take(first);
            metadata.insert(key, MetaValue::List(vec![first, item.to_string()]));
        }
        None => {
            metadata.insert(key, MetaValue::List(vec![item.to_string()]));
        }
    }
}

/// `[a, "b", 'c']` as a list; `None` when `value` is not bracketed
fn split_flow_sequence(value: &str) -> Option<Vec<String>> {
    let inner = value.trim().strip_prefix('[')?.strip_suffix(']')?;
    Some(
        inner
            .split(',')
            .map(|item| item.trim().trim_matches(|c: char| c == '"' || c == '\''))
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
    use hexosync_core::FixedClock;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn service() -> (MetadataService, Arc<FixedClock>) {
        let clock = Arc::new(FixedClock::new(noon()));
        (MetadataService::with_clock(clock.clone()), clock)
    }

    fn doc() -> Document {
        Document::new("blog/Hello World.md").unwrap()
    }

    #[test]
    fn test_parse_simple_header() {
        let parsed = MetadataService::parse("---\ntitle: Hi\n---\nHello");
        assert_eq!(parsed.metadata.scalar("title"), Some("Hi"));
        assert_eq!(parsed.body, "Hello");
    }

    #[test]
    fn test_parse_lists_and_empty_values() {
        let text = "---\ntitle: T\ntags:\n  - rust\n  - hexo\ncategories:\n---\n\n\nBody";
        let parsed = MetadataService::parse(text);
        assert_eq!(
            parsed.metadata.get("tags"),
            Some(&MetaValue::List(vec!["rust".into(), "hexo".into()]))
        );
        assert_eq!(parsed.metadata.get("categories"), Some(&MetaValue::List(vec![])));
        assert_eq!(parsed.body, "Body");
    }

    #[test]
    fn test_parse_ignores_lines_without_colon() {
        let parsed = MetadataService::parse("---\njust words\ntitle: X\n---\nB");
        assert_eq!(parsed.metadata.len(), 1);
        assert_eq!(parsed.metadata.scalar("title"), Some("X"));
    }

    #[test]
    fn test_parse_value_keeps_inner_colons() {
        let parsed = MetadataService::parse("---\ndate: 2024-01-01 10:20:30\n---\n");
        assert_eq!(parsed.metadata.scalar("date"), Some("2024-01-01 10:20:30"));
        assert_eq!(parsed.body, "");
    }

    #[test]
    fn test_parse_list_item_promotes_scalar() {
        let parsed = MetadataService::parse("---\ntags: a\n  - b\n---\nx");
        assert_eq!(
            parsed.metadata.get("tags"),
            Some(&MetaValue::List(vec!["a".into(), "b".into()]))
        );
    }

    #[test]
    fn test_parse_dash_before_any_key_is_ignored() {
        let parsed = MetadataService::parse("---\n- orphan\ntitle: T\n---\nx");
        assert_eq!(parsed.metadata.keys().collect::<Vec<_>>(), vec!["title"]);
    }

    #[test]
    fn test_no_header_returns_input() {
        let text = "# Heading\n\nbody";
        let parsed = MetadataService::parse(text);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn test_unclosed_header_returns_input() {
        let text = "---\ntitle: never closed\nbody";
        let parsed = MetadataService::parse(text);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn test_crlf_header() {
        let parsed = MetadataService::parse("---\r\ntitle: Win\r\n---\r\nBody\r\n");
        assert_eq!(parsed.metadata.scalar("title"), Some("Win"));
        assert_eq!(parsed.body, "Body\r\n");
    }

    #[test]
    fn test_leading_thematic_break_is_read_as_header() {
        // A note that opens with a horizontal rule loses the text up to the
        // next rule to the header parser. Kept as-is; see module docs.
        let text = "---\n\n# Title\n\nIntro\n\n---\n\nRest";
        let parsed = MetadataService::parse(text);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, "Rest");
    }

    #[test]
    fn test_normalize_injects_defaults_in_order() {
        let (svc, _) = service();
        let normalized = svc.normalize(&doc(), &Metadata::new());

        assert_eq!(
            normalized.keys().collect::<Vec<_>>(),
            vec!["title", "date", "updated", "hexo_id"]
        );
        assert_eq!(normalized.scalar("title"), Some("Hello World"));
        assert_eq!(normalized.scalar("date"), Some("2024-05-01 12:00:00"));
        assert_eq!(normalized.scalar("updated"), Some("2024-05-01 12:00:00"));
        let id = normalized.scalar("hexo_id").unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_normalize_keeps_existing_fields() {
        let (svc, _) = service();
        let input: Metadata = [
            ("title", MetaValue::scalar("Custom")),
            ("date", MetaValue::scalar("2020-01-01 00:00:00")),
            ("hexo_id", MetaValue::scalar("fixed-id")),
            ("author", MetaValue::scalar("me")),
        ]
        .into_iter()
        .collect();

        let normalized = svc.normalize(&doc(), &input);
        assert_eq!(normalized.scalar("title"), Some("Custom"));
        assert_eq!(normalized.scalar("date"), Some("2020-01-01 00:00:00"));
        assert_eq!(normalized.scalar("hexo_id"), Some("fixed-id"));
        assert_eq!(
            normalized.keys().collect::<Vec<_>>(),
            vec!["title", "date", "hexo_id", "author", "updated"]
        );
        // input is not mutated
        assert!(!input.contains_key("updated"));
    }

    #[test]
    fn test_normalize_wraps_scalar_tags() {
        let (svc, _) = service();
        let input: Metadata = [
            ("tags", MetaValue::scalar("rust")),
            ("categories", MetaValue::scalar("[notes, 'dev']")),
        ]
        .into_iter()
        .collect();

        let normalized = svc.normalize(&doc(), &input);
        assert_eq!(normalized.get("tags"), Some(&MetaValue::List(vec!["rust".into()])));
        assert_eq!(
            normalized.get("categories"),
            Some(&MetaValue::List(vec!["notes".into(), "dev".into()]))
        );
    }

    #[test]
    fn test_renormalize_keeps_date_and_id_but_moves_updated() {
        let (svc, clock) = service();
        let first = svc.ensure_and_normalize(&doc(), "Body");

        clock.advance(TimeDelta::minutes(5));
        let second = svc.ensure_and_normalize(&doc(), &first.content);

        assert_eq!(first.metadata.scalar("date"), second.metadata.scalar("date"));
        assert_eq!(
            first.metadata.scalar("hexo_id"),
            second.metadata.scalar("hexo_id")
        );
        assert_eq!(second.metadata.scalar("updated"), Some("2024-05-01 12:05:00"));
        assert!(second.changed);
    }

    #[test]
    fn test_unchanged_when_clock_stands_still() {
        let (svc, _) = service();
        let first = svc.ensure_and_normalize(&doc(), "Body");
        let second = svc.ensure_and_normalize(&doc(), &first.content);
        assert!(!second.changed);
        assert_eq!(second.content, first.content);
    }

    #[test]
    fn test_serialize_layout() {
        let metadata: Metadata = [
            ("title", MetaValue::scalar("Hi")),
            ("tags", MetaValue::List(vec!["a".into(), "b".into()])),
        ]
        .into_iter()
        .collect();

        let out = MetadataService::serialize(&metadata, "Hello");
        assert_eq!(out, "---\ntitle: Hi\ntags:\n  - a\n  - b\n---\n\nHello");
    }

    #[test]
    fn test_serialize_then_parse_roundtrip() {
        let (svc, _) = service();
        let input = "---\ntitle: Round\ntags: [x, y]\nempty:\nnote: a: b\n---\nBody text";
        let outcome = svc.ensure_and_normalize(&doc(), input);

        let reparsed = MetadataService::parse(&outcome.content);
        assert_eq!(reparsed.metadata, outcome.metadata);
        assert_eq!(reparsed.body, "Body text");
    }

    #[test]
    fn test_scenario_simple_header() {
        let (svc, _) = service();
        let outcome = svc.ensure_and_normalize(&doc(), "---\ntitle: Hi\n---\nHello");

        assert!(outcome.content.starts_with("---\ntitle: Hi\ndate: 2024-05-01 12:00:00\n"));
        assert!(outcome.content.contains("\nupdated: 2024-05-01 12:00:00\n"));
        assert!(outcome.content.contains("\nhexo_id: "));
        assert!(outcome.content.ends_with("---\n\nHello"));
        assert!(outcome.changed);
    }

    #[test]
    fn test_missing_header_only_adds_defaults() {
        let (svc, _) = service();
        let body = "Plain note\n\nwith paragraphs";
        let outcome = svc.ensure_and_normalize(&doc(), body);

        let reparsed = MetadataService::parse(&outcome.content);
        assert_eq!(reparsed.body, body);
        assert_eq!(
            reparsed.metadata.keys().collect::<Vec<_>>(),
            vec!["title", "date", "updated", "hexo_id"]
        );
    }
}
