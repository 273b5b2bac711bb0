//! Intent classification for chat input.
//!
//! Classification is a literal, case-insensitive prefix test against the
//! trimmed text. The first matching rule wins.

use crate::executors::{InsertVariant, MissingPayload};

pub const SECTION_PREFIX: &str = "please add a section about electric shuffleboard";
pub const TEXT_PREFIX: &str = "please add text about electric shuffle board";
pub const FETCH_DOC_PREFIX: &str = "please fetch doc";
pub const SEARCH_PREFIX: &str = "please search";

/// What the user wants done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Insert canned content into the host document.
    InsertContent(InsertVariant),
    /// Fetch a document by id.
    FetchDoc { doc_id: String },
    /// Search the site.
    Search { query: String },
    /// A command was recognised but its argument is missing.
    MissingPayload(MissingPayload),
    /// No command: a question or small-talk.
    SmallTalk { text: String },
}

/// Parses chat input into an [`Intent`].
pub struct IntentParser;

impl IntentParser {
    /// Classify `content`. Surrounding whitespace is ignored.
    pub fn parse(content: &str) -> Intent {
        let trimmed = content.trim();

        if starts_with_ignore_case(trimmed, SECTION_PREFIX) {
            return Intent::InsertContent(InsertVariant::Section);
        }
        if starts_with_ignore_case(trimmed, TEXT_PREFIX) {
            return Intent::InsertContent(InsertVariant::Text);
        }

        parse_fetch_doc(trimmed)
            .or_else(|| parse_search(trimmed))
            .unwrap_or_else(|| Intent::SmallTalk {
                text: trimmed.to_string(),
            })
    }
}

/// `please fetch doc <id>`
fn parse_fetch_doc(trimmed: &str) -> Option<Intent> {
    let rest = strip_prefix_ignore_case(trimmed, FETCH_DOC_PREFIX)?.trim();
    if rest.is_empty() {
        return Some(Intent::MissingPayload(MissingPayload::DocumentId));
    }
    Some(Intent::FetchDoc {
        doc_id: rest.to_string(),
    })
}

/// `please search <query>`
fn parse_search(trimmed: &str) -> Option<Intent> {
    let rest = strip_prefix_ignore_case(trimmed, SEARCH_PREFIX)?.trim();
    if rest.is_empty() {
        return Some(Intent::MissingPayload(MissingPayload::SearchTerm));
    }
    Some(Intent::Search {
        query: rest.to_string(),
    })
}

fn starts_with_ignore_case(text: &str, prefix: &str) -> bool {
    strip_prefix_ignore_case(text, prefix).is_some()
}

/// Prefixes are ASCII, so an ASCII case-insensitive compare on the leading
/// bytes is exact. `get` refuses to split a multi-byte character.
fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        text.get(prefix.len()..)
    } else {
        None
    }
}
