//! Maps decoded remote payloads into transcript content.
//!
//! Everything here is pure: no I/O, no configuration. Shape checks that can
//! fail return `Option` and the calling executor decides what failure that is.

use std::fmt;

use serde_json::Value;

use crate::transcript::{Document, SearchResult, Source, TranscriptContent};

/// Answer text used when the assistant payload has none.
pub const NO_ANSWER: &str = "I wasn't able to find an answer for that.";

/// Title used for sources that come without one.
pub const UNTITLED_SOURCE: &str = "Untitled source";

/// Map an assistant payload `{answer?, sources?}` into a rich answer.
pub fn answer(payload: &Value) -> TranscriptContent {
    let text = payload
        .get("answer")
        .and_then(Value::as_str)
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(NO_ANSWER)
        .to_string();

    let sources = payload
        .get("sources")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(source).collect())
        .unwrap_or_default();

    TranscriptContent::RichAnswer { text, sources }
}

fn source(item: &Value) -> Option<Source> {
    let item = item.as_object()?;
    let title = item
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .unwrap_or(UNTITLED_SOURCE);
    let url = item.get("url").and_then(Value::as_str).unwrap_or_default();
    Some(Source {
        title: title.to_string(),
        url: url.to_string(),
    })
}

/// Map a search payload into results, keeping upstream order.
///
/// Anything other than an array (null, object, scalar) yields no results.
/// Entries may carry `title` as a string or as `{rendered}`, and `url` or
/// `link` for the address.
pub fn search_results(payload: &Value) -> Vec<SearchResult> {
    let Some(items) = payload.as_array() else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| {
            let title = match item.get("title") {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Object(t)) => t
                    .get("rendered")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                _ => String::new(),
            };
            let url = item
                .get("url")
                .or_else(|| item.get("link"))
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            SearchResult { title, url }
        })
        .collect()
}

/// Content for a finished search. No hits is a plain message naming the
/// query, never an empty list.
pub fn search_content(query: &str, results: Vec<SearchResult>) -> TranscriptContent {
    if results.is_empty() {
        TranscriptContent::text(format!("No results found for \"{query}\"."))
    } else {
        TranscriptContent::ResultList { results }
    }
}

/// Pull `source.title` and `source.text` out of a document payload.
///
/// `None` when either is missing, not a string, or blank.
pub fn document(payload: &Value) -> Option<Document> {
    let source = payload.get("source")?;
    let field = |name: &str| {
        source
            .get(name)
            .and_then(Value::as_str)
            .filter(|v| !v.trim().is_empty())
            .map(str::to_string)
    };
    Some(Document {
        title: field("title")?,
        text: field("text")?,
    })
}

impl fmt::Display for TranscriptContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PlainText { text } => write!(f, "{text}"),
            Self::ResultList { results } => {
                writeln!(f, "Here's what I found:")?;
                for (i, r) in results.iter().enumerate() {
                    write!(f, "{}. {} <{}>", i + 1, r.title, r.url)?;
                    if i + 1 < results.len() {
                        writeln!(f)?;
                    }
                }
                Ok(())
            }
            Self::DocumentView { document } => {
                write!(f, "# {}\n\n{}", document.title, document.text)
            }
            Self::RichAnswer { text, sources } => {
                write!(f, "{text}")?;
                if !sources.is_empty() {
                    write!(f, "\n\nSources:")?;
                    for s in sources {
                        write!(f, "\n- {} <{}>", s.title, s.url)?;
                    }
                }
                Ok(())
            }
        }
    }
}
