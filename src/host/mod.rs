//! Host document capability — the editor content that insertion intents
//! mutate.
//!
//! The host accepts structured content nodes (block name, attributes, inner
//! blocks) and places them at its own insertion point. Undo is the host's
//! business.

pub mod markup;

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One structured content node, e.g. `core/paragraph`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentNode {
    pub name: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub attributes: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inner_blocks: Vec<ContentNode>,
}

impl ContentNode {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
            inner_blocks: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn inner(mut self, blocks: Vec<ContentNode>) -> Self {
        self.inner_blocks = blocks;
        self
    }

    pub fn heading(content: &str, level: u8) -> Self {
        Self::new("core/heading")
            .attr("content", content)
            .attr("level", level)
    }

    pub fn paragraph(content: &str) -> Self {
        Self::new("core/paragraph").attr("content", content)
    }

    /// String attribute, if present.
    pub fn attr_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// This node followed by all of its descendants, depth first.
    pub fn walk(&self) -> Vec<&ContentNode> {
        let mut nodes = vec![self];
        for child in &self.inner_blocks {
            nodes.extend(child.walk());
        }
        nodes
    }
}

/// Something that can take inserted content, typically the open editor.
pub trait HostDocument: Send + Sync {
    /// Insert `blocks`, in order, at the host's current insertion point.
    fn insert_blocks(&self, blocks: Vec<ContentNode>);
}

/// An in-memory document that appends inserted blocks at the end.
#[derive(Debug, Default)]
pub struct DocumentBuffer {
    blocks: Mutex<Vec<ContentNode>>,
}

impl DocumentBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the top-level blocks.
    pub fn blocks(&self) -> Vec<ContentNode> {
        self.blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// The document as block markup.
    pub fn markup(&self) -> String {
        markup::serialize(&self.blocks())
    }
}

impl HostDocument for DocumentBuffer {
    fn insert_blocks(&self, blocks: Vec<ContentNode>) {
        let mut doc = self
            .blocks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        tracing::debug!(count = blocks.len(), at = doc.len(), "Inserting blocks");
        doc.extend(blocks);
    }
}
