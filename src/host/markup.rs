//! Block-comment markup for content nodes.
//!
//! Produces the `<!-- wp:name {attrs} --> html <!-- /wp:name -->` form that
//! block editors store. Text attributes (`content`) go into the HTML, the
//! rest into the comment's JSON.

use serde_json::{Map, Value};

use crate::host::ContentNode;

/// Serialize top-level blocks, separated by blank lines.
pub fn serialize(blocks: &[ContentNode]) -> String {
    blocks
        .iter()
        .map(serialize_node)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn serialize_node(node: &ContentNode) -> String {
    let name = node.name.strip_prefix("core/").unwrap_or(&node.name);
    let attrs: Map<String, Value> = node
        .attributes
        .iter()
        .filter(|(k, _)| k.as_str() != "content")
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    let open = if attrs.is_empty() {
        format!("<!-- wp:{name} -->")
    } else {
        format!("<!-- wp:{name} {} -->", Value::Object(attrs))
    };

    format!("{open}\n{}\n<!-- /wp:{name} -->", inner_html(name, node))
}

fn inner_html(name: &str, node: &ContentNode) -> String {
    let text = escape(node.attr_str("content").unwrap_or_default());
    let align_class = node
        .attr_str("align")
        .or_else(|| node.attr_str("textAlign"))
        .map(|a| format!(" class=\"has-text-align-{a}\""))
        .unwrap_or_default();

    match name {
        "paragraph" => format!("<p{align_class}>{text}</p>"),
        "heading" => {
            let level = node
                .attributes
                .get("level")
                .and_then(Value::as_u64)
                .unwrap_or(2);
            format!("<h{level}{align_class}>{text}</h{level}>")
        }
        "cover" => {
            let dim = node
                .attributes
                .get("dimRatio")
                .and_then(Value::as_u64)
                .unwrap_or(50);
            let image = node
                .attr_str("url")
                .map(|url| {
                    format!(
                        "<img class=\"wp-block-cover__image-background\" alt=\"\" src=\"{}\"/>",
                        escape(url)
                    )
                })
                .unwrap_or_default();
            format!(
                "<div class=\"wp-block-cover\"><span aria-hidden=\"true\" class=\"wp-block-cover__background has-background-dim-{dim} has-background-dim\"></span>{image}<div class=\"wp-block-cover__inner-container\">\n{}\n</div></div>",
                serialize(&node.inner_blocks)
            )
        }
        _ => serialize(&node.inner_blocks),
    }
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
