//! Content-insertion executor — drops canned electric shuffleboard content
//! into the host document.

use std::sync::Arc;
use std::time::Duration;

use crate::host::{ContentNode, HostDocument};
use crate::transcript::TranscriptContent;

pub const SECTION_HEADING: &str = "Electric Shuffleboard";

pub const COVER_IMAGE_URL: &str =
    "https://images.unsplash.com/photo-1611251135345-18c56206b863?auto=format&fit=crop&w=1600&q=80";

pub const FIRST_PARAGRAPH: &str = "Electric shuffleboard takes the classic table game and wires it up: \
     sensors track every puck, scores update automatically, and light effects \
     celebrate each point.";

pub const SECOND_PARAGRAPH: &str = "It is easy to pick up and hard to master, which makes it a favourite \
     for bars, offices and game rooms that want something social without a \
     steep learning curve.";

pub const SECTION_CONFIRMATION: &str =
    "Done! I've added a section about electric shuffleboard to your page.";

pub const TEXT_CONFIRMATION: &str =
    "Done! I've added some text about electric shuffleboard to your page.";

/// Which canned content to insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertVariant {
    /// A cover banner holding a heading and two paragraphs.
    Section,
    /// Two plain paragraphs.
    Text,
}

impl InsertVariant {
    /// The nodes handed to the host for this variant.
    pub fn blocks(&self) -> Vec<ContentNode> {
        match self {
            Self::Section => vec![
                ContentNode::new("core/cover")
                    .attr("url", COVER_IMAGE_URL)
                    .attr("dimRatio", 50)
                    .attr("overlayColor", "black")
                    .attr("contentPosition", "center center")
                    .attr("align", "full")
                    .inner(vec![
                        ContentNode::heading(SECTION_HEADING, 2).attr("textAlign", "center"),
                        ContentNode::paragraph(FIRST_PARAGRAPH).attr("align", "center"),
                        ContentNode::paragraph(SECOND_PARAGRAPH).attr("align", "center"),
                    ]),
            ],
            Self::Text => vec![
                ContentNode::paragraph(FIRST_PARAGRAPH),
                ContentNode::paragraph(SECOND_PARAGRAPH),
            ],
        }
    }

    pub fn confirmation(&self) -> &'static str {
        match self {
            Self::Section => SECTION_CONFIRMATION,
            Self::Text => TEXT_CONFIRMATION,
        }
    }
}

#[derive(Clone)]
pub struct InsertExecutor {
    host: Arc<dyn HostDocument>,
    typing_delay: Duration,
}

impl InsertExecutor {
    pub fn new(host: Arc<dyn HostDocument>, typing_delay: Duration) -> Self {
        Self { host, typing_delay }
    }

    /// Insert the variant's content, pause, and confirm. Never fails.
    pub async fn insert(&self, variant: InsertVariant) -> TranscriptContent {
        let blocks = variant.blocks();
        tracing::info!(?variant, blocks = blocks.len(), "Inserting content into host document");
        self.host.insert_blocks(blocks);

        if !self.typing_delay.is_zero() {
            tokio::time::sleep(self.typing_delay).await;
        }
        TranscriptContent::text(variant.confirmation())
    }
}
