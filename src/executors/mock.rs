//! Canned answers for panels with no assistant backend.

use rand::seq::SliceRandom;

use crate::transcript::TranscriptContent;

pub const GREETING_REPLY: &str = "Hi there! I'm Builder Buddy. How can I help with your page today?";

pub const HELP_REPLY: &str = "I can help you build pages. Try \"please search\" followed by a topic, \
     \"please fetch doc\" followed by a document id, or ask me to add a section \
     about electric shuffleboard.";

pub const FILLER_REPLIES: [&str; 5] = [
    "Interesting! Tell me more about what you're building.",
    "I'm not sure I follow. Could you put that another way?",
    "Good question. I'm still learning, so I may not have the answer yet.",
    "Let's figure it out together. What does the page need to do?",
    "Noted! Is there something on this page I can help with?",
];

/// Pick a canned reply for `text`.
///
/// Greetings and help requests get fixed answers; anything else gets a
/// random filler.
pub fn mock_reply(text: &str) -> TranscriptContent {
    let lower = text.to_lowercase();
    let reply = if lower.contains("hello") || lower.contains("hi") {
        GREETING_REPLY
    } else if lower.contains("help") {
        HELP_REPLY
    } else {
        FILLER_REPLIES
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(FILLER_REPLIES[0])
    };
    TranscriptContent::text(reply)
}
