//! Agent module — intent classification and dispatch.

pub mod intent;
pub mod router;

pub use intent::{Intent, IntentParser};
pub use router::{Dispatch, IntentRouter, StatusUpdate};
