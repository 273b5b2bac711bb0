//! Builder Buddy — a conversational assistant for a page editor.

pub mod agent;
pub mod channels;
pub mod config;
pub mod error;
pub mod executors;
pub mod host;
pub mod relay;
pub mod transcript;

#[cfg(test)]
mod test_support;
