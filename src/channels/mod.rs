//! Front-ends that feed chat input to the router.

pub mod cli;

pub use cli::{CliChannel, CliCommand};
