//! CLI argument model for the `autowork` binary.

pub mod cli_args;

pub use cli_args::{AutoworkCommand, Cli};
