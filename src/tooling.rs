//! Tooling & Integration Layer
//!
//! Command-line entry points over the workspace facade.

pub mod cli;

pub use cli::{load_config, Cli, CliContext, Commands};
