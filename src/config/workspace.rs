//! Workspace section of the configuration.

pub mod containers;
