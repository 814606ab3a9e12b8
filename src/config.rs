//! Configuration
//!
//! Layered configuration loaded with the `config` crate: built-in defaults, the global
//! file, the workspace file, then `GROVE__*` environment variables.

mod facade;
pub mod merge;
pub mod paths;
pub mod sources;
pub mod workspace;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;
pub use workspace::containers::{ContainerConfig, WorkspaceConfig};

use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

/// Name of the per-workspace configuration file
pub const WORKSPACE_CONFIG_FILE: &str = "grove.toml";

/// Top-level configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroveConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub workspace: WorkspaceConfig,
}
