//! Built-in defaults, the lowest-precedence layer.

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};

pub(crate) fn builder_with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Config::builder()
        .set_default("logging.level", "info")?
        .set_default("workspace.default_mode", "a")
}
