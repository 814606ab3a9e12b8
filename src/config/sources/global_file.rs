//! Global config file: `$XDG_CONFIG_HOME/grove/config.toml`

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File};
use tracing::debug;

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::global_config_path() {
        Ok(path) => Ok(builder.add_source(File::from(path).required(false))),
        Err(e) => {
            debug!(error = %e, "Skipping global config file");
            Ok(builder)
        }
    }
}
