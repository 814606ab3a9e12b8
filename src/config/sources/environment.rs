//! Environment variable source: GROVE__* prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Add environment variable overlay to builder.
/// `GROVE__WORKSPACE__DEFAULT_MODE=r` sets `workspace.default_mode`.
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("GROVE")
            .separator("__")
            .try_parsing(true),
    );
    Ok(builder)
}
