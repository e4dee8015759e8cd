//! Configuration loading.
//!
//! Sources are layered: defaults, then an optional `config/default` file, then
//! `KIDOS_`-prefixed environment variables (`KIDOS_MASTER__PORT=4000`).

mod settings;

use config::{Config, ConfigError, Environment, File};

pub use settings::{
    BrokerSettings, LoggingSettings, MasterSettings, PartialSettings, Settings,
};

/// Loads the configuration from the default file and environment variables
/// and merges it with default values.
pub fn load_config() -> Result<Settings, ConfigError> {
    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("KIDOS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(Settings::merged(partial))
}
