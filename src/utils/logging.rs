//! Logging setup for the binary and tests.

use config::ConfigError;
use tracing::Level;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

use crate::utils::{Error, Result};

/// Builds the filter: `level` (the `logging.level` setting) is the default,
/// and directives in `RUST_LOG` refine it per target.
///
/// An unrecognised `level` is a configuration error, not a silent fallback.
pub fn filter(level: &str) -> Result<EnvFilter> {
    let level: Level = level.trim().parse().map_err(|e| {
        Error::Config(ConfigError::Message(format!(
            "invalid logging.level {level:?}: {e}"
        )))
    })?;

    Ok(EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level).into())
        .from_env_lossy())
}

/// Installs the global fmt subscriber.
///
/// Installing twice is harmless; the first subscriber stays in place.
pub fn init(level: &str) -> Result<()> {
    let filter = filter(level)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
    Ok(())
}
