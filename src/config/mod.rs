mod settings;

use config::{Config, Environment, File};

use settings::PartialSettings;

pub use config::ConfigError;
pub use settings::{BackendSettings, FeedSettings, LogSettings, Settings};

/// Loads the configuration from `.env`, the default file and environment variables.
/// Environment variables use the `POPFEED` prefix and `__` between sections,
/// e.g. `POPFEED_BACKEND__BASE_URL`.
/// Returns `Settings` with every missing value taken from the defaults.
pub fn load_config() -> Result<Settings, ConfigError> {
    let _ = dotenvy::dotenv();

    let builder = Config::builder()
        .add_source(File::with_name("config/default").required(false))
        .add_source(
            Environment::with_prefix("POPFEED")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

    let config = builder.build()?;
    let partial: PartialSettings = config.try_deserialize()?;

    Ok(partial.merge_with_defaults())
}
