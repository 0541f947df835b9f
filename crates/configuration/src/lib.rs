use crate::error::ConfigError;
use config::{Environment, File, FileFormat};
use std::path::Path;

// Declare the modules that make up this crate.
#[cfg(feature = "clap")]
pub mod cli;
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
#[cfg(feature = "clap")]
pub use cli::Overrides;
pub use settings::{
    Comparison, ComparisonBasis, Logging, Sample, Settings, Source, SourceKind, Tables, Universe,
};

const DEFAULT_CONFIG_FILE: &str = "config.toml";
const ENV_PREFIX: &str = "REPLICATION";

/// Loads the run settings.
///
/// Sources, lowest precedence first: built-in defaults, the TOML file (an
/// explicitly given path must exist; the default `config.toml` is optional),
/// then `REPLICATION__SECTION__KEY` environment variables.
///
/// The result is not validated: command-line overrides may still complete it,
/// so callers run [`Settings::validate`] once every layer has been applied.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let file = match path {
        Some(path) => File::from(path).required(true),
        None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(environment());

    finish(builder)
}

/// Same as [`load_settings`] but reads the TOML from a string.
pub fn load_settings_from_str(toml: &str) -> Result<Settings, ConfigError> {
    let builder = config::Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .add_source(environment());

    finish(builder)
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("universe.share_codes")
        .with_list_parse_key("universe.exchange_codes")
}

fn finish(
    builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
) -> Result<Settings, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Settings` struct
    Ok(builder.build()?.try_deserialize::<Settings>()?)
}
