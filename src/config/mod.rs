//! JSON configuration: typed model, loading, validation and generation

pub mod defaults;
pub mod error;
pub mod loader;
pub mod types;

pub use defaults::{DEFAULT_CONFIG_DOCUMENT, DEFAULT_CONFIG_FILE};
pub use error::{ConfigError, ConfigResult};
pub use loader::{generate_config, load_config, parse_config, validate_config};
pub use types::{
    AccountConfig, DownloadsConfig, RuntimeSettings, ScanSelector, ScanSmugglerConfig,
    StaticSourceConfig, TenableIoDestinationConfig, TenableIoSourceConfig,
    TenableScDestinationConfig, TenableScSourceConfig, UploadsConfig,
};
