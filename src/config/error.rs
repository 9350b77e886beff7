//! Configuration Error Types

use std::path::PathBuf;

/// Errors raised while loading, validating or generating the configuration.
/// All of them are fatal and happen before any network I/O.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{} does not exist. Use the --config-gen argument to create one.", .path.display())]
    NotFound { path: PathBuf },

    #[error("Unable to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Improperly formatted JSON configuration file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("The {} configuration file already exists and will NOT be overwritten.", .path.display())]
    AlreadyExists { path: PathBuf },

    #[error("Unable to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ConfigError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            message: message.into(),
        }
    }
}

impl crate::core::error_handling::ContextualError for ConfigError {
    fn is_user_actionable(&self) -> bool {
        match self {
            ConfigError::NotFound { .. }
            | ConfigError::Parse { .. }
            | ConfigError::Invalid { .. }
            | ConfigError::AlreadyExists { .. } => true,
            ConfigError::Read { .. } | ConfigError::Write { .. } => false,
        }
    }

    fn user_message(&self) -> Option<String> {
        if self.is_user_actionable() {
            Some(self.to_string())
        } else {
            None
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
