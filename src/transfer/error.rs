//! Transfer Error Types

use crate::config::ConfigError;
use crate::core::error_handling::ContextualError;
use crate::staging::StagingError;

/// Fatal failures of a transfer run. Everything per-file or per-endpoint is
/// logged and absorbed instead.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Staging(#[from] StagingError),
}

impl ContextualError for TransferError {
    fn is_user_actionable(&self) -> bool {
        match self {
            TransferError::Config(e) => e.is_user_actionable(),
            TransferError::Staging(e) => e.is_user_actionable(),
        }
    }

    fn user_message(&self) -> Option<String> {
        match self {
            TransferError::Config(e) => e.user_message(),
            TransferError::Staging(e) => e.user_message(),
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
