//! Generic error handling utilities
//!
//! Provides unified fatal-error reporting across the configuration, staging and
//! transfer error types while keeping system detail at debug level.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)` with a helpful, actionable message. When it returns `false`,
/// `user_message()` should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the operator can act on
    /// directly (a missing config file, malformed JSON, an existing file that
    /// would be overwritten)
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<String>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// User-actionable errors log their own message; system errors log the
/// operation context. Full detail always goes to debug level.
///
/// # Examples
/// ```rust,no_run
/// # use scan_smuggler::core::error_handling::log_error_with_context;
/// # use scan_smuggler::config::ConfigError;
/// # use std::path::PathBuf;
/// let error = ConfigError::NotFound { path: PathBuf::from("tenable.json") };
/// log_error_with_context(&error, "Loading configuration");
/// // Logs: "FATAL: tenable.json does not exist. Use the --config-gen argument to create one."
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
