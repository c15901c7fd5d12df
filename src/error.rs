//! Error handling for copycat.
//! Defines the error taxonomy and the result alias used throughout the crate.

use std::io;
use std::path::Path;
use thiserror::Error;

/// Custom error types for copycat operations.
///
/// Every variant is fatal to a run: the first error aborts the expansion
/// and is propagated to the caller with the offending path or expression.
#[derive(Error, Debug)]
pub enum Error {
    /// Represents errors that occur during file system operations outside the storages
    #[error("IO error: {0}.")]
    IoError(#[from] io::Error),

    /// The model does not have the expected shape (e.g. the root is not a map)
    #[error("Model error: {0}.")]
    ModelError(String),

    /// The model file could not be read or parsed
    #[error("Configuration error: {0}.")]
    ConfigError(String),

    /// A path placeholder resolved neither structurally nor through template evaluation
    #[error("Cannot evaluate expression '{{{{ {expression} }}}}': {source}.")]
    ExpressionError {
        expression: String,
        #[source]
        source: minijinja::Error,
    },

    /// A template body (or a templated model value) failed to render
    #[error("Cannot render template '{template}': {source}.")]
    RenderError {
        template: String,
        #[source]
        source: minijinja::Error,
    },

    /// A template or output storage operation failed
    #[error("Storage error at '{path}': {source}.")]
    StorageError {
        path: String,
        #[source]
        source: io::Error,
    },

    /// Invalid template root or rendered path
    #[error("Template error: {0}.")]
    TemplateError(String),
}

impl Error {
    /// Wraps an I/O error raised while touching `path`.
    pub fn storage<P: AsRef<Path>>(path: P, source: io::Error) -> Self {
        Error::StorageError { path: path.as_ref().display().to_string(), source }
    }
}

/// Convenience type alias for Results with copycat's Error as the error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Default error handler that prints the error and exits the program.
///
/// # Arguments
/// * `err` - The error to handle
///
/// # Behavior
/// Prints the error message to stderr and exits with status code 1
pub fn default_error_handler(err: Error) {
    eprintln!("{err}");
    std::process::exit(1);
}
