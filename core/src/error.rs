//! # Error Handling
//!
//! Provides the unified `AppError` enum used across the workspace.

use derive_more::{Display, From};

/// The Global Error Enum.
///
/// We use `derive_more` for boilerplate.
/// Note: String errors default to `General`.
#[derive(Debug, Display, From)]
pub enum AppError {
    /// Wrapper for standard IO errors.
    #[display("IO Error: {_0}")]
    Io(std::io::Error),

    /// A source file could not be parsed as Rust.
    #[from(ignore)]
    #[display("Syntax Error in {path}: {message}")]
    Syntax {
        /// File that failed to parse.
        path: String,
        /// Parser message.
        message: String,
    },

    /// A type declaration was rejected (unsupported shape, malformed attribute, bad enum block).
    #[from(ignore)]
    #[display("Type Error in '{type_name}': {message}")]
    Type {
        /// The offending type.
        type_name: String,
        /// What is wrong with it.
        message: String,
    },

    /// Several independent errors collected in one pass.
    #[from(ignore)]
    #[display("{} errors:\n{}", _0.len(), join_errors(_0))]
    Multiple(Vec<AppError>),

    /// An operation id was registered twice across HTTP and MQTT.
    #[from(ignore)]
    #[display("Duplicate Operation: '{_0}' is already registered")]
    DuplicateOperation(String),

    /// An operation failed validation at registration time.
    #[from(ignore)]
    #[display("Registration Error for '{operation_id}': {message}")]
    Registration {
        /// Operation being registered.
        operation_id: String,
        /// Validation failure.
        message: String,
    },

    /// A documentation artifact could not be rendered.
    #[from(ignore)]
    #[display("Render Error: {_0}")]
    Render(String),

    /// Wrapper for scratch database failures.
    #[from(ignore)]
    #[display("Database Error: {_0}")]
    Database(String),

    /// JSON serialization failures.
    #[display("JSON Error: {_0}")]
    Json(serde_json::Error),

    /// YAML serialization failures.
    #[display("YAML Error: {_0}")]
    Yaml(serde_yaml::Error),

    /// Generic errors.
    #[display("General Error: {_0}")]
    General(String),
}

/// Manual implementation of the standard Error trait.
impl std::error::Error for AppError {}

/// Helper type alias for Result using AppError.
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Shorthand for a [`AppError::Type`] error.
    pub fn type_error(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Type {
            type_name: type_name.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a [`AppError::Registration`] error.
    pub fn registration(operation_id: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Registration {
            operation_id: operation_id.into(),
            message: message.into(),
        }
    }

    /// Collapses collected errors: `Ok` when empty, the error itself when alone,
    /// otherwise [`AppError::Multiple`].
    pub fn join(mut errors: Vec<AppError>) -> AppResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(AppError::Multiple(errors)),
        }
    }
}

fn join_errors(errors: &[AppError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {}", e))
        .collect::<Vec<_>>()
        .join("\n")
}
