//! Error types for confirmed schemas

use thiserror::Error;

/// Errors that can occur when validating or persisting a confirmed schema
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Schema is malformed, has duplicate names or unknown types
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// No schema has been saved yet
    #[error("No confirmed schema has been saved")]
    NotFound,

    /// Schema file could not be read or written
    #[error("Schema storage error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl SchemaError {
    /// Get a user-friendly error message for CLI output
    pub fn user_message(&self) -> String {
        match self {
            SchemaError::InvalidSchema(reason) => format!(
                "Invalid schema: {reason}\n\n\
                Hint: Each column needs a unique non-blank name and one of the types \
                string, number, boolean, date."
            ),
            SchemaError::NotFound => "No confirmed schema has been saved.\n\n\
                Hint: Confirm an import first."
                .to_string(),
            SchemaError::Io { path, source } => format!(
                "Cannot access schema file: {path}\nReason: {source}\n\n\
                Hint: Check that the state directory exists and is writable."
            ),
        }
    }
}
