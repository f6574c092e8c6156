//! Error types for slowlog-digest

use thiserror::Error;

/// Errors that can occur while reading, aggregating or reporting slow logs
#[derive(Debug, Error)]
pub enum SlowlogError {
    /// I/O failure while reading a log source or writing output
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A log header could not be parsed
    #[error("Parse error: {message}")]
    Parse {
        message: String,
        line_content: Option<String>,
    },

    /// A metric required for the report layout is absent from a class
    #[error("Missing metric {metric} in class {class_id}")]
    MissingMetric { metric: String, class_id: String },

    /// JSON serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unexpected error: {message}")]
    Unexpected {
        message: String,
        context: Option<String>,
    },
}

/// Result type used throughout the crate
pub type Result<T> = std::result::Result<T, SlowlogError>;

/// Build a [`SlowlogError::Parse`] for a header timestamp that did not match any known layout
pub fn timestamp_error(message: &str, timestamp: &str) -> SlowlogError {
    SlowlogError::Parse {
        message: format!("{}: {}", message, timestamp),
        line_content: Some(timestamp.to_string()),
    }
}

impl From<std::fmt::Error> for SlowlogError {
    fn from(e: std::fmt::Error) -> Self {
        SlowlogError::Unexpected {
            message: e.to_string(),
            context: Some("text formatting".to_string()),
        }
    }
}
