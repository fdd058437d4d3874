//! Error types for message parsing and catalog loading
//!
//! The extraction engine itself never fails; these errors only surface at
//! the edges, when decoding raw message sources or compiling caller-supplied
//! catalogs and configuration.

use thiserror::Error;

/// Errors that can occur while parsing messages or loading catalogs
#[derive(Error, Debug)]
pub enum ParseError {
    /// Failed to parse the message structure
    #[error("Failed to parse email structure: {0}")]
    Structure(String),

    /// Missing required header
    #[error("Missing required header: {0}")]
    MissingHeader(String),

    /// Invalid header format
    #[error("Invalid header format for {header}: {details}")]
    InvalidHeader { header: String, details: String },

    /// A catalog entry carries a pattern that does not compile
    #[error("Invalid pattern for {name}: {source}")]
    InvalidPattern {
        name: String,
        #[source]
        source: regex::Error,
    },

    /// Configuration could not be deserialized
    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

/// Result type for parsing and loading operations
pub type Result<T> = std::result::Result<T, ParseError>;
