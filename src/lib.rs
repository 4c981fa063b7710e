//! ATEL Processor Library
//!
//! A Rust library for mining celestial object metadata from Astronomer's Telegram
//! (ATel) bulletins and deciding which extracted coordinates can be trusted.
//!
//! This library provides tools for:
//! - Loading bulletin text from CSV and per-bulletin extraction documents from JSON
//! - Classifying every extracted coordinate pair as GOOD, BAD or NULL against the bulletin text
//! - Aggregating classification results and summary counts across a bulletin corpus
//! - Normalizing sexagesimal and decimal coordinates to decimal degrees
//! - Requesting structured extractions from an LLM chat-completions endpoint
//! - Resolving extracted object names against the SIMBAD TAP service

pub mod config;
pub mod constants;

// Core application modules
pub mod app {
    pub mod models;
    pub mod services {
        pub mod batch_reporter;
        pub mod bulletin_loader;
        pub mod catalog;
        pub mod coordinate_normalizer;
        pub mod entry_classifier;
        pub mod evidence_matcher;
        pub mod extraction;
    }
}

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use app::models::{Bulletin, CandidateEntry, ClassificationCounts, ClassificationLabel, CoordinatePair};
pub use config::Config;

/// Result type alias for the ATEL processor
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for ATEL processing operations
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// CSV parsing error
    #[error("CSV parsing error in file '{file}': {message}")]
    CsvParsing {
        file: String,
        message: String,
        #[source]
        source: Option<csv::Error>,
    },

    /// JSON decoding or encoding error
    #[error("JSON error in '{context}': {message}")]
    JsonParsing {
        context: String,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Coordinate string could not be interpreted
    #[error("Coordinate parse error for '{value}': {message}")]
    CoordinateParse { value: String, message: String },

    /// RA/Dec value has a shape outside {absent, number, string, list, mapping}
    #[error("Unsupported coordinate shape: RA is {ra_shape}, Dec is {dec_shape}")]
    UnsupportedShape { ra_shape: String, dec_shape: String },

    /// Bulletin identifier carries no bulletin number
    #[error("Invalid bulletin identifier: '{id}'")]
    InvalidBulletinId { id: String },

    /// No bulletin text is available for an extraction document
    #[error("Bulletin not found: {id}")]
    BulletinNotFound { id: String },

    /// LLM extraction failed
    #[error("Extraction error for bulletin '{bulletin_id}': {message}")]
    Extraction { bulletin_id: String, message: String },

    /// Catalog query failed
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// HTTP transport error
    #[error("HTTP error: {message}")]
    Http {
        message: String,
        #[source]
        source: reqwest::Error,
    },

    /// File not found
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// Processing interrupted
    #[error("Processing interrupted: {reason}")]
    ProcessingInterrupted { reason: String },
}

impl Error {
    /// Create an I/O error with context
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a CSV parsing error with context
    pub fn csv_parsing(
        file: impl Into<String>,
        message: impl Into<String>,
        source: Option<csv::Error>,
    ) -> Self {
        Self::CsvParsing {
            file: file.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a JSON error with context
    pub fn json_parsing(
        context: impl Into<String>,
        message: impl Into<String>,
        source: Option<serde_json::Error>,
    ) -> Self {
        Self::JsonParsing {
            context: context.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a coordinate parse error
    pub fn coordinate_parse(value: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CoordinateParse {
            value: value.into(),
            message: message.into(),
        }
    }

    /// Create an unsupported shape error
    pub fn unsupported_shape(ra_shape: impl Into<String>, dec_shape: impl Into<String>) -> Self {
        Self::UnsupportedShape {
            ra_shape: ra_shape.into(),
            dec_shape: dec_shape.into(),
        }
    }

    /// Create an invalid bulletin id error
    pub fn invalid_bulletin_id(id: impl Into<String>) -> Self {
        Self::InvalidBulletinId { id: id.into() }
    }

    /// Create a bulletin not found error
    pub fn bulletin_not_found(id: impl Into<String>) -> Self {
        Self::BulletinNotFound { id: id.into() }
    }

    /// Create an extraction error
    pub fn extraction(bulletin_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Extraction {
            bulletin_id: bulletin_id.into(),
            message: message.into(),
        }
    }

    /// Create a catalog error
    pub fn catalog(message: impl Into<String>) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a file not found error
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    /// Create a processing interrupted error
    pub fn processing_interrupted(reason: impl Into<String>) -> Self {
        Self::ProcessingInterrupted {
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            message: "I/O operation failed".to_string(),
            source: error,
        }
    }
}

impl From<csv::Error> for Error {
    fn from(error: csv::Error) -> Self {
        Self::CsvParsing {
            file: "unknown".to_string(),
            message: "CSV parsing failed".to_string(),
            source: Some(error),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::JsonParsing {
            context: "unknown".to_string(),
            message: error.to_string(),
            source: Some(error),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Http {
            message: error.to_string(),
            source: error,
        }
    }
}
