//! Error types for the sheet normalization pipeline.
//!
//! This module defines one error type per layer:
//!
//! - [`CsvError`] - Tokenizer errors (decoding, CSV syntax)
//! - [`NormalizeError`] - Structural failures recovered inside the core
//! - [`RetrievalError`] - Errors fetching CSV payloads from a source
//! - [`CatalogError`] - Dataset catalog loading errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Tokenizer Errors
// =============================================================================

/// Errors while turning raw bytes or text into a grid.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Bytes could not be decoded with the detected encoding.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV syntax.
    #[error("Invalid CSV at line {line}: {message}")]
    ParseError { line: u64, message: String },
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        CsvError::ParseError {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Normalization Errors
// =============================================================================

/// Structural failures detected while normalizing a grid.
///
/// These never escape the normalization entry points: a missing header is
/// turned into an empty table so callers can render the empty state the same
/// way as a sheet with no data.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormalizeError {
    /// No row carries a recognised header marker.
    #[error("No header row found (looked for: {markers})")]
    HeaderNotFound { markers: String },
}

// =============================================================================
// Retrieval Errors
// =============================================================================

/// Errors from the retrieval collaborator that fetches CSV payloads.
#[derive(Debug, Error)]
pub enum RetrievalError {
    /// Transport-level failure (DNS, TLS, connection reset, timeout).
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Server answered with a non-success status.
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    /// Local file could not be read.
    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Dataset id is not configured.
    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

// =============================================================================
// Catalog Errors
// =============================================================================

/// Errors loading the dataset catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// IO error.
    #[error("Catalog IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Catalog JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Two datasets share an id.
    #[error("Duplicate dataset id: {0}")]
    DuplicateId(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// A missing header is deliberately absent here: it is recovered into an
/// empty table before reaching this level.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Tokenizer error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Retrieval error.
    #[error("Retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Catalog error.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for tokenizer operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for retrieval operations.
pub type RetrievalResult<T> = Result<T, RetrievalError>;

/// Result type for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;
