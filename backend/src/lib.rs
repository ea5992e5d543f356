//! # Usage Sheets - normalization of loosely structured usage spreadsheets
//!
//! Turns exported library-usage sheets and monthly newspaper ledgers into
//! regular tables, whatever banner rows, shifted headers or transposed
//! layouts the export came with.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────┐    ┌───────────┐    ┌────────────┐    ┌────────────┐    ┌─────────────┐
//! │ CSV bytes │───▶│  Parser   │───▶│   Header   │───▶│   Layout   │───▶│ Normalized  │
//! │ (any enc) │    │  (Grid)   │    │  locator   │    │ + cells    │    │   table     │
//! └───────────┘    └───────────┘    └────────────┘    └────────────┘    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use usage_sheets::{process_usage_text, PipelineOptions};
//!
//! let csv = "Library Usage 2025\nMonths,IEEE,JSTOR\nJan,\"1,200\",30\nTotal,1200,30\n";
//! let result = process_usage_text(csv, &PipelineOptions::default()).unwrap();
//!
//! assert_eq!(result.table.series, vec!["IEEE", "JSTOR"]);
//! assert_eq!(result.table.records[0].value("IEEE"), 1200.0);
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - Grid, header row, normalized table and ledger records
//! - [`parser`] - CSV tokenizing with encoding auto-detection
//! - [`transform`] - Header discovery, layout, cell coercion, filtering, pipelines
//! - [`analysis`] - Totals, rankings, dispersion and ledger overview
//! - [`catalog`] - Dataset configuration and the school resource table
//! - [`source`] - Retrieval of CSV payloads from URLs and files
//! - [`validation`] - JSON Schema checks of normalized output
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Normalization
pub mod transform;

// Aggregation
pub mod analysis;

// Configuration and retrieval
pub mod catalog;
pub mod source;

// Validation
pub mod validation;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CatalogError, CsvError, NormalizeError, PipelineError, RetrievalError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    CellWarning, Grid, HeaderRow, LayoutKind, LedgerPeriod, LedgerRecord, NormalizedTable,
    PeriodRecord,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, parse_bytes_auto, parse_csv, parse_csv_file_auto, tokenize,
    ParseResult,
};

// =============================================================================
// Re-exports - Normalization
// =============================================================================

pub use transform::{
    locate_header, locate_ledger_header, normalize_grid, normalize_ledger, to_grouped_grid,
    HeaderTier, Layout, LedgerNormalization, LedgerOptions, NormalizeOptions, UsageNormalization,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{
    load_dataset, load_ledger_overview, process_ledger_bytes, process_ledger_file,
    process_ledger_grid, process_ledger_text, process_usage_bytes, process_usage_file,
    process_usage_grid, process_usage_text, DatasetOutput, LoadedDataset, OverviewReport,
    PipelineOptions,
};

// =============================================================================
// Re-exports - Analysis
// =============================================================================

pub use analysis::{
    ledger_overview, ranking, summarize, trend, LedgerOverview, TrendSelection, UsageSummary,
};

// =============================================================================
// Re-exports - Catalog, retrieval, validation
// =============================================================================

pub use catalog::{school_resources, Dataset, DatasetCatalog, DatasetKind, SourceLocator};
pub use source::Fetcher;
pub use validation::{validate, validate_ledger, validate_table};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
