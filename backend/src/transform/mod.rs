//! Normalization module.
//!
//! This module turns a tokenized grid into a normalized table:
//! - Header: content-based header row discovery
//! - Layout: row-oriented vs transposed classification and pivot
//! - Cells: label/number coercion with sentinel handling
//! - Filter: aggregate rows and non-series columns
//! - Usage: table assembly for the usage pipeline
//! - Ledger: the newspaper ledger variant
//! - Pipeline: entry points over text, bytes, grids and datasets
//!
//! Data flows strictly forward:
//!
//! ```text
//! Grid → header → layout → cells → filter → assembled table
//! ```

pub mod cells;
pub mod filter;
pub mod header;
pub mod layout;
pub mod ledger;
pub mod pipeline;
pub mod usage;

pub use cells::{CellReader, NumericCell};
pub use header::{locate_header, HeaderMatch, Marker, MarkerFamily};
pub use layout::{classify, to_grouped_grid, Layout};
pub use ledger::{
    locate_ledger_header, normalize_ledger, HeaderTier, LedgerColumns, LedgerHeader,
    LedgerNormalization, LedgerOptions,
};
pub use pipeline::*;
pub use usage::{normalize_grid, NormalizeOptions, UsageNormalization};
