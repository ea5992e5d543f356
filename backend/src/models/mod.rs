//! Domain models for the normalization pipeline.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Grid`] - Raw string cells as produced by the tokenizer
//! - [`HeaderRow`] - The row that defines series identity
//! - [`LayoutKind`] - Row-oriented or transposed source layout
//! - [`PeriodRecord`] / [`NormalizedTable`] - Usage pipeline output
//! - [`LedgerRecord`] / [`LedgerPeriod`] - Newspaper ledger output
//! - [`CellWarning`] - Partly or non-numeric cell reported in strict mode

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

/// Key holding the period (or metric) label in serialized records.
pub const LABEL_FIELD: &str = "month";

// =============================================================================
// Grid
// =============================================================================

/// Rectangular-ish grid of raw cells, row-major.
///
/// Rows may be ragged: a cell past a row's physical length is simply absent.
/// The grid is never mutated once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Grid {
    rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self { rows }
    }

    /// Build a grid from anything that yields rows of string-like cells.
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(Into::into).collect())
                .collect(),
        }
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn row(&self, index: usize) -> Option<&[String]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Raw cell at `(row, column)`, `None` past the row's length.
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(column))
            .map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

// =============================================================================
// Header & Layout
// =============================================================================

/// The grid row selected as defining column semantics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderRow {
    /// Index of the row in the grid.
    pub index: usize,
    /// Trimmed cell labels, one per physical cell.
    pub labels: Vec<String>,
}

impl HeaderRow {
    pub fn from_grid(grid: &Grid, index: usize) -> Option<Self> {
        let row = grid.row(index)?;
        Some(Self {
            index,
            labels: row.iter().map(|c| c.trim().to_string()).collect(),
        })
    }
}

/// How the source sheet lays out its series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutKind {
    /// One header row, each following row is one period.
    RowOriented,
    /// Rows are entities under a grouping column; pivoted on output.
    Transposed,
}

// =============================================================================
// Usage table
// =============================================================================

/// One row of the normalized table: a label plus one value per series.
///
/// Serializes as a flat object `{ "month": label, "<series>": value, ... }`
/// with series keys in table order.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRecord {
    pub label: String,
    pub values: Vec<(String, f64)>,
}

impl PeriodRecord {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, series: impl Into<String>, value: f64) -> Self {
        self.values.push((series.into(), value));
        self
    }

    /// Value for `series`, or `None` if the record has no such key.
    pub fn get(&self, series: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(name, _)| name == series)
            .map(|(_, v)| *v)
    }

    /// Value for `series`, defaulting to zero.
    pub fn value(&self, series: &str) -> f64 {
        self.get(series).unwrap_or(0.0)
    }

    /// Sum across all series of this record.
    pub fn total(&self) -> f64 {
        self.values.iter().map(|(_, v)| v).sum()
    }
}

impl Serialize for PeriodRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry(LABEL_FIELD, &self.label)?;
        for (series, value) in &self.values {
            map.serialize_entry(series, value)?;
        }
        map.end()
    }
}

/// Ordered period records plus the ordered series identifiers.
///
/// Every record carries exactly one value per entry in `series`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedTable {
    pub records: Vec<PeriodRecord>,
    pub series: Vec<String>,
}

impl NormalizedTable {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.series.is_empty()
    }

    /// Labels of all records, in order.
    pub fn labels(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.label.as_str()).collect()
    }

    /// Check that every record has a value for every series and nothing else.
    pub fn is_consistent(&self) -> bool {
        self.records.iter().all(|r| {
            r.values.len() == self.series.len()
                && r.values
                    .iter()
                    .zip(&self.series)
                    .all(|((name, _), series)| name == series)
        })
    }
}

// =============================================================================
// Newspaper ledger
// =============================================================================

/// One newspaper line of a monthly ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerRecord {
    pub name: String,
    pub total_copies: f64,
    pub total_price: f64,
}

/// A month of ledger records with its totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerPeriod {
    pub period: String,
    pub total_copies: f64,
    pub total_price: f64,
    pub records: Vec<LedgerRecord>,
}

impl LedgerPeriod {
    pub fn from_records(period: impl Into<String>, records: Vec<LedgerRecord>) -> Self {
        let total_copies = records.iter().map(|r| r.total_copies).sum();
        let total_price = records.iter().map(|r| r.total_price).sum();
        Self {
            period: period.into(),
            total_copies,
            total_price,
            records,
        }
    }
}

// =============================================================================
// Strict-mode diagnostics
// =============================================================================

/// A numeric cell that was not cleanly numeric, read as its leading number
/// or as zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellWarning {
    /// Grid row of the offending cell.
    pub row: usize,
    /// Grid column of the offending cell.
    pub column: usize,
    /// Header label of the column.
    pub header: String,
    /// Raw cell content.
    pub value: String,
}
