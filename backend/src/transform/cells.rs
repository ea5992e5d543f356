//! Cell coercion.
//!
//! Label cells are only trimmed. Value cells follow these rules, in order:
//!
//! 1. Trim whitespace.
//! 2. Empty or a bare dash (`-`, `- `) is exactly `0`.
//! 3. Strip thousands-separator commas and read the longest leading
//!    decimal: `"45%"` is `45`, `"12 views"` is `12`.
//! 4. A cell with no leading decimal at all is `0`.
//!
//! A malformed cell never fails the table. In strict mode [`CellReader`]
//! additionally records a [`CellWarning`] for every cell that was only
//! partly numeric or not numeric at all.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{CellWarning, Grid};

static DECIMAL_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(\d+\.?\d*|\.\d+)([eE][+-]?\d+)?").expect("decimal pattern is valid")
});

/// Outcome of reading a value cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NumericCell {
    /// Blank or dash placeholder for "no data".
    Sentinel,
    /// Parsed number.
    Number(f64),
    /// Leading number followed by other text (`"45%"`).
    Partial(f64),
    /// No leading number; read as zero.
    Malformed,
}

impl NumericCell {
    pub fn value(self) -> f64 {
        match self {
            NumericCell::Number(n) | NumericCell::Partial(n) => n,
            NumericCell::Sentinel | NumericCell::Malformed => 0.0,
        }
    }

    /// True for cells that were not cleanly numeric.
    pub fn is_suspect(self) -> bool {
        matches!(self, NumericCell::Partial(_) | NumericCell::Malformed)
    }
}

/// Trimmed label; absent cells are empty.
pub fn label(raw: Option<&str>) -> String {
    raw.map(str::trim).unwrap_or("").to_string()
}

/// True for the "no data" placeholders: empty, `-`, or `-` plus whitespace.
pub fn is_blank_sentinel(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-"
}

/// Classify a raw value cell.
pub fn read_number(raw: Option<&str>) -> NumericCell {
    let trimmed = raw.map(str::trim).unwrap_or("");
    if is_blank_sentinel(trimmed) {
        return NumericCell::Sentinel;
    }

    let digits = trimmed.replace(',', "");
    let Some(prefix) = DECIMAL_PREFIX_RE.find(&digits) else {
        return NumericCell::Malformed;
    };
    match prefix.as_str().parse::<f64>() {
        Ok(n) if !n.is_finite() => NumericCell::Malformed,
        Ok(n) if prefix.end() == digits.len() => NumericCell::Number(n),
        Ok(n) => NumericCell::Partial(n),
        Err(_) => NumericCell::Malformed,
    }
}

/// Numeric value of a raw cell with zero fallback.
///
/// # Example
/// ```
/// use usage_sheets::transform::cells::number;
///
/// assert_eq!(number(Some(" 1,234 ")), 1234.0);
/// assert_eq!(number(Some("- ")), 0.0);
/// assert_eq!(number(Some("45%")), 45.0);
/// ```
pub fn number(raw: Option<&str>) -> f64 {
    read_number(raw).value()
}

/// Reads numeric cells from a grid, collecting warnings in strict mode.
#[derive(Debug, Default)]
pub struct CellReader {
    strict: bool,
    warnings: Vec<CellWarning>,
}

impl CellReader {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    /// Numeric value at `(row, column)`; `header` names the column in warnings.
    pub fn number(&mut self, grid: &Grid, row: usize, column: usize, header: &str) -> f64 {
        let raw = grid.cell(row, column);
        let cell = read_number(raw);
        if self.strict && cell.is_suspect() {
            self.warnings.push(CellWarning {
                row,
                column,
                header: header.to_string(),
                value: raw.unwrap_or("").to_string(),
            });
        }
        cell.value()
    }

    pub fn into_warnings(self) -> Vec<CellWarning> {
        self.warnings
    }
}
