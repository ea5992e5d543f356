//! Header row discovery.
//!
//! Spreadsheets carry title and banner rows of unknown length above the real
//! header, so the header is found by content rather than by position: the
//! first row holding a cell that matches a marker wins. Marker families are
//! tried in priority order, grouping marker first, because a grid containing
//! the grouping marker must be read as transposed even if it also mentions
//! months somewhere.

use crate::error::NormalizeError;
use crate::models::{Grid, HeaderRow};

/// How a marker token is compared with a trimmed, case-folded cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerMatch {
    /// Cell must equal the token.
    Exact,
    /// Cell must contain the token.
    Contains,
}

/// Which schema family a marker identifies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerFamily {
    /// Explicit grouping column, signals the transposed layout.
    Grouping,
    /// Month axis column, signals the row-oriented layout.
    MonthAxis,
}

/// A header marker: a lower-case token and its matching rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Marker {
    pub family: MarkerFamily,
    pub token: &'static str,
    pub matching: MarkerMatch,
}

impl Marker {
    pub const GROUPING: Marker = Marker {
        family: MarkerFamily::Grouping,
        token: "group",
        matching: MarkerMatch::Exact,
    };

    pub const MONTH_AXIS: Marker = Marker {
        family: MarkerFamily::MonthAxis,
        token: "months",
        matching: MarkerMatch::Contains,
    };

    /// Markers in the order they are tried.
    pub const PRIORITY: [Marker; 2] = [Marker::GROUPING, Marker::MONTH_AXIS];

    pub fn matches(&self, cell: &str) -> bool {
        let folded = cell.trim().to_lowercase();
        match self.matching {
            MarkerMatch::Exact => folded == self.token,
            MarkerMatch::Contains => folded.contains(self.token),
        }
    }

    /// First `(row, column)` whose cell matches this marker.
    pub fn find(&self, grid: &Grid) -> Option<(usize, usize)> {
        grid.rows().iter().enumerate().find_map(|(row, cells)| {
            cells
                .iter()
                .position(|cell| self.matches(cell))
                .map(|column| (row, column))
        })
    }
}

/// A located header with the marker that selected it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMatch {
    pub header: HeaderRow,
    pub marker: Marker,
    /// Column of the first matching cell in the header row.
    pub marker_column: usize,
}

/// Locate the header row, trying each marker family in priority order.
pub fn locate_header(grid: &Grid) -> Result<HeaderMatch, NormalizeError> {
    for marker in Marker::PRIORITY {
        if let Some((row, column)) = marker.find(grid) {
            if let Some(header) = HeaderRow::from_grid(grid, row) {
                return Ok(HeaderMatch {
                    header,
                    marker,
                    marker_column: column,
                });
            }
        }
    }

    Err(NormalizeError::HeaderNotFound {
        markers: Marker::PRIORITY
            .iter()
            .map(|m| m.token)
            .collect::<Vec<_>>()
            .join(", "),
    })
}
