//! Usage table assembly.
//!
//! Combines header discovery, layout classification, cell coercion and
//! filtering into a [`NormalizedTable`]. The same grid always produces the
//! same table; nothing here depends on time or external state.

use serde::{Deserialize, Serialize};

use super::cells::{label, CellReader};
use super::filter::{first_seen, is_data_label, is_series_header};
use super::header::locate_header;
use super::layout::{classify, pivot, Layout};
use crate::error::NormalizeError;
use crate::models::{CellWarning, Grid, HeaderRow, LayoutKind, NormalizedTable, PeriodRecord};

/// Options for usage normalization
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// Report malformed numeric cells as warnings
    #[serde(default)]
    pub strict: bool,
}

/// Outcome of normalizing one grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageNormalization {
    /// The normalized table (empty when no header was found)
    pub table: NormalizedTable,

    /// Layout the grid was read with
    pub layout: Option<LayoutKind>,

    /// Grid index of the header row
    pub header_row: Option<usize>,

    /// Partly or non-numeric cells, collected in strict mode only
    pub warnings: Vec<CellWarning>,

    /// Set when no header row could be located
    #[serde(skip)]
    pub missing_header: Option<NormalizeError>,
}

impl UsageNormalization {
    fn not_found(err: NormalizeError) -> Self {
        Self {
            table: NormalizedTable::empty(),
            layout: None,
            header_row: None,
            warnings: Vec::new(),
            missing_header: Some(err),
        }
    }
}

/// Normalize a usage grid.
///
/// An empty grid, or one without any recognised header, yields an empty
/// table rather than an error.
///
/// # Example
/// ```
/// use usage_sheets::models::Grid;
/// use usage_sheets::transform::{normalize_grid, NormalizeOptions};
///
/// let grid = Grid::from_rows(vec![
///     vec!["Banner"],
///     vec!["Months", "A", "B"],
///     vec!["Jan", "10", "-"],
///     vec!["Total", "10", "0"],
/// ]);
/// let result = normalize_grid(&grid, &NormalizeOptions::default());
///
/// assert_eq!(result.header_row, Some(1));
/// assert_eq!(result.table.series, vec!["A", "B"]);
/// assert_eq!(result.table.records.len(), 1);
/// assert_eq!(result.table.records[0].value("B"), 0.0);
/// ```
pub fn normalize_grid(grid: &Grid, options: &NormalizeOptions) -> UsageNormalization {
    let found = match locate_header(grid) {
        Ok(found) => found,
        Err(err) => return UsageNormalization::not_found(err),
    };

    let layout = classify(found);
    let mut cells = CellReader::new(options.strict);
    let table = match &layout {
        Layout::RowOriented {
            header,
            label_column,
        } => assemble_rows(grid, header, *label_column, &mut cells),
        Layout::Transposed {
            header,
            group_column,
        } => pivot(grid, header, *group_column, &mut cells),
    };

    UsageNormalization {
        table,
        layout: Some(layout.kind()),
        header_row: Some(layout.header().index),
        warnings: cells.into_warnings(),
        missing_header: None,
    }
}

/// Assemble a row-oriented sheet: header cells are series, each following
/// row is one period.
pub fn assemble_rows(
    grid: &Grid,
    header: &HeaderRow,
    label_column: usize,
    cells: &mut CellReader,
) -> NormalizedTable {
    let series: Vec<(String, usize)> = first_seen(
        header
            .labels
            .iter()
            .enumerate()
            .filter(|(column, name)| *column != label_column && is_series_header(name))
            .map(|(column, name)| (name.clone(), column)),
        |(name, _)| name.as_str(),
    );

    let mut records = Vec::new();
    for row in header.index + 1..grid.len() {
        let period = label(grid.cell(row, label_column));
        if !is_data_label(&period) {
            continue;
        }

        records.push(PeriodRecord {
            values: series
                .iter()
                .map(|(name, column)| (name.clone(), cells.number(grid, row, *column, name)))
                .collect(),
            label: period,
        });
    }

    NormalizedTable {
        records,
        series: series.into_iter().map(|(name, _)| name).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::layout::to_grouped_grid;

    fn normalize(grid: &Grid) -> NormalizedTable {
        normalize_grid(grid, &NormalizeOptions::default()).table
    }

    #[test]
    fn test_banner_scenario() {
        let grid = Grid::from_rows(vec![
            vec!["Banner"],
            vec!["Months", "A", "B"],
            vec!["Jan", "10", "-"],
            vec!["Total", "10", "0"],
        ]);
        let result = normalize_grid(&grid, &NormalizeOptions::default());

        assert_eq!(result.header_row, Some(1));
        assert_eq!(result.layout, Some(LayoutKind::RowOriented));
        assert_eq!(result.table.series, vec!["A", "B"]);
        assert_eq!(
            result.table.records,
            vec![PeriodRecord::new("Jan").with_value("A", 10.0).with_value("B", 0.0)]
        );
    }

    #[test]
    fn test_serialized_shape() {
        let grid = Grid::from_rows(vec![vec!["Months", "A"], vec!["Jan", "1,234"]]);
        let value = serde_json::to_value(normalize(&grid)).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "records": [{ "month": "Jan", "A": 1234.0 }], "series": ["A"] })
        );
    }

    #[test]
    fn test_series_order_preserved() {
        let grid = Grid::from_rows(vec![
            vec!["Months", "Zeta", "", "Alpha", "Month Total", "Mid"],
            vec!["Jan", "1", "2", "3", "4", "5"],
        ]);
        let table = normalize(&grid);
        assert_eq!(table.series, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(table.records[0].values.len(), 3);
    }

    #[test]
    fn test_label_column_need_not_be_first() {
        let grid = Grid::from_rows(vec![vec!["A", "Months", "B"], vec!["1", "Feb", "2"]]);
        let table = normalize(&grid);
        assert_eq!(table.series, vec!["A", "B"]);
        assert_eq!(table.records[0].label, "Feb");
        assert_eq!(table.records[0].value("B"), 2.0);
    }

    #[test]
    fn test_total_rows_never_appear() {
        let grid = Grid::from_rows(vec![
            vec!["Months", "A"],
            vec!["Jan", "1"],
            vec!["TOTAL ", "1"],
            vec!["total", "1"],
            vec!["Feb", "2"],
        ]);
        assert_eq!(normalize(&grid).labels(), vec!["Jan", "Feb"]);
    }

    #[test]
    fn test_short_rows_default_to_zero() {
        let grid = Grid::from_rows(vec![vec!["Months", "A", "B", "C"], vec!["Jan", "4"]]);
        let table = normalize(&grid);
        assert!(table.is_consistent());
        assert_eq!(table.records[0].value("C"), 0.0);
    }

    #[test]
    fn test_rows_without_label_dropped() {
        let grid = Grid::from_rows(vec![
            vec!["Months", "A"],
            vec!["", "4"],
            vec!["-", "4"],
            vec!["Mar", "4"],
        ]);
        assert_eq!(normalize(&grid).labels(), vec!["Mar"]);
    }

    #[test]
    fn test_month_cell_is_kept_as_text() {
        let grid = Grid::from_rows(vec![vec!["Months", "A"], vec!["2025", "1"]]);
        assert_eq!(normalize(&grid).records[0].label, "2025");
    }

    #[test]
    fn test_empty_grid_is_empty_table() {
        let result = normalize_grid(&Grid::default(), &NormalizeOptions::default());
        assert!(result.table.is_empty());
        assert!(result.missing_header.is_some());
    }

    #[test]
    fn test_missing_header_is_empty_table() {
        let grid = Grid::from_rows(vec![vec!["Name", "Value"], vec!["x", "1"]]);
        let result = normalize_grid(&grid, &NormalizeOptions::default());
        assert_eq!(result.table, NormalizedTable::empty());
        assert_eq!(result.layout, None);
        assert!(matches!(
            result.missing_header,
            Some(NormalizeError::HeaderNotFound { .. })
        ));
    }

    #[test]
    fn test_idempotent() {
        let grid = Grid::from_rows(vec![
            vec!["Usage Report"],
            vec!["Months", "IEEE", "JSTOR"],
            vec!["Jan", "1,000", "abc"],
            vec!["Feb", "-", "30"],
        ]);
        let options = NormalizeOptions::default();
        assert_eq!(normalize_grid(&grid, &options), normalize_grid(&grid, &options));
    }

    #[test]
    fn test_strict_mode_reports_without_changing_table() {
        let grid = Grid::from_rows(vec![vec!["Months", "A", "B"], vec!["Jan", "n/a", "5"]]);

        let lenient = normalize_grid(&grid, &NormalizeOptions::default());
        let strict = normalize_grid(&grid, &NormalizeOptions { strict: true });

        assert_eq!(lenient.table, strict.table);
        assert!(lenient.warnings.is_empty());
        assert_eq!(strict.warnings.len(), 1);
        assert_eq!(strict.warnings[0].row, 1);
        assert_eq!(strict.warnings[0].column, 1);
        assert_eq!(strict.table.records[0].value("A"), 0.0);
    }

    #[test]
    fn test_leading_numbers_kept_and_reported() {
        let grid = Grid::from_rows(vec![
            vec!["Months", "Hit rate", "Views"],
            vec!["Jan", "45%", "12 views"],
        ]);
        let strict = normalize_grid(&grid, &NormalizeOptions { strict: true });

        assert_eq!(strict.table.records[0].value("Hit rate"), 45.0);
        assert_eq!(strict.table.records[0].value("Views"), 12.0);
        assert_eq!(strict.warnings.len(), 2);
        assert_eq!(strict.warnings[0].value, "45%");
    }

    #[test]
    fn test_transposed_dispatch_and_round_trip() {
        let grid = Grid::from_rows(vec![
            vec!["Jan 2026 School Wise"],
            vec!["Group", "Q1", "Q2"],
            vec!["Eng", "100", "200"],
            vec!["Law", "50,000", "10"],
        ]);
        let result = normalize_grid(&grid, &NormalizeOptions::default());
        assert_eq!(result.layout, Some(LayoutKind::Transposed));
        assert_eq!(result.header_row, Some(1));

        let rebuilt = to_grouped_grid(&result.table, "Group");
        assert_eq!(normalize(&rebuilt), result.table);
    }
}
