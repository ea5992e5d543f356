//! Layout classification and the transposed-sheet pivot.
//!
//! The layout is decided once, from the marker that located the header, and
//! carried as a [`Layout`] value. Transposed sheets list entities as rows
//! under a grouping column and metrics as columns; [`pivot`] turns them
//! around so metrics become period records and entities become series.

use super::cells::{label, CellReader};
use super::filter::{first_seen, is_data_label, is_series_header};
use super::header::{HeaderMatch, MarkerFamily};
use crate::models::{Grid, HeaderRow, LayoutKind, NormalizedTable, PeriodRecord};

/// Classified source layout with the columns that drive it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    RowOriented { header: HeaderRow, label_column: usize },
    Transposed { header: HeaderRow, group_column: usize },
}

impl Layout {
    pub fn kind(&self) -> LayoutKind {
        match self {
            Layout::RowOriented { .. } => LayoutKind::RowOriented,
            Layout::Transposed { .. } => LayoutKind::Transposed,
        }
    }

    pub fn header(&self) -> &HeaderRow {
        match self {
            Layout::RowOriented { header, .. } | Layout::Transposed { header, .. } => header,
        }
    }
}

/// Decide the layout from the marker family that found the header.
pub fn classify(found: HeaderMatch) -> Layout {
    match found.marker.family {
        MarkerFamily::Grouping => Layout::Transposed {
            header: found.header,
            group_column: found.marker_column,
        },
        MarkerFamily::MonthAxis => Layout::RowOriented {
            header: found.header,
            label_column: found.marker_column,
        },
    }
}

/// Pivot a transposed sheet.
///
/// Series are the grouping column's values below the header, in first-seen
/// order, skipping blanks, aggregate rows and names that would collide
/// with the record label field. Each remaining header cell
/// becomes one record whose value for a series is read from the first row
/// carrying that series name.
pub fn pivot(
    grid: &Grid,
    header: &HeaderRow,
    group_column: usize,
    cells: &mut CellReader,
) -> NormalizedTable {
    let groups: Vec<(String, usize)> = first_seen(
        (header.index + 1..grid.len()).filter_map(|row| {
            let name = label(grid.cell(row, group_column));
            (is_data_label(&name) && is_series_header(&name)).then_some((name, row))
        }),
        |(name, _)| name.as_str(),
    );

    let metrics: Vec<(String, usize)> = first_seen(
        header
            .labels
            .iter()
            .enumerate()
            .filter(|(column, name)| *column != group_column && !name.is_empty())
            .map(|(column, name)| (name.clone(), column)),
        |(name, _)| name.as_str(),
    );

    let records = metrics
        .iter()
        .filter(|(metric, _)| is_data_label(metric))
        .map(|(metric, column)| PeriodRecord {
            label: metric.clone(),
            values: groups
                .iter()
                .map(|(group, row)| (group.clone(), cells.number(grid, *row, *column, metric)))
                .collect(),
        })
        .collect();

    NormalizedTable {
        records,
        series: groups.into_iter().map(|(name, _)| name).collect(),
    }
}

/// Rebuild a grouping-column grid from a normalized table.
///
/// Inverse of [`pivot`]: the header is `group_label` followed by record
/// labels, then one row per series.
pub fn to_grouped_grid(table: &NormalizedTable, group_label: &str) -> Grid {
    let mut rows = Vec::with_capacity(table.series.len() + 1);

    let mut header = vec![group_label.to_string()];
    header.extend(table.records.iter().map(|r| r.label.clone()));
    rows.push(header);

    for series in &table.series {
        let mut row = vec![series.clone()];
        row.extend(table.records.iter().map(|r| format_number(r.value(series))));
        rows.push(row);
    }

    Grid::new(rows)
}

/// Render a number without a trailing `.0` for whole values.
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::header::locate_header;

    fn pivot_grid(grid: &Grid) -> NormalizedTable {
        match classify(locate_header(grid).unwrap()) {
            Layout::Transposed { header, group_column } => {
                pivot(grid, &header, group_column, &mut CellReader::new(false))
            }
            other => panic!("expected transposed layout, got {:?}", other.kind()),
        }
    }

    #[test]
    fn test_classify_by_marker_family() {
        let grouped = Grid::from_rows(vec![vec!["Group", "Q1"]]);
        assert_eq!(
            classify(locate_header(&grouped).unwrap()).kind(),
            LayoutKind::Transposed
        );

        let monthly = Grid::from_rows(vec![vec!["Months", "A"]]);
        assert_eq!(
            classify(locate_header(&monthly).unwrap()).kind(),
            LayoutKind::RowOriented
        );
    }

    #[test]
    fn test_school_wise_scenario() {
        let grid = Grid::from_rows(vec![
            vec!["Group", "Q1", "Q2"],
            vec!["Eng", "100", "200"],
            vec!["Law", "50,000", "10"],
        ]);
        let table = pivot_grid(&grid);

        assert_eq!(table.series, vec!["Eng", "Law"]);
        assert_eq!(
            table.records,
            vec![
                PeriodRecord::new("Q1").with_value("Eng", 100.0).with_value("Law", 50000.0),
                PeriodRecord::new("Q2").with_value("Eng", 200.0).with_value("Law", 10.0),
            ]
        );
    }

    #[test]
    fn test_group_column_not_first() {
        let grid = Grid::from_rows(vec![
            vec!["Downloads", "Group", "Searches"],
            vec!["5", "Eng", "7"],
        ]);
        let table = pivot_grid(&grid);
        assert_eq!(table.series, vec!["Eng"]);
        assert_eq!(table.labels(), vec!["Downloads", "Searches"]);
        assert_eq!(table.records[1].value("Eng"), 7.0);
    }

    #[test]
    fn test_total_rows_and_columns_dropped() {
        let grid = Grid::from_rows(vec![
            vec!["Group", "Q1", "", "Total"],
            vec!["Eng", "1", "x", "1"],
            vec!["", "9", "", ""],
            vec!["TOTAL ", "1", "", "1"],
        ]);
        let table = pivot_grid(&grid);
        assert_eq!(table.series, vec!["Eng"]);
        assert_eq!(table.labels(), vec!["Q1"]);
    }

    #[test]
    fn test_values_follow_series_rows_not_positions() {
        // A blank group row sits between schools; values must stay aligned.
        let grid = Grid::from_rows(vec![
            vec!["Group", "Q1"],
            vec!["", "999"],
            vec!["Eng", "1"],
            vec!["Law", "2"],
        ]);
        let table = pivot_grid(&grid);
        assert_eq!(table.records[0].value("Eng"), 1.0);
        assert_eq!(table.records[0].value("Law"), 2.0);
    }

    #[test]
    fn test_duplicate_group_keeps_first_row() {
        let grid = Grid::from_rows(vec![
            vec!["Group", "Q1"],
            vec!["Eng", "1"],
            vec!["Eng", "2"],
        ]);
        let table = pivot_grid(&grid);
        assert_eq!(table.series, vec!["Eng"]);
        assert_eq!(table.records[0].value("Eng"), 1.0);
    }

    #[test]
    fn test_transpose_round_trip() {
        let grid = Grid::from_rows(vec![
            vec!["Group", "Downloads", "Searches", "Sessions"],
            vec!["Engineering", "1,200", "340", "-"],
            vec!["Law", "15", "2.5", "8"],
            vec!["Business", "0", "77", "12"],
        ]);
        let table = pivot_grid(&grid);

        let rebuilt = to_grouped_grid(&table, "Group");
        assert_eq!(rebuilt.row(0).unwrap(), grid.row(0).unwrap());
        assert_eq!(rebuilt.row(1).unwrap(), &["Engineering", "1200", "340", "0"]);
        assert_eq!(rebuilt.row(2).unwrap(), &["Law", "15", "2.5", "8"]);

        assert_eq!(pivot_grid(&rebuilt), table);
    }

    #[test]
    fn test_label_field_never_becomes_a_series() {
        let grid = Grid::from_rows(vec![
            vec!["Group", "Q1"],
            vec!["Eng", "100"],
            vec!["Month", "7"],
            vec!["Monthly avg", "8"],
        ]);
        let table = pivot_grid(&grid);

        assert_eq!(table.series, vec!["Eng"]);
        let value = serde_json::to_value(&table.records[0]).unwrap();
        assert_eq!(value, serde_json::json!({ "month": "Q1", "Eng": 100.0 }));
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(50000.0), "50000");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(-3.0), "-3");
    }
}
