//! Newspaper ledger normalization.
//!
//! Monthly newspaper bills have noisy, sometimes two-line headers and no
//! stable layout from one month to the next. The header is found with a
//! three-tier search:
//!
//! 1. Within the first rows, a row whose joined text mentions both a price
//!    and a day count.
//! 2. The row right after a row whose first cell is exactly `Date`.
//! 3. A fixed row position.
//!
//! The tier is reported alongside the records so callers can flag guesses:
//! a wrong header silently mislabels a whole month.

use serde::{Deserialize, Serialize};

use super::cells::{label, CellReader};
use super::filter::is_ledger_name;
use crate::error::NormalizeError;
use crate::models::{CellWarning, Grid, LedgerPeriod, LedgerRecord};

const PRICE_MARKER: &str = "price";
const DAYS_MARKER: &str = "days";
const DATE_MARKER: &str = "Date";

/// Options for ledger normalization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerOptions {
    /// Number of leading rows searched for the price/days header
    pub scan_rows: usize,

    /// Row used when neither marker search succeeds
    pub fallback_row: usize,

    /// Report malformed numeric cells as warnings
    #[serde(default)]
    pub strict: bool,
}

impl Default for LedgerOptions {
    fn default() -> Self {
        Self {
            scan_rows: 10,
            fallback_row: 2,
            strict: false,
        }
    }
}

/// Which search tier produced the ledger header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderTier {
    PriceAndDays,
    DateMarker,
    FixedPosition,
}

impl HeaderTier {
    /// True for the tiers that guess rather than recognise the header.
    pub fn is_fallback(self) -> bool {
        !matches!(self, HeaderTier::PriceAndDays)
    }
}

/// Ledger header row and the tier that found it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerHeader {
    pub index: usize,
    pub tier: HeaderTier,
}

/// Columns holding the newspaper name, copy count and billed price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerColumns {
    pub name: usize,
    pub copies: Option<usize>,
    pub price: Option<usize>,
}

/// Outcome of normalizing one ledger grid
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerNormalization {
    pub period: LedgerPeriod,
    pub header: Option<LedgerHeader>,
    pub columns: Option<LedgerColumns>,
    pub warnings: Vec<CellWarning>,
    #[serde(skip)]
    pub missing_header: Option<NormalizeError>,
}

/// Locate the ledger header row.
pub fn locate_ledger_header(
    grid: &Grid,
    options: &LedgerOptions,
) -> Result<LedgerHeader, NormalizeError> {
    let priced = grid
        .rows()
        .iter()
        .take(options.scan_rows)
        .position(|row| {
            let joined = row.join(" ").to_lowercase();
            joined.contains(PRICE_MARKER) && joined.contains(DAYS_MARKER)
        });
    if let Some(index) = priced {
        return Ok(LedgerHeader {
            index,
            tier: HeaderTier::PriceAndDays,
        });
    }

    let dated = grid
        .rows()
        .iter()
        .position(|row| row.first().is_some_and(|c| c.trim() == DATE_MARKER));
    if let Some(index) = dated {
        if index + 1 < grid.len() {
            return Ok(LedgerHeader {
                index: index + 1,
                tier: HeaderTier::DateMarker,
            });
        }
    }

    if options.fallback_row < grid.len() {
        return Ok(LedgerHeader {
            index: options.fallback_row,
            tier: HeaderTier::FixedPosition,
        });
    }

    Err(NormalizeError::HeaderNotFound {
        markers: format!("{} + {}, {}", PRICE_MARKER, DAYS_MARKER, DATE_MARKER),
    })
}

/// Header labels, with blank cells filled from the row above.
///
/// Merged header cells export as a label on one line and blanks on the
/// other, so a blank header cell borrows the label directly above it.
pub fn merged_labels(grid: &Grid, header_index: usize) -> Vec<String> {
    let width = grid.row(header_index).map_or(0, <[String]>::len);
    (0..width)
        .map(|column| {
            let own = label(grid.cell(header_index, column));
            if own.is_empty() && header_index > 0 {
                label(grid.cell(header_index - 1, column))
            } else {
                own
            }
        })
        .collect()
}

/// Pick the name, copies and price columns from header labels.
pub fn resolve_columns(labels: &[String]) -> LedgerColumns {
    let folded: Vec<String> = labels.iter().map(|l| l.to_lowercase()).collect();
    let find = |pred: &dyn Fn(&str) -> bool| folded.iter().position(|l| pred(l.as_str()));

    let name = find(&|l: &str| l.contains("name") || l.contains("newspaper") || l.contains("paper"))
        .unwrap_or_else(|| match folded.first() {
            Some(first) if is_serial_header(first) => 1,
            _ => 0,
        });

    let copies = find(&|l: &str| l.contains("copies"))
        .or_else(|| find(&|l: &str| l.contains(DAYS_MARKER)));

    let price = find(&|l: &str| {
        l.contains("total") && (l.contains(PRICE_MARKER) || l.contains("amount"))
    })
        .or_else(|| {
            folded
                .iter()
                .rposition(|l| l.contains(PRICE_MARKER) || l.contains("amount"))
        })
        .filter(|column| Some(*column) != copies);

    LedgerColumns {
        name,
        copies,
        price,
    }
}

fn is_serial_header(label: &str) -> bool {
    let compact: String = label.chars().filter(|c| c.is_alphanumeric()).collect();
    matches!(compact.as_str(), "sno" | "srno" | "slno" | "no" | "serial" | "serialno")
}

/// Normalize a ledger grid into one period.
///
/// Repeated names are merged by summing copies and price.
pub fn normalize_ledger(grid: &Grid, period: &str, options: &LedgerOptions) -> LedgerNormalization {
    let header = match locate_ledger_header(grid, options) {
        Ok(header) => header,
        Err(err) => {
            return LedgerNormalization {
                period: LedgerPeriod::from_records(period, Vec::new()),
                header: None,
                columns: None,
                warnings: Vec::new(),
                missing_header: Some(err),
            }
        }
    };

    let labels = merged_labels(grid, header.index);
    let columns = resolve_columns(&labels);
    let header_label = |column: usize| labels.get(column).cloned().unwrap_or_default();

    let mut cells = CellReader::new(options.strict);
    let mut records: Vec<LedgerRecord> = Vec::new();

    for row in header.index + 1..grid.len() {
        let name = label(grid.cell(row, columns.name));
        if !is_ledger_name(&name) {
            continue;
        }

        let total_copies = columns
            .copies
            .map_or(0.0, |c| cells.number(grid, row, c, &header_label(c)))
            .max(0.0);
        let total_price = columns
            .price
            .map_or(0.0, |c| cells.number(grid, row, c, &header_label(c)))
            .max(0.0);

        match records.iter_mut().find(|r| r.name == name) {
            Some(existing) => {
                existing.total_copies += total_copies;
                existing.total_price += total_price;
            }
            None => records.push(LedgerRecord {
                name,
                total_copies,
                total_price,
            }),
        }
    }

    LedgerNormalization {
        period: LedgerPeriod::from_records(period, records),
        header: Some(header),
        columns: Some(columns),
        warnings: cells.into_warnings(),
        missing_header: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    fn march_bill() -> Grid {
        Grid::from_rows(vec![
            vec!["Knowledge Center"],
            vec!["Newspaper Bill - March 2025"],
            vec!["S.No", "Name of Newspaper", "Price per copy", "No. of Days", "Total Price"],
            vec!["1", "The Hindu", "10", "31", "310"],
            vec!["2", "Dainik Jagran", "5", "30", "150"],
            vec!["", "Hindi Total", "", "30", "150"],
            vec!["3", "Economic Times", "12", "-", "1,116"],
            vec!["", "Grand Total", "", "", "1,576"],
        ])
    }

    #[test]
    fn test_tier_one_price_and_days() {
        let header = locate_ledger_header(&march_bill(), &LedgerOptions::default()).unwrap();
        assert_eq!(header.index, 2);
        assert_eq!(header.tier, HeaderTier::PriceAndDays);
        assert!(!header.tier.is_fallback());
    }

    #[test]
    fn test_tier_one_limited_to_scan_rows() {
        let mut rows: Vec<Vec<&str>> = (0..12).map(|_| vec!["banner"]).collect();
        rows.push(vec!["Name", "Days", "Price"]);
        let grid = Grid::from_rows(rows);

        let header = locate_ledger_header(&grid, &LedgerOptions::default()).unwrap();
        assert_eq!(header.tier, HeaderTier::FixedPosition);
        assert_eq!(header.index, 2);
    }

    #[test]
    fn test_tier_two_date_marker() {
        let grid = Grid::from_rows(vec![
            vec!["April 2025"],
            vec!["Date", "01-04-2025"],
            vec!["Newspaper", "Copies", "Amount"],
            vec!["The Hindu", "30", "300"],
        ]);
        let header = locate_ledger_header(&grid, &LedgerOptions::default()).unwrap();
        assert_eq!(header.index, 2);
        assert_eq!(header.tier, HeaderTier::DateMarker);
        assert!(header.tier.is_fallback());

        let result = normalize_ledger(&grid, "April 2025", &LedgerOptions::default());
        assert_eq!(result.period.records.len(), 1);
        assert_eq!(result.period.records[0].total_copies, 30.0);
        assert_eq!(result.period.records[0].total_price, 300.0);
    }

    #[test]
    fn test_tier_two_requires_following_row() {
        let grid = Grid::from_rows(vec![vec!["x"], vec!["y"], vec!["Date"]]);
        let header = locate_ledger_header(&grid, &LedgerOptions::default()).unwrap();
        assert_eq!(header.tier, HeaderTier::FixedPosition);
    }

    #[test]
    fn test_tier_three_fixed_position() {
        let grid = Grid::from_rows(vec![
            vec!["Bill"],
            vec!["May"],
            vec!["Paper", "Copies", "Amount"],
            vec!["Amar Ujala", "31", "155"],
        ]);
        let result = normalize_ledger(&grid, "May 2025", &LedgerOptions::default());
        let header = result.header.unwrap();
        assert_eq!(header.tier, HeaderTier::FixedPosition);
        assert_eq!(header.index, 2);
        assert_eq!(result.period.total_price, 155.0);
    }

    #[test]
    fn test_no_tier_applies() {
        let grid = Grid::from_rows(vec![vec!["only"], vec!["two rows"]]);
        let result = normalize_ledger(&grid, "June 2025", &LedgerOptions::default());
        assert!(result.period.records.is_empty());
        assert!(result.missing_header.is_some());
        assert_eq!(result.period.period, "June 2025");
    }

    #[test]
    fn test_records_and_filtering() {
        let result = normalize_ledger(&march_bill(), "March 2025", &LedgerOptions::default());
        let names: Vec<&str> = result.period.records.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["The Hindu", "Dainik Jagran", "Economic Times"]);
        assert_eq!(result.period.records[2].total_copies, 0.0);
        assert_eq!(result.period.records[2].total_price, 1116.0);
        assert_eq!(result.period.total_price, 1576.0);
        assert_eq!(result.period.total_copies, 61.0);
    }

    #[test]
    fn test_resolve_columns() {
        let columns = resolve_columns(&strings(&[
            "S.No",
            "Name of Newspaper",
            "Price per copy",
            "No. of Days",
            "Total Price",
        ]));
        assert_eq!(columns.name, 1);
        assert_eq!(columns.copies, Some(3));
        assert_eq!(columns.price, Some(4));

        let serial_only = resolve_columns(&strings(&["Sr. No.", "Title", "Days", "Price"]));
        assert_eq!(serial_only.name, 1);
        assert_eq!(serial_only.price, Some(3));
    }

    #[test]
    fn test_merged_header_borrows_label_above() {
        let grid = Grid::from_rows(vec![
            vec!["", "", "Total Price"],
            vec!["Newspaper", "No. of Days", "", "Price/copy"],
            vec!["The Tribune", "31", "465", "15"],
        ]);
        assert_eq!(
            merged_labels(&grid, 1),
            vec!["Newspaper", "No. of Days", "Total Price", "Price/copy"]
        );

        let result = normalize_ledger(&grid, "July 2025", &LedgerOptions::default());
        assert_eq!(result.header.unwrap().index, 1);
        assert_eq!(result.columns.unwrap().price, Some(2));
        assert_eq!(result.period.records[0].total_price, 465.0);
        assert_eq!(result.period.records[0].total_copies, 31.0);
    }

    #[test]
    fn test_duplicate_names_are_merged() {
        let grid = Grid::from_rows(vec![
            vec!["Newspaper", "Days", "Total Price"],
            vec!["The Hindu", "31", "310"],
            vec!["The Hindu", "31", "310"],
        ]);
        let result = normalize_ledger(&grid, "August 2025", &LedgerOptions::default());
        assert_eq!(result.period.records.len(), 1);
        assert_eq!(result.period.records[0].total_copies, 62.0);
        assert_eq!(result.period.records[0].total_price, 620.0);
    }

    #[test]
    fn test_negative_amounts_clamped() {
        let grid = Grid::from_rows(vec![
            vec!["Newspaper", "Days", "Total Price"],
            vec!["Hindustan Times", "-3", "-90"],
        ]);
        let result = normalize_ledger(&grid, "September 2025", &LedgerOptions::default());
        assert_eq!(result.period.records[0].total_copies, 0.0);
        assert_eq!(result.period.records[0].total_price, 0.0);
    }

    #[test]
    fn test_strict_mode_warnings() {
        let grid = Grid::from_rows(vec![
            vec!["Newspaper", "Days", "Total Price"],
            vec!["The Statesman", "thirty", "300"],
        ]);
        let options = LedgerOptions {
            strict: true,
            ..LedgerOptions::default()
        };
        let result = normalize_ledger(&grid, "October 2025", &options);
        assert_eq!(result.warnings.len(), 1);
        assert_eq!(result.warnings[0].header, "Days");
    }
}
