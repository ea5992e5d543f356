//! Predicates that drop spreadsheet artifacts.
//!
//! Aggregate rows ("Total"), the label column itself and blank columns are
//! present for human readers and must not become data.

use std::collections::HashSet;

use super::cells::is_blank_sentinel;

/// Case-folded label of aggregate rows.
pub const AGGREGATE_SENTINEL: &str = "total";

/// Term identifying the label axis in a header.
pub const LABEL_AXIS_TERM: &str = "month";

/// Minimum length of a ledger newspaper name.
pub const MIN_LEDGER_NAME_CHARS: usize = 3;

/// True when `label` names an aggregate row, e.g. `"Total"` or `"TOTAL "`.
pub fn is_aggregate(label: &str) -> bool {
    label.trim().to_lowercase() == AGGREGATE_SENTINEL
}

/// True for header labels naming the label axis (`"Months"`, `"Month"`).
pub fn is_label_axis(header: &str) -> bool {
    header.trim().to_lowercase().contains(LABEL_AXIS_TERM)
}

/// Header labels that become series in a row-oriented table.
pub fn is_series_header(header: &str) -> bool {
    !header.trim().is_empty() && !is_label_axis(header)
}

/// Period labels kept in the output: not blank and not an aggregate.
pub fn is_data_label(label: &str) -> bool {
    !is_blank_sentinel(label) && !is_aggregate(label)
}

/// Ledger rows that are real newspapers rather than section breaks or
/// summary lines.
pub fn is_ledger_name(name: &str) -> bool {
    let trimmed = name.trim();
    if trimmed.chars().count() < MIN_LEDGER_NAME_CHARS {
        return false;
    }
    let folded = trimmed.to_lowercase();
    !folded.contains("total") && !folded.contains("month")
}

/// Keep the first occurrence of every name, preserving order.
pub fn first_seen<I, T>(items: I, key: impl Fn(&T) -> &str) -> Vec<T>
where
    I: IntoIterator<Item = T>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(key(item).to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_any_case_and_padding() {
        assert!(is_aggregate("Total"));
        assert!(is_aggregate("TOTAL "));
        assert!(is_aggregate(" total"));
        assert!(!is_aggregate("Total Usage"));
    }

    #[test]
    fn test_label_axis_headers_are_not_series() {
        assert!(!is_series_header("Months"));
        assert!(!is_series_header("month"));
        assert!(!is_series_header("Month-wise"));
        assert!(!is_series_header("  "));
        assert!(is_series_header("IEEE Xplore"));
    }

    #[test]
    fn test_data_labels() {
        assert!(is_data_label("Jan"));
        assert!(!is_data_label(""));
        assert!(!is_data_label("-"));
        assert!(!is_data_label("Total"));
    }

    #[test]
    fn test_ledger_names() {
        assert!(is_ledger_name("The Hindu"));
        assert!(!is_ledger_name("TH"));
        assert!(!is_ledger_name("  "));
        assert!(!is_ledger_name("Grand Total"));
        assert!(!is_ledger_name("Month: March"));
        assert!(is_ledger_name("Mint"));
    }

    #[test]
    fn test_first_seen_preserves_order() {
        let names = vec!["B", "A", "B", "C", "A"];
        let unique = first_seen(names, |s| *s);
        assert_eq!(unique, vec!["B", "A", "C"]);
    }
}
