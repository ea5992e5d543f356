//! JSON Schema validation of normalized output.
//!
//! Two layers of checks:
//!
//! - The serialized shape, against JSON Schema Draft 7 documents embedded
//!   from `schemas/` at compile time (`normalized-table.json`,
//!   `ledger-period.json`).
//! - The table invariants a schema cannot express: every record carries
//!   exactly the table's series, in order, and no aggregate row survived.
//!
//! # Example
//!
//! ```
//! use usage_sheets::models::{NormalizedTable, PeriodRecord};
//! use usage_sheets::validation::validate_table;
//!
//! let table = NormalizedTable {
//!     records: vec![PeriodRecord::new("Jan").with_value("A", 1.0)],
//!     series: vec!["A".to_string()],
//! };
//! assert!(validate_table(&table).is_ok());
//! ```

use serde_json::Value;

use crate::models::{LedgerPeriod, NormalizedTable};
use crate::transform::filter::is_aggregate;

const TABLE_SCHEMA: &str = include_str!("../../schemas/normalized-table.json");
const LEDGER_SCHEMA: &str = include_str!("../../schemas/ledger-period.json");

/// Validate a JSON value against a schema.
///
/// # Returns
/// * `Ok(())` if valid
/// * `Err(Vec<String>)` with one message per violation
pub fn validate(schema: &Value, data: &Value) -> Result<(), Vec<String>> {
    let validator =
        jsonschema::draft7::new(schema).map_err(|e| vec![format!("Invalid schema: {}", e)])?;

    let errors: Vec<String> = validator.iter_errors(data).map(|e| e.to_string()).collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn embedded(schema: &str) -> Result<Value, Vec<String>> {
    serde_json::from_str(schema).map_err(|e| vec![format!("Invalid embedded schema: {}", e)])
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<Value, Vec<String>> {
    serde_json::to_value(value).map_err(|e| vec![format!("Serialization failed: {}", e)])
}

/// Validate a normalized table: serialized shape plus record/series alignment.
pub fn validate_table(table: &NormalizedTable) -> Result<(), Vec<String>> {
    validate(&embedded(TABLE_SCHEMA)?, &to_json(table)?)?;

    let mut errors = Vec::new();
    for (i, record) in table.records.iter().enumerate() {
        let keys: Vec<&str> = record.values.iter().map(|(name, _)| name.as_str()).collect();
        if keys != table.series.iter().map(String::as_str).collect::<Vec<_>>() {
            errors.push(format!(
                "record {} ('{}') has series {:?}, expected {:?}",
                i, record.label, keys, table.series
            ));
        }
        if is_aggregate(&record.label) {
            errors.push(format!("record {} is an aggregate row", i));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Validate a ledger period: serialized shape plus totals matching records.
pub fn validate_ledger(period: &LedgerPeriod) -> Result<(), Vec<String>> {
    validate(&embedded(LEDGER_SCHEMA)?, &to_json(period)?)?;

    let copies: f64 = period.records.iter().map(|r| r.total_copies).sum();
    let price: f64 = period.records.iter().map(|r| r.total_price).sum();

    let mut errors = Vec::new();
    if (copies - period.total_copies).abs() > f64::EPSILON * copies.abs().max(1.0) {
        errors.push(format!(
            "totalCopies {} does not match records ({})",
            period.total_copies, copies
        ));
    }
    if (price - period.total_price).abs() > f64::EPSILON * price.abs().max(1.0) {
        errors.push(format!(
            "totalPrice {} does not match records ({})",
            period.total_price, price
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
