//! High-level pipeline API: tokenize, normalize and report.
//!
//! The normalizers in this module's siblings are pure. This layer wires
//! them to the tokenizer and the retrieval collaborator and logs what it
//! found along the way.
//!
//! # Example
//!
//! ```rust,ignore
//! use usage_sheets::transform::{process_usage_file, PipelineOptions};
//!
//! let result = process_usage_file("usage.csv", &PipelineOptions::default())?;
//! println!("{} periods", result.table.records.len());
//! ```

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::ledger::{normalize_ledger, LedgerNormalization, LedgerOptions};
use super::usage::{normalize_grid, NormalizeOptions, UsageNormalization};
use crate::analysis::{ledger_overview, sort_periods, LedgerOverview};
use crate::api::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::catalog::{Dataset, DatasetCatalog, DatasetKind};
use crate::error::{CsvError, PipelineResult, RetrievalError};
use crate::models::{CellWarning, Grid, LedgerPeriod};
use crate::parser::{parse_bytes_auto, parse_csv_file_auto, tokenize, ParseResult};
use crate::source::Fetcher;
use crate::validation::{validate_ledger, validate_table};

/// Number of cell warnings echoed to the log
const LOGGED_WARNINGS: usize = 3;

/// Options for both pipelines
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineOptions {
    #[serde(default)]
    pub usage: NormalizeOptions,
    #[serde(default)]
    pub ledger: LedgerOptions,
}

impl PipelineOptions {
    /// Enable strict cell reporting for both pipelines
    pub fn strict(mut self, strict: bool) -> Self {
        self.usage.strict = strict;
        self.ledger.strict = strict;
        self
    }
}

/// Normalized output of a catalog dataset
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetOutput {
    Usage(UsageNormalization),
    Ledger(LedgerNormalization),
}

/// A catalog dataset together with its normalized output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadedDataset {
    pub dataset: Dataset,
    pub output: DatasetOutput,
}

/// All ledger periods of a catalog, in chronological order, with their overview
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewReport {
    pub periods: Vec<LedgerPeriod>,
    pub overview: LedgerOverview,
}

// =============================================================================
// Usage
// =============================================================================

/// Normalize a usage grid and log the outcome
pub fn process_usage_grid(grid: &Grid, options: &PipelineOptions) -> UsageNormalization {
    log_info(format!("Normalizing usage sheet ({} rows)...", grid.len()));
    let result = normalize_grid(grid, &options.usage);

    match (&result.missing_header, result.layout, result.header_row) {
        (Some(err), _, _) => log_warning(format!("{}, returning empty table", err)),
        (None, Some(layout), Some(row)) => {
            log_success(format!("Header found at row {} ({:?} layout)", row, layout));
            log_success(format!(
                "{} periods x {} series",
                result.table.records.len(),
                result.table.series.len()
            ));
        }
        _ => {}
    }
    report_warnings(&result.warnings);
    report_invalid(validate_table(&result.table));

    result
}

/// Tokenize CSV text and normalize it as a usage sheet
pub fn process_usage_text(
    text: &str,
    options: &PipelineOptions,
) -> Result<UsageNormalization, CsvError> {
    let grid = tokenize(text)?;
    Ok(process_usage_grid(&grid, options))
}

/// Decode, tokenize and normalize CSV bytes as a usage sheet
pub fn process_usage_bytes(
    bytes: &[u8],
    options: &PipelineOptions,
) -> Result<UsageNormalization, CsvError> {
    let parsed = parse_bytes_auto(bytes)?;
    Ok(process_usage_grid(&log_parsed(parsed), options))
}

/// Read, tokenize and normalize a CSV file as a usage sheet
pub fn process_usage_file(
    path: impl AsRef<Path>,
    options: &PipelineOptions,
) -> Result<UsageNormalization, CsvError> {
    log_info(format!("Reading {}", path.as_ref().display()));
    let parsed = parse_csv_file_auto(path)?;
    Ok(process_usage_grid(&log_parsed(parsed), options))
}

// =============================================================================
// Ledger
// =============================================================================

/// Normalize a ledger grid for `period` and log the outcome
pub fn process_ledger_grid(
    grid: &Grid,
    period: &str,
    options: &PipelineOptions,
) -> LedgerNormalization {
    log_info(format!("Normalizing ledger '{}' ({} rows)...", period, grid.len()));
    let result = normalize_ledger(grid, period, &options.ledger);

    if let Some(err) = &result.missing_header {
        log_warning(format!("{}, returning empty ledger", err));
    }
    if let Some(header) = &result.header {
        if header.tier.is_fallback() {
            log_warning(format!(
                "Ledger header guessed at row {} ({:?}); check the column mapping",
                header.index, header.tier
            ));
        } else {
            log_success(format!("Ledger header found at row {}", header.index));
        }
    }
    if let Some(columns) = &result.columns {
        if columns.copies.is_none() || columns.price.is_none() {
            log_warning("Copies or price column not found, missing values read as 0");
        }
    }
    log_success(format!(
        "{} newspapers, {} copies, {:.2} total",
        result.period.records.len(),
        result.period.total_copies,
        result.period.total_price
    ));
    report_warnings(&result.warnings);
    report_invalid(validate_ledger(&result.period));

    result
}

/// Tokenize CSV text and normalize it as a ledger
pub fn process_ledger_text(
    text: &str,
    period: &str,
    options: &PipelineOptions,
) -> Result<LedgerNormalization, CsvError> {
    let grid = tokenize(text)?;
    Ok(process_ledger_grid(&grid, period, options))
}

/// Decode, tokenize and normalize CSV bytes as a ledger
pub fn process_ledger_bytes(
    bytes: &[u8],
    period: &str,
    options: &PipelineOptions,
) -> Result<LedgerNormalization, CsvError> {
    let parsed = parse_bytes_auto(bytes)?;
    Ok(process_ledger_grid(&log_parsed(parsed), period, options))
}

/// Read, tokenize and normalize a CSV file as a ledger
pub fn process_ledger_file(
    path: impl AsRef<Path>,
    period: &str,
    options: &PipelineOptions,
) -> Result<LedgerNormalization, CsvError> {
    log_info(format!("Reading {}", path.as_ref().display()));
    let parsed = parse_csv_file_auto(path)?;
    Ok(process_ledger_grid(&log_parsed(parsed), period, options))
}

// =============================================================================
// Datasets
// =============================================================================

/// Retrieve a catalog dataset and normalize it with the matching pipeline
pub async fn load_dataset(
    catalog: &DatasetCatalog,
    fetcher: &Fetcher,
    id: &str,
    options: &PipelineOptions,
) -> PipelineResult<LoadedDataset> {
    let dataset = catalog
        .get(id)
        .ok_or_else(|| RetrievalError::UnknownDataset(id.to_string()))?;

    log_info(format!("Fetching '{}' from {}", dataset.id, dataset.locator));
    let bytes = fetcher.fetch(&dataset.locator).await?;
    log_success(format!("Retrieved {} bytes", bytes.len()));

    let output = match dataset.kind {
        DatasetKind::Usage => DatasetOutput::Usage(process_usage_bytes(&bytes, options)?),
        DatasetKind::Ledger => DatasetOutput::Ledger(process_ledger_bytes(
            &bytes,
            dataset.period_label(),
            options,
        )?),
    };
    Ok(LoadedDataset {
        dataset: dataset.clone(),
        output,
    })
}

/// Retrieve every ledger dataset and build the cross-period overview.
///
/// Datasets are fetched concurrently; the first retrieval or tokenizer
/// error aborts the overview.
pub async fn load_ledger_overview(
    catalog: &DatasetCatalog,
    fetcher: &Fetcher,
    options: &PipelineOptions,
) -> PipelineResult<OverviewReport> {
    let ids: Vec<&str> = catalog
        .of_kind(DatasetKind::Ledger)
        .map(|d| d.id.as_str())
        .collect();
    log_info(format!("Loading {} ledger dataset(s)...", ids.len()));

    let outputs = join_all(
        ids.iter()
            .map(|id| load_dataset(catalog, fetcher, id, options)),
    )
    .await;

    let mut periods = Vec::with_capacity(outputs.len());
    for output in outputs {
        if let DatasetOutput::Ledger(result) = output?.output {
            periods.push(result.period);
        }
    }
    sort_periods(&mut periods);

    let overview = ledger_overview(&periods);
    log_success(format!(
        "Overview: {} periods, {:.2} total cost",
        periods.len(),
        overview.total_cost
    ));

    Ok(OverviewReport { periods, overview })
}

// =============================================================================
// Logging helpers
// =============================================================================

fn log_parsed(parsed: ParseResult) -> Grid {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Read {} rows", parsed.grid.len()));
    parsed.grid
}

fn report_warnings(warnings: &[CellWarning]) {
    if warnings.is_empty() {
        return;
    }
    log_warning(format!("{} malformed cell(s) read as 0", warnings.len()));
    for w in warnings.iter().take(LOGGED_WARNINGS) {
        log_info_indent(
            format!("row {}, column '{}': {:?}", w.row, w.header, w.value),
            1,
        );
    }
}

fn report_invalid(outcome: Result<(), Vec<String>>) {
    if let Err(errors) = outcome {
        for err in errors.iter().take(LOGGED_WARNINGS) {
            log_error(format!("Output failed validation: {}", err));
        }
    }
}
