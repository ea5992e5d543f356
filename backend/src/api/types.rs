//! REST API response types.
//!
//! Every response carries a job id, a status and a generation timestamp so
//! the dashboard can correlate it with the SSE log stream.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::analysis::{ledger_overview, summarize, LedgerOverview, UsageSummary};
use crate::catalog::Dataset;
use crate::transform::{DatasetOutput, LedgerNormalization, UsageNormalization};

/// Outcome shown next to a normalized sheet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Normalized cleanly
    Ready,
    /// Normalized, but some cells or the header had to be guessed
    Warning,
    /// No header found or no data rows
    Empty,
}

impl JobStatus {
    pub fn of_usage(result: &UsageNormalization) -> Self {
        if result.missing_header.is_some() || result.table.records.is_empty() {
            JobStatus::Empty
        } else if !result.warnings.is_empty() {
            JobStatus::Warning
        } else {
            JobStatus::Ready
        }
    }

    pub fn of_ledger(result: &LedgerNormalization) -> Self {
        let guessed = result.header.as_ref().is_some_and(|h| h.tier.is_fallback());
        if result.missing_header.is_some() || result.period.records.is_empty() {
            JobStatus::Empty
        } else if guessed || !result.warnings.is_empty() {
            JobStatus::Warning
        } else {
            JobStatus::Ready
        }
    }
}

/// Response to a usage sheet upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: UsageNormalization,
    pub summary: UsageSummary,
}

impl From<UsageNormalization> for UsageResponse {
    fn from(result: UsageNormalization) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::of_usage(&result),
            generated_at: Utc::now(),
            summary: summarize(&result.table),
            result,
        }
    }
}

/// Response to a ledger upload
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerResponse {
    pub job_id: String,
    pub status: JobStatus,
    pub generated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub result: LedgerNormalization,
    /// Cost, copies and language split of this single period
    pub summary: LedgerOverview,
}

impl From<LedgerNormalization> for LedgerResponse {
    fn from(result: LedgerNormalization) -> Self {
        Self {
            job_id: Uuid::new_v4().to_string(),
            status: JobStatus::of_ledger(&result),
            generated_at: Utc::now(),
            summary: ledger_overview(std::slice::from_ref(&result.period)),
            result,
        }
    }
}

/// Response to a dataset load
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetResponse {
    pub dataset: Dataset,
    #[serde(flatten)]
    pub output: DatasetResponseBody,
}

/// Dataset payload, tagged by kind
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DatasetResponseBody {
    Usage(UsageResponse),
    Ledger(LedgerResponse),
}

impl DatasetResponse {
    pub fn new(dataset: Dataset, output: DatasetOutput) -> Self {
        let output = match output {
            DatasetOutput::Usage(result) => DatasetResponseBody::Usage(result.into()),
            DatasetOutput::Ledger(result) => DatasetResponseBody::Ledger(result.into()),
        };
        Self { dataset, output }
    }
}

/// JSON body for failed requests
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "generatedAt": Utc::now(),
    })
}
