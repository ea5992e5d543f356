//! Aggregates over normalized tables and ledgers.
//!
//! Everything here is a pure function of its input. Quantities that are
//! undefined for the input (share of a zero total, dispersion of zero
//! periods, growth from a zero baseline) come back as `None` instead of
//! dividing by zero.

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{LedgerPeriod, NormalizedTable};

/// Coefficient of variation above which usage counts as fluctuating
pub const FLUCTUATION_THRESHOLD: f64 = 0.5;

// =============================================================================
// Usage summary
// =============================================================================

/// Total of one series across all periods
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesTotal {
    pub name: String,
    pub total: f64,
}

/// The series with the largest total and its share of the grand total
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSeries {
    pub name: String,
    pub total: f64,
    /// Percentage of the grand total, `None` when the grand total is zero
    pub share_pct: Option<f64>,
}

/// Total of one period across all series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotal {
    pub label: String,
    pub total: f64,
}

/// Dispersion of per-period totals
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispersion {
    /// Mean; `None` for zero periods
    pub mean: Option<f64>,
    /// Population standard deviation; `None` for zero periods
    pub std_dev: Option<f64>,
    /// Coefficient of variation; `None` when the mean is zero or undefined
    pub cv: Option<f64>,
}

/// Whether period totals are steady or swing month to month
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    Stable,
    Fluctuating,
    Unknown,
}

/// Dashboard figures for one normalized table
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageSummary {
    pub grand_total: f64,
    pub series_count: usize,
    /// Per-series totals in table order
    pub series_totals: Vec<SeriesTotal>,
    pub top_series: Option<TopSeries>,
    pub period_totals: Vec<PeriodTotal>,
    pub peak_period: Option<PeriodTotal>,
    pub dispersion: Dispersion,
    pub stability: Stability,
    /// Percent change from the first to the last period
    pub growth_pct: Option<f64>,
}

/// Per-series totals in table order
pub fn series_totals(table: &NormalizedTable) -> Vec<SeriesTotal> {
    table
        .series
        .iter()
        .map(|name| SeriesTotal {
            name: name.clone(),
            total: table.records.iter().map(|r| r.value(name)).sum(),
        })
        .collect()
}

/// Per-period totals in record order
pub fn period_totals(table: &NormalizedTable) -> Vec<PeriodTotal> {
    table
        .records
        .iter()
        .map(|r| PeriodTotal {
            label: r.label.clone(),
            total: table.series.iter().map(|s| r.value(s)).sum(),
        })
        .collect()
}

/// Series with the largest total; earliest series wins ties
pub fn top_series(totals: &[SeriesTotal]) -> Option<TopSeries> {
    let grand: f64 = totals.iter().map(|t| t.total).sum();
    let top = totals
        .iter()
        .fold(None::<&SeriesTotal>, |best, t| match best {
            Some(b) if b.total >= t.total => Some(b),
            _ => Some(t),
        })?;

    Some(TopSeries {
        name: top.name.clone(),
        total: top.total,
        share_pct: (grand != 0.0).then(|| top.total / grand * 100.0),
    })
}

/// Period with the largest total; earliest period wins ties
pub fn peak_period(totals: &[PeriodTotal]) -> Option<PeriodTotal> {
    totals
        .iter()
        .fold(None::<&PeriodTotal>, |best, t| match best {
            Some(b) if b.total >= t.total => Some(b),
            _ => Some(t),
        })
        .cloned()
}

/// Mean, population standard deviation and coefficient of variation
pub fn dispersion(values: &[f64]) -> Dispersion {
    if values.is_empty() {
        return Dispersion {
            mean: None,
            std_dev: None,
            cv: None,
        };
    }

    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let std_dev = variance.sqrt();

    Dispersion {
        mean: Some(mean),
        std_dev: Some(std_dev),
        cv: (mean != 0.0).then(|| std_dev / mean),
    }
}

/// Classify dispersion against [`FLUCTUATION_THRESHOLD`]
pub fn stability(dispersion: &Dispersion) -> Stability {
    match dispersion.cv {
        Some(cv) if cv > FLUCTUATION_THRESHOLD => Stability::Fluctuating,
        Some(_) => Stability::Stable,
        None => Stability::Unknown,
    }
}

/// Percent change from the first to the last value
pub fn growth_pct(values: &[f64]) -> Option<f64> {
    let first = *values.first()?;
    let last = *values.last()?;
    (first != 0.0).then(|| (last - first) / first * 100.0)
}

/// Compute all dashboard figures for a table
pub fn summarize(table: &NormalizedTable) -> UsageSummary {
    let series = series_totals(table);
    let periods = period_totals(table);
    let values: Vec<f64> = periods.iter().map(|p| p.total).collect();
    let spread = dispersion(&values);

    UsageSummary {
        grand_total: values.iter().sum(),
        series_count: table.series.len(),
        top_series: top_series(&series),
        peak_period: peak_period(&periods),
        stability: stability(&spread),
        growth_pct: growth_pct(&values),
        dispersion: spread,
        series_totals: series,
        period_totals: periods,
    }
}

/// Series sorted by total, largest first, truncated to `limit`
pub fn ranking(table: &NormalizedTable, limit: usize) -> Vec<SeriesTotal> {
    let mut totals = series_totals(table);
    totals.sort_by(|a, b| b.total.total_cmp(&a.total));
    totals.truncate(limit);
    totals
}

/// Which series a trend line follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrendSelection {
    All,
    Series(String),
}

/// One value per period for the selected series (or their sum)
pub fn trend(table: &NormalizedTable, selection: &TrendSelection) -> Vec<PeriodTotal> {
    match selection {
        TrendSelection::All => period_totals(table),
        TrendSelection::Series(name) => table
            .records
            .iter()
            .map(|r| PeriodTotal {
                label: r.label.clone(),
                total: r.value(name),
            })
            .collect(),
    }
}

// =============================================================================
// Ledger overview
// =============================================================================

/// Language of a newspaper title
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Language {
    Hindi,
    English,
    Other,
}

const ENGLISH_TITLES: &[&str] = &[
    "hindustan times",
    "times of india",
    "economic times",
    "the times",
    "express",
    "the hindu",
    "mint",
    "tribune",
    "statesman",
    "telegraph",
    "pioneer",
    "asian age",
    "deccan",
    "business standard",
    "economic",
    "financial",
];

const HINDI_TITLES: &[&str] = &[
    "dainik",
    "jagran",
    "amar ujala",
    "hindustan",
    "bhaskar",
    "navbharat",
    "punjab kesari",
    "rashtriya sahara",
    "jansatta",
    "prabhat",
    "rajasthan patrika",
];

/// Classify a newspaper by title keywords; English matches first so that
/// "Hindustan Times" is not read as Hindi.
pub fn newspaper_language(name: &str) -> Language {
    let folded = name.to_lowercase();
    if ENGLISH_TITLES.iter().any(|k| folded.contains(k)) {
        Language::English
    } else if HINDI_TITLES.iter().any(|k| folded.contains(k)) {
        Language::Hindi
    } else {
        Language::Other
    }
}

/// Copies received per language
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LanguageShare {
    pub language: Language,
    pub copies: f64,
}

/// Totals of one ledger period, for trend charts
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerTrendPoint {
    pub period: String,
    pub total_price: f64,
    pub total_copies: f64,
}

/// Cross-period newspaper figures
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerOverview {
    pub total_cost: f64,
    pub total_copies: f64,
    pub trend: Vec<LedgerTrendPoint>,
    /// Hindi and English always present, Other only when non-zero
    pub languages: Vec<LanguageShare>,
    pub dominant_language: Option<Language>,
}

/// Parse a `"March 2025"` style period label
pub fn period_date(label: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("1 {}", label.trim()), "%d %B %Y").ok()
}

/// Order periods chronologically; unparsable labels keep their relative
/// order after the dated ones.
pub fn sort_periods(periods: &mut [LedgerPeriod]) {
    periods.sort_by_key(|p| match period_date(&p.period) {
        Some(date) => (0, Some(date)),
        None => (1, None),
    });
}

/// Summarize several ledger periods
pub fn ledger_overview(periods: &[LedgerPeriod]) -> LedgerOverview {
    let mut ordered = periods.to_vec();
    sort_periods(&mut ordered);

    let mut hindi = 0.0;
    let mut english = 0.0;
    let mut other = 0.0;
    for record in ordered.iter().flat_map(|p| &p.records) {
        match newspaper_language(&record.name) {
            Language::Hindi => hindi += record.total_copies,
            Language::English => english += record.total_copies,
            Language::Other => other += record.total_copies,
        }
    }

    let mut languages = vec![
        LanguageShare { language: Language::Hindi, copies: hindi },
        LanguageShare { language: Language::English, copies: english },
    ];
    if other > 0.0 {
        languages.push(LanguageShare { language: Language::Other, copies: other });
    }

    let dominant_language = if hindi + english + other == 0.0 {
        None
    } else if hindi > english {
        Some(Language::Hindi)
    } else {
        Some(Language::English)
    };

    LedgerOverview {
        total_cost: ordered.iter().map(|p| p.total_price).sum(),
        total_copies: hindi + english + other,
        trend: ordered
            .iter()
            .map(|p| LedgerTrendPoint {
                period: p.period.clone(),
                total_price: p.total_price,
                total_copies: p.total_copies,
            })
            .collect(),
        languages,
        dominant_language,
    }
}
