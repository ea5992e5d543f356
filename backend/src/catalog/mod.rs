//! Dataset catalog - which sheets exist and where to fetch them.
//!
//! Dataset selection is caller-level configuration: a map from dataset id
//! to a source locator, loaded from a JSON file or taken from the built-in
//! defaults. The core normalizers never read this.
//!
//! ```json
//! {
//!   "datasets": [
//!     { "id": "2025 Data", "kind": "usage", "locator": { "url": "https://..." } },
//!     { "id": "March 2025", "kind": "ledger", "locator": { "file": "bills/march.csv" } }
//!   ]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{CatalogError, CatalogResult};

/// Environment variable naming a catalog file (read by the binary only)
pub const CATALOG_ENV: &str = "USAGE_SHEETS_CATALOG";

/// Which normalizer a dataset is read with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    Usage,
    Ledger,
}

/// Where a dataset's CSV comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceLocator {
    Url(String),
    File(PathBuf),
}

impl std::fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceLocator::Url(url) => write!(f, "{}", url),
            SourceLocator::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A configured dataset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Unique identifier, also the display name
    pub id: String,
    pub kind: DatasetKind,
    pub locator: SourceLocator,
    /// Period label for ledgers; defaults to the id
    #[serde(default)]
    pub period: Option<String>,
}

impl Dataset {
    pub fn period_label(&self) -> &str {
        self.period.as_deref().unwrap_or(&self.id)
    }
}

/// Ordered set of datasets, unique by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetCatalog {
    datasets: Vec<Dataset>,
}

const USAGE_2025_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSpo7h-HSoZ6knQ7hib7GdKNEJgEPUGaFPXPZ5bKyrByUQ2ap_xmNuP8W94rD_j4A/pub?output=csv";
const SCHOOL_WISE_2026_URL: &str = "https://docs.google.com/spreadsheets/d/e/2PACX-1vSpo7h-HSoZ6knQ7hib7GdKNEJgEPUGaFPXPZ5bKyrByUQ2ap_xmNuP8W94rD_j4A/pub?gid=4218642&single=true&output=csv";

impl DatasetCatalog {
    /// Built-in datasets of the usage dashboard
    pub fn builtin() -> Self {
        Self {
            datasets: vec![
                Dataset {
                    id: "2025 Data".to_string(),
                    kind: DatasetKind::Usage,
                    locator: SourceLocator::Url(USAGE_2025_URL.to_string()),
                    period: None,
                },
                Dataset {
                    id: "Jan 2026 (School Wise)".to_string(),
                    kind: DatasetKind::Usage,
                    locator: SourceLocator::Url(SCHOOL_WISE_2026_URL.to_string()),
                    period: None,
                },
            ],
        }
    }

    /// Parse a catalog from JSON text
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        let catalog: DatasetCatalog = serde_json::from_str(json)?;
        catalog.check_unique()?;
        Ok(catalog)
    }

    /// Load a catalog file; relative file locators resolve against its directory
    pub fn from_file(path: impl AsRef<Path>) -> CatalogResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut catalog = Self::from_json(&content)?;

        if let Some(base) = path.parent() {
            for dataset in &mut catalog.datasets {
                if let SourceLocator::File(file) = &mut dataset.locator {
                    if file.is_relative() {
                        *file = base.join(&*file);
                    }
                }
            }
        }
        Ok(catalog)
    }

    /// Load from `path` if given, else the built-in defaults
    pub fn load(path: Option<&Path>) -> CatalogResult<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Ok(Self::builtin()),
        }
    }

    /// Add a dataset, rejecting duplicate ids
    pub fn insert(&mut self, dataset: Dataset) -> CatalogResult<()> {
        if self.get(&dataset.id).is_some() {
            return Err(CatalogError::DuplicateId(dataset.id));
        }
        self.datasets.push(dataset);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&Dataset> {
        self.datasets.iter().find(|d| d.id == id)
    }

    pub fn list(&self) -> &[Dataset] {
        &self.datasets
    }

    pub fn of_kind(&self, kind: DatasetKind) -> impl Iterator<Item = &Dataset> {
        self.datasets.iter().filter(move |d| d.kind == kind)
    }

    fn check_unique(&self) -> CatalogResult<()> {
        let mut seen = HashSet::new();
        for dataset in &self.datasets {
            if !seen.insert(dataset.id.as_str()) {
                return Err(CatalogError::DuplicateId(dataset.id.clone()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// School resources
// =============================================================================

/// Resources assigned to a school or department
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchoolResources {
    pub school: String,
    pub resources: Vec<String>,
}

/// Static school → resource lookup table. Configuration data, not derived
/// from any sheet.
pub fn school_resources() -> Vec<SchoolResources> {
    const TABLE: &[(&str, &[&str])] = &[
        (
            "School of Engineering",
            &["IEEE Xplore", "ACM Digital Library", "ScienceDirect", "SpringerLink"],
        ),
        (
            "School of Business",
            &["Emerald Insight", "Business Source Complete", "ProQuest Central"],
        ),
        (
            "School of Law",
            &["Manupatra", "SCC Online", "HeinOnline", "LexisNexis"],
        ),
        (
            "School of Medical & Allied Sciences",
            &["PubMed", "CINAHL", "ClinicalKey"],
        ),
        (
            "School of Liberal Arts",
            &["JSTOR", "Project MUSE", "Taylor & Francis Online"],
        ),
        (
            "General / Cross-Disciplinary",
            &["Scopus", "Web of Science", "EBSCOhost", "Cambridge Core"],
        ),
    ];

    TABLE
        .iter()
        .map(|(school, resources)| SchoolResources {
            school: school.to_string(),
            resources: resources.iter().map(|r| r.to_string()).collect(),
        })
        .collect()
}
