//! Usage Sheets CLI - normalize usage sheets and newspaper ledgers
//!
//! ```bash
//! usage-sheets usage report.csv --summary   # Normalize a usage sheet
//! usage-sheets ledger march.csv --period "March 2025"
//! usage-sheets datasets                     # List configured datasets
//! usage-sheets fetch "2025 Data" --summary  # Retrieve and normalize a dataset
//! usage-sheets overview                     # Cross-period ledger overview
//! usage-sheets serve                        # Start HTTP server (port 3000)
//! ```

use clap::{Parser, Subcommand};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use usage_sheets::catalog::CATALOG_ENV;
use usage_sheets::{
    load_dataset, load_ledger_overview, process_ledger_file, process_usage_file, ranking,
    summarize, DatasetCatalog, DatasetOutput, Fetcher, NormalizedTable, PipelineOptions,
};

/// Series listed in the printed summary
const SUMMARY_TOP: usize = 5;

#[derive(Parser)]
#[command(name = "usage-sheets")]
#[command(about = "Normalize library usage sheets and newspaper ledgers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize a usage sheet to JSON
    Usage {
        /// Input CSV file
        input: PathBuf,

        /// Report malformed numeric cells
        #[arg(long)]
        strict: bool,

        /// Print totals, top series and stability
        #[arg(long)]
        summary: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Normalize a newspaper ledger to JSON
    Ledger {
        /// Input CSV file
        input: PathBuf,

        /// Period label (default: file name)
        #[arg(short, long)]
        period: Option<String>,

        /// Report malformed numeric cells
        #[arg(long)]
        strict: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List configured datasets
    Datasets {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Retrieve and normalize one dataset
    Fetch {
        /// Dataset id
        id: String,

        /// Catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,

        /// Print totals, top series and stability
        #[arg(long)]
        summary: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Retrieve every ledger dataset and print the overview
    Overview {
        /// Catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Catalog JSON file
        #[arg(short, long)]
        catalog: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Usage {
            input,
            strict,
            summary,
            output,
        } => cmd_usage(&input, strict, summary, output.as_deref()),

        Commands::Ledger {
            input,
            period,
            strict,
            output,
        } => cmd_ledger(&input, period, strict, output.as_deref()),

        Commands::Datasets { catalog } => cmd_datasets(catalog),

        Commands::Fetch {
            id,
            catalog,
            summary,
            output,
        } => cmd_fetch(&id, catalog, summary, output.as_deref()).await,

        Commands::Overview { catalog } => cmd_overview(catalog).await,

        Commands::Serve { port, catalog } => cmd_serve(port, catalog).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Catalog from the flag, else from the environment, else built in
fn load_catalog(flag: Option<PathBuf>) -> Result<DatasetCatalog, Box<dyn std::error::Error>> {
    let path = flag.or_else(|| std::env::var_os(CATALOG_ENV).map(PathBuf::from));
    if let Some(ref p) = path {
        eprintln!("📚 Catalog: {}", p.display());
    }
    Ok(DatasetCatalog::load(path.as_deref())?)
}

fn cmd_usage(
    input: &Path,
    strict: bool,
    summary: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let options = PipelineOptions::default().strict(strict);
    let result = process_usage_file(input, &options)?;

    if summary {
        print_summary(&result.table);
    }
    write_json(&result, output)
}

fn cmd_ledger(
    input: &Path,
    period: Option<String>,
    strict: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let period = period.unwrap_or_else(|| {
        input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("ledger")
            .to_string()
    });
    let options = PipelineOptions::default().strict(strict);
    let result = process_ledger_file(input, &period, &options)?;

    write_json(&result, output)
}

fn cmd_datasets(catalog: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(catalog)?;

    eprintln!("📋 Datasets ({}):\n", catalog.list().len());
    for dataset in catalog.list() {
        println!("  📄 {} [{:?}]", dataset.id, dataset.kind);
        println!("     Source: {}", dataset.locator);
        if let Some(ref period) = dataset.period {
            println!("     Period: {}", period);
        }
    }
    Ok(())
}

async fn cmd_fetch(
    id: &str,
    catalog: Option<PathBuf>,
    summary: bool,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(catalog)?;
    let loaded = load_dataset(&catalog, &Fetcher::new(), id, &PipelineOptions::default()).await?;

    if summary {
        if let DatasetOutput::Usage(ref result) = loaded.output {
            print_summary(&result.table);
        }
    }
    write_json(&loaded, output)
}

async fn cmd_overview(catalog: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(catalog)?;
    let report = load_ledger_overview(&catalog, &Fetcher::new(), &PipelineOptions::default()).await?;

    let overview = &report.overview;
    eprintln!("\n📊 LEDGER OVERVIEW");
    eprintln!("   Periods:      {}", report.periods.len());
    eprintln!("   Total cost:   {:.2}", overview.total_cost);
    eprintln!("   Total copies: {}", overview.total_copies);
    for share in &overview.languages {
        eprintln!("   {:?}: {} copies", share.language, share.copies);
    }
    if let Some(language) = overview.dominant_language {
        eprintln!("   Dominant:     {:?}", language);
    }

    write_json(&report, None)
}

async fn cmd_serve(port: u16, catalog: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = load_catalog(catalog)?;
    usage_sheets::server::start_server(port, catalog).await
}

fn print_summary(table: &NormalizedTable) {
    let summary = summarize(table);

    eprintln!("\n📊 SUMMARY");
    eprintln!("   Periods:      {}", table.records.len());
    eprintln!("   Series:       {}", summary.series_count);
    eprintln!("   Grand total:  {}", summary.grand_total);
    if let Some(ref top) = summary.top_series {
        match top.share_pct {
            Some(share) => eprintln!("   Top series:   {} ({:.1}%)", top.name, share),
            None => eprintln!("   Top series:   {}", top.name),
        }
    }
    if let Some(ref peak) = summary.peak_period {
        eprintln!("   Peak period:  {} ({})", peak.label, peak.total);
    }
    if let Some(growth) = summary.growth_pct {
        eprintln!("   Growth:       {:+.1}%", growth);
    }
    eprintln!("   Stability:    {:?}", summary.stability);

    for (i, entry) in ranking(table, SUMMARY_TOP).iter().enumerate() {
        eprintln!("   {:>2}. {} - {}", i + 1, entry.name, entry.total);
    }
    eprintln!();
}

fn write_json<T: Serialize>(value: &T, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
