//! CLI entry point for browsing a project sheet.

use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use polars::prelude::*;
use project_deck::{
    Dataset, FieldRole, LoadError, LoaderConfig, Record, ResolverConfig, SearchQuery,
    load_dataset,
};
use tracing::{debug, info};

/// Placeholder for missing text values.
const MISSING_TEXT: &str = "N/A";
/// Placeholder for missing dates.
const MISSING_DATE: &str = "TBC";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Browse a real-estate project sheet as project cards",
    long_about = "Loads a hand-maintained project sheet (CSV or workbook, any common \
                  encoding) and prints one card per project.\n\n\
                  EXAMPLES:\n  \
                  # Load data.csv (or the first sheet found) from the current directory\n  \
                  project-deck\n\n  \
                  # Search and filter\n  \
                  project-deck --dir /srv/sheets --search marina --developer Emaar\n\n  \
                  # Export the filtered cards\n  \
                  project-deck --area \"Dubai Marina\" --export marina.csv"
)]
struct Args {
    /// File name to look for first
    #[arg(short, long, default_value = "data.csv")]
    source: String,

    /// Directory to search for the sheet
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// Case-insensitive text searched in every column
    #[arg(long)]
    search: Option<String>,

    /// Only show projects by this developer (exact match)
    #[arg(long)]
    developer: Option<String>,

    /// Only show projects in this area (exact match)
    #[arg(long)]
    area: Option<String>,

    /// JSON file overriding the column keywords per role
    #[arg(long)]
    roles: Option<PathBuf>,

    /// Output JSON to stdout instead of cards
    ///
    /// Disables all logs; only the JSON document is written.
    #[arg(long)]
    json: bool,

    /// Write the matching projects to a CSV file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Print the available developer and area filter values
    #[arg(long)]
    list_filters: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and the cards)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled so stdout only
/// carries the JSON document.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    let loader_config = LoaderConfig::builder()
        .source_hint(&args.source)
        .working_dir(&args.dir)
        .build()?;

    let resolver_config = match &args.roles {
        Some(path) => ResolverConfig::from_json_file(path)?,
        None => ResolverConfig::default(),
    };

    let dataset = match load_dataset(&loader_config, &resolver_config) {
        Ok(dataset) => dataset,
        Err(e) => {
            print_load_error(&e, args.json)?;
            std::process::exit(1);
        }
    };

    for (role, resolution) in dataset.roles().iter() {
        debug!("{}: {:?}", role.label(), resolution);
    }

    if args.list_filters {
        let options = dataset.filter_options();
        if args.json {
            println!("{}", serde_json::to_string_pretty(&options)?);
        } else {
            print_filter_options(&options.developers, &options.areas);
        }
        return Ok(());
    }

    let query = SearchQuery {
        text: args.search.clone().unwrap_or_default(),
        developer: args.developer.clone(),
        area: args.area.clone(),
    };
    let records: Vec<Record> = dataset.search(&query).collect();

    if let Some(path) = &args.export {
        export_records(&records, path)?;
        info!("Exported {} projects to {}", records.len(), path.display());
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    print_cards(&dataset, &records, args.quiet);
    Ok(())
}

/// Explain a load failure on stderr (or as JSON on stdout with `--json`).
fn print_load_error(error: &LoadError, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(error)?);
        return Ok(());
    }

    eprintln!("Error [{}]: {}", error.error_code(), error);
    if !error.attempts().is_empty() {
        eprintln!("\nAttempts:");
        for attempt in error.attempts() {
            eprintln!("  - {}: {}", attempt.attempt, attempt.reason);
        }
    }
    if let LoadError::NoFileFound { directory, listing } = error {
        eprintln!("\nFiles in {}:", directory.display());
        if listing.is_empty() {
            eprintln!("  (empty)");
        }
        for name in listing {
            eprintln!("  - {}", name);
        }
    }
    Ok(())
}

/// Print one card per record.
fn print_cards(dataset: &Dataset, records: &[Record], quiet: bool) {
    if !quiet {
        let source = dataset.source();
        println!(
            "{} projects from {} ({})",
            records.len(),
            source.path.display(),
            source.format
        );
    }

    if records.is_empty() {
        println!("No projects match.");
        return;
    }

    for record in records {
        println!("{}", "=".repeat(60));
        println!("{}", record.name);
        println!("{}", "-".repeat(60));
        println!(
            "  {:<14} {}",
            "Developer:",
            record.display_or(FieldRole::Developer, MISSING_TEXT)
        );
        println!(
            "  {:<14} {}",
            "Area:",
            record.display_or(FieldRole::Area, MISSING_TEXT)
        );
        println!(
            "  {:<14} {}",
            "Handover:",
            record.display_or(FieldRole::HandoverDate, MISSING_DATE)
        );
        if dataset.roles().get(FieldRole::LaunchDate).is_resolved() {
            println!(
                "  {:<14} {}",
                "Launch:",
                record.display_or(FieldRole::LaunchDate, MISSING_DATE)
            );
        }
        println!(
            "  {:<14} {}",
            "Agent pack:",
            record.link.url().unwrap_or("No link")
        );
    }
    println!("{}", "=".repeat(60));
}

fn print_filter_options(developers: &[String], areas: &[String]) {
    println!("DEVELOPERS");
    println!("{}", "-".repeat(40));
    for developer in developers {
        println!("  {}", developer);
    }
    println!();
    println!("AREAS");
    println!("{}", "-".repeat(40));
    for area in areas {
        println!("  {}", area);
    }
}

/// Write records to CSV with polars' writer.
fn export_records(records: &[Record], path: &Path) -> Result<()> {
    let names: Vec<String> = records.iter().map(|r| r.name.clone()).collect();

    let mut df = DataFrame::new(vec![
        Column::new(FieldRole::Name.label().into(), names),
        Column::new(
            FieldRole::Developer.label().into(),
            optional_column(records, |r| r.developer.as_deref()),
        ),
        Column::new(
            FieldRole::Area.label().into(),
            optional_column(records, |r| r.area.as_deref()),
        ),
        Column::new(
            FieldRole::HandoverDate.label().into(),
            optional_column(records, |r| r.handover_date.as_deref()),
        ),
        Column::new(
            FieldRole::LaunchDate.label().into(),
            optional_column(records, |r| r.launch_date.as_deref()),
        ),
        Column::new(
            FieldRole::Link.label().into(),
            optional_column(records, |r| r.link.url()),
        ),
    ])?;

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create export file {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .with_separator(b',')
        .finish(&mut df)?;
    Ok(())
}

fn optional_column(records: &[Record], value: fn(&Record) -> Option<&str>) -> Vec<Option<String>> {
    records
        .iter()
        .map(|r| value(r).map(str::to_string))
        .collect()
}
