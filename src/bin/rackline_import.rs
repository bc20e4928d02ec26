// ABOUTME: Command-line importer and feature query tool for Rackline
// ABOUTME: Imports CSV/XML workout exports into SQLite and prints batch reports
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Rackline Analytics

//! Rackline importer CLI.
//!
//! Usage:
//! ```bash
//! # Import one export file
//! rackline-import import data/export-2025-03.csv
//!
//! # Import every CSV/XML file in a directory, incrementally
//! rackline-import import data/ --incremental
//!
//! # Inspect derived features for one exercise
//! rackline-import features bench-press
//! ```

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use rackline::config::EtlConfig;
use rackline::import::ImportReport;
use rackline::{EtlPipeline, FeatureCalculator, ImportOptions, SqliteWorkoutStore, WorkoutStore};

#[derive(Parser)]
#[command(
    name = "rackline-import",
    about = "Rackline workout-log importer",
    long_about = "Imports CSV/XML workout-log exports into the Rackline store and queries derived training features."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Database URL override (defaults to $DATABASE_URL, then sqlite:rackline.db)
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Enable verbose logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Import a file or every CSV/XML file in a directory
    Import {
        /// File or directory to import
        path: PathBuf,

        /// Only import recent sessions whose dates are not yet stored
        #[arg(long)]
        incremental: bool,

        /// Anchor date for the incremental window (YYYY-MM-DD, default today)
        #[arg(long)]
        reference_date: Option<NaiveDate>,
    },
    /// Print derived features for one exercise
    Features {
        /// Canonical exercise name
        exercise: String,

        /// Range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(log_level).init();

    let database_url = cli
        .database_url
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| "sqlite:rackline.db".into());
    let store = std::sync::Arc::new(
        SqliteWorkoutStore::connect(&database_url)
            .await
            .with_context(|| format!("cannot open store at {database_url}"))?,
    );

    match cli.command {
        Command::Import {
            path,
            incremental,
            reference_date,
        } => {
            let pipeline = EtlPipeline::new(EtlConfig::default(), store);
            let options = ImportOptions {
                incremental,
                reference_date,
            };
            run_import(&pipeline, &path, options).await
        }
        Command::Features { exercise, from, to } => {
            run_features(store.as_ref(), &exercise, from, to).await
        }
    }
}

async fn run_import(pipeline: &EtlPipeline, path: &Path, options: ImportOptions) -> Result<()> {
    let files = collect_files(path)?;
    if files.is_empty() {
        bail!("no CSV/XML files found at {}", path.display());
    }

    let mut failed_files = 0usize;
    for file in &files {
        match pipeline.import_file(file, options).await {
            Ok(report) => print_report(file, &report),
            Err(error) => {
                failed_files += 1;
                warn!(file = %file.display(), %error, "import failed");
            }
        }
    }

    if failed_files == files.len() {
        bail!("all {failed_files} file(s) failed to import");
    }
    Ok(())
}

/// Expand a path into the list of importable files.
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }
    if !path.is_dir() {
        bail!("path not found: {}", path.display());
    }

    let mut files: Vec<PathBuf> = std::fs::read_dir(path)
        .with_context(|| format!("cannot read directory {}", path.display()))?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|candidate| {
            candidate
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| {
                    let ext = ext.to_lowercase();
                    ext == "csv" || ext == "xml"
                })
        })
        .collect();
    files.sort();
    Ok(files)
}

fn print_report(file: &Path, report: &ImportReport) {
    info!(
        file = %file.display(),
        inserted = report.inserted,
        skipped_duplicate = report.skipped_duplicate,
        rejected_malformed = report.rejected_malformed,
        rejected_failed = report.rejected_failed,
        sessions_created = report.sessions_created,
        "import report"
    );
    println!("{}", file.display());
    println!("  inserted:           {}", report.inserted);
    println!("  skipped duplicates: {}", report.skipped_duplicate);
    println!("  rejected malformed: {}", report.rejected_malformed);
    println!("  rejected failed:    {}", report.rejected_failed);
    println!("  sessions created:   {}", report.sessions_created);
    if report.filtered_incremental > 0 {
        println!("  outside window:     {}", report.filtered_incremental);
    }
    for row_error in &report.row_errors {
        println!("  ! {row_error}");
    }
    for failed in &report.failed_sessions {
        println!("  ! session {}: {}", failed.key, failed.error);
    }
}

async fn run_features(
    store: &SqliteWorkoutStore,
    exercise: &str,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Result<()> {
    let range = match (from, to) {
        (Some(from), Some(to)) => Some((from, to)),
        (Some(from), None) => Some((from, NaiveDate::from_ymd_opt(9999, 12, 31).unwrap_or(from))),
        (None, Some(to)) => Some((NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(to), to)),
        (None, None) => None,
    };

    let sessions = store
        .list_session_sets(Some(exercise), range)
        .await
        .context("feature query failed")?;
    if sessions.is_empty() {
        bail!("no sets found for exercise '{exercise}'");
    }

    let calculator = FeatureCalculator::default();
    for record in calculator.exercise_features(&sessions, exercise) {
        println!(
            "{}  {:<26} {:>10.2}  [{} .. {}]",
            record.exercise, record.metric, record.value, record.window.start, record.window.end
        );
    }
    println!(
        "sessions since last 1RM improvement: {}",
        calculator.plateau_age(&sessions, exercise)
    );
    Ok(())
}
