use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use rusqlite::Connection;
use std::path::PathBuf;

use country_cleaner::logging::init_logging;
use country_cleaner::{
    parse_measured_date, render_report, render_table, save_run, setup_audit_store,
    CleaningConfig, DateErrorPolicy, Pipeline, Table,
};

#[derive(Parser, Debug)]
#[command(name = "country-cleaner", version, about = "Canonicalize a CSV country column and derive days_ago")]
struct Cli {
    /// Input CSV (needs `country` and `date_measured` columns)
    #[arg(default_value = "store_income_data_task.csv")]
    input: PathBuf,

    /// JSON config with canonical labels, aliases, threshold, date layout
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fuzzy acceptance threshold (0-100), overrides the config
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    threshold: Option<u8>,

    /// Reference date for days_ago, in the config's date layout (default: today)
    #[arg(long)]
    as_of: Option<String>,

    /// Drop rows with unparsable dates instead of aborting
    #[arg(long)]
    skip_bad_dates: bool,

    /// Write the cleaned table here
    #[arg(long)]
    output: Option<PathBuf>,

    /// Persist the run and its rewrite events to this SQLite file
    #[arg(long)]
    audit_db: Option<PathBuf>,

    /// Print the report as JSON instead of text
    #[arg(long)]
    json: bool,

    /// Only print the first N rows of the final table
    #[arg(long)]
    rows: Option<usize>,

    /// Debug-level logging
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(if cli.verbose { "debug" } else { "info" });

    // 1. Config (file, then CLI overrides)
    let mut config = match &cli.config {
        Some(path) => CleaningConfig::from_file(path)?,
        None => CleaningConfig::default(),
    };
    if let Some(threshold) = cli.threshold {
        config.threshold = threshold;
    }
    if cli.skip_bad_dates {
        config.on_date_error = DateErrorPolicy::SkipRow;
    }

    let reference = match &cli.as_of {
        Some(raw) => parse_measured_date(raw, &config.date_format, 0)
            .with_context(|| format!("Invalid --as-of date: {}", raw))?,
        None => Local::now().date_naive(),
    };

    // 2. Load CSV
    let table = Table::load_csv(&cli.input)
        .with_context(|| format!("Failed to load CSV: {:?}", cli.input))?;

    if !cli.json {
        println!("📂 Loaded {} rows from {:?}", table.len(), cli.input);
        println!("   {} distinct raw country values", table.distinct_countries().len());
    }

    // 3. Clean
    let pipeline = Pipeline::new(config).context("Failed to build cleaning pipeline")?;
    let output = pipeline.run(&table, reference).context("Cleaning run failed")?;

    // 4. Report
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&output.report)?);
    } else {
        println!();
        print!("{}", render_report(&output.report));
        println!(" ***********");
        print!("{}", render_table(&output.table, cli.rows));
    }

    // 5. Optional outputs
    if let Some(path) = &cli.output {
        output
            .table
            .save_csv(path)
            .with_context(|| format!("Failed to write CSV: {:?}", path))?;
        if !cli.json {
            println!("\n💾 Cleaned table written to {:?}", path);
        }
    }

    if let Some(path) = &cli.audit_db {
        let mut conn = Connection::open(path)
            .with_context(|| format!("Failed to open audit database: {:?}", path))?;
        setup_audit_store(&conn)?;
        save_run(&mut conn, &output.report.run_record(), &output.audit)?;
        if !cli.json {
            println!("🧾 {} audit events stored for run {}", output.audit.len(), output.audit.run_id);
        }
    }

    Ok(())
}
