//! Clipset - labeled media directory to feature table
//!
//! A CLI tool that scans a dataset of labeled media clips, analyzes every
//! clip concurrently, and writes the results as one table.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (unreadable dataset root, config, output, etc.)
//!   2 - Some files failed analysis and --fail-on-errors was set

use anyhow::{Context, Result};
use clipset::cli::Args;
use clipset::config::{Config, CONFIG_FILE_NAME};
use clipset::pipeline::{self, GenerateOptions};
use clipset::report;
use clipset::scanner::{DatasetScanner, ScanConfig};
use clipset::ByteProfileAnalyzer;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Load and merge configuration
    let mut config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    config.merge_with_args(&args);

    // Initialize logging
    init_logging(config.log_level(args.quiet));

    info!("Clipset v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);
    debug!("Configuration: {:?}", config);

    match run(args, config).await {
        Ok(exit_code) => {
            std::process::exit(exit_code);
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .clipset.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    println!("   Edit it to customize extensions, sampling rate, concurrency, and output.");
    Ok(())
}

/// Initialize logging at the given level.
fn init_logging(level: tracing::Level) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

/// Run the complete workflow. Returns exit code (0 or 2).
async fn run(args: Args, config: Config) -> Result<i32> {
    config.validate().context("Invalid configuration")?;

    let root = args
        .root
        .clone()
        .context("A dataset root is required (--root)")?;
    let scan_config = ScanConfig::from(&config.scanner);

    if args.dry_run {
        return handle_dry_run(&root, scan_config);
    }

    println!("🎬 Building table from: {}", root.display());
    println!("   Sampling rate: {} samples/s", config.analysis.sampling_rate);
    println!("   Concurrency: {}", config.general.concurrency);

    let progress_bar = (!args.quiet).then(|| {
        let pb = ProgressBar::new(0);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );
        Arc::new(pb)
    });

    let mut options = GenerateOptions::new(&root)
        .sampling_rate(config.analysis.sampling_rate)
        .concurrency(config.general.concurrency)
        .scan_config(scan_config);
    options.analysis_timeout = config.analysis.timeout();
    options.include_path = config.table.include_path;

    if let Some(ref pb) = progress_bar {
        let pb = pb.clone();
        options.progress = Some(Arc::new(move |done, total| {
            pb.set_length(total as u64);
            pb.set_position(done as u64);
        }));
    }

    let generated = pipeline::generate(options, Arc::new(ByteProfileAnalyzer)).await?;

    if let Some(pb) = progress_bar {
        pb.finish_and_clear();
    }

    let output_path = PathBuf::from(&config.general.output);
    report::generator::write_report(&generated, config.table.format, &output_path)
        .with_context(|| format!("Failed to write table to {}", output_path.display()))?;

    let summary = &generated.summary;
    println!("\n📊 Summary:");
    println!("   Items discovered: {}", summary.items_discovered);
    println!("   Rows written: {}", summary.items_analyzed);
    if summary.files_skipped > 0 {
        println!("   Skipped (unsupported format): {}", summary.files_skipped);
    }
    if summary.items_failed > 0 {
        println!("   Failed analysis: {}", summary.items_failed);
        for failure in &generated.failures {
            println!("     ⚠️  {}/{}: {}", failure.label, failure.file_name, failure.error);
        }
    }
    println!("   Duration: {:.1}s", summary.duration_seconds);
    println!("\n✅ Table saved to: {}", output_path.display());

    if args.fail_on_errors && summary.items_failed > 0 {
        eprintln!(
            "\n⛔ {} file(s) failed analysis. Failing (exit code 2).",
            summary.items_failed
        );
        return Ok(2);
    }

    Ok(0)
}

/// Handle --dry-run: scan the dataset, print what would be analyzed, exit.
fn handle_dry_run(root: &Path, scan_config: ScanConfig) -> Result<i32> {
    println!("\n🔍 Dry run: scanning dataset (no analysis)...\n");

    let dataset = DatasetScanner::new(root, scan_config).scan()?;

    if dataset.is_empty() {
        println!("   No matching media files found.");
    } else {
        println!("   Found {} files that would be analyzed:\n", dataset.len());
        for item in &dataset.items {
            println!("     {:>5}  {}/{}", item.sequence_index, item.label, item.file_name);
        }
        println!("\n   Labels: {}", dataset.labels().join(", "));
    }

    if !dataset.skipped.is_empty() {
        println!("\n   Skipped {} unsupported files.", dataset.skipped.len());
    }

    println!("\n✅ Dry run complete. No files were analyzed.");
    Ok(0)
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    // Try explicit config path
    if let Some(ref config_path) = args.config {
        return Config::load(config_path);
    }

    // Try default location
    Ok(Config::load_default()?.unwrap_or_default())
}
