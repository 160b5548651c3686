//! Gallery Linker - date-based hard-link organizer for photos and videos
//!
//! Walks a source directory, reads the creation time of every photo and
//! video, and hard-links each one into a `YYYY/MM-Mon/YYYY-MM-DD` tree.

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use gallery_linker::report::{write_error_report, write_inventory, write_loggables};
use gallery_linker::{Cli, Config, Processor};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{Level, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.print_config {
        print!("{}", Config::sample_config());
        return Ok(());
    }

    let exe_dir = get_executable_dir()?;
    let log_path = get_log_path(&exe_dir, &cli);
    let _guard = setup_logging(&cli, &log_path)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Gallery Linker starting");

    let config = load_config(&cli)?;
    if config.verbose {
        info!(?config, "Configuration loaded");
    }
    info!(log_file = %log_path.display(), "Log file location");

    let source = validate_config(&config)?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Cannot create output directory: {}", config.output_dir.display())
    })?;

    let processor = Processor::from_config(&config)?;

    let inventory = {
        let stdout = io::stdout();
        let mut progress = stdout.lock();
        processor.walk(&source, &config.output_dir, &mut progress)?
    };

    {
        let stderr = io::stderr();
        let mut err = stderr.lock();
        write_loggables(&inventory, &mut err)?;
        err.flush()?;
    }

    write_inventory(&inventory, &config.get_inventory_file())?;
    write_error_report(&inventory, &config.output_dir, &config.get_report_file())?;

    info!(summary = %inventory.summary(), "Processing complete");
    Ok(())
}

/// Get the directory where the executable is located
fn get_executable_dir() -> Result<PathBuf> {
    let exe_path = std::env::current_exe()?;
    Ok(exe_path
        .parent()
        .map(|p| p.to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".")))
}

/// Determine the log file path based on config file or timestamp
fn get_log_path(exe_dir: &Path, cli: &Cli) -> PathBuf {
    let log_dir = exe_dir.join("Log");
    let timestamp = Local::now().format("%Y%m%d_%H%M%S");

    if let Some(config_name) = cli.config_name() {
        log_dir
            .join(&config_name)
            .join(format!("{}_{}.log", config_name, timestamp))
    } else {
        log_dir.join(format!("Run_{}.log", timestamp))
    }
}

/// Load configuration from file or CLI arguments
fn load_config(cli: &Cli) -> Result<Config> {
    let config = if let Some(ref config_path) = cli.config {
        info!(config_file = %config_path.display(), "Loading configuration from file");
        let file_config = Config::load_from_file(config_path)?;
        cli.merge_with_config(file_config)
    } else {
        cli.to_config()
    };

    Ok(config)
}

/// Setup logging: everything to the log file, only problems to the console
///
/// The console layer stays quiet by default so the progress line on stdout
/// is not broken up.
fn setup_logging(cli: &Cli, log_path: &Path) -> Result<WorkerGuard> {
    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let console_level = if cli.verbose {
        LevelFilter::WARN
    } else {
        LevelFilter::ERROR
    };

    let env_filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path)?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if cli.json_log {
        subscriber
            .with(fmt::layer().json().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(io::stderr).with_filter(console_level))
            .init();
    } else {
        subscriber
            .with(fmt::layer().with_ansi(false).with_writer(non_blocking))
            .with(fmt::layer().with_writer(io::stderr).with_filter(console_level))
            .init();
    }

    Ok(guard)
}

/// Validate configuration before processing, returning the absolute source directory
fn validate_config(config: &Config) -> Result<PathBuf> {
    let Some(ref source) = config.source_dir else {
        anyhow::bail!("No source directory specified (pass SOURCE or set source_dir)");
    };

    if !source.exists() {
        anyhow::bail!("Source directory does not exist: {}", source.display());
    }

    let source = std::path::absolute(source)?;
    let output = std::path::absolute(&config.output_dir)?;
    if output.starts_with(&source) {
        anyhow::bail!(
            "Output directory {} is inside source directory {}",
            output.display(),
            source.display()
        );
    }

    Ok(source)
}
