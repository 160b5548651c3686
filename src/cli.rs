//! CLI argument parsing with clap

use crate::config::Config;
use crate::layout::NamingPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Gallery Linker - hard-link photos and videos into a date-based tree
///
/// Reads the creation time of every JPEG (EXIF) and MOV/MP4/M4V (FFprobe)
/// under SOURCE and hard-links each file to
/// OUTPUT_DIR/YYYY/MM-Mon/YYYY-MM-DD/. Nothing is copied or modified.
/// A JSON inventory and an HTML report of problem files are written at the end.
///
/// Make sure OUTPUT_DIR is not inside SOURCE.
#[derive(Parser, Debug)]
#[command(name = "gallery-linker")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan for media files
    pub source: Option<PathBuf>,

    /// Root of the output tree [default: ./output]
    pub output_dir: Option<PathBuf>,

    /// Path to configuration file (TOML format)
    ///
    /// When specified, settings from the config file are used as defaults.
    /// CLI arguments will override config file settings.
    #[arg(short = 'C', long)]
    pub config: Option<PathBuf>,

    /// JSON inventory path [default: OUTPUT_DIR/files.json]
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// HTML error report path [default: OUTPUT_DIR/errors.html]
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// How linked files are named
    #[arg(short, long, value_enum)]
    pub naming: Option<NamingPolicy>,

    /// Media probe executable
    #[arg(long, env = "GALLERY_LINKER_PROBE")]
    pub probe: Option<String>,

    /// chrono layout of the probe's creation_time tags
    #[arg(long)]
    pub probe_layout: Option<String>,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub print_config: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Output log format as JSON
    #[arg(long)]
    pub json_log: bool,
}

impl Cli {
    /// Get config file name (without extension) for log naming
    pub fn config_name(&self) -> Option<String> {
        self.config.as_ref().and_then(|p| {
            p.file_stem()
                .and_then(|s| s.to_str())
                .map(|s| s.to_string())
        })
    }

    /// Merge CLI arguments with config from file
    /// CLI arguments take precedence over config file settings
    pub fn merge_with_config(&self, mut config: Config) -> Config {
        if let Some(ref source) = self.source {
            config.source_dir = Some(source.clone());
        }
        if let Some(ref output) = self.output_dir {
            config.output_dir = output.clone();
        }
        if let Some(ref json) = self.json {
            config.inventory_file = Some(json.clone());
        }
        if let Some(ref report) = self.report {
            config.report_file = Some(report.clone());
        }
        if let Some(naming) = self.naming {
            config.naming = naming;
        }
        if let Some(ref probe) = self.probe {
            config.probe.program = probe.clone();
        }
        if let Some(ref layout) = self.probe_layout {
            config.probe.local_layout = layout.clone();
        }
        if self.verbose {
            config.verbose = true;
        }

        config
    }

    /// Convert CLI arguments to Config (when no config file is used)
    pub fn to_config(&self) -> Config {
        self.merge_with_config(Config::default())
    }
}
