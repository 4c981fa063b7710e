//! Command-line argument definitions for the ATEL processor
//!
//! This module defines the CLI interface using the clap derive API. Every
//! subcommand flattens [`CommonArgs`] for verbosity, config file and output format.

use crate::config::Config;
use crate::constants::DEFAULT_PARALLEL_WORKERS;
use crate::{Error, Result};
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// CLI arguments for the ATEL bulletin processor
///
/// Extracts celestial object records from Astronomer's Telegram bulletins,
/// classifies their coordinates against the bulletin text and resolves object
/// names in SIMBAD.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "atel-processor",
    version,
    about = "Extract, validate and classify object coordinates mined from ATel bulletins",
    long_about = "Mines celestial object metadata from Astronomer's Telegram bulletins. \
                  Coordinates returned by the LLM extraction are checked against the bulletin \
                  text and partitioned into good, bad and null groups; object names can be \
                  resolved against the SIMBAD reference catalog."
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Classify extracted coordinates into good, bad and null partitions
    Classify(ClassifyArgs),
    /// Convert RA/Dec pairs to decimal degrees
    Normalize(NormalizeArgs),
    /// Request structured extractions for every bulletin from the LLM endpoint
    Extract(ExtractArgs),
    /// Resolve extracted and reference object names against SIMBAD
    Resolve(ResolveArgs),
}

/// Output format for command reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable console output with colors
    Human,
    /// JSON for machine processing
    Json,
}

/// Options shared by every subcommand
#[derive(Debug, Clone, ClapArgs)]
pub struct CommonArgs {
    /// Configuration file path (JSON)
    ///
    /// Defaults to <config dir>/atel-processor/config.json when that file exists.
    #[arg(
        short = 'c',
        long = "config",
        value_name = "FILE",
        help = "Configuration file path"
    )]
    pub config_file: Option<PathBuf>,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(
        short = 'v',
        long = "verbose",
        action = clap::ArgAction::Count,
        help = "Increase logging verbosity"
    )]
    pub verbose: u8,

    /// Only print errors, no progress bars
    #[arg(
        short = 'q',
        long = "quiet",
        conflicts_with = "verbose",
        help = "Suppress all output except errors"
    )]
    pub quiet: bool,

    #[arg(
        long = "output-format",
        value_enum,
        default_value = "human",
        help = "Output format for reports"
    )]
    pub output_format: OutputFormat,
}

impl CommonArgs {
    /// Determine the appropriate log level based on verbosity flags
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Log level for the subscriber, falling back to `configured` without -v or -q
    pub fn effective_log_level(&self, configured: &str) -> String {
        if self.quiet || self.verbose > 0 {
            self.get_log_level().to_string()
        } else {
            configured.to_string()
        }
    }

    /// Progress bars are drawn unless quiet or producing JSON
    pub fn show_progress(&self) -> bool {
        !self.quiet && self.output_format == OutputFormat::Human
    }

    fn validate(&self) -> Result<()> {
        if let Some(config_file) = &self.config_file {
            if !config_file.is_file() {
                return Err(Error::configuration(format!(
                    "Config file does not exist: {}",
                    config_file.display()
                )));
            }
        }
        Ok(())
    }
}

impl Default for CommonArgs {
    fn default() -> Self {
        Self {
            config_file: None,
            verbose: 0,
            quiet: false,
            output_format: OutputFormat::Human,
        }
    }
}

/// Arguments a command contributes on top of the layered configuration
pub trait CommandArgs {
    fn common(&self) -> &CommonArgs;

    /// Override configuration values the user set on the command line
    fn apply_overrides(&self, config: &mut Config);
}

/// Arguments for the classify command
#[derive(Debug, Clone, Parser)]
pub struct ClassifyArgs {
    /// Bulletin CSV with `atelno` and `body` columns
    #[arg(
        short = 'b',
        long = "bulletins",
        value_name = "FILE",
        help = "Bulletin corpus CSV"
    )]
    pub bulletin_csv: Option<PathBuf>,

    /// Directory with one extraction document per bulletin
    #[arg(
        short = 'e',
        long = "extractions",
        value_name = "PATH",
        help = "Directory of extraction JSON documents"
    )]
    pub extraction_dir: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output directory for partition and summary files"
    )]
    pub output_dir: Option<PathBuf>,

    /// Glob matched against extraction file names (default "*.json")
    #[arg(long = "pattern", value_name = "GLOB", help = "Extraction file name pattern")]
    pub file_pattern: Option<String>,

    #[arg(
        short = 'j',
        long = "workers",
        default_value_t = DEFAULT_PARALLEL_WORKERS,
        help = "Number of parallel classification workers"
    )]
    pub workers: usize,

    /// Load and check inputs without classifying
    #[arg(long = "dry-run", help = "Load inputs and report what would be classified")]
    pub dry_run: bool,

    /// Persist the good, bad, null and summary files to the output directory
    #[arg(short = 'w', long = "write", help = "Write partition files")]
    pub write: bool,

    /// Skip documents with unsupported coordinate shapes instead of aborting
    #[arg(
        long = "skip-malformed",
        help = "Log and skip documents whose entries cannot be ingested"
    )]
    pub skip_malformed: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ClassifyArgs {
    /// Validate the classify arguments for consistency
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        if self.workers == 0 {
            return Err(Error::configuration(
                "Number of workers must be greater than 0",
            ));
        }
        if self.workers > 100 {
            return Err(Error::configuration("Number of workers cannot exceed 100"));
        }

        if let Some(extraction_dir) = &self.extraction_dir {
            if !extraction_dir.is_dir() {
                return Err(Error::configuration(format!(
                    "Extraction directory does not exist: {}",
                    extraction_dir.display()
                )));
            }
        }

        if self.dry_run && self.write {
            return Err(Error::configuration(
                "--dry-run and --write cannot be used together",
            ));
        }

        Ok(())
    }
}

impl CommandArgs for ClassifyArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.bulletin_csv {
            config.paths.bulletin_csv = path.clone();
        }
        if let Some(path) = &self.extraction_dir {
            config.paths.extraction_dir = path.clone();
        }
        if let Some(path) = &self.output_dir {
            config.paths.output_dir = path.clone();
        }
        if let Some(pattern) = &self.file_pattern {
            config.classification.file_pattern = pattern.clone();
        }
        config.classification.parallel_workers = self.workers;
    }
}

impl Default for ClassifyArgs {
    fn default() -> Self {
        Self {
            bulletin_csv: None,
            extraction_dir: None,
            output_dir: None,
            file_pattern: None,
            workers: DEFAULT_PARALLEL_WORKERS,
            dry_run: false,
            write: false,
            skip_malformed: false,
            common: CommonArgs::default(),
        }
    }
}

/// Arguments for the normalize command
///
/// Either a single `--ra`/`--dec` pair or a good partition file via `--input`.
#[derive(Debug, Clone, Parser)]
pub struct NormalizeArgs {
    #[arg(
        long = "ra",
        value_name = "RA",
        requires = "dec",
        allow_hyphen_values = true,
        help = "Right ascension (e.g. 22h02m43.29s, 22:02:43.29 or 330.68)"
    )]
    pub ra: Option<String>,

    #[arg(
        long = "dec",
        value_name = "DEC",
        requires = "ra",
        allow_hyphen_values = true,
        help = "Declination (e.g. +42d16m39.6s, -05:12:00 or 42.28)"
    )]
    pub dec: Option<String>,

    /// Partition file written by `classify --write`
    #[arg(
        short = 'i',
        long = "input",
        value_name = "FILE",
        conflicts_with_all = ["ra", "dec"],
        help = "Partition file whose entries are normalized"
    )]
    pub input: Option<PathBuf>,

    /// Write the input groups back with RA/Dec in decimal degrees
    #[arg(
        short = 'o',
        long = "output",
        value_name = "FILE",
        requires = "input",
        help = "Write converted entries to this partition file"
    )]
    pub output: Option<PathBuf>,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl NormalizeArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        match (&self.ra, &self.dec, &self.input) {
            (Some(_), Some(_), None) => Ok(()),
            (None, None, Some(input)) if input.is_file() => Ok(()),
            (None, None, Some(input)) => Err(Error::configuration(format!(
                "Input file does not exist: {}",
                input.display()
            ))),
            _ => Err(Error::configuration(
                "Provide either --ra and --dec, or --input",
            )),
        }
    }
}

impl CommandArgs for NormalizeArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, _config: &mut Config) {}
}

/// Arguments for the extract command
#[derive(Debug, Clone, Parser)]
pub struct ExtractArgs {
    #[arg(
        short = 'b',
        long = "bulletins",
        value_name = "FILE",
        help = "Bulletin corpus CSV"
    )]
    pub bulletin_csv: Option<PathBuf>,

    /// Extraction documents are written here as <id-with-hyphens>.json
    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Directory for extraction documents"
    )]
    pub extraction_dir: Option<PathBuf>,

    #[arg(short = 'm', long = "model", value_name = "MODEL", help = "Chat model name")]
    pub model: Option<String>,

    /// Only extract the first N bulletins of the corpus
    #[arg(long = "limit", value_name = "N", help = "Maximum number of bulletins")]
    pub limit: Option<usize>,

    /// Skip bulletins that already have an extraction document
    #[arg(long = "skip-existing", help = "Do not re-extract existing documents")]
    pub skip_existing: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ExtractArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        if self.limit == Some(0) {
            return Err(Error::configuration("--limit must be greater than 0"));
        }
        if let Some(model) = &self.model {
            if model.trim().is_empty() {
                return Err(Error::configuration("--model must not be empty"));
            }
        }
        Ok(())
    }
}

impl CommandArgs for ExtractArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.bulletin_csv {
            config.paths.bulletin_csv = path.clone();
        }
        if let Some(path) = &self.extraction_dir {
            config.paths.extraction_dir = path.clone();
        }
        if let Some(model) = &self.model {
            config.extraction.model = model.clone();
        }
    }
}

/// Arguments for the resolve command
#[derive(Debug, Clone, Parser)]
pub struct ResolveArgs {
    #[arg(
        short = 'e',
        long = "extractions",
        value_name = "PATH",
        help = "Directory of extraction JSON documents"
    )]
    pub extraction_dir: Option<PathBuf>,

    /// Reference source list with `ATELNO` and `Sources` columns
    #[arg(
        short = 's',
        long = "sources",
        value_name = "FILE",
        help = "Reference source list CSV"
    )]
    pub sources_csv: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "PATH",
        help = "Output directory for catalog CSV files"
    )]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "batch-size", value_name = "N", help = "Names per SIMBAD query")]
    pub batch_size: Option<usize>,

    /// Only report name counts, do not query SIMBAD
    #[arg(long = "dry-run", help = "Collect and count names without querying")]
    pub dry_run: bool,

    #[command(flatten)]
    pub common: CommonArgs,
}

impl ResolveArgs {
    pub fn validate(&self) -> Result<()> {
        self.common.validate()?;

        if self.batch_size == Some(0) {
            return Err(Error::configuration("--batch-size must be greater than 0"));
        }
        if let Some(extraction_dir) = &self.extraction_dir {
            if !extraction_dir.is_dir() {
                return Err(Error::configuration(format!(
                    "Extraction directory does not exist: {}",
                    extraction_dir.display()
                )));
            }
        }
        Ok(())
    }
}

impl CommandArgs for ResolveArgs {
    fn common(&self) -> &CommonArgs {
        &self.common
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(path) = &self.extraction_dir {
            config.paths.extraction_dir = path.clone();
        }
        if let Some(path) = &self.sources_csv {
            config.paths.sources_csv = path.clone();
        }
        if let Some(path) = &self.output_dir {
            config.paths.output_dir = path.clone();
        }
        if let Some(batch_size) = self.batch_size {
            config.catalog.batch_size = batch_size;
        }
    }
}

impl Args {
    /// The subcommand to run; `main` handles the missing-subcommand case first
    pub fn get_command(&self) -> Commands {
        match &self.command {
            Some(command) => command.clone(),
            None => Commands::Classify(ClassifyArgs::default()),
        }
    }
}
