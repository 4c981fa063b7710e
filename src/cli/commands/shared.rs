//! Shared components for CLI commands
//!
//! Logging setup, layered configuration loading, progress bars and the run
//! statistics every command returns.

use crate::cli::args::{CommandArgs, CommonArgs};
use crate::config::Config;
use crate::{Error, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{debug, info};

/// Run statistics reported by every command
#[derive(Debug, Clone, Default)]
pub struct CommandStats {
    /// Bulletins (or name batches, for `resolve`) handled
    pub bulletins_processed: usize,
    /// Entries or names handled
    pub entries_processed: usize,
    /// Inputs skipped because of non-critical errors
    pub errors_encountered: usize,
    pub processing_time: Duration,
    /// Files written, with their sizes in bytes
    pub output_files: Vec<(String, u64)>,
}

impl CommandStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a written file, reading its size from disk
    pub fn add_output_file(&mut self, path: &std::path::Path) {
        let size = std::fs::metadata(path).map(|m| m.len()).unwrap_or(0);
        self.output_files.push((path.display().to_string(), size));
    }

    /// Calculate total output size in bytes
    pub fn total_output_size(&self) -> u64 {
        self.output_files.iter().map(|(_, size)| size).sum()
    }

    /// Format a byte count in human-readable form
    pub fn format_size(bytes: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = bytes as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", bytes, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}

/// Set up structured logging on stderr
///
/// `RUST_LOG` wins over the verbosity flags when set. Without -v or -q the
/// level comes from `configured`, the `logging.level` configuration value.
pub fn setup_logging(common: &CommonArgs, configured: &str) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = common.effective_log_level(configured);
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("atel_processor={}", log_level)));

    let result = if common.quiet {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_writer(std::io::stderr)
                    .compact(),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_level(true)
                    .with_timer(fmt::time::uptime())
                    .with_writer(std::io::stderr),
            )
            .try_init()
    };
    result.map_err(|e| Error::configuration(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Load configuration using the layered approach (file -> env -> args)
pub fn load_configuration<A: CommandArgs>(args: &A) -> Result<Config> {
    info!("Loading configuration");

    let default_config_path = Config::default_config_path().ok();
    let config_file = match &args.common().config_file {
        Some(path) => Some(path.as_path()),
        None => default_config_path
            .as_deref()
            .filter(|path| path.exists()),
    };

    if let Some(config_path) = config_file {
        info!("Using config file: {}", config_path.display());
    } else {
        info!("No config file found, using defaults and environment variables");
    }

    let mut config = Config::load_layered(config_file)?;
    args.apply_overrides(&mut config);
    config.validate()?;

    debug!("Effective configuration: {:?}", config);
    Ok(config)
}

/// Errors that abort a batch instead of skipping the current input
///
/// An unsupported coordinate shape is critical: skipping the document would
/// drop its valid entries from every partition.
pub fn is_critical_error(error: &Error) -> bool {
    matches!(
        error,
        Error::Configuration { .. }
            | Error::ProcessingInterrupted { .. }
            | Error::UnsupportedShape { .. }
    )
}

/// Progress bar with the standard template, hidden when `visible` is false
pub fn create_progress_bar(total: u64, message: &str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg} [{per_sec}] ETA: {eta}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb.set_message(message.to_string());
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::args::ClassifyArgs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_format_size() {
        assert_eq!(CommandStats::format_size(512), "512 B");
        assert_eq!(CommandStats::format_size(1536), "1.50 KB");
        assert_eq!(CommandStats::format_size(5 * 1024 * 1024), "5.00 MB");
    }

    #[test]
    fn test_add_output_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ATEL_good.json");
        std::fs::write(&path, "[]").unwrap();

        let mut stats = CommandStats::new();
        stats.add_output_file(&path);
        stats.add_output_file(&temp_dir.path().join("missing.json"));

        assert_eq!(stats.output_files.len(), 2);
        assert_eq!(stats.total_output_size(), 2);
    }

    #[test]
    fn test_is_critical_error() {
        assert!(is_critical_error(&Error::configuration("bad")));
        assert!(is_critical_error(&Error::processing_interrupted("ctrl-c")));
        assert!(is_critical_error(&Error::unsupported_shape("boolean", "number")));
        assert!(!is_critical_error(&Error::bulletin_not_found("ATel #1")));
        assert!(!is_critical_error(&Error::extraction("ATel #1", "timeout")));
    }

    #[test]
    fn test_load_configuration_with_explicit_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{"paths": {"output_dir": "from_file"}, "classification": {"file_pattern": "ATel-*.json"}}"#,
        )
        .unwrap();

        let mut args = ClassifyArgs::default();
        args.common.config_file = Some(config_path);
        args.output_dir = Some(PathBuf::from("from_cli"));

        let config = load_configuration(&args).unwrap();
        assert_eq!(config.paths.output_dir, PathBuf::from("from_cli"));
        assert_eq!(config.classification.file_pattern, "ATel-*.json");
    }

    #[test]
    fn test_configured_log_level_applies_without_flags() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{"logging": {"level": "debug"}}"#).unwrap();

        let mut args = ClassifyArgs::default();
        args.common.config_file = Some(config_path);
        let config = load_configuration(&args).unwrap();
        assert_eq!(args.common.effective_log_level(&config.logging.level), "debug");

        args.common.quiet = true;
        assert_eq!(args.common.effective_log_level(&config.logging.level), "error");
    }

    #[test]
    fn test_hidden_progress_bar() {
        let pb = create_progress_bar(10, "Classifying", false);
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
    }
}
